//! Use-case services layered over the database clients.

pub mod metrics_service;

pub use metrics_service::MetricsService;
