//! Authentication Module
//!
//! Session authentication for the OpOne API. Credentials are verified
//! against bcrypt hashes in the users table; successful logins receive a
//! signed JWT carried in the `auth-token` cookie (HttpOnly, SameSite=Lax,
//! 8-hour lifetime). A `Bearer` Authorization header is accepted as an
//! equivalent carrier for non-browser clients.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use opone_core::{AuthError, EntityId, TeamRole, UserAccount};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth-token";

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS + CI ROBUSTNESS)
// ============================================================================

/// Clock abstraction for token time validation.
///
/// By owning time validation ourselves (instead of letting `jsonwebtoken`
/// do it), we avoid the `SystemTime::now().duration_since(UNIX_EPOCH)`
/// panic path on broken CI clocks and make expiry tests fully
/// deterministic.
pub trait AuthClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl AuthClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl AuthClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Type-safe signing secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new secret. Empty strings fall back to the insecure
    /// development default (which production validation rejects).
    pub fn new(secret: String) -> Self {
        let normalized = if secret.trim().is_empty() {
            INSECURE_DEFAULT_SECRET.to_string()
        } else {
            secret
        };
        Self(SecretString::new(normalized.into()))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Signing secret for session tokens
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// Session lifetime in seconds (default: 8 hours)
    pub session_ttl_secs: i64,

    /// Clock skew tolerance in seconds (default: 60)
    pub clock_skew_secs: i64,

    /// Clock for token time validation (injected for testing)
    pub clock: Arc<dyn AuthClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("clock", &"<AuthClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::new(
                std::env::var("OPONE_JWT_SECRET").unwrap_or_default(),
            ),
            jwt_algorithm: Algorithm::HS256,
            session_ttl_secs: 8 * 60 * 60,
            clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `OPONE_JWT_SECRET`: session token signing secret
    /// - `OPONE_SESSION_TTL_SECS`: session lifetime (default: 28800 = 8h)
    /// - `OPONE_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        Self {
            jwt_secret: JwtSecret::new(
                std::env::var("OPONE_JWT_SECRET").unwrap_or_default(),
            ),
            jwt_algorithm: Algorithm::HS256,
            session_ttl_secs: std::env::var("OPONE_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8 * 60 * 60),
            clock_skew_secs: std::env::var("OPONE_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// Called at server startup. In development mode, warnings are logged
    /// but the server continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("OPONE_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(
                    "Cannot start server in production with the insecure default \
                     session secret. Set OPONE_JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using the insecure default session secret. Acceptable for local \
                 development only; set OPONE_JWT_SECRET before deploying."
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Session secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                "Session secret is short ({} chars). Use at least 32 characters \
                 in production.",
                self.jwt_secret.len()
            );
        }

        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// Session token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User's login email
    pub email: String,

    /// Display name shown in the UI header
    pub name: String,

    /// Role (serialized TeamRole)
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a user account using a clock.
    pub fn for_user(user: &UserAccount, session_ttl_secs: i64, clock: &dyn AuthClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: user.user_id.to_string(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            role: user.role.to_string(),
            iat: now,
            exp: now + session_ttl_secs,
        }
    }

    /// Check if the token has expired according to a clock.
    pub fn is_expired(&self, clock: &dyn AuthClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authentication context extracted from a validated session token.
///
/// Injected into Axum request extensions by the session guard.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: EntityId,
    pub email: String,
    pub display_name: String,
    pub role: TeamRole,
}

impl AuthContext {
    /// Build a context from validated claims.
    pub fn from_claims(claims: &Claims) -> ApiResult<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::invalid_token("Token subject is not a valid id"))?;
        let role = claims
            .role
            .parse()
            .map_err(|_| ApiError::invalid_token("Token carries an unknown role"))?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            display_name: claims.name.clone(),
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == TeamRole::Admin
    }
}

// ============================================================================
// TOKEN OPERATIONS
// ============================================================================

/// Validate claim times using our own clock logic.
///
/// Separated from signature validation so tests are deterministic and
/// custom skew policy applies uniformly.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> Result<(), AuthError> {
    if exp < now - leeway_secs {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}

/// Issue a signed session token for a user account.
pub fn issue_token(config: &AuthConfig, user: &UserAccount) -> ApiResult<String> {
    let claims = Claims::for_user(user, config.session_ttl_secs, &*config.clock);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue session token: {}", e)))
}

/// Validate a session token and extract its claims.
///
/// Performs signature validation ONLY through `jsonwebtoken`, then applies
/// our own expiry check against the injected clock.
pub fn validate_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // We do this ourselves with our clock
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();

    // Fail loud if the production clock returns pre-epoch time.
    if now < 0 {
        tracing::error!(timestamp = now, "System clock returned pre-epoch time");
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    validate_claim_times(now, claims.exp, config.clock_skew_secs)?;

    Ok(claims)
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> ApiResult<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Malformed hashes verify as false rather than erroring, so a corrupt row
/// reads as bad credentials instead of a 500.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

// ============================================================================
// SESSION COOKIE
// ============================================================================

/// Render the Set-Cookie value that installs a session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, token, max_age_secs
    )
}

/// Render the Set-Cookie value that clears the session.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", AUTH_COOKIE)
}

/// Extract the session token from a Cookie header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == AUTH_COOKIE && !value.is_empty() {
            Some(value)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opone_core::new_entity_id;

    // 2024-01-01 00:00:00 UTC
    const T0: i64 = 1_704_067_200;

    fn test_config(clock_at: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("a-test-secret-that-is-long-enough-123".to_string()),
            jwt_algorithm: Algorithm::HS256,
            session_ttl_secs: 8 * 60 * 60,
            clock_skew_secs: 60,
            clock: Arc::new(FixedClock(clock_at)),
        }
    }

    fn test_user() -> UserAccount {
        UserAccount {
            user_id: new_entity_id(),
            email: "ana@opone.dev".to_string(),
            password_hash: String::new(),
            display_name: "Ana".to_string(),
            role: TeamRole::Admin,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip_preserves_claims() {
        let config = test_config(T0);
        let user = test_user();

        let token = issue_token(&config, &user).unwrap();
        let claims = validate_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user.user_id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.name, user.display_name);
        assert_eq!(claims.role, "Admin");
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 8 * 60 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = test_config(T0);
        let user = test_user();
        let token = issue_token(&config, &user).unwrap();

        // Validate 9 hours later: past the 8h lifetime plus skew.
        let later = test_config(T0 + 9 * 60 * 60);
        let err = validate_token(&later, &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TokenExpired);
    }

    #[test]
    fn test_clock_skew_tolerance() {
        let config = test_config(T0);
        let user = test_user();
        let token = issue_token(&config, &user).unwrap();

        // 30 seconds past expiry is within the 60 second leeway.
        let slightly_later = test_config(T0 + 8 * 60 * 60 + 30);
        assert!(validate_token(&slightly_later, &token).is_ok());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let config = test_config(T0);
        let user = test_user();
        let token = issue_token(&config, &user).unwrap();

        let other = AuthConfig {
            jwt_secret: JwtSecret::new("a-completely-different-secret-456789".to_string()),
            ..test_config(T0)
        };
        let err = validate_token(&other, &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidToken);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let config = test_config(T0);
        assert!(validate_token(&config, "not-a-jwt").is_err());
        assert!(validate_token(&config, "").is_err());
    }

    #[test]
    fn test_auth_context_from_claims() {
        let config = test_config(T0);
        let user = test_user();
        let token = issue_token(&config, &user).unwrap();
        let claims = validate_token(&config, &token).unwrap();

        let context = AuthContext::from_claims(&claims).unwrap();
        assert_eq!(context.user_id, user.user_id);
        assert_eq!(context.role, TeamRole::Admin);
        assert!(context.is_admin());
    }

    #[test]
    fn test_auth_context_rejects_bad_subject() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: "x@y.z".to_string(),
            name: "X".to_string(),
            role: "Admin".to_string(),
            iat: T0,
            exp: T0 + 100,
        };
        assert!(AuthContext::from_claims(&claims).is_err());
    }

    #[test]
    fn test_password_hash_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_verify_tolerates_malformed_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok123", 28_800);
        assert_eq!(
            cookie,
            "auth-token=tok123; Path=/; HttpOnly; SameSite=Lax; Max-Age=28800"
        );

        let expired = expired_session_cookie();
        assert!(expired.starts_with("auth-token=;"));
        assert!(expired.contains("Max-Age=0"));
    }

    #[test]
    fn test_token_from_cookie_header() {
        assert_eq!(
            token_from_cookie_header("auth-token=abc123"),
            Some("abc123")
        );
        assert_eq!(
            token_from_cookie_header("theme=dark; auth-token=abc123; lang=pt"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header("theme=dark"), None);
        assert_eq!(token_from_cookie_header("auth-token="), None);
        assert_eq!(token_from_cookie_header(""), None);
    }

    #[test]
    fn test_jwt_secret_debug_is_redacted() {
        let secret = JwtSecret::new("super-secret-value".to_string());
        let debug = format!("{:?}", secret);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_empty_secret_falls_back_to_insecure_default() {
        let secret = JwtSecret::new("   ".to_string());
        assert!(secret.is_insecure_default());
    }
}
