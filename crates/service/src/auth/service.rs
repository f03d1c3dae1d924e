use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use models::user::{self, UserChanges};
use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, Claims};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self { jwt_secret: Some(secret.into()), password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Sign an HS256 token for `user` valid for `ttl_hours`.
pub fn issue_token(secret: &str, user: &AuthUser, ttl_hours: i64) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(ttl_hours)).timestamp() as usize,
    };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry, returning the claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 });
    /// let input = RegisterInput { username: "zelda".into(), password: "Triforce1".into(), first_name: None, last_name: None };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.username, "zelda");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let changes = UserChanges {
            username: Some(input.username.clone()),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
        };
        user::validate(&changes, true).map_err(|e| AuthError::Validation(e.to_string()))?;
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
        }
        if let Some(existing) = self.repo.find_user_by_username(&input.username).await? {
            debug!("user exists: {}", existing.username);
            return Err(AuthError::Conflict);
        }

        // 先哈希，再在同一事务中写入用户与凭据
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        let user = self.repo
            .create_user_with_password(
                &input.username,
                input.first_name.as_deref(),
                input.last_name.as_deref(),
                hash,
                self.cfg.password_algorithm.clone(),
            )
            .await?;
        info!(user_id = user.id, username = %user.username, event = "user_registered", "user registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::with_secret("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { username: "ganon".into(), password: "Passw0rd".into(), first_name: None, last_name: None }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "ganon".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.username, "ganon");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !user.is_active {
            return Err(AuthError::Unauthorized);
        }

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(issue_token(secret, &user, self.cfg.token_ttl_hours)?),
            None => None,
        };
        info!(user_id = user.id, event = "user_logged_in", "login succeeded");
        Ok(AuthSession { user, token })
    }

    /// Resolve a bearer token to an active user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let secret = self.cfg.jwt_secret.as_deref().ok_or(AuthError::Unauthorized)?;
        let claims = decode_token(secret, token)?;
        match self.repo.find_user_by_id(claims.uid).await? {
            Some(u) if u.is_active && u.username == claims.sub => Ok(u),
            _ => Err(AuthError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> (Arc<MockAuthRepository>, AuthService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        (repo.clone(), AuthService::new(repo, AuthConfig::with_secret("test-secret")))
    }

    fn reg(username: &str, password: &str) -> RegisterInput {
        RegisterInput { username: username.into(), password: password.into(), first_name: Some("F".into()), last_name: None }
    }

    #[tokio::test]
    async fn register_login_authenticate() {
        let (_, svc) = svc();
        let u = svc.register(reg("wario", "Garlic123")).await.unwrap();
        assert_eq!(u.first_name, "F");
        let session = svc.login(LoginInput { username: "wario".into(), password: "Garlic123".into() }).await.unwrap();
        let token = session.token.expect("token issued");
        let who = svc.authenticate(&token).await.unwrap();
        assert_eq!(who.id, u.id);
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_duplicates() {
        let (_, svc) = svc();
        assert!(matches!(svc.register(reg("waluigi", "short")).await, Err(AuthError::Validation(_))));
        svc.register(reg("waluigi", "LongEnough1")).await.unwrap();
        assert!(matches!(svc.register(reg("waluigi", "LongEnough1")).await, Err(AuthError::Conflict)));
        assert!(matches!(svc.register(reg("bad name", "LongEnough1")).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn failed_registration_can_be_retried() {
        let (repo, svc) = svc();
        repo.fail_credential_writes(true);
        assert!(matches!(svc.register(reg("kamek", "Magikoopa1")).await, Err(AuthError::Repository(_))));
        assert!(repo.find_user_by_username("kamek").await.unwrap().is_none());

        repo.fail_credential_writes(false);
        let u = svc.register(reg("kamek", "Magikoopa1")).await.unwrap();
        assert!(repo.get_credentials(u.id).await.unwrap().is_some());
        svc.login(LoginInput { username: "kamek".into(), password: "Magikoopa1".into() }).await.unwrap();
    }

    #[tokio::test]
    async fn login_failures_are_unauthorized() {
        let (repo, svc) = svc();
        svc.register(reg("dk", "Banana1234")).await.unwrap();
        let wrong = svc.login(LoginInput { username: "dk".into(), password: "nope-nope".into() }).await;
        assert!(matches!(wrong, Err(AuthError::Unauthorized)));
        let unknown = svc.login(LoginInput { username: "diddy".into(), password: "Banana1234".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));
        repo.set_active("dk", false);
        let inactive = svc.login(LoginInput { username: "dk".into(), password: "Banana1234".into() }).await;
        assert!(matches!(inactive, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn tokens_for_inactive_or_foreign_secret_rejected() {
        let (repo, svc) = svc();
        let u = svc.register(reg("rosalina", "Lumas1234")).await.unwrap();
        let foreign = issue_token("other-secret", &u, 1).unwrap();
        assert!(matches!(svc.authenticate(&foreign).await, Err(AuthError::TokenError(_))));

        let token = issue_token("test-secret", &u, 1).unwrap();
        repo.set_active("rosalina", false);
        assert!(matches!(svc.authenticate(&token).await, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn expired_token_fails_decode() {
        let u = AuthUser { id: 1, username: "old".into(), first_name: String::new(), last_name: String::new(), is_active: true };
        let token = issue_token("s", &u, -2).unwrap();
        assert!(decode_token("s", &token).is_err());
        let fresh = issue_token("s", &u, 2).unwrap();
        let claims = decode_token("s", &fresh).unwrap();
        assert_eq!(claims.sub, "old");
        assert_eq!(claims.uid, 1);
    }
}
