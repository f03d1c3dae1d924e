use async_trait::async_trait;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Persistence needed by `AuthService`.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError>;

    /// Insert the user and its password hash together; on error neither is stored.
    async fn create_user_with_password(
        &self,
        username: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: username
        creds: Mutex<HashMap<i32, Credentials>>, // key: user_id
        fail_credentials: AtomicBool,
    }

    impl MockAuthRepository {
        /// Flip `is_active` for an existing user.
        pub fn set_active(&self, username: &str, active: bool) {
            if let Some(u) = self.users.lock().unwrap().get_mut(username) {
                u.is_active = active;
            }
        }

        /// Make the credential write of the next registrations fail.
        pub fn fail_credential_writes(&self, fail: bool) {
            self.fail_credentials.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }

        async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user_with_password(
            &self,
            username: &str,
            first_name: Option<&str>,
            last_name: Option<&str>,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return Err(AuthError::Conflict);
            }
            // 与事务语义一致：凭据写入失败时用户也不落库
            if self.fail_credentials.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("credential write failed".into()));
            }
            let user = AuthUser {
                id: users.len() as i32 + 1,
                username: username.to_string(),
                first_name: first_name.unwrap_or_default().to_string(),
                last_name: last_name.unwrap_or_default().to_string(),
                is_active: true,
            };
            users.insert(username.to_string(), user.clone());
            self.creds.lock().unwrap().insert(
                user.id,
                Credentials { user_id: user.id, password_hash, password_algorithm },
            );
            Ok(user)
        }

        async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }
    }
}
