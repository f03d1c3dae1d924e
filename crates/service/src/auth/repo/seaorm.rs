use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};

use models::user::{self, UserChanges};
use models::user_credentials;
use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: user::Model) -> AuthUser {
    AuthUser { id: u.id, username: u.username, first_name: u.first_name, last_name: u.last_name, is_active: u.is_active }
}

fn repo_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Repository(e.to_string())
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_username(&self.db, username).await.map_err(repo_err)?;
        Ok(res.map(to_auth_user))
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id).one(&self.db).await.map_err(repo_err)?;
        Ok(res.map(to_auth_user))
    }

    async fn create_user_with_password(
        &self,
        username: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        let changes = UserChanges {
            username: Some(username.to_string()),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
        };
        // 用户与凭据同一事务写入；任一步失败时 txn 被丢弃并回滚
        let txn = self.db.begin().await.map_err(repo_err)?;
        let created = user::create(&txn, changes).await?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(to_auth_user(created))
    }

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_for_user(&self.db, user_id).await.map_err(repo_err)?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }
}
