use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{users, UserLookup};
use crate::error::{AppError, Result};
use crate::middleware::permissions::check_account_ownership;
use crate::models::{NewUser, User, UserChanges, UserCreate, UserUpdate};
use crate::security::hash_password;

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: UserCreate) -> Result<User> {
        payload.check()?;
        let password_hash = hash_password(&payload.password)?;

        let user = users::insert_user(&self.pool, &NewUser::from_create(payload, password_hash))
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn find(&self, lookup: UserLookup<'_>) -> Result<Option<User>> {
        users::find_user(&self.pool, lookup).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.find(UserLookup::ById(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with ID {id} not found in the system.")))
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = users::list_users(&self.pool).await?;
        if users.is_empty() {
            return Err(AppError::NotFound("Users not found in the system.".to_string()));
        }
        Ok(users)
    }

    /// Apply a partial update to the caller's own account.
    pub async fn update(&self, actor: &User, id: Uuid, payload: UserUpdate) -> Result<User> {
        check_account_ownership(actor.id, id)?;
        payload.check()?;

        let password_hash = payload.password.as_deref().map(hash_password).transpose()?;
        let changes = UserChanges {
            username: payload.username,
            email: payload.email,
            password_hash,
            phone_number: payload.phone_number,
            address: payload.address,
            city: payload.city,
            state: payload.state,
            country: payload.country,
        };

        let user = users::update_user(&self.pool, id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found in the system.".to_string()))?;

        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    /// Delete the caller's own account; `Ok(false)` if nothing was removed.
    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<bool> {
        check_account_ownership(actor.id, id)?;

        let deleted = users::delete_user(&self.pool, id).await?;
        if deleted {
            info!(user_id = %id, "user deleted");
        }
        Ok(deleted)
    }
}
