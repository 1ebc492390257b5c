use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserChanges};
use sqlx::PgPool;
use uuid::Uuid;

/// How to find a single user
#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    ById(Uuid),
    ByEmail(&'a str),
    ByUsername(&'a str),
}

/// Map a unique violation to the duplicated field and its submitted value.
fn map_unique_violation(err: sqlx::Error, username: Option<&str>, email: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("username") {
                return AppError::Duplicate {
                    field: "username",
                    value: username.unwrap_or_default().to_string(),
                };
            }
            if constraint.contains("email") {
                return AppError::Duplicate {
                    field: "email",
                    value: email.unwrap_or_default().to_string(),
                };
            }
        }
    }
    err.into()
}

pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            id, username, email, password_hash, given_name, middle_name, family_name,
            gender, birthdate, phone_number, address, city, state, country
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.given_name)
    .bind(&user.middle_name)
    .bind(&user.family_name)
    .bind(user.gender)
    .bind(user.birthdate)
    .bind(&user.phone_number)
    .bind(&user.address)
    .bind(&user.city)
    .bind(&user.state)
    .bind(&user.country)
    .fetch_one(pool)
    .await
    .map_err(|e| map_unique_violation(e, Some(&user.username), Some(&user.email)))
}

pub async fn find_user(pool: &PgPool, lookup: UserLookup<'_>) -> Result<Option<User>> {
    let user = match lookup {
        UserLookup::ById(id) => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        UserLookup::ByEmail(email) => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(pool)
                .await?
        }
        UserLookup::ByUsername(username) => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(pool)
                .await?
        }
    };

    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

pub async fn update_user(pool: &PgPool, id: Uuid, changes: &UserChanges) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET username = COALESCE($2, username),
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            phone_number = COALESCE($5, phone_number),
            address = COALESCE($6, address),
            city = COALESCE($7, city),
            state = COALESCE($8, state),
            country = COALESCE($9, country),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&changes.username)
    .bind(&changes.email)
    .bind(&changes.password_hash)
    .bind(&changes.phone_number)
    .bind(&changes.address)
    .bind(&changes.city)
    .bind(&changes.state)
    .bind(&changes.country)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        map_unique_violation(e, changes.username.as_deref(), changes.email.as_deref())
    })
}

pub async fn update_password(pool: &PgPool, email: &str, password_hash: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET password_hash = $2, updated_at = NOW()
        WHERE email = $1
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
