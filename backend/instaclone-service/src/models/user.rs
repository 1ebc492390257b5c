use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::Gender;
use crate::error::Result;
use crate::validators;

/// User row
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub family_name: String,
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Given, middle and family names joined by single spaces
    pub fn full_name(&self) -> String {
        [
            Some(self.given_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.family_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn default_gender() -> Option<Gender> {
    Some(Gender::Male)
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UserCreate {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    #[schema(example = "jdoe")]
    pub username: String,

    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "jdoe@example.com")]
    pub email: String,

    /// 8-14 characters with upper, lower, digit and one of `#?!@$%^&*-`
    #[schema(example = "Hunter2!pass")]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub given_name: String,

    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    #[serde(default)]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub family_name: String,

    #[serde(default = "default_gender")]
    pub gender: Option<Gender>,

    #[serde(default)]
    pub birthdate: Option<NaiveDate>,

    #[serde(default)]
    #[schema(example = "+1 555-123-4567")]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub country: Option<String>,
}

impl UserCreate {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        validators::validate_password(&self.password)?;
        if let Some(phone) = &self.phone_number {
            validators::validate_phone_number(phone)?;
        }
        if let Some(birthdate) = self.birthdate {
            validators::validate_past_date(birthdate)?;
        }
        Ok(())
    }
}

/// Partial profile update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,

    pub password: Option<String>,

    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl UserUpdate {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if let Some(password) = &self.password {
            validators::validate_password(password)?;
        }
        if let Some(phone) = &self.phone_number {
            validators::validate_phone_number(phone)?;
        }
        Ok(())
    }
}

/// Insert values for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub family_name: String,
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl NewUser {
    pub fn from_create(payload: UserCreate, password_hash: String) -> Self {
        Self {
            username: payload.username,
            email: payload.email,
            password_hash,
            given_name: payload.given_name,
            middle_name: payload.middle_name,
            family_name: payload.family_name,
            gender: payload.gender,
            birthdate: payload.birthdate,
            phone_number: payload.phone_number,
            address: payload.address,
            city: payload.city,
            state: payload.state,
            country: payload.country,
        }
    }
}

/// Column changes for an update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Public view of another user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserDisplay {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<User> for UserDisplay {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Full profile of the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserMe {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub family_name: String,
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserMe {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            given_name: user.given_name,
            middle_name: user.middle_name,
            family_name: user.family_name,
            gender: user.gender,
            birthdate: user.birthdate,
            phone_number: user.phone_number,
            address: user.address,
            city: user.city,
            state: user.state,
            country: user.country,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;

    pub(crate) fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            given_name: "John".into(),
            middle_name: Some("Quincy".into()),
            family_name: "Doe".into(),
            gender: Some(Gender::Male),
            birthdate: NaiveDate::from_ymd_opt(1991, 2, 3),
            phone_number: Some("+1 555-123-4567".into()),
            address: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            state: None,
            country: Some("US".into()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn sample_create() -> UserCreate {
        serde_json::from_value(serde_json::json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "Hunter2!pass",
            "given_name": "John",
            "family_name": "Doe"
        }))
        .unwrap()
    }

    #[test]
    fn create_defaults_gender_to_male() {
        let payload = sample_create();
        assert_eq!(payload.gender, Some(Gender::Male));
        assert!(payload.check().is_ok());
    }

    #[test]
    fn create_rejects_bad_email_and_password() {
        let mut payload = sample_create();
        payload.email = "not-an-email".into();
        assert!(matches!(payload.check(), Err(AppError::Validation(_))));

        let mut payload = sample_create();
        payload.password = "weakpass".into();
        assert!(matches!(payload.check(), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_rejects_future_birthdate_and_bad_phone() {
        let mut payload = sample_create();
        payload.birthdate = Some(Utc::now().date_naive() + chrono::Duration::days(1));
        assert!(payload.check().is_err());

        let mut payload = sample_create();
        payload.phone_number = Some("12345".into());
        assert!(payload.check().is_err());
    }

    #[test]
    fn create_rejects_long_names() {
        let mut payload = sample_create();
        payload.username = "x".repeat(51);
        assert!(payload.check().is_err());

        let mut payload = sample_create();
        payload.middle_name = Some("m".repeat(51));
        assert!(payload.check().is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UserUpdate::default().check().is_ok());

        let update = UserUpdate {
            password: Some("short".into()),
            ..UserUpdate::default()
        };
        assert!(update.check().is_err());
    }

    #[test]
    fn full_name_skips_missing_middle_name() {
        let mut user = sample_user();
        assert_eq!(user.full_name(), "John Quincy Doe");

        user.middle_name = None;
        assert_eq!(user.full_name(), "John Doe");
    }

    #[test]
    fn display_hides_private_fields() {
        let user = sample_user();
        let json = serde_json::to_value(UserDisplay::from(&user)).unwrap();
        assert_eq!(json["username"], "jdoe");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("phone_number").is_none());
    }
}
