use chrono::{DateTime, Utc};
use models::customer::Customer;
use serde::{Deserialize, Serialize};

use super::errors::CustomerError;

/// Create/update input. Every field replaces the stored value; `id` and
/// timestamps are never taken from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CustomerInput {
    /// Trim text fields and lowercase the email so the unique index compares
    /// addresses case-insensitively.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_ascii_lowercase();
        self.username = self.username.trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<(), CustomerError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(CustomerError::Validation("email is required".into()));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(CustomerError::Validation("invalid email".into())),
        }
        if self.password.is_empty() {
            return Err(CustomerError::Validation("password is required".into()));
        }
        if self.username.trim().is_empty() {
            return Err(CustomerError::Validation("username is required".into()));
        }
        if matches!(self.age, Some(age) if age < 0) {
            return Err(CustomerError::Validation("age must not be negative".into()));
        }
        Ok(())
    }
}

/// Public view of a customer. Never carries the password hash nor the
/// pending verification token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub email: String,
    pub username: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerView {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id.to_hex(),
            first_name: c.first_name,
            last_name: c.last_name,
            age: c.age,
            email: c.email,
            username: c.username,
            is_verified: c.is_verified,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
