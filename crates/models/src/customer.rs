use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer document as persisted in the store.
///
/// `password` always holds a PHC-formatted hash. `verification_token` is
/// present only while the email address is still unverified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Replacement values for every mutable field of a customer.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerChanges {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub username: String,
    pub password: String,
    pub updated_at: DateTime<Utc>,
}

impl CustomerChanges {
    /// Update document replacing all mutable fields.
    /// `_id`, `created_at` and the verification state are left untouched.
    pub fn to_update_document(&self) -> Document {
        let mut set = doc! {
            "first_name": self.first_name.as_str(),
            "last_name": self.last_name.as_str(),
            "email": self.email.as_str(),
            "username": self.username.as_str(),
            "password": self.password.as_str(),
            "updated_at": bson::DateTime::from_chrono(self.updated_at),
        };
        match self.age {
            Some(age) => {
                set.insert("age", age);
                doc! { "$set": set }
            }
            None => doc! { "$set": set, "$unset": { "age": "" } },
        }
    }

    /// Apply the changes to an in-memory document.
    pub fn apply_to(&self, customer: &mut Customer) {
        customer.first_name = self.first_name.clone();
        customer.last_name = self.last_name.clone();
        customer.age = self.age;
        customer.email = self.email.clone();
        customer.username = self.username.clone();
        customer.password = self.password.clone();
        customer.updated_at = self.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    fn changes(age: Option<i32>) -> CustomerChanges {
        CustomerChanges {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            age,
            email: "a@x.com".into(),
            username: "ann".into(),
            password: "$argon2id$hash".into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn update_document_never_touches_identity_or_creation_time() {
        let update = changes(Some(30)).to_update_document();
        let set = update.get_document("$set").expect("$set");
        assert!(!set.contains_key("_id"));
        assert!(!set.contains_key("created_at"));
        assert!(!set.contains_key("is_verified"));
        assert_eq!(set.get_i32("age").expect("age"), 30);
        assert!(!update.contains_key("$unset"));
    }

    #[test]
    fn missing_age_is_unset() {
        let update = changes(None).to_update_document();
        let unset = update.get_document("$unset").expect("$unset");
        assert!(unset.contains_key("age"));
    }

    #[test]
    fn stored_document_omits_absent_token() {
        let now = Utc::now().trunc_subsecs(3);
        let c = Customer {
            id: ObjectId::new(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            age: None,
            email: "a@x.com".into(),
            username: "ann".into(),
            password: "h".into(),
            is_verified: true,
            verification_token: None,
            created_at: now,
            updated_at: now,
        };
        let d = bson::to_document(&c).expect("to bson");
        assert!(d.get_object_id("_id").is_ok());
        assert!(!d.contains_key("verification_token"));
        assert!(d.get_datetime("created_at").is_ok());
        let back: Customer = bson::from_document(d).expect("from bson");
        assert_eq!(back, c);
    }
}
