use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ReturnDocument,
    Collection,
};
use tracing::debug;

use models::customer::{Customer, CustomerChanges};

use crate::customer::errors::RepositoryError;
use crate::customer::repository::CustomerRepository;

/// Server error code raised by a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoCustomerRepository {
    collection: Collection<Customer>,
}

impl MongoCustomerRepository {
    pub fn new(collection: Collection<Customer>) -> Self {
        Self { collection }
    }

    /// Create the unique indexes the repository contract relies on.
    pub async fn ensure_indexes(&self) -> Result<(), RepositoryError> {
        models::db::ensure_indexes(&self.collection)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_err(err: MongoError) -> RepositoryError {
    if is_duplicate_key(&err) {
        debug!(error = %err, "unique index violation");
        RepositoryError::DuplicateKey
    } else {
        RepositoryError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl CustomerRepository for MongoCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_err)?;
        cursor.try_collect().await.map_err(map_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(map_err)
    }

    async fn save(&self, customer: &Customer) -> Result<(), RepositoryError> {
        self.collection.insert_one(customer).await.map_err(map_err)?;
        Ok(())
    }

    async fn update(&self, id: ObjectId, changes: &CustomerChanges) -> Result<Customer, RepositoryError> {
        self.collection
            .find_one_and_update(doc! { "_id": id }, changes.to_update_document())
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err)?
            .ok_or(RepositoryError::NotFound)
    }

    async fn verify_email(&self, token: &str, at: DateTime<Utc>) -> Result<Customer, RepositoryError> {
        let update = doc! {
            "$set": { "is_verified": true, "updated_at": bson::DateTime::from_chrono(at) },
            "$unset": { "verification_token": "" },
        };
        self.collection
            .find_one_and_update(doc! { "verification_token": token }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err)?
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    //! Exercised against a live server; set `MONGODB_URI` to run.
    use super::*;
    use configs::DatabaseConfig;

    async fn repo() -> Option<MongoCustomerRepository> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return None;
        }
        let url = std::env::var("MONGODB_URI").ok()?;
        let cfg = DatabaseConfig {
            url,
            collection: format!("customers_test_{}", ObjectId::new().to_hex()),
            connect_timeout_secs: 2,
            ..DatabaseConfig::default()
        };
        let store = match models::db::connect(&cfg).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("skip: cannot connect to mongodb: {}", e);
                return None;
            }
        };
        let repo = MongoCustomerRepository::new(store.customers);
        repo.ensure_indexes().await.expect("indexes");
        Some(repo)
    }

    fn customer(email: &str, token: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: ObjectId::new(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            age: Some(30),
            email: email.into(),
            username: "ann".into(),
            password: "$argon2id$placeholder".into(),
            is_verified: false,
            verification_token: Some(token.into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn unique_email_is_enforced_by_the_store() {
        let Some(repo) = repo().await else { return };
        repo.save(&customer("a@x.com", "t1")).await.expect("first save");
        let err = repo.save(&customer("a@x.com", "t2")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey));
        assert_eq!(repo.find_all().await.expect("list").len(), 1);
        repo.collection.drop().await.expect("drop");
    }

    #[tokio::test]
    async fn verify_consumes_token() {
        let Some(repo) = repo().await else { return };
        let c = customer("b@x.com", "tok");
        repo.save(&c).await.expect("save");

        let verified = repo.verify_email("tok", Utc::now()).await.expect("verify");
        assert!(verified.is_verified);
        assert_eq!(verified.verification_token, None);

        let again = repo.verify_email("tok", Utc::now()).await.unwrap_err();
        assert!(matches!(again, RepositoryError::NotFound));

        let missing = repo
            .update(
                ObjectId::new(),
                &CustomerChanges {
                    first_name: "x".into(),
                    last_name: "y".into(),
                    age: None,
                    email: "z@x.com".into(),
                    username: "z".into(),
                    password: "h".into(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, RepositoryError::NotFound));
        repo.collection.drop().await.expect("drop");
    }
}
