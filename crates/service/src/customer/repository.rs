use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use models::customer::{Customer, CustomerChanges};

use super::errors::RepositoryError;

/// Repository abstraction for customer persistence.
///
/// Uniqueness of `email` and of pending verification tokens is enforced by
/// the store; implementations report violations as
/// [`RepositoryError::DuplicateKey`].
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;
    async fn save(&self, customer: &Customer) -> Result<(), RepositoryError>;
    /// Replace every mutable field of `id` and return the updated record.
    async fn update(&self, id: ObjectId, changes: &CustomerChanges) -> Result<Customer, RepositoryError>;
    /// Mark the holder of `token` verified and consume the token in one step.
    async fn verify_email(&self, token: &str, at: DateTime<Utc>) -> Result<Customer, RepositoryError>;
}

/// Simple in-memory mock repository for tests and doc examples.
///
/// Mirrors the store's unique indexes on `email` and `verification_token`.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCustomerRepository {
        customers: Mutex<Vec<Customer>>,
        unavailable: AtomicBool,
    }

    impl MockCustomerRepository {
        /// Make every subsequent call fail as if the store were down.
        pub fn set_unavailable(&self, down: bool) {
            self.unavailable.store(down, Ordering::SeqCst);
        }

        pub fn snapshot(&self) -> Vec<Customer> {
            self.customers.lock().unwrap().clone()
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(RepositoryError::Unavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CustomerRepository for MockCustomerRepository {
        async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
            self.check()?;
            Ok(self.snapshot())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
            self.check()?;
            let customers = self.customers.lock().unwrap();
            Ok(customers.iter().find(|c| c.email == email).cloned())
        }

        async fn save(&self, customer: &Customer) -> Result<(), RepositoryError> {
            self.check()?;
            let mut customers = self.customers.lock().unwrap();
            let clash = customers.iter().any(|c| {
                c.id == customer.id
                    || c.email == customer.email
                    || (c.verification_token.is_some() && c.verification_token == customer.verification_token)
            });
            if clash {
                return Err(RepositoryError::DuplicateKey);
            }
            customers.push(customer.clone());
            Ok(())
        }

        async fn update(&self, id: ObjectId, changes: &CustomerChanges) -> Result<Customer, RepositoryError> {
            self.check()?;
            let mut customers = self.customers.lock().unwrap();
            let idx = customers.iter().position(|c| c.id == id).ok_or(RepositoryError::NotFound)?;
            if customers.iter().any(|c| c.id != id && c.email == changes.email) {
                return Err(RepositoryError::DuplicateKey);
            }
            let found = &mut customers[idx];
            changes.apply_to(found);
            Ok(found.clone())
        }

        async fn verify_email(&self, token: &str, at: DateTime<Utc>) -> Result<Customer, RepositoryError> {
            self.check()?;
            let mut customers = self.customers.lock().unwrap();
            let found = customers
                .iter_mut()
                .find(|c| c.verification_token.as_deref() == Some(token))
                .ok_or(RepositoryError::NotFound)?;
            found.is_verified = true;
            found.verification_token = None;
            found.updated_at = at;
            Ok(found.clone())
        }
    }
}
