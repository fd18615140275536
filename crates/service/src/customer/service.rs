use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use models::customer::{Customer, CustomerChanges};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, info, instrument, warn};

use super::domain::CustomerInput;
use super::errors::CustomerError;
use super::mailer::{Mailer, OutgoingMail};
use super::repository::CustomerRepository;

/// Deadline applied to every operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_BYTES: usize = 32;

/// Current time at the millisecond precision BSON dates store.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Customer service configuration
#[derive(Clone, Debug)]
pub struct CustomerConfig {
    /// Base URL used to build verification links, without trailing slash.
    pub app_url: String,
    pub timeout: Duration,
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self { app_url: "http://localhost:8080".into(), timeout: DEFAULT_TIMEOUT }
    }
}

/// Customer business service independent of web framework
pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
    mailer: Arc<dyn Mailer>,
    cfg: CustomerConfig,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomerRepository>, mailer: Arc<dyn Mailer>, cfg: CustomerConfig) -> Self {
        Self { repo, mailer, cfg }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CustomerError>
    where
        F: Future<Output = Result<T, CustomerError>>,
    {
        tokio::time::timeout(self.cfg.timeout, fut)
            .await
            .map_err(|_| CustomerError::Timeout(self.cfg.timeout))?
    }

    #[instrument(skip(self))]
    pub async fn get_customers(&self) -> Result<Vec<Customer>, CustomerError> {
        self.bounded(async move { Ok::<_, CustomerError>(self.repo.find_all().await?) }).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerError> {
        let email = email.trim().to_ascii_lowercase();
        self.bounded(async move { Ok::<_, CustomerError>(self.repo.find_by_email(&email).await?) }).await
    }

    /// Register a new customer with a hashed password and a pending
    /// verification token, then mail the verification link.
    ///
    /// # Examples
    /// ```
    /// use service::customer::{
    ///     domain::CustomerInput, mailer::mock::RecordingMailer,
    ///     repository::mock::MockCustomerRepository, CustomerConfig, CustomerService,
    /// };
    /// use std::sync::Arc;
    /// let svc = CustomerService::new(
    ///     Arc::new(MockCustomerRepository::default()),
    ///     Arc::new(RecordingMailer::default()),
    ///     CustomerConfig::default(),
    /// );
    /// let input = CustomerInput {
    ///     email: "ann@example.com".into(),
    ///     username: "ann".into(),
    ///     password: "secret".into(),
    ///     ..Default::default()
    /// };
    /// let customer = tokio_test::block_on(svc.create_customer(input)).unwrap();
    /// assert_eq!(customer.email, "ann@example.com");
    /// assert_ne!(customer.password, "secret");
    /// assert!(!customer.is_verified);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(&self, input: CustomerInput) -> Result<Customer, CustomerError> {
        let input = input.normalized();
        input.validate()?;

        let customer = self
            .bounded(async move {
                let password = hash_password(input.password.clone()).await?;
                let stamp = now();
                let customer = Customer {
                    id: ObjectId::new(),
                    first_name: input.first_name,
                    last_name: input.last_name,
                    age: input.age,
                    email: input.email,
                    username: input.username,
                    password,
                    is_verified: false,
                    verification_token: Some(generate_token()),
                    created_at: stamp,
                    updated_at: stamp,
                };
                self.repo.save(&customer).await?;
                Ok::<_, CustomerError>(customer)
            })
            .await?;
        info!(customer_id = %customer.id, "customer_created");

        self.send_verification_email(&customer).await;
        Ok(customer)
    }

    /// Replace every mutable field of the customer identified by `id`.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn update_customer(&self, id: &str, input: CustomerInput) -> Result<Customer, CustomerError> {
        let oid = ObjectId::parse_str(id).map_err(|_| CustomerError::InvalidId(id.to_string()))?;
        let input = input.normalized();
        input.validate()?;

        let updated = self
            .bounded(async move {
                let changes = CustomerChanges {
                    first_name: input.first_name,
                    last_name: input.last_name,
                    age: input.age,
                    email: input.email,
                    username: input.username,
                    password: hash_password(input.password).await?,
                    updated_at: now(),
                };
                Ok::<_, CustomerError>(self.repo.update(oid, &changes).await?)
            })
            .await?;
        info!(customer_id = %updated.id, "customer_updated");
        Ok(updated)
    }

    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<Customer, CustomerError> {
        if token.trim().is_empty() {
            return Err(CustomerError::Validation("token is required".into()));
        }
        let verified = self
            .bounded(async move {
                self.repo.verify_email(token, now()).await.map_err(|e| match CustomerError::from(e) {
                    CustomerError::NotFound => CustomerError::InvalidToken,
                    other => other,
                })
            })
            .await?;
        info!(customer_id = %verified.id, "customer_email_verified");
        Ok(verified)
    }

    /// The record is already persisted; a failed dispatch leaves it unverified
    /// with its token intact and is only logged.
    async fn send_verification_email(&self, customer: &Customer) {
        let Some(token) = customer.verification_token.as_deref() else { return };
        let link = format!("{}/verify-email?token={}", self.cfg.app_url, token);
        let mail = OutgoingMail::verification(&customer.email, &link);
        match tokio::time::timeout(self.cfg.timeout, self.mailer.send(mail)).await {
            Ok(Ok(())) => debug!(customer_id = %customer.id, "verification_email_sent"),
            Ok(Err(e)) => warn!(customer_id = %customer.id, error = %e, "verification_email_failed"),
            Err(_) => warn!(customer_id = %customer.id, "verification_email_timed_out"),
        }
    }
}

/// 32 bytes from the OS CSPRNG, URL-safe base64 with padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// Argon2 with library-default parameters; runs off the async workers.
pub async fn hash_password(password: String) -> Result<String, CustomerError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CustomerError::HashError(e.to_string()))
    })
    .await
    .map_err(|e| CustomerError::HashError(e.to_string()))?
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, CustomerError> {
    let parsed = PasswordHash::new(hash).map_err(|e| CustomerError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
