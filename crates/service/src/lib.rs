//! Service layer providing the customer use cases on top of `models`.
//! - Separates business logic from data access and from HTTP.
//! - Provides clear error types and documented interfaces.

pub mod customer;
