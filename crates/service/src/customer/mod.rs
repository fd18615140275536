//! Customer module: three-layer architecture (domain, repository, service).
//!
//! Centralizes registration, update and email-verification business logic.
//! HTTP concerns live in the `server` crate; persistence lives behind
//! [`repository::CustomerRepository`].

pub mod domain;
pub mod errors;
pub mod mailer;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::{CustomerConfig, CustomerService};
