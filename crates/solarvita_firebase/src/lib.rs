//! Firebase integration for SolarVita
//!
//! - [`FirebaseClient`]: FCM HTTP v1 push gateway authenticated with a
//!   service account key
//! - [`FirebaseIdentityVerifier`]: verifies Firebase Auth ID tokens of
//!   callable invocations
//! - [`DryRunGateway`]: logs sends instead of delivering them
//!
//! # Example
//!
//! ```rust,no_run
//! use solarvita_config::FirebaseConfig;
//! use solarvita_firebase::FirebaseClient;
//!
//! fn build_gateway(config: &FirebaseConfig) -> Result<FirebaseClient, Box<dyn std::error::Error>> {
//!     Ok(FirebaseClient::new(config)?)
//! }
//! ```

pub mod auth;
pub mod client;
pub mod dry_run;
pub mod identity;

pub use auth::FcmAuth;
pub use client::{FirebaseClient, FirebaseError};
pub use dry_run::DryRunGateway;
pub use identity::{FirebaseIdentityVerifier, UnconfiguredIdentityVerifier};
