//! Async client for the CloudVision Portal controller web API.
//!
//! [`CvpClient`] speaks the controller's `/web/*.do` endpoints with a
//! cookie-based session. Endpoint groups live in their own modules as
//! inherent methods; every call returns typed wire models from [`models`]
//! or an [`Error`] carrying the controller's numeric error code.

pub mod auth;
pub mod client;
pub mod codes;
pub mod configlets;
pub mod error;
pub mod images;
pub mod inventory;
pub mod models;
pub mod roles;
pub mod tasks;
pub mod topology;
pub mod transport;

pub use client::CvpClient;
pub use error::Error;
pub use topology::ConfigletRefs;
pub use transport::{TlsMode, TransportConfig};
