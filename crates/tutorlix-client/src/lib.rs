//! Tutorlix REST client
//!
//! Talks to Django REST list endpoints and exposes them as table list
//! functions.

pub mod client;
pub mod endpoint;
pub mod error;

pub use client::{ClientOptions, RestClient};
pub use endpoint::ListEndpoint;
pub use error::ClientError;
