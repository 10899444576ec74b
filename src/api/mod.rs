//! Backend REST boundary: credential exchange and the authenticated client.
//!
//! All business calls carry a JWT bearer token and go through
//! `AuthenticatedClient`, which owns the renew-once-retry-once policy.

pub mod client;
pub mod credentials;

pub use client::{ApiRequest, AuthenticatedClient, Backend, HttpResponse, Method, ReqwestBackend};
pub use credentials::{CredentialExchange, Grant, HttpCredentialStore, Renewal};
