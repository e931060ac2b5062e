//! Seams between the session layer and its collaborators.

mod auth_api;
mod credential_store;

pub use auth_api::AuthApi;
pub use credential_store::CredentialStore;
