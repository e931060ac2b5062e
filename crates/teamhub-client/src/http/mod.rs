//! HTTP plumbing shared by the auth transport and the gateway.

pub(crate) mod client;
pub(crate) mod endpoints;

pub use client::ApiResponse;
pub(crate) use client::HttpClient;
pub use endpoints::is_auth_endpoint;
