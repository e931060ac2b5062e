//! teamhub-store - Credential store implementations.
//!
//! [`FileCredentialStore`] keeps the session in a single JSON document on
//! disk; [`MemoryCredentialStore`] keeps it in process memory.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
