//! IP feature surface: local addresses, access lists, and pool policy.

pub mod state;

pub use state::{PolicyDraft, build_local_ip_request, normalize_access_ip};
