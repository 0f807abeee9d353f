//! HTTP plumbing: the transport seam and the typed gateway over it.

pub mod gateway;
pub mod transport;

pub use gateway::ApiGateway;
pub use transport::{ApiRequest, HttpMethod, HttpTransport, RawResponse, Transport, TransportError};
