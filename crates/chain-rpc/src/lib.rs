//! JSON-RPC plumbing shared by the chain clients.
//!
//! Chain crates talk to nodes through [`RpcClient`], which wraps any
//! [`RpcTransport`]. Production code uses [`HttpTransport`]; tests plug in
//! the in-memory `MockTransport` (feature `mock`).

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod quantity;
pub mod transport;

pub use client::RpcClient;
pub use error::RpcError;
pub use transport::{HttpTransport, RpcTransport};
