/// Chlu Query - read-only HTTP gateway for Chlu review records
///
/// Serves immutable review records by multihash and DID documents plus the
/// reviews written by or about a DID, on top of a pluggable storage
/// collaborator.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod identifier;
pub mod metrics;
pub mod resolution;
pub mod server;
pub mod shaper;
pub mod store;
pub mod validation;

pub use context::AppContext;
