//! Backend interface and Dgraph client for dgraph-mcp.
//!
//! This crate defines the request/response models exchanged with the graph
//! database, the transaction traits the adapter core is written against, and
//! the HTTP implementation that talks to a live Dgraph alpha.

pub mod backend;
pub mod http;
pub mod models;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backend::{BackendError, BackendResult, GraphBackend, GraphTxn};
pub use http::{DgraphHttpConfig, HttpBackend, HttpTxn};
pub use models::*;
