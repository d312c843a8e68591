//! Core adapter for dgraph-mcp.
//!
//! This crate turns tool and resource invocations into Dgraph transactions:
//! arguments are validated, translated into backend requests, and executed
//! inside exactly one transaction per invocation whose release is guaranteed
//! on every exit path.

pub mod args;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod resources;
pub mod seed;
pub mod translate;
pub mod txn;

pub use control::DgraphControlPlane;
pub use error::{CoreError, CoreResult};
pub use invocation::{ResourceOutput, ToolInvocation, ToolOutput};
