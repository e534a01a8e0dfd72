//! Dgraph gRPC Protocol Definitions
//!
//! This crate provides the message types and a unary gRPC client for the
//! `api.Dgraph` service spoken by Dgraph alpha nodes.
//!
//! # Overview
//!
//! The protocol defines:
//! - Login into a namespace
//! - Query and mutation execution (a single `Query` RPC carries both)
//! - Schema alteration
//! - Transaction commit or abort
//! - Server version check
//!
//! # Example
//!
//! ```ignore
//! use dgraph_proto::DgraphClient;
//! use dgraph_proto::Request;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = DgraphClient::connect("http://localhost:9080").await?;
//!
//!     let request = Request {
//!         query: "{ q(func: has(name)) { name } }".to_string(),
//!         read_only: true,
//!         ..Default::default()
//!     };
//!
//!     let response = client.query(request).await?;
//!     println!("Result: {:?}", response);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

/// Protobuf message types and the gRPC client for the `api` package.
#[allow(missing_docs)]
#[allow(clippy::derive_partial_eq_without_eq)]
pub mod proto;

// Re-export commonly used types
pub use proto::*;

// Re-export client types
pub use proto::dgraph_client::DgraphClient;
