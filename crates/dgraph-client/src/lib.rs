//! # dgraph-client
//!
//! Client library for the Dgraph graph database.
//!
//! The heart of the crate is the client-side transaction coordinator: it
//! tracks a transaction's start timestamp, accumulates the conflict keys and
//! predicates returned by the server, and only lets queries, mutations,
//! commits and discards through when the transaction's state allows them.
//! It includes:
//!
//! - **Dispatch**: round-robin execution over a fixed pool of gRPC channels
//! - **Transactions**: read-write transactions with optimistic concurrency
//! - **Read-only queries**: with optional best-effort timestamps
//! - **Cleanup**: abandoned transactions are discarded in the background
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dgraph_client::{CallOptions, Client, ClientConfig, MutationBuilder, Queryable};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect(ClientConfig::new().endpoint("http://localhost:9080")).await?;
//!
//!     // Read-write transaction
//!     let mut txn = client.new_transaction()?;
//!     let mutation = MutationBuilder::new()
//!         .set_json(r#"{"name": "Alice"}"#)
//!         .build();
//!     txn.mutate(mutation, CallOptions::default()).await?;
//!     txn.commit(CallOptions::default()).await?;
//!
//!     // Read-only query
//!     let mut ro = client.new_read_only_transaction(false)?;
//!     let response = ro.query("{ q(func: has(name)) { name } }").await?;
//!     println!("{}", response.json_str()?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Retrying conflicts
//!
//! A commit that loses an optimistic-concurrency race fails with a transport
//! error whose [`ClientError::is_aborted`] is true. Start a new transaction
//! and run it again.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// Client facade and configuration.
pub mod client;

/// Round-robin RPC dispatch.
pub mod dispatch;

/// RPC abstraction.
pub mod rpc;

/// Request builders.
pub mod request;

/// Transactions.
pub mod transaction;

// Re-exports
pub use client::{Client, ClientConfig};
pub use dispatch::{CallOptions, Dispatcher};
pub use error::{ClientError, ClientResult};
pub use request::{MutationBuilder, RequestBuilder};
pub use rpc::DgraphRpc;
pub use transaction::{
    Queryable, ReadOnlyTxn, Response, Transaction, TransactionExt, TransactionState, TxnContext,
};

/// Wire types, re-exported for building requests and operations.
pub use dgraph_proto as api;
