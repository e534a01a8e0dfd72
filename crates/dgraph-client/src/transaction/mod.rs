//! Transactions and read-only query handles.
//!
//! Both handle types share one state machine:
//!
//! ```text
//!                 ┌────┐
//!   new_*() ─────▶│ OK │
//!                 └────┘
//!        commit()   │  discard() / release()   failed do_request()
//!       ┌───────────┼──────────────────┬───────────────┐
//!       ▼           │                  ▼               ▼
//! ┌───────────┐     │            ┌─────────┐      ┌─────────┐
//! │ Committed │     │            │ Aborted │      │  Error  │
//! └───────────┘     │            └─────────┘      └─────────┘
//! ```
//!
//! Every terminal state rejects queries, mutations and commits with
//! [`ClientError::TransactionNotOk`](crate::ClientError::TransactionNotOk);
//! discarding a finished transaction is a successful no-op.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::client::Client;
use crate::dispatch::CallOptions;
use crate::error::{ClientError, ClientResult};

mod base;
mod context;
mod guard;
mod read_only;
mod read_write;
mod response;

pub use context::TxnContext;
pub use read_only::ReadOnlyTxn;
pub use read_write::Transaction;
pub use response::Response;

/// Lifecycle state of a transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Open; queries, mutations and commit are allowed.
    Ok,
    /// Committed.
    Committed,
    /// Discarded, explicitly or by release.
    Aborted,
    /// A request failed and the transaction was discarded.
    Error,
}

impl TransactionState {
    /// Returns true if operations may still be issued.
    pub fn is_ok(&self) -> bool {
        *self == TransactionState::Ok
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Ok => write!(f, "OK"),
            TransactionState::Committed => write!(f, "Committed"),
            TransactionState::Aborted => write!(f, "Aborted"),
            TransactionState::Error => write!(f, "Error"),
        }
    }
}

/// Query capability shared by read-write and read-only handles.
#[async_trait]
pub trait Queryable: Send {
    /// Returns the lifecycle state.
    fn state(&self) -> TransactionState;

    /// Returns the accumulated server context.
    fn context(&self) -> &TxnContext;

    /// Runs a parameterized query.
    ///
    /// Fails with [`ClientError::TransactionNotOk`] outside the OK state. An
    /// RPC failure is returned as is and leaves the state unchanged.
    async fn query_with_vars(
        &mut self,
        query: &str,
        vars: HashMap<String, String>,
        options: CallOptions,
    ) -> ClientResult<Response>;

    /// Runs a query without variables or call options.
    async fn query(&mut self, query: &str) -> ClientResult<Response> {
        self.query_with_vars(query, HashMap::new(), CallOptions::default())
            .await
    }
}

/// Extension trait for running code in a transaction.
pub trait TransactionExt {
    /// Runs a closure within a transaction.
    ///
    /// If the closure returns Ok, the transaction is committed.
    /// If the closure returns Err, the transaction is discarded.
    fn run_transaction<F, T, E>(&self, f: F) -> impl Future<Output = Result<T, E>>
    where
        F: for<'a> FnOnce(
            &'a mut Transaction,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
        T: Send,
        E: From<ClientError> + Send;
}

impl TransactionExt for Client {
    async fn run_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(
            &'a mut Transaction,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
        T: Send,
        E: From<ClientError> + Send,
    {
        let mut txn = self.new_transaction()?;

        match f(&mut txn).await {
            Ok(result) => {
                txn.commit(CallOptions::default()).await?;
                Ok(result)
            }
            Err(e) => {
                // Try to discard, but keep the caller's error
                let _ = txn.discard(CallOptions::default()).await;
                Err(e)
            }
        }
    }
}
