//! Read-write transactions.

use std::collections::HashMap;

use async_trait::async_trait;
use dgraph_proto::{Mutation, Request as ApiRequest};
use tracing::{debug, warn};

use super::base::TxnCore;
use super::guard::DiscardGuard;
use super::{Queryable, Response, TransactionState, TxnContext};
use crate::client::Client;
use crate::dispatch::CallOptions;
use crate::error::{ClientError, ClientResult};

/// A read-write transaction.
///
/// Queries and mutations run under one start timestamp until the transaction
/// is committed or discarded. A handle dropped while still OK is discarded in
/// the background.
pub struct Transaction {
    core: TxnCore,
    /// Set by the first `do_request` that reaches the server.
    has_mutated: bool,
    guard: DiscardGuard,
}

impl Transaction {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            core: TxnCore::new(client, false, false),
            has_mutated: false,
            guard: DiscardGuard::new(),
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.core.state
    }

    /// Returns the accumulated server context.
    pub fn context(&self) -> &TxnContext {
        &self.core.context
    }

    /// Returns true once a request has been sent through `do_request`.
    pub fn has_mutated(&self) -> bool {
        self.has_mutated
    }

    /// Runs a query and/or mutations in this transaction.
    ///
    /// A request with no query text and no mutations returns an empty
    /// response without contacting the server. Local errors, such as invalid
    /// metadata, leave the transaction untouched. If the RPC fails the
    /// transaction is discarded and moves to [`TransactionState::Error`]. If
    /// the server's context cannot be merged the call fails with
    /// [`ClientError::Incomplete`], which still carries the response.
    pub async fn do_request(
        &mut self,
        mut request: ApiRequest,
        options: CallOptions,
    ) -> ClientResult<Response> {
        if request.query.trim().is_empty() && request.mutations.is_empty() {
            return Ok(Response::default());
        }

        self.core.ensure_ok()?;

        self.core.prepare(&mut request);
        let commit_now = request.commit_now;
        let call = self.core.build(request, options)?;

        // Any request may touch server-side conflict tracking.
        self.has_mutated = true;

        let response = match self.core.send(call).await {
            Ok(response) => response,
            Err(err) => {
                if let Err(discard_err) = self.discard(CallOptions::default()).await {
                    debug!(error = %discard_err, "implicit discard failed");
                }
                self.core.state = TransactionState::Error;
                return Err(err);
            }
        };

        if commit_now {
            self.core.state = TransactionState::Committed;
        }

        if let Err(err) = self.core.context.merge(response.txn()) {
            return Err(ClientError::Incomplete {
                response: Box::new(response),
                source: Box::new(err),
            });
        }

        Ok(response)
    }

    /// Runs a single mutation. The request commits immediately when the
    /// mutation has `commit_now` set.
    pub async fn mutate(
        &mut self,
        mutation: Mutation,
        options: CallOptions,
    ) -> ClientResult<Response> {
        let request = ApiRequest {
            commit_now: mutation.commit_now,
            mutations: vec![mutation],
            ..Default::default()
        };
        self.do_request(request, options).await
    }

    /// Commits the transaction.
    ///
    /// The state becomes [`TransactionState::Committed`] before the RPC is
    /// sent and stays there even if the RPC fails. The reply is merged into
    /// the context like any other response. A transaction that never sent a
    /// request commits without contacting the server.
    pub async fn commit(&mut self, options: CallOptions) -> ClientResult<()> {
        self.core.ensure_ok()?;

        self.core.state = TransactionState::Committed;

        if !self.has_mutated {
            return Ok(());
        }

        let reply = self.core.commit_or_abort(options).await?;
        self.core.context.merge(Some(&reply))
    }

    /// Aborts the transaction. Calling this on a finished transaction is a
    /// no-op that succeeds.
    pub async fn discard(&mut self, options: CallOptions) -> ClientResult<()> {
        if self.core.state != TransactionState::Ok {
            return Ok(());
        }

        self.core.state = TransactionState::Aborted;

        if !self.has_mutated {
            return Ok(());
        }

        self.core.context.mark_aborted();
        self.core.commit_or_abort(options).await.map(|_| ())
    }

    /// Abandons the transaction without waiting.
    ///
    /// If it is still OK it moves to [`TransactionState::Aborted`] and, when
    /// the server has seen it, an abort is sent from a detached task. Only
    /// the first call has any effect; dropping the handle calls this too.
    pub fn release(&mut self) {
        if self.core.state != TransactionState::Ok || !self.guard.arm() {
            return;
        }

        self.core.state = TransactionState::Aborted;

        if !self.has_mutated {
            return;
        }

        self.core.context.mark_aborted();
        let context = self.core.context.to_proto();
        let client = self.core.client.clone();
        let start_ts = context.start_ts;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match client.commit_or_abort(context, CallOptions::default()).await {
                        Ok(_) => debug!(start_ts, "released transaction discarded"),
                        Err(err) => debug!(start_ts, error = %err, "background discard failed"),
                    }
                });
            }
            Err(_) => {
                warn!(
                    start_ts,
                    "transaction released outside a tokio runtime, not discarded"
                );
            }
        }
    }
}

#[async_trait]
impl Queryable for Transaction {
    fn state(&self) -> TransactionState {
        self.core.state
    }

    fn context(&self) -> &TxnContext {
        &self.core.context
    }

    async fn query_with_vars(
        &mut self,
        query: &str,
        vars: HashMap<String, String>,
        options: CallOptions,
    ) -> ClientResult<Response> {
        self.core.query_with_vars(query, vars, options).await
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.core.state)
            .field("start_ts", &self.core.context.start_ts())
            .field("has_mutated", &self.has_mutated)
            .field("released", &self.guard.is_released())
            .finish()
    }
}
