//! State and behaviour shared by read-write and read-only handles.

use std::collections::HashMap;

use dgraph_proto::{Request as ApiRequest, TxnContext as ApiTxnContext};
use tracing::debug;

use super::{Response, TransactionState, TxnContext};
use crate::client::Client;
use crate::dispatch::CallOptions;
use crate::error::{ClientError, ClientResult};

/// State machine core: lifecycle state, server context and the request
/// flags every outgoing request is stamped with.
pub(crate) struct TxnCore {
    pub(crate) client: Client,
    pub(crate) context: TxnContext,
    pub(crate) state: TransactionState,
    read_only: bool,
    best_effort: bool,
}

impl TxnCore {
    pub(crate) fn new(client: Client, read_only: bool, best_effort: bool) -> Self {
        Self {
            client,
            context: TxnContext::new(),
            state: TransactionState::Ok,
            read_only,
            best_effort,
        }
    }

    pub(crate) fn best_effort(&self) -> bool {
        self.best_effort
    }

    pub(crate) fn ensure_ok(&self) -> ClientResult<()> {
        if self.state != TransactionState::Ok {
            return Err(ClientError::TransactionNotOk(self.state));
        }
        Ok(())
    }

    /// Stamps the current context and handle flags onto a request.
    pub(crate) fn prepare(&self, request: &mut ApiRequest) {
        self.context.stamp(request);
        request.read_only = self.read_only;
        request.best_effort = self.best_effort;
    }

    /// Builds the outgoing call. Fails only on local problems such as bad
    /// metadata or a closed client.
    pub(crate) fn build(
        &self,
        request: ApiRequest,
        options: CallOptions,
    ) -> ClientResult<tonic::Request<ApiRequest>> {
        self.client.prepare_query(request, options)
    }

    pub(crate) async fn send(&self, request: tonic::Request<ApiRequest>) -> ClientResult<Response> {
        self.client.send_query(request).await
    }

    /// Runs a query. A failed RPC leaves the state untouched.
    pub(crate) async fn query_with_vars(
        &mut self,
        query: &str,
        vars: HashMap<String, String>,
        options: CallOptions,
    ) -> ClientResult<Response> {
        self.ensure_ok()?;

        let mut request = ApiRequest {
            query: query.to_string(),
            vars,
            ..Default::default()
        };
        self.prepare(&mut request);
        let call = self.build(request, options)?;

        let response = self.send(call).await?;
        self.context.merge(response.txn())?;

        Ok(response)
    }

    /// Sends the current context with `CommitOrAbort` and returns the
    /// server's reply.
    pub(crate) async fn commit_or_abort(&self, options: CallOptions) -> ClientResult<ApiTxnContext> {
        let context = self.context.to_proto();
        let aborted = context.aborted;

        let reply = self.client.commit_or_abort(context, options).await?;
        debug!(
            start_ts = reply.start_ts,
            commit_ts = reply.commit_ts,
            aborted,
            "transaction finished"
        );

        Ok(reply)
    }
}

impl std::fmt::Debug for TxnCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxnCore")
            .field("state", &self.state)
            .field("start_ts", &self.context.start_ts())
            .field("read_only", &self.read_only)
            .field("best_effort", &self.best_effort)
            .finish()
    }
}
