//! Read-only query handles.

use std::collections::HashMap;

use async_trait::async_trait;

use super::base::TxnCore;
use super::{Queryable, Response, TransactionState, TxnContext};
use crate::client::Client;
use crate::dispatch::CallOptions;
use crate::error::ClientResult;

/// A read-only transaction.
///
/// Every query is sent with `read_only` set. Repeated queries on one handle
/// share the start timestamp the server assigned to the first. With
/// `best_effort` the server may answer from a slightly stale timestamp.
/// There is nothing to commit or discard.
#[derive(Debug)]
pub struct ReadOnlyTxn {
    core: TxnCore,
}

impl ReadOnlyTxn {
    pub(crate) fn new(client: Client, best_effort: bool) -> Self {
        Self {
            core: TxnCore::new(client, true, best_effort),
        }
    }

    /// Returns true if queries are sent as best-effort reads.
    pub fn is_best_effort(&self) -> bool {
        self.core.best_effort()
    }
}

#[async_trait]
impl Queryable for ReadOnlyTxn {
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::ClientConfig;
    use crate::error::ClientError;
    use crate::rpc::mock::MockDgraph;
    use crate::rpc::DgraphRpc;

    fn setup() -> (Arc<MockDgraph>, Client) {
        let mock = Arc::new(MockDgraph::new());
        let client = Client::from_channels(
            vec![Arc::clone(&mock) as Arc<dyn DgraphRpc>],
            ClientConfig::default(),
        )
        .unwrap();
        (mock, client)
    }

    #[tokio::test]
    async fn test_read_only_flags() {
        let (mock, client) = setup();
        let mut txn = client.new_read_only_transaction(true).unwrap();
        assert!(txn.is_best_effort());

        txn.query("{ q(func: has(name)) { name } }").await.unwrap();

        let queries = mock.queries.lock();
        assert!(queries[0].read_only);
        assert!(queries[0].best_effort);
        assert!(queries[0].mutations.is_empty());
    }

    #[tokio::test]
    async fn test_reuses_start_ts() {
        let (mock, client) = setup();
        mock.push_query_ctx(20, "h1", &[], &[]);
        mock.push_query_ctx(20, "h2", &[], &[]);
        let mut txn = client.new_read_only_transaction(false).unwrap();

        txn.query("{ a }").await.unwrap();
        txn.query("{ b }").await.unwrap();

        assert_eq!(txn.context().start_ts(), 20);
        assert_eq!(txn.context().hash(), "h2");
        let queries = mock.queries.lock();
        assert_eq!(queries[1].start_ts, 20);
        assert_eq!(queries[1].hash, "h1");
        assert!(!queries[1].best_effort);
    }

    #[tokio::test]
    async fn test_mismatch_returns_error_only() {
        let (mock, client) = setup();
        mock.push_query_ctx(20, "h1", &[], &[]);
        mock.push_query_ctx(21, "h2", &[], &[]);
        let mut txn = client.new_read_only_transaction(false).unwrap();

        txn.query("{ a }").await.unwrap();
        let err = txn.query("{ b }").await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::StartTsMismatch {
                local: 20,
                incoming: 21
            }
        ));
        assert!(err.response().is_none());
        assert_eq!(txn.state(), TransactionState::Ok);
    }

    #[tokio::test]
    async fn test_closed_client_rejects_queries() {
        let (mock, client) = setup();
        let mut txn = client.new_read_only_transaction(false).unwrap();
        client.close();

        let err = txn.query("{ a }").await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyDisposed));
        assert_eq!(mock.query_count(), 0);

        assert!(matches!(
            client.new_read_only_transaction(false).unwrap_err(),
            ClientError::AlreadyDisposed
        ));
    }
}
