//! Client-side copy of a transaction's server context.

use std::collections::BTreeSet;

use dgraph_proto::{Request as ApiRequest, TxnContext as ApiTxnContext};

use crate::error::{ClientError, ClientResult};

/// Timestamp, optimistic-lock hash and conflict sets of one transaction.
///
/// A zero `start_ts` means the server has not assigned one yet. Keys and
/// predicates only ever grow over the lifetime of the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxnContext {
    start_ts: u64,
    hash: String,
    keys: BTreeSet<String>,
    preds: BTreeSet<String>,
    aborted: bool,
}

impl TxnContext {
    /// Creates an unassigned context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timestamp, or 0 if unassigned.
    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    /// Latest hash reported by the server.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Accumulated conflict keys.
    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// Accumulated predicates.
    pub fn preds(&self) -> &BTreeSet<String> {
        &self.preds
    }

    /// True once a discard has been issued for this context.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    /// Folds a server-returned context into this one.
    ///
    /// A missing context is accepted as is. The first non-empty context fixes
    /// the start timestamp; any later one must agree with it, otherwise the
    /// merge fails with [`ClientError::StartTsMismatch`] and nothing else is
    /// updated. On success the hash is replaced and keys/preds are unioned.
    pub fn merge(&mut self, incoming: Option<&ApiTxnContext>) -> ClientResult<()> {
        let Some(incoming) = incoming else {
            return Ok(());
        };

        if self.start_ts == 0 {
            self.start_ts = incoming.start_ts;
        }

        if self.start_ts != incoming.start_ts {
            return Err(ClientError::StartTsMismatch {
                local: self.start_ts,
                incoming: incoming.start_ts,
            });
        }

        self.hash.clone_from(&incoming.hash);
        self.keys.extend(incoming.keys.iter().cloned());
        self.preds.extend(incoming.preds.iter().cloned());

        Ok(())
    }

    /// Copies the timestamp and hash onto an outgoing request.
    pub(crate) fn stamp(&self, request: &mut ApiRequest) {
        request.start_ts = self.start_ts;
        request.hash.clone_from(&self.hash);
    }

    /// Wire form sent with `CommitOrAbort`.
    pub fn to_proto(&self) -> ApiTxnContext {
        ApiTxnContext {
            start_ts: self.start_ts,
            commit_ts: 0,
            aborted: self.aborted,
            keys: self.keys.iter().cloned().collect(),
            preds: self.preds.iter().cloned().collect(),
            hash: self.hash.clone(),
        }
    }
}
