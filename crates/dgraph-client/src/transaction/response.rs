//! Query and mutation results.

use std::collections::HashMap;

use dgraph_proto::{Latency, Response as ApiResponse, TxnContext as ApiTxnContext};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

/// The server's reply to a query or mutation, together with the transaction
/// context fragment it carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    inner: ApiResponse,
}

impl Response {
    /// Wraps a raw server response.
    pub fn new(inner: ApiResponse) -> Self {
        Self { inner }
    }

    /// Raw JSON result.
    pub fn json(&self) -> &[u8] {
        &self.inner.json
    }

    /// JSON result as a string.
    pub fn json_str(&self) -> ClientResult<&str> {
        std::str::from_utf8(&self.inner.json)
            .map_err(|e| ClientError::SerializationError(e.to_string()))
    }

    /// Deserializes the JSON result.
    pub fn decode<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.inner.json)
            .map_err(|e| ClientError::SerializationError(e.to_string()))
    }

    /// RDF result, when requested.
    pub fn rdf(&self) -> &[u8] {
        &self.inner.rdf
    }

    /// Transaction context attached by the server.
    pub fn txn(&self) -> Option<&ApiTxnContext> {
        self.inner.txn.as_ref()
    }

    /// Blank-node to UID assignments made by mutations.
    pub fn uids(&self) -> &HashMap<String, String> {
        &self.inner.uids
    }

    /// Server-side timing breakdown.
    pub fn latency(&self) -> Option<&Latency> {
        self.inner.latency.as_ref()
    }

    /// Returns the raw server response.
    pub fn into_inner(self) -> ApiResponse {
        self.inner
    }
}

impl From<ApiResponse> for Response {
    fn from(inner: ApiResponse) -> Self {
        Self::new(inner)
    }
}
