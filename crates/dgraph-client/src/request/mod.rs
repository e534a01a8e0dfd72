//! Builders for query and mutation requests.

use dgraph_proto::request::RespFormat;
use dgraph_proto::{Mutation, Request};
use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// A fluent builder for [`Request`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Creates an empty request builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query text.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.request.query = query.into();
        self
    }

    /// Binds a query variable.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.vars.insert(name.into(), value.into());
        self
    }

    /// Binds several query variables.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends a mutation.
    pub fn mutation(mut self, mutation: Mutation) -> Self {
        self.request.mutations.push(mutation);
        self
    }

    /// Commits the transaction together with this request.
    pub fn commit_now(mut self, commit_now: bool) -> Self {
        self.request.commit_now = commit_now;
        self
    }

    /// Selects JSON or RDF output.
    pub fn resp_format(mut self, format: RespFormat) -> Self {
        self.request.resp_format = format as i32;
        self
    }

    /// Returns the request.
    pub fn build(self) -> Request {
        self.request
    }
}

/// A fluent builder for [`Mutation`].
#[derive(Debug, Clone, Default)]
pub struct MutationBuilder {
    mutation: Mutation,
}

impl MutationBuilder {
    /// Creates an empty mutation builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the JSON to add.
    pub fn set_json(mut self, json: impl Into<Vec<u8>>) -> Self {
        self.mutation.set_json = json.into();
        self
    }

    /// Serializes `value` as the JSON to add.
    pub fn set_value<T: Serialize>(self, value: &T) -> ClientResult<Self> {
        let json = serde_json::to_vec(value)
            .map_err(|e| ClientError::SerializationError(e.to_string()))?;
        Ok(self.set_json(json))
    }

    /// Sets the JSON to delete.
    pub fn delete_json(mut self, json: impl Into<Vec<u8>>) -> Self {
        self.mutation.delete_json = json.into();
        self
    }

    /// Sets the N-Quads to add.
    pub fn set_nquads(mut self, nquads: impl Into<Vec<u8>>) -> Self {
        self.mutation.set_nquads = nquads.into();
        self
    }

    /// Sets the N-Quads to delete.
    pub fn del_nquads(mut self, nquads: impl Into<Vec<u8>>) -> Self {
        self.mutation.del_nquads = nquads.into();
        self
    }

    /// Only apply the mutation when `cond` holds (upsert blocks).
    pub fn cond(mut self, cond: impl Into<String>) -> Self {
        self.mutation.cond = cond.into();
        self
    }

    /// Commits the transaction together with this mutation.
    pub fn commit_now(mut self, commit_now: bool) -> Self {
        self.mutation.commit_now = commit_now;
        self
    }

    /// Returns the mutation.
    pub fn build(self) -> Mutation {
        self.mutation
    }
}
