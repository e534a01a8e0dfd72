//! Scripted in-memory [`DgraphRpc`] used by unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tonic::{Request, Response, Status};

use dgraph_proto::{
    Check, Jwt, LoginRequest, Operation, Payload, Request as ApiRequest, Response as ApiResponse,
    TxnContext, Version,
};
use prost::Message;

use super::DgraphRpc;

/// Replays canned replies in order and records every request it sees.
///
/// An empty reply queue answers with a default (successful) message.
#[derive(Debug, Default)]
pub(crate) struct MockDgraph {
    query_replies: Mutex<VecDeque<Result<ApiResponse, Status>>>,
    commit_replies: Mutex<VecDeque<Result<TxnContext, Status>>>,
    login_replies: Mutex<VecDeque<Result<ApiResponse, Status>>>,
    pub queries: Mutex<Vec<ApiRequest>>,
    pub commits: Mutex<Vec<TxnContext>>,
    pub logins: Mutex<Vec<LoginRequest>>,
    pub alters: Mutex<Vec<Operation>>,
    pub version_checks: Mutex<usize>,
    /// `accessjwt` header of each query, in call order.
    pub query_jwts: Mutex<Vec<Option<String>>>,
    /// `grpc-timeout` header of each query, in call order.
    pub query_timeouts: Mutex<Vec<Option<String>>>,
}

impl MockDgraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_query(&self, reply: Result<ApiResponse, Status>) {
        self.query_replies.lock().push_back(reply);
    }

    /// Queues a successful query reply carrying the given context.
    pub fn push_query_ctx(&self, start_ts: u64, hash: &str, keys: &[&str], preds: &[&str]) {
        self.push_query(Ok(ApiResponse {
            json: br#"{"q":[]}"#.to_vec(),
            txn: Some(TxnContext {
                start_ts,
                hash: hash.to_string(),
                keys: keys.iter().map(|k| k.to_string()).collect(),
                preds: preds.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }));
    }

    pub fn push_commit(&self, reply: Result<TxnContext, Status>) {
        self.commit_replies.lock().push_back(reply);
    }

    pub fn push_login_jwt(&self, access: &str) {
        let jwt = Jwt {
            access_jwt: access.to_string(),
            refresh_jwt: "refresh".to_string(),
        };
        self.login_replies.lock().push_back(Ok(ApiResponse {
            json: jwt.encode_to_vec(),
            ..Default::default()
        }));
    }

    pub fn push_login(&self, reply: Result<ApiResponse, Status>) {
        self.login_replies.lock().push_back(reply);
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().len()
    }
}

fn header<T>(request: &Request<T>, key: &str) -> Option<String> {
    request
        .metadata()
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl DgraphRpc for MockDgraph {
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<ApiResponse>, Status> {
        self.logins.lock().push(request.into_inner());
        let reply = self.login_replies.lock().pop_front();
        reply.unwrap_or_else(|| Ok(ApiResponse::default())).map(Response::new)
    }

    async fn query(&self, request: Request<ApiRequest>) -> Result<Response<ApiResponse>, Status> {
        self.query_jwts.lock().push(header(&request, "accessjwt"));
        self.query_timeouts.lock().push(header(&request, "grpc-timeout"));
        self.queries.lock().push(request.into_inner());
        let reply = self.query_replies.lock().pop_front();
        reply.unwrap_or_else(|| Ok(ApiResponse::default())).map(Response::new)
    }

    async fn alter(&self, request: Request<Operation>) -> Result<Response<Payload>, Status> {
        self.alters.lock().push(request.into_inner());
        Ok(Response::new(Payload::default()))
    }

    async fn commit_or_abort(
        &self,
        request: Request<TxnContext>,
    ) -> Result<Response<TxnContext>, Status> {
        let ctx = request.into_inner();
        self.commits.lock().push(ctx.clone());
        let reply = self.commit_replies.lock().pop_front();
        reply
            .unwrap_or_else(|| {
                Ok(TxnContext {
                    commit_ts: ctx.start_ts + 1,
                    ..ctx
                })
            })
            .map(Response::new)
    }

    async fn check_version(&self, _request: Request<Check>) -> Result<Response<Version>, Status> {
        *self.version_checks.lock() += 1;
        Ok(Response::new(Version {
            tag: "v24.0.0".to_string(),
        }))
    }
}
