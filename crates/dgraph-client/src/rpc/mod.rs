//! The RPC seam between the transaction machinery and the network.
//!
//! Everything above this module talks to a [`DgraphRpc`]. The production
//! implementation is the tonic client from `dgraph-proto`; tests plug in an
//! in-memory double.

use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

use dgraph_proto::{
    Check, DgraphClient, LoginRequest, Operation, Payload, Request as ApiRequest,
    Response as ApiResponse, TxnContext, Version,
};

#[cfg(test)]
pub(crate) mod mock;

/// One endpoint of the `api.Dgraph` service.
///
/// Implementations must be safe to share across tasks: the dispatcher hands
/// the same channel to many transactions concurrently.
#[async_trait]
pub trait DgraphRpc: Send + Sync + std::fmt::Debug {
    /// `Login` RPC.
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<ApiResponse>, Status>;

    /// `Query` RPC, which also carries mutations.
    async fn query(&self, request: Request<ApiRequest>) -> Result<Response<ApiResponse>, Status>;

    /// `Alter` RPC.
    async fn alter(&self, request: Request<Operation>) -> Result<Response<Payload>, Status>;

    /// `CommitOrAbort` RPC.
    async fn commit_or_abort(
        &self,
        request: Request<TxnContext>,
    ) -> Result<Response<TxnContext>, Status>;

    /// `CheckVersion` RPC.
    async fn check_version(&self, request: Request<Check>) -> Result<Response<Version>, Status>;
}

// `Grpc<Channel>` is a cheap clone over a shared connection, so each call
// works on its own copy instead of locking a single `&mut` client. The calls
// are spelled out as `DgraphClient::method` so they resolve to the inherent
// tonic methods rather than back into this trait.
#[async_trait]
impl DgraphRpc for DgraphClient<Channel> {
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<ApiResponse>, Status> {
        DgraphClient::login(&mut self.clone(), request).await
    }

    async fn query(&self, request: Request<ApiRequest>) -> Result<Response<ApiResponse>, Status> {
        DgraphClient::query(&mut self.clone(), request).await
    }

    async fn alter(&self, request: Request<Operation>) -> Result<Response<Payload>, Status> {
        DgraphClient::alter(&mut self.clone(), request).await
    }

    async fn commit_or_abort(
        &self,
        request: Request<TxnContext>,
    ) -> Result<Response<TxnContext>, Status> {
        DgraphClient::commit_or_abort(&mut self.clone(), request).await
    }

    async fn check_version(&self, request: Request<Check>) -> Result<Response<Version>, Status> {
        DgraphClient::check_version(&mut self.clone(), request).await
    }
}
