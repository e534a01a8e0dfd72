//! Client facade.
//!
//! Provides the main `Client` struct: configuration, connection setup, the
//! one-shot administrative RPCs and the factories for transactions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use prost::Message;
use serde::{Deserialize, Serialize};
use tonic::transport::Endpoint;
use tonic::Status;
use tracing::debug;

use dgraph_proto::{
    Check, DgraphClient, Jwt, LoginRequest, Operation, Request as ApiRequest,
    TxnContext as ApiTxnContext,
};

use crate::dispatch::{CallOptions, Dispatcher};
use crate::error::{ClientError, ClientResult};
use crate::rpc::DgraphRpc;
use crate::transaction::{ReadOnlyTxn, Response, Transaction};

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Alpha endpoints, one channel each.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Default deadline for calls without an explicit one, in milliseconds.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_endpoints() -> Vec<String> {
    vec!["http://localhost:9080".to_string()]
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Uses a single endpoint.
    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        self.endpoints([endpoint])
    }

    /// Replaces the endpoint list.
    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the default call deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Returns the default call deadline.
    pub fn request_timeout_duration(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.endpoints.is_empty() {
            return Err(ClientError::InvalidConfig(
                "at least one endpoint is required".to_string(),
            ));
        }
        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ClientError::InvalidConfig(
                "endpoints must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

struct ClientInner {
    config: ClientConfig,
    dispatcher: Dispatcher,
    /// Access token from the last successful login.
    access_jwt: RwLock<Option<String>>,
}

/// Dgraph client.
///
/// Cheap to clone; clones share the channel pool and login state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client over already-built channels.
    pub fn from_channels(
        channels: Vec<Arc<dyn DgraphRpc>>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let dispatcher = Dispatcher::new(channels)?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                dispatcher,
                access_jwt: RwLock::new(None),
            }),
        })
    }

    /// Connects to every configured endpoint.
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let mut channels: Vec<Arc<dyn DgraphRpc>> = Vec::with_capacity(config.endpoints.len());

        for url in &config.endpoints {
            let endpoint = Endpoint::from_shared(url.clone())
                .map_err(|e| ClientError::InvalidConfig(format!("{}: {}", url, e)))?
                .connect_timeout(timeout);
            let channel = endpoint
                .connect()
                .await
                .map_err(|e| ClientError::ConnectionFailed(format!("{}: {}", url, e)))?;

            debug!(endpoint = %url, "connected");
            channels.push(Arc::new(DgraphClient::new(channel)));
        }

        Self::from_channels(channels, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the number of channels in the pool.
    pub fn channel_count(&self) -> usize {
        self.inner.dispatcher.channel_count()
    }

    /// Closes the client. Every later call fails with
    /// [`ClientError::AlreadyDisposed`], including calls from transactions
    /// that are still open.
    pub fn close(&self) {
        self.inner.dispatcher.close();
    }

    /// Returns true once the client is closed.
    pub fn is_closed(&self) -> bool {
        self.inner.dispatcher.is_closed()
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Starts a read-write transaction.
    pub fn new_transaction(&self) -> ClientResult<Transaction> {
        self.inner.dispatcher.ensure_open()?;
        Ok(Transaction::new(self.clone()))
    }

    /// Starts a read-only transaction.
    pub fn new_read_only_transaction(&self, best_effort: bool) -> ClientResult<ReadOnlyTxn> {
        self.inner.dispatcher.ensure_open()?;
        Ok(ReadOnlyTxn::new(self.clone(), best_effort))
    }

    // =========================================================================
    // One-shot RPCs
    // =========================================================================

    /// Logs into the default namespace.
    pub async fn login(
        &self,
        user: &str,
        password: &str,
        options: CallOptions,
    ) -> ClientResult<()> {
        self.login_into_namespace(user, password, 0, options).await
    }

    /// Logs into a namespace. The returned access token is attached to every
    /// later call made through this client.
    pub async fn login_into_namespace(
        &self,
        user: &str,
        password: &str,
        namespace: u64,
        options: CallOptions,
    ) -> ClientResult<()> {
        let request = self.request(
            LoginRequest {
                userid: user.to_string(),
                password: password.to_string(),
                namespace,
                ..Default::default()
            },
            options,
        )?;

        let response = self
            .inner
            .dispatcher
            .execute_with(
                move |dg| async move { dg.login(request).await },
                ClientError::AuthenticationFailed,
            )
            .await?;

        let jwt = Jwt::decode(response.into_inner().json.as_slice())
            .map_err(|e| ClientError::SerializationError(e.to_string()))?;
        *self.inner.access_jwt.write() = Some(jwt.access_jwt);

        debug!(user, namespace, "logged in");
        Ok(())
    }

    /// Alters the schema or drops data.
    pub async fn alter(&self, operation: Operation, options: CallOptions) -> ClientResult<()> {
        let request = self.request(operation, options)?;
        self.execute(move |dg| async move { dg.alter(request).await })
            .await?;
        Ok(())
    }

    /// Returns the server's version tag.
    pub async fn check_version(&self, options: CallOptions) -> ClientResult<String> {
        let request = self.request(Check {}, options)?;
        let version = self
            .execute(move |dg| async move { dg.check_version(request).await })
            .await?;
        Ok(version.into_inner().tag)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs `work` against the next channel of the pool.
    pub async fn execute<T, F, Fut>(&self, work: F) -> ClientResult<T>
    where
        F: FnOnce(Arc<dyn DgraphRpc>) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        self.inner.dispatcher.execute(work).await
    }

    /// Wraps a message with call options, the default deadline and the
    /// current access token.
    fn request<M>(&self, message: M, options: CallOptions) -> ClientResult<tonic::Request<M>> {
        let jwt = self.inner.access_jwt.read().clone();
        options.into_request(
            message,
            self.inner.config.request_timeout_duration(),
            jwt.as_deref(),
        )
    }

    /// Checks the client is open and builds the outgoing query call. Nothing
    /// is sent, so errors here are local.
    pub(crate) fn prepare_query(
        &self,
        request: ApiRequest,
        options: CallOptions,
    ) -> ClientResult<tonic::Request<ApiRequest>> {
        self.inner.dispatcher.ensure_open()?;
        self.request(request, options)
    }

    pub(crate) async fn send_query(
        &self,
        request: tonic::Request<ApiRequest>,
    ) -> ClientResult<Response> {
        let response = self
            .execute(move |dg| async move { dg.query(request).await })
            .await?;
        Ok(Response::new(response.into_inner()))
    }

    pub(crate) async fn commit_or_abort(
        &self,
        context: ApiTxnContext,
        options: CallOptions,
    ) -> ClientResult<ApiTxnContext> {
        let request = self.request(context, options)?;
        let reply = self
            .execute(move |dg| async move { dg.commit_or_abort(request).await })
            .await?;
        Ok(reply.into_inner())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.inner.config.endpoints)
            .field("channels", &self.channel_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
