//! Round-robin dispatch of RPCs over a fixed pool of channels.
//!
//! The pool is fixed at construction and shared by every transaction of a
//! client. Selection only needs to be approximately fair, so the cursor is a
//! relaxed atomic counter taken modulo the pool size.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::Status;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::rpc::DgraphRpc;

/// Per-call options: deadline and extra request metadata.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Deadline for the call. Falls back to the client's request timeout.
    pub timeout: Option<Duration>,
    /// Extra ASCII metadata sent with the call.
    pub metadata: Vec<(String, String)>,
}

impl CallOptions {
    /// Creates empty call options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Wraps `message` in a tonic request carrying these options.
    ///
    /// `default_timeout` applies when no explicit timeout is set, and
    /// `access_jwt` is attached as the `accessjwt` header when present.
    pub(crate) fn into_request<M>(
        self,
        message: M,
        default_timeout: Option<Duration>,
        access_jwt: Option<&str>,
    ) -> ClientResult<tonic::Request<M>> {
        let mut request = tonic::Request::new(message);

        if let Some(timeout) = self.timeout.or(default_timeout) {
            request.set_timeout(timeout);
        }

        let jwt = access_jwt.map(|token| ("accessjwt", token));
        let extra = self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        for (key, value) in jwt.into_iter().chain(extra) {
            let key = AsciiMetadataKey::from_bytes(key.as_bytes())
                .map_err(|_| ClientError::InvalidMetadata(format!("bad key {:?}", key)))?;
            let value = AsciiMetadataValue::try_from(value)
                .map_err(|_| ClientError::InvalidMetadata(format!("bad value for {}", key.as_str())))?;
            request.metadata_mut().insert(key, value);
        }

        Ok(request)
    }
}

/// Executes units of work against a round-robin selected channel.
pub struct Dispatcher {
    /// Channel pool, fixed after construction.
    channels: Vec<Arc<dyn DgraphRpc>>,
    /// Round-robin cursor.
    next: AtomicUsize,
    /// Set once the owning client is closed.
    closed: AtomicBool,
}

impl Dispatcher {
    /// Creates a dispatcher over the given channels.
    pub fn new(channels: Vec<Arc<dyn DgraphRpc>>) -> ClientResult<Self> {
        if channels.is_empty() {
            return Err(ClientError::InvalidConfig(
                "at least one channel is required".to_string(),
            ));
        }
        Ok(Self {
            channels,
            next: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the number of channels in the pool.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Picks the index of the next channel.
    pub(crate) fn next_index(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % self.channels.len()
    }

    /// Rejects every later call.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Returns true once [`Dispatcher::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fails with [`ClientError::AlreadyDisposed`] after close.
    pub fn ensure_open(&self) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::AlreadyDisposed);
        }
        Ok(())
    }

    /// Runs `work` against the next channel, mapping RPC failures into
    /// [`ClientError::Transport`].
    pub async fn execute<T, F, Fut>(&self, work: F) -> ClientResult<T>
    where
        F: FnOnce(Arc<dyn DgraphRpc>) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        self.execute_with(work, ClientError::Transport).await
    }

    /// Runs `work` against the next channel, mapping RPC failures with
    /// `on_failure`.
    pub async fn execute_with<T, F, Fut, E>(&self, work: F, on_failure: E) -> ClientResult<T>
    where
        F: FnOnce(Arc<dyn DgraphRpc>) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
        E: FnOnce(Status) -> ClientError,
    {
        self.ensure_open()?;

        let index = self.next_index();
        let channel = Arc::clone(&self.channels[index]);

        work(channel).await.map_err(|status| {
            debug!(
                channel = index,
                code = ?status.code(),
                message = status.message(),
                "rpc failed"
            );
            on_failure(status)
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.channels.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
