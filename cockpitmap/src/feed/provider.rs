//! Location provider contract and the channel-backed provider.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use super::merge::FeedShared;
use crate::geo::PositionFix;

/// Errors a provider can report while registering.
///
/// The feed logs these and carries on with the remaining providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Provider is already registered")]
    AlreadyRegistered,
}

/// Handle a provider pushes raw fixes into.
///
/// Cloneable and cheap. Once the feed that issued it is stopped (or
/// restarted) the sink is inert: pushes are silently discarded.
#[derive(Clone)]
pub struct FixSink {
    shared: Arc<FeedShared>,
    generation: u64,
}

impl FixSink {
    pub(super) fn new(shared: Arc<FeedShared>, generation: u64) -> Self {
        Self { shared, generation }
    }

    /// Offer a raw fix to the feed.
    ///
    /// Invalid fixes are dropped here; the return value says whether the fix
    /// reached subscribers.
    pub fn push(&self, fix: PositionFix) -> bool {
        self.shared.dispatch(self.generation, fix)
    }

    /// Whether the issuing feed is still running this registration.
    pub fn is_live(&self) -> bool {
        self.shared.is_current(self.generation)
    }
}

impl std::fmt::Debug for FixSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixSink")
            .field("generation", &self.generation)
            .field("live", &self.is_live())
            .finish()
    }
}

/// A physical source of location fixes.
///
/// `register` and `unregister` must not block. `unregister` is only called
/// for providers whose `register` succeeded, at most once per registration.
pub trait LocationProvider: Send {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Begin delivering fixes into `sink`.
    fn register(&mut self, sink: FixSink) -> Result<(), ProviderError>;

    /// Stop delivering fixes.
    fn unregister(&mut self);
}

/// Provider fed from a tokio channel.
///
/// Whatever is sent on the paired sender is forwarded to the feed by a task
/// spawned on the current runtime. Used for recorded drives and tests.
pub struct ChannelProvider {
    name: String,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<PositionFix>>>,
    forwarding: Option<CancellationToken>,
}

impl ChannelProvider {
    /// Create a provider and the sender that feeds it.
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedSender<PositionFix>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = Self {
            name: name.into(),
            receiver: Arc::new(AsyncMutex::new(rx)),
            forwarding: None,
        };
        (provider, tx)
    }

    /// Whether a forwarding task is active.
    pub fn is_registered(&self) -> bool {
        self.forwarding.is_some()
    }
}

impl LocationProvider for ChannelProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&mut self, sink: FixSink) -> Result<(), ProviderError> {
        if self.forwarding.is_some() {
            return Err(ProviderError::AlreadyRegistered);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ProviderError::Unavailable("no async runtime".to_string()))?;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let receiver = Arc::clone(&self.receiver);
        let name = self.name.clone();

        runtime.spawn(async move {
            // A previous registration's task releases the lock once cancelled
            let mut rx = receiver.lock().await;
            loop {
                tokio::select! {
                    biased;

                    _ = cancelled.cancelled() => break,

                    fix = rx.recv() => {
                        let Some(fix) = fix else { break };
                        sink.push(fix);
                    }
                }
            }
            tracing::debug!(provider = %name, "Channel provider forwarding stopped");
        });

        self.forwarding = Some(token);
        Ok(())
    }

    fn unregister(&mut self) {
        if let Some(token) = self.forwarding.take() {
            token.cancel();
        }
    }
}

impl Drop for ChannelProvider {
    fn drop(&mut self) {
        self.unregister();
    }
}
