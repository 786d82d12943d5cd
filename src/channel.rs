//! An event-driven collector backed by tokio queues.
//!
//! An [`ErrorChannel`] owns a [`Catcher`] and a background task bridging two
//! bounded queues. Errors arrive either through [`ErrorChannel::collect`] or
//! through the inbound sender; every error is recorded in the catcher first
//! and then forwarded on the outbound queue, where a consumer can observe
//! failures as they happen.
//!
//! The channel lives inside a cancellation scope derived from the parent
//! token given at construction. Cancelling the parent or calling
//! [`ErrorChannel::stop`] ends forwarding; recorded errors are kept and can
//! still be resolved.
//!
//! ```
//! use errcatch::{ErrorChannel, Message};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let root = CancellationToken::new();
//! let channel = ErrorChannel::new(&root, 8);
//!
//! channel.collect(&root, Message::new("upload failed")).await;
//! let seen = channel.outbound().recv().await.unwrap();
//! assert_eq!(seen.to_string(), "upload failed");
//!
//! channel.stop();
//! let resolved = channel.wait(&root).await.unwrap().unwrap();
//! assert!(resolved.as_str().contains("upload failed"));
//! # }
//! ```

use alloc::{format, string::String, vec, vec::Vec};
use core::{any::Any, error::Error, fmt, ops::ControlFlow, panic::AssertUnwindSafe};

use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use triomphe::Arc;

use crate::{Aggregate, Catcher, Caught, Format, IntoCaught, Message, Resolved, Submission};

/// A collector that records errors and forwards them to an outbound queue.
///
/// Every error is recorded in the owned [`Catcher`] before it is forwarded,
/// so a consumer of [`outbound`](ErrorChannel::outbound) never sees an error
/// that [`resolve`](ErrorChannel::resolve) would miss.
///
/// Dropping the channel cancels its scope, which stops the background task.
pub struct ErrorChannel {
    catcher: Arc<Catcher>,
    inbound: mpsc::Sender<Caught>,
    outbound_tx: mpsc::Sender<Caught>,
    outbound: Outbound,
    scope: CancellationToken,
}

impl ErrorChannel {
    /// Creates a channel whose queues hold up to `size` errors each, using
    /// a default [`Catcher`].
    ///
    /// A `size` of zero is treated as one. The channel's scope is a child of
    /// `parent`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(parent: &CancellationToken, size: usize) -> Self {
        Self::with_catcher(parent, size, Catcher::default())
    }

    /// Creates a channel recording errors into `catcher`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn with_catcher(parent: &CancellationToken, size: usize, catcher: Catcher) -> Self {
        let capacity = size.max(1);
        let (inbound, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let catcher = Arc::new(catcher);
        let scope = parent.child_token();

        let forwarder = Forwarder {
            catcher: Arc::clone(&catcher),
            inbound: inbound_rx,
            outbound: outbound_tx.clone(),
            scope: scope.clone(),
        };
        tokio::spawn(forwarder.run());
        tracing::debug!(capacity, "error channel started");

        Self {
            catcher,
            inbound,
            outbound_tx,
            outbound: Outbound {
                receiver: Mutex::new(outbound_rx),
            },
            scope,
        }
    }

    /// Records an error and forwards it on the outbound queue.
    ///
    /// Absent errors are ignored. The error is recorded unconditionally;
    /// forwarding waits for outbound capacity and gives up as soon as either
    /// `scope` or the channel's own scope is cancelled. Flattened aggregates
    /// forward each member in order.
    pub async fn collect<M>(&self, scope: &CancellationToken, error: impl IntoCaught<M>) {
        let submission = error.into_submission();
        let forwarded = match &submission {
            Submission::Absent => return,
            Submission::Single(error) => vec![error.clone()],
            Submission::Flatten { errors, .. } => errors.clone(),
        };
        self.catcher.submit(submission);

        for error in forwarded {
            tokio::select! {
                biased;
                () = scope.cancelled() => return,
                () = self.scope.cancelled() => return,
                _ = self.outbound_tx.send(error) => {}
            }
        }
    }

    /// Returns a sender feeding the background task.
    ///
    /// Errors sent here are recorded and forwarded exactly like collected
    /// ones, for as long as the channel is not stopped.
    #[must_use]
    pub fn inbound(&self) -> mpsc::Sender<Caught> {
        self.inbound.clone()
    }

    /// Returns the read end of the outbound queue.
    #[must_use]
    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    /// Cancels the channel's scope. Idempotent.
    pub fn stop(&self) {
        if !self.scope.is_cancelled() {
            tracing::debug!("stopping error channel");
        }
        self.scope.cancel();
    }

    /// Returns `true` once the channel's scope is cancelled, by
    /// [`stop`](ErrorChannel::stop) or by the parent token.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Waits for the channel to stop, then resolves the recorded errors.
    ///
    /// Returns [`WaitError::Cancelled`] if `scope` is cancelled first.
    pub async fn wait(&self, scope: &CancellationToken) -> Result<Option<Resolved>, WaitError> {
        tokio::select! {
            biased;
            () = scope.cancelled() => Err(WaitError::Cancelled),
            () = self.scope.cancelled() => Ok(self.resolve()),
        }
    }

    /// Resolves the recorded errors. Available at any time.
    #[must_use]
    pub fn resolve(&self) -> Option<Resolved> {
        self.catcher.resolve()
    }

    /// Returns the catcher recording this channel's errors.
    #[must_use]
    pub fn catcher(&self) -> &Catcher {
        &self.catcher
    }

    /// Returns the number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catcher.len()
    }

    /// Returns `true` if no error is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catcher.is_empty()
    }

    /// Returns `true` if at least one error is recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.catcher.has_errors()
    }

    /// Returns a copy of the recorded errors in insertion order.
    #[must_use]
    pub fn errors(&self) -> Vec<Caught> {
        self.catcher.errors()
    }
}

impl Aggregate for ErrorChannel {
    fn has_errors(&self) -> bool {
        ErrorChannel::has_errors(self)
    }

    fn errors(&self) -> Vec<Caught> {
        ErrorChannel::errors(self)
    }

    fn format(&self) -> Format {
        self.catcher.format()
    }
}

impl Drop for ErrorChannel {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("catcher", &*self.catcher)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// The read end of an [`ErrorChannel`]'s outbound queue.
///
/// Several consumers may share it; each error is delivered to one of them.
pub struct Outbound {
    receiver: Mutex<mpsc::Receiver<Caught>>,
}

impl Outbound {
    /// Waits for the next forwarded error.
    ///
    /// The channel keeps the queue open for as long as it exists, so this
    /// only returns `None` once the channel is gone.
    pub async fn recv(&self) -> Option<Caught> {
        self.receiver.lock().await.recv().await
    }

    /// Returns the next forwarded error if one is ready.
    ///
    /// Also returns `None` while another consumer is waiting in
    /// [`recv`](Outbound::recv).
    #[must_use]
    pub fn try_recv(&self) -> Option<Caught> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }
}

impl fmt::Debug for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbound").finish_non_exhaustive()
    }
}

/// Failure returned by [`ErrorChannel::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitError {
    /// The caller's scope was cancelled before the channel stopped.
    Cancelled,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Cancelled => f.write_str("cancelled while waiting for the error channel"),
        }
    }
}

impl Error for WaitError {}

/// The background half of an [`ErrorChannel`].
struct Forwarder {
    catcher: Arc<Catcher>,
    inbound: mpsc::Receiver<Caught>,
    outbound: mpsc::Sender<Caught>,
    scope: CancellationToken,
}

impl Forwarder {
    async fn run(mut self) {
        loop {
            let catcher = Arc::clone(&self.catcher);
            if contain(&catcher, self.step()).await.is_break() {
                break;
            }
        }
        tracing::debug!("error channel forwarder stopped");
    }

    /// Receives one error, records it, then forwards it.
    async fn step(&mut self) -> ControlFlow<()> {
        let error = tokio::select! {
            biased;
            () = self.scope.cancelled() => return ControlFlow::Break(()),
            received = self.inbound.recv() => match received {
                Some(error) => error,
                None => return ControlFlow::Break(()),
            },
        };

        self.catcher.add(&error);

        tokio::select! {
            biased;
            () = self.scope.cancelled() => ControlFlow::Break(()),
            _ = self.outbound.send(error) => ControlFlow::Continue(()),
        }
    }
}

/// Runs one processing step, recording a panic as an error.
///
/// A panicking step breaks the loop.
async fn contain<F>(catcher: &Catcher, step: F) -> ControlFlow<()>
where
    F: Future<Output = ControlFlow<()>>,
{
    match AssertUnwindSafe(step).catch_unwind().await {
        Ok(flow) => flow,
        Err(payload) => {
            let description = describe_panic(&*payload);
            tracing::error!(panic = %description, "error channel processor panicked");
            catcher.add(Message::new(format!(
                "channel processor encountered panic: {description}"
            )));
            ControlFlow::Break(())
        }
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        String::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, string::ToString};
    use core::time::Duration;

    use super::*;

    #[test]
    fn test_channel_send_sync() {
        static_assertions::assert_impl_all!(ErrorChannel: Send, Sync, Aggregate);
        static_assertions::assert_impl_all!(Outbound: Send, Sync);
        static_assertions::assert_impl_all!(WaitError: Send, Sync, Copy, Error);
    }

    #[tokio::test]
    async fn test_collect_absent() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel.collect(&root, None::<Message>).await;
        assert!(!channel.has_errors());
        assert!(channel.outbound().try_recv().is_none());
        assert!(channel.resolve().is_none());
    }

    #[tokio::test]
    async fn test_collect_records_and_forwards() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel.collect(&root, Message::new("hi")).await;
        assert_eq!(channel.len(), 1);

        let forwarded = channel.outbound().recv().await.unwrap();
        assert_eq!(forwarded.to_string(), "hi");
        assert!(forwarded.ptr_eq(&channel.errors()[0]));
    }

    #[tokio::test]
    async fn test_collect_records_even_when_cancelled() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        channel.collect(&cancelled, Message::new("kept")).await;
        assert_eq!(channel.len(), 1);
        assert!(channel.outbound().try_recv().is_none());
    }

    #[tokio::test]
    async fn test_collect_blocks_on_full_outbound() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 1);
        channel.collect(&root, Message::new("first")).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(20),
            channel.collect(&root, Message::new("second")),
        )
        .await;
        assert!(blocked.is_err());
        assert_eq!(channel.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_flattens_aggregates() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::with_catcher(&root, 4, Catcher::plain());
        let batch = Catcher::plain();
        batch.message("a");
        batch.message("b");

        channel.collect(&root, &batch).await;
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.outbound().recv().await.unwrap().to_string(), "a");
        assert_eq!(channel.outbound().recv().await.unwrap().to_string(), "b");
    }

    #[tokio::test]
    async fn test_wait_cancelled() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        let caller = CancellationToken::new();
        caller.cancel();
        assert_eq!(channel.wait(&caller).await, Err(WaitError::Cancelled));
    }

    #[tokio::test]
    async fn test_wait_after_stop_without_errors() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel.stop();
        channel.stop();
        assert!(channel.is_stopped());
        assert_eq!(channel.wait(&root).await, Ok(None));
    }

    #[tokio::test]
    async fn test_wait_resolves_collected() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::with_catcher(&root, 4, Catcher::new(Format::Simple));
        channel.collect(&root, Message::new("hi")).await;
        channel.stop();

        let resolved = channel.wait(&root).await.unwrap().unwrap();
        assert!(resolved.as_str().contains("hi"));
    }

    #[tokio::test]
    async fn test_inbound_is_recorded_then_forwarded() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel
            .inbound()
            .send(Caught::new(Message::new("pushed")))
            .await
            .unwrap();

        let forwarded = channel.outbound().recv().await.unwrap();
        assert_eq!(forwarded.to_string(), "pushed");
        assert_eq!(channel.len(), 1);
    }

    #[tokio::test]
    async fn test_inbound_ignored_after_stop() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel.stop();
        channel
            .inbound()
            .send(Caught::new(Message::new("late")))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(channel.is_empty());
        assert!(channel.outbound().try_recv().is_none());
    }

    #[tokio::test]
    async fn test_parent_cancel_stops_channel() {
        let root = CancellationToken::new();
        let channel = ErrorChannel::new(&root, 4);
        channel.collect(&root, Message::new("before")).await;
        root.cancel();

        assert!(channel.is_stopped());
        let caller = CancellationToken::new();
        let resolved = channel.wait(&caller).await.unwrap().unwrap();
        assert!(resolved.as_str().contains("before"));
    }

    async fn explode() -> ControlFlow<()> {
        panic!("boom")
    }

    async fn explode_with(code: u32) -> ControlFlow<()> {
        tokio::task::yield_now().await;
        panic!("code {code}")
    }

    #[tokio::test]
    async fn test_contain_records_panic() {
        let catcher = Catcher::plain();
        let flow = contain(&catcher, async { ControlFlow::Continue(()) }).await;
        assert_eq!(flow, ControlFlow::Continue(()));
        assert!(catcher.is_empty());

        assert!(contain(&catcher, explode()).await.is_break());
        assert_eq!(
            catcher.to_string(),
            "channel processor encountered panic: boom"
        );

        assert!(contain(&catcher, explode_with(7)).await.is_break());
        assert_eq!(catcher.len(), 2);
        assert!(catcher.to_string().ends_with("panic: code 7"));
    }

    #[test]
    fn test_wait_error_display() {
        assert_eq!(
            WaitError::Cancelled.to_string(),
            "cancelled while waiting for the error channel"
        );
        let _boxed: Box<dyn Error> = Box::new(WaitError::Cancelled);
    }
}
