//! Per-call deadline, cancellation, and call-scoped metadata.
//!
//! A [`Context`] is what the caller hands to [`Client::call`]: an optional
//! deadline plus a [`Cancellation`] token. The pipeline wraps it in a
//! [`CallContext`] that also carries the [`CallMeta`] for exactly one call
//! and passes it by `&mut` through the interceptor chain.
//!
//! [`Client::call`]: crate::Client::call

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http::HeaderMap;
use protocol_grpc::{Code, Compression};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::Error;

/// A cooperative cancellation token. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<CancellationState>,
}

#[derive(Debug, Default)]
struct CancellationState {
    flag: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Mark the token cancelled and wake every waiter.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn cancel(&self) -> bool {
        let first = self
            .inner
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel()
            // cannot slip between the check and the await.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Why [`Context::run`] gave up on its future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl Interrupted {
    pub fn code(self) -> Code {
        match self {
            Interrupted::Canceled => Code::CANCELED,
            Interrupted::DeadlineExceeded => Code::DEADLINE_EXCEEDED,
        }
    }
}

impl From<Interrupted> for Error {
    fn from(interrupted: Interrupted) -> Self {
        Error::new(interrupted.code(), interrupted.to_string())
    }
}

/// Caller-supplied deadline and cancellation for one call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancellation: Cancellation,
}

impl Context {
    /// A context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a deadline `timeout` from now. A timeout too large to represent
    /// leaves the context without a deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Set an absolute deadline. An existing earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Replace the cancellation token, e.g. to share one across calls.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Time left until the deadline, saturating at zero. `None` when the
    /// context has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The reason this context is already done, if it is. Cancellation wins
    /// over an expired deadline.
    pub fn interrupted(&self) -> Option<Interrupted> {
        if self.cancellation.is_cancelled() {
            return Some(Interrupted::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupted::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drive `fut` until it completes, the token is cancelled, or the
    /// deadline passes, whichever happens first. `fut` is dropped when
    /// interrupted.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Interrupted::Canceled),
            _ = deadline => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

/// What is being called and how the request body is encoded. Fixed for the
/// lifetime of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// Fully-qualified procedure name, e.g. `acme.foo.v1.FooService.Bar`.
    pub method: String,
    pub request_compression: Compression,
}

/// Call-scoped metadata.
///
/// `response_headers` is empty until the transport has answered; read it
/// only after the inner call returns.
#[derive(Debug, Clone)]
pub struct CallMeta {
    pub spec: Specification,
    pub request_headers: HeaderMap,
    pub response_headers: HeaderMap,
}

/// The state one call threads through its interceptors.
#[derive(Debug)]
pub struct CallContext {
    context: Context,
    meta: Option<CallMeta>,
}

impl CallContext {
    /// A context without call metadata. Useful for exercising interceptors
    /// in isolation; the network call rejects it with `Internal`.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            meta: None,
        }
    }

    pub fn with_meta(context: Context, meta: CallMeta) -> Self {
        Self {
            context,
            meta: Some(meta),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Interceptors may tighten the deadline or swap the token here.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn meta(&self) -> Option<&CallMeta> {
        self.meta.as_ref()
    }

    pub fn meta_mut(&mut self) -> Option<&mut CallMeta> {
        self.meta.as_mut()
    }

    /// Split into the context and metadata so both can be borrowed at once.
    pub fn parts_mut(&mut self) -> (&Context, Option<&mut CallMeta>) {
        (&self.context, self.meta.as_mut())
    }
}
