//! Unary-call middleware.
//!
//! An [`Interceptor`] turns the next [`UnaryCall`] into a new one. The
//! wrapper may inspect or modify the call context, the request or the
//! response, and may return an error without calling `next` at all.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::CallContext;
use crate::error::Error;
use crate::message::Message;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One step of a unary call: the network exchange itself, or an
/// interceptor layered on top of it.
pub trait UnaryCall: Send + Sync {
    fn call<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        request: &'a dyn Message,
        response: &'a mut dyn Message,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

pub trait Interceptor: Send + Sync {
    fn wrap(&self, next: Arc<dyn UnaryCall>) -> Arc<dyn UnaryCall>;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn wrap(&self, next: Arc<dyn UnaryCall>) -> Arc<dyn UnaryCall> {
        (**self).wrap(next)
    }
}

/// Several interceptors composed into one. The first member is the
/// outermost: it sees the call first and the result last.
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl From<Vec<Arc<dyn Interceptor>>> for Chain {
    fn from(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { interceptors }
    }
}

impl Interceptor for Chain {
    fn wrap(&self, next: Arc<dyn UnaryCall>) -> Arc<dyn UnaryCall> {
        self.interceptors
            .iter()
            .rev()
            .fold(next, |next, interceptor| interceptor.wrap(next))
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}
