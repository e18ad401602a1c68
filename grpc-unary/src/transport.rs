//! The HTTP transport boundary.
//!
//! The pipeline never opens connections itself. It hands a fully-built
//! `http::Request` to a [`Doer`] and reads status, headers, body frames and
//! trailers off the `http::Response` it gets back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use bytes::Bytes;
use http::HeaderMap;
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;

/// Type-erased error returned by transports and message codecs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body handed back by a [`Doer`]: data frames, then trailers.
pub type ResponseBody = BoxBody<Bytes, BoxError>;

/// Submits one HTTP request and returns the response head and body.
///
/// Implementations are shared by every call made through a client and must
/// tolerate concurrent use. Returning [`Interrupted`] from `send` is
/// understood as the call being cancelled or timed out.
///
/// [`Interrupted`]: crate::Interrupted
pub trait Doer: Send + Sync + 'static {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<http::Response<ResponseBody>, BoxError>> + Send;
}

impl<D: Doer> Doer for Arc<D> {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<http::Response<ResponseBody>, BoxError>> + Send {
        (**self).send(request)
    }
}

/// A fully-buffered body: at most one data frame followed by optional
/// trailers.
///
/// Transports that read the whole response before returning can use this
/// directly; it is also what in-memory test transports build.
#[derive(Debug, Clone, Default)]
pub struct BufferedBody {
    data: Option<Bytes>,
    trailers: Option<HeaderMap>,
}

impl BufferedBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
            trailers: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_trailers(mut self, trailers: HeaderMap) -> Self {
        self.trailers = Some(trailers);
        self
    }

    pub fn boxed(self) -> ResponseBody {
        BodyExt::boxed(self)
    }
}

impl Body for BufferedBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        let this = self.get_mut();
        if let Some(data) = this.data.take() {
            return Poll::Ready(Some(Ok(Frame::data(data))));
        }
        if let Some(trailers) = this.trailers.take() {
            return Poll::Ready(Some(Ok(Frame::trailers(trailers))));
        }
        Poll::Ready(None)
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none() && self.trailers.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        let len = self.data.as_ref().map_or(0, Bytes::len) as u64;
        SizeHint::with_exact(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[tokio::test]
    async fn data_then_trailers() {
        let mut trailers = HeaderMap::new();
        trailers.insert("grpc-status", HeaderValue::from_static("0"));
        let body = BufferedBody::new(&b"payload"[..]).with_trailers(trailers);
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(7));

        let collected = body.boxed().collect().await.unwrap();
        let trailers = collected.trailers().cloned().unwrap();
        assert_eq!(trailers["grpc-status"], "0");
        assert_eq!(collected.to_bytes(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn empty_body_ends_immediately() {
        let body = BufferedBody::new(Bytes::new());
        assert!(body.is_end_stream());
        let collected = body.boxed().collect().await.unwrap();
        assert!(collected.trailers().is_none());
        assert!(collected.to_bytes().is_empty());
    }
}
