//! The unary call pipeline and its HTTP exchange.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;
use protocol_grpc::message::{self, PREFIX_LEN};
use protocol_grpc::{ACCEPT_ENCODING, Code, Compression, encode_timeout};
use tracing::{debug, trace, warn};

use crate::config::{CallConfig, CallOption};
use crate::context::{CallContext, CallMeta, Context, Interrupted, Specification};
use crate::error::Error;
use crate::headers::{GRPC_ENCODING, GRPC_TIMEOUT, extract_error, request_headers};
use crate::interceptor::{BoxFuture, UnaryCall};
use crate::message::Message;
use crate::metrics::{CALLS, CALLS_FAILED, TRANSPORT_ERRORS};
use crate::transport::{BoxError, Doer, ResponseBody};

/// A client for one unary method.
///
/// Cloning is cheap and clones share the transport. Calls may run
/// concurrently from any number of tasks.
pub struct Client<D> {
    inner: Arc<Inner<D>>,
}

struct Inner<D> {
    doer: D,
    url: String,
    method: String,
    options: Vec<CallOption>,
}

impl<D> Clone for Client<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D> fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.url)
            .field("method", &self.inner.method)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl<D: Doer> Client<D> {
    /// `url` is the full method URL the request is POSTed to; `method` is
    /// the fully-qualified procedure name. `options` apply to every call,
    /// before any per-call options.
    pub fn new(
        doer: D,
        url: impl Into<String>,
        method: impl Into<String>,
        options: Vec<CallOption>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                doer,
                url: url.into(),
                method: method.into(),
                options,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    pub fn options(&self) -> &[CallOption] {
        &self.inner.options
    }

    /// Run one unary call, decoding the reply into `response`.
    ///
    /// `response` is only meaningful when this returns `Ok`.
    pub async fn call(
        &self,
        ctx: &Context,
        request: &dyn Message,
        response: &mut dyn Message,
        options: &[CallOption],
    ) -> Result<(), Error> {
        let config = CallConfig::fold(self.inner.options.iter().chain(options));
        let compression = if config.gzip_requests {
            Compression::Gzip
        } else {
            Compression::Identity
        };
        let meta = CallMeta {
            spec: Specification {
                method: self.inner.method.clone(),
                request_compression: compression,
            },
            request_headers: request_headers(compression),
            response_headers: HeaderMap::new(),
        };
        let mut call_ctx = CallContext::with_meta(ctx.clone(), meta);

        let terminal: Arc<dyn UnaryCall> = Arc::new(Terminal {
            inner: self.inner.clone(),
            max_response_bytes: config.max_response_bytes,
        });
        let call = match &config.interceptor {
            Some(interceptor) => interceptor.wrap(terminal),
            None => terminal,
        };

        CALLS.increment();
        debug!(
            method = %self.inner.method,
            %compression,
            timeout = ?ctx.remaining(),
            "unary call"
        );

        let result = call.call(&mut call_ctx, request, response).await;
        if let Err(err) = &result {
            CALLS_FAILED.increment();
            debug!(
                method = %self.inner.method,
                code = %err.code(),
                message = %err.message(),
                "unary call failed"
            );
        }
        result
    }
}

/// The innermost [`UnaryCall`]: the HTTP exchange.
struct Terminal<D> {
    inner: Arc<Inner<D>>,
    max_response_bytes: usize,
}

impl<D: Doer> UnaryCall for Terminal<D> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        request: &'a dyn Message,
        response: &'a mut dyn Message,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(
            self.inner
                .exchange(ctx, request, response, self.max_response_bytes),
        )
    }
}

impl<D: Doer> Inner<D> {
    async fn exchange(
        &self,
        ctx: &mut CallContext,
        request: &dyn Message,
        response: &mut dyn Message,
        max_response_bytes: usize,
    ) -> Result<(), Error> {
        let (context, meta) = ctx.parts_mut();
        let Some(meta) = meta else {
            return Err(Error::new(Code::INTERNAL, "no call metadata available"));
        };

        if let Some(remaining) = context.remaining() {
            if remaining.is_zero() {
                return Err(Error::new(Code::DEADLINE_EXCEEDED, "no time to make RPC"));
            }
            let encoded = encode_timeout(remaining)
                .map_err(|err| err.to_string())
                .and_then(|value| HeaderValue::try_from(value).map_err(|err| err.to_string()));
            match encoded {
                Ok(value) => {
                    meta.request_headers.insert(GRPC_TIMEOUT, value);
                }
                Err(err) => warn!(?remaining, "omitting grpc-timeout: {err}"),
            }
        }
        if let Some(interrupted) = context.interrupted() {
            return Err(interrupted.into());
        }

        let mut payload = Vec::new();
        request.marshal(&mut payload).map_err(|err| {
            Error::new(
                Code::INVALID_ARGUMENT,
                format!("can't marshal request as protobuf: {err}"),
            )
        })?;
        let mut body = Vec::with_capacity(PREFIX_LEN + payload.len());
        message::marshal(&payload, meta.spec.request_compression, 0, &mut body).map_err(|err| {
            Error::new(Code::INVALID_ARGUMENT, format!("can't frame request: {err}"))
        })?;

        let mut http_request = http::Request::builder()
            .method(Method::POST)
            .uri(self.url.as_str())
            .body(Bytes::from(body))
            .map_err(|err| Error::new(Code::INTERNAL, format!("can't create HTTP request: {err}")))?;
        *http_request.headers_mut() = meta.request_headers.clone();

        let http_response = match context.run(self.doer.send(http_request)).await {
            Ok(Ok(http_response)) => http_response,
            Ok(Err(err)) => return Err(transport_error(context, err)),
            Err(interrupted) => return Err(interrupted.into()),
        };

        let (parts, mut body) = http_response.into_parts();
        let result = read_response(
            context,
            meta,
            parts,
            &mut body,
            response,
            max_response_bytes,
        )
        .await;

        // Leave the connection reusable on every exit path.
        if !body.is_end_stream() {
            let _ = context.run(discard(&mut body)).await;
        }
        result
    }
}

async fn read_response(
    context: &Context,
    meta: &mut CallMeta,
    parts: http::response::Parts,
    body: &mut ResponseBody,
    response: &mut dyn Message,
    max_response_bytes: usize,
) -> Result<(), Error> {
    trace!(headers = ?parts.headers, "response headers");
    meta.response_headers = parts.headers;

    if parts.status != StatusCode::OK {
        let code = Code::from_http_status(parts.status.as_u16()).unwrap_or(Code::UNKNOWN);
        return Err(Error::new(code, format!("HTTP status {}", parts.status)));
    }

    let compression = match meta.response_headers.get(&GRPC_ENCODING) {
        None => Compression::Identity,
        Some(value) if value.is_empty() => Compression::Identity,
        Some(value) => match value.to_str().ok().and_then(Compression::from_name) {
            Some(compression) => compression,
            None => {
                return Err(Error::new(
                    Code::INTERNAL,
                    format!(
                        "unknown compression {:?}: accepted grpc-encoding values are {ACCEPT_ENCODING}",
                        String::from_utf8_lossy(value.as_bytes())
                    ),
                ));
            }
        },
    };

    // Header-only errors carry no body.
    if let Some(err) = extract_error(&meta.response_headers) {
        return Err(err);
    }

    let retain = match max_response_bytes {
        0 => usize::MAX,
        max => PREFIX_LEN.saturating_add(max),
    };
    let (decoded, trailers) = match context.run(read_body(body, retain)).await {
        Err(interrupted) => return Err(interrupted.into()),
        Ok(Err(err)) => (Err(err), None),
        Ok(Ok((data, trailers))) => {
            let decoded = unmarshal_into(&data, compression, max_response_bytes, response);
            (decoded, trailers)
        }
    };

    if let Some(err) = trailers.as_ref().and_then(extract_error) {
        return Err(err);
    }
    decoded.map_err(|err| {
        Error::new(
            Code::UNKNOWN,
            format!("server returned invalid protobuf: {err}"),
        )
    })
}

/// Read `body` to the end, keeping at most `retain` bytes of data and any
/// trailers. Data past `retain` is read and dropped.
async fn read_body(
    body: &mut ResponseBody,
    retain: usize,
) -> Result<(Vec<u8>, Option<HeaderMap>), BoxError> {
    let mut data = Vec::new();
    let mut trailers: Option<HeaderMap> = None;
    while let Some(frame) = body.frame().await {
        let frame = match frame?.into_data() {
            Ok(chunk) => {
                let keep = chunk.len().min(retain.saturating_sub(data.len()));
                data.extend_from_slice(&chunk[..keep]);
                continue;
            }
            Err(frame) => frame,
        };
        if let Ok(map) = frame.into_trailers() {
            trailers.get_or_insert_with(HeaderMap::new).extend(map);
        }
    }
    Ok((data, trailers))
}

async fn discard(body: &mut ResponseBody) {
    while let Some(frame) = body.frame().await {
        if frame.is_err() {
            break;
        }
    }
}

fn unmarshal_into(
    body: &[u8],
    compression: Compression,
    max_bytes: usize,
    response: &mut dyn Message,
) -> Result<(), BoxError> {
    let payload = message::unmarshal(body, compression, max_bytes)?;
    response.unmarshal(&payload)
}

fn transport_error(context: &Context, err: BoxError) -> Error {
    if let Some(interrupted) = err.downcast_ref::<Interrupted>() {
        return (*interrupted).into();
    }
    if let Some(interrupted) = context.interrupted() {
        return interrupted.into();
    }
    TRANSPORT_ERRORS.increment();
    Error::wrap(Code::UNKNOWN, err)
}
