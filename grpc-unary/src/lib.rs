//! Unary gRPC calls over any HTTP transport.
//!
//! A [`Client`] is bound to one method URL. Each [`Client::call`] folds the
//! client and call [`CallOption`]s, builds the gRPC request headers, runs
//! the configured [`Interceptor`]s and finally performs the HTTP exchange
//! through a [`Doer`]. Every failure comes back as an [`Error`] carrying a
//! canonical [`Code`].
//!
//! Response outcomes are resolved in a fixed order: a non-200 HTTP status,
//! then an unsupported `grpc-encoding`, then a header-only `grpc-status`,
//! then a `grpc-status` in the trailers, and only then a body that failed
//! to decode.
//!
//! # Example
//!
//! ```no_run
//! use grpc_unary::{CallOption, Client, Code, Context, Doer, Message};
//! use std::time::Duration;
//!
//! async fn get_widget<D: Doer>(
//!     doer: D,
//!     request: &dyn Message,
//!     response: &mut dyn Message,
//! ) -> Result<(), grpc_unary::Error> {
//!     let client = Client::new(
//!         doer,
//!         "http://localhost:8080/acme.widget.v1.WidgetService/GetWidget",
//!         "acme.widget.v1.WidgetService.GetWidget",
//!         vec![CallOption::GzipRequests(true)],
//!     );
//!     let ctx = Context::new().with_timeout(Duration::from_secs(2));
//!     match client.call(&ctx, request, response, &[]).await {
//!         Err(err) if err.code() == Code::NOT_FOUND => Ok(()),
//!         other => other,
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod message;
pub mod metrics;
pub mod transport;

pub use client::Client;
pub use config::{CallConfig, CallOption};
pub use context::{CallContext, CallMeta, Cancellation, Context, Interrupted, Specification};
pub use error::Error;
pub use headers::{
    CONTENT_TYPE_PROTO, GRPC_ACCEPT_ENCODING, GRPC_ENCODING, GRPC_MESSAGE, GRPC_STATUS,
    GRPC_STATUS_DETAILS_BIN, GRPC_TIMEOUT, USER_AGENT, extract_error, request_headers,
};
pub use interceptor::{BoxFuture, Chain, Interceptor, UnaryCall};
pub use message::Message;
pub use protocol_grpc::{Any, Code, Compression, Status};
pub use transport::{BoxError, BufferedBody, Doer, ResponseBody};
