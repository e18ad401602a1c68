//! Client call counters.
//!
//! Registered with metriken so any exposition layer the host process runs
//! picks them up.

use metriken::{Counter, metric};

#[metric(name = "grpc_unary/calls", description = "Unary calls started")]
pub static CALLS: Counter = Counter::new();

#[metric(
    name = "grpc_unary/calls/failed",
    description = "Unary calls that returned an error"
)]
pub static CALLS_FAILED: Counter = Counter::new();

#[metric(
    name = "grpc_unary/transport/errors",
    description = "Transport failures not caused by cancellation or deadline"
)]
pub static TRANSPORT_ERRORS: Counter = Counter::new();
