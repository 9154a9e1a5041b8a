//! dream-broker - a reference service broker.
//!
//! A marketplace orchestrator can fetch the catalog, provision and
//! deprovision instances of the "dream" service, and bind to them. Nothing
//! real is provisioned; instances and bindings are bookkeeping records in
//! an in-memory registry.
//!
//! This library provides:
//! - `api`: axum router and endpoint handlers
//! - `catalog`: the service/plan descriptors and per-request URL resolution
//! - `gates`: API version and basic auth middleware
//! - `registry`: in-memory instance and binding store
//! - `serve`: HTTP server loop
//! - `telemetry`: tracing and OpenTelemetry setup

pub mod api;
pub mod catalog;
pub mod error;
pub mod gates;
pub mod registry;
pub mod response;
pub mod serve;
pub mod state;
pub mod telemetry;

pub use error::{BrokerError, BrokerResult};
pub use state::BrokerState;
