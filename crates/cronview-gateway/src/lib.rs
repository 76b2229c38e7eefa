//! cronview-gateway: Gateway client for the remote cron registry.
//!
//! Talks JSON-RPC 2.0 over WebSocket. Only the read-only `cron.list`
//! method is used.

pub mod client;
pub mod jsonrpc;
pub mod source;

pub use client::{GatewayClient, GatewayClientError};
pub use source::GatewayJobSource;
