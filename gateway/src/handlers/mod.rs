//! HTTP request handlers
//!
//! - `api` - Health check and timer status endpoints
//! - `webhook` - Vapi webhook receiver

pub mod api;
pub mod webhook;

pub use webhook::vapi_webhook;
