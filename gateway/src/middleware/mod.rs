pub mod webhook_auth;

// Re-export middleware functions
pub use webhook_auth::{VAPI_SECRET_HEADER, webhook_secret_middleware};
