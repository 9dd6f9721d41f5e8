pub mod call_control_error;
pub mod webhook_error;

pub use call_control_error::{CallControlError, CallControlResult};
pub use webhook_error::{WebhookError, WebhookResult};
