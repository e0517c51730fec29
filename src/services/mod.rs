//! Notification delivery services.

mod sink;
mod webhook;

pub use sink::{Message, NotificationSink, NullSink};
pub use webhook::WebhookSink;
