// ==========================================
// mHealth Barangay San Cristobal - Notification Layer
// ==========================================

pub mod notifier;
pub mod sms;

pub use notifier::{NotificationError, Notifier, NullNotifier};
pub use sms::SmsGatewayClient;
