// ==========================================
// mHealth Barangay San Cristobal - Notifier Trait
// ==========================================
// Responsibility: the seam between the import engine and the outside
// world. Delivery is best effort; the engine logs a failure here and
// moves on.
// ==========================================

use crate::domain::Contact;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("sms transport failed: {0}")]
    Transport(String),

    #[error("sms gateway rejected message: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(err.to_string())
    }
}

// ==========================================
// Notifier Trait
// ==========================================
// Implementors: SmsGatewayClient; NullNotifier for preview runs and
// tests
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the welcome message to one newly created subject.
    async fn notify(&self, contact: &Contact) -> Result<(), NotificationError>;
}

/// Notifier that delivers nothing and always succeeds.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _contact: &Contact) -> Result<(), NotificationError> {
        Ok(())
    }
}
