//! Notification domain model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    Trigger,
    Task,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub source_type: NotificationSource,
    pub source_id: String,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        notification_type: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        source_type: NotificationSource,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_type: notification_type.into(),
            title: title.into(),
            message: message.into(),
            source_type,
            source_id: source_id.into(),
            dismissed: false,
            created_at: Utc::now(),
            expires_at: None,
        }
    }
}
