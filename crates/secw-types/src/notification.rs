use serde::{Deserialize, Serialize};

use crate::Document;

/// Publish topic carrying the change events.
pub const NOTIFICATIONS_TOPIC: &str = "SECW_NOTIFICATIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationAction {
    Created,
    Updated,
    Deleted,
}

/// One event per successful mutation. The `old`/`new` documents are always
/// redacted copies; secrets never ride the notification stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub action: NotificationAction,
    pub portfolio: String,
    pub old: Option<Document>,
    pub new: Option<Document>,
    #[serde(rename = "nonSecretChanged", skip_serializing_if = "Option::is_none", default)]
    pub non_secret_changed: Option<bool>,
    #[serde(rename = "secretChanged", skip_serializing_if = "Option::is_none", default)]
    pub secret_changed: Option<bool>,
    /// Per-portfolio counter; consumers can rely on it being dense and
    /// strictly increasing for a given portfolio.
    pub sequence: u64,
}

impl Notification {
    pub fn created(portfolio: impl Into<String>, new: Document, sequence: u64) -> Notification {
        Notification {
            action: NotificationAction::Created,
            portfolio: portfolio.into(),
            old: None,
            new: Some(new),
            non_secret_changed: None,
            secret_changed: None,
            sequence,
        }
    }

    pub fn updated(
        portfolio: impl Into<String>,
        old: Document,
        new: Document,
        non_secret_changed: bool,
        secret_changed: bool,
        sequence: u64,
    ) -> Notification {
        Notification {
            action: NotificationAction::Updated,
            portfolio: portfolio.into(),
            old: Some(old),
            new: Some(new),
            non_secret_changed: Some(non_secret_changed),
            secret_changed: Some(secret_changed),
            sequence,
        }
    }

    pub fn deleted(portfolio: impl Into<String>, old: Document, sequence: u64) -> Notification {
        Notification {
            action: NotificationAction::Deleted,
            portfolio: portfolio.into(),
            old: Some(old),
            new: None,
            non_secret_changed: None,
            secret_changed: None,
            sequence,
        }
    }
}
