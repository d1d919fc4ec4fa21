//! Closed string enumerations stored as text columns.
//!
//! Values are persisted as their snake_case string form; unknown values read
//! back from the database surface as parse errors rather than panics.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// The kind of system a data source was ingested from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    /// Uploaded CSV export.
    Csv,
    /// Uploaded spreadsheet (XLSX).
    Spreadsheet,
    /// External database extract.
    Database,
}

/// Lifecycle status of a data source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataSourceStatus {
    /// Created, not yet processed.
    Pending,
    /// Ingestion in progress.
    Processing,
    /// Processed and searchable.
    Connected,
    /// Last processing attempt failed.
    Failed,
    /// Soft-deleted; hidden from queries.
    Deleted,
}

/// Author role of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// End-user message.
    User,
    /// Assistant response.
    Assistant,
    /// System prompt or notice.
    System,
    /// Error surfaced as a message.
    Error,
}

/// Processing status of a chat message.
///
/// Transitions are loading -> complete or loading -> error only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Response generation in flight.
    Loading,
    /// Response complete.
    Complete,
    /// Response failed.
    Error,
}

impl MessageStatus {
    /// Returns whether a transition to `next` is legal.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (MessageStatus::Loading, MessageStatus::Complete)
                | (MessageStatus::Loading, MessageStatus::Error)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_enum_round_trip() {
        assert_eq!(DataSourceStatus::Connected.as_ref(), "connected");
        assert_eq!(
            DataSourceStatus::from_str("connected").unwrap(),
            DataSourceStatus::Connected
        );
        assert_eq!(ChatRole::Assistant.as_ref(), "assistant");
        assert!(ChatRole::from_str("robot").is_err());
    }

    #[test]
    fn test_message_status_transitions() {
        assert!(MessageStatus::Loading.can_transition_to(MessageStatus::Complete));
        assert!(MessageStatus::Loading.can_transition_to(MessageStatus::Error));
        assert!(!MessageStatus::Complete.can_transition_to(MessageStatus::Loading));
        assert!(!MessageStatus::Error.can_transition_to(MessageStatus::Complete));
    }
}
