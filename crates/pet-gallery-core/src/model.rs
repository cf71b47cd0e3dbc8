use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// One entry of the remote pet catalog.
///
/// `url` doubles as the identity of a pet within a session; the upstream
/// payload carries no separate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PetRecord {
    pub title: String,
    pub description: String,
    pub url: String,
}

impl PetRecord {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
        }
    }
}

/// Title ordering applied by the gallery view.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "A-Z", alias = "asc")]
    #[strum(to_string = "A-Z", serialize = "asc", ascii_case_insensitive)]
    AscendingTitle,
    #[serde(rename = "Z-A", alias = "desc")]
    #[strum(to_string = "Z-A", serialize = "desc", ascii_case_insensitive)]
    DescendingTitle,
}

/// A persisted record of one image packaged into an export archive.
///
/// `title` is `None` when the exported url had no matching catalog entry at
/// export time. `downloaded_at` is kept as the raw RFC 3339 string; display
/// formatting happens when the history is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadHistoryEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    pub downloaded_at: String,
}

impl DownloadHistoryEntry {
    pub fn new(title: Option<String>, url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            title,
            url: url.into(),
            downloaded_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parse the stored timestamp. Entries written by older clients may carry
    /// an unparsable value; those yield `None`.
    pub fn downloaded_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.downloaded_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn sort_order_wire_names() {
        assert_eq!(SortOrder::AscendingTitle.to_string(), "A-Z");
        assert_eq!(SortOrder::DescendingTitle.to_string(), "Z-A");
        assert_eq!(SortOrder::from_str("Z-A").unwrap(), SortOrder::DescendingTitle);
        assert_eq!(SortOrder::from_str("ASC").unwrap(), SortOrder::AscendingTitle);
        assert!(SortOrder::from_str("sideways").is_err());

        let json = serde_json::to_string(&SortOrder::DescendingTitle).unwrap();
        assert_eq!(json, "\"Z-A\"");
    }

    #[test]
    fn history_entry_uses_camel_case_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let entry = DownloadHistoryEntry::new(Some("Bella".into()), "https://x/b.jpg", at);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["downloadedAt"], "2024-03-01T12:30:00.000Z");
        assert_eq!(entry.downloaded_at_utc(), Some(at));
    }

    #[test]
    fn history_entry_tolerates_missing_title_and_url() {
        let entry: DownloadHistoryEntry =
            serde_json::from_str(r#"{"downloadedAt":"2024-03-01T12:30:00.000Z"}"#).unwrap();
        assert_eq!(entry.title, None);
        assert_eq!(entry.url, "");
    }
}
