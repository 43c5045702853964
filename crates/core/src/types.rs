/// Backend-assigned file identifiers are opaque strings.
pub type FileId = String;

/// Auth-provider user identifiers (UUID text).
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Caller-supplied or resolved operation options, keyed by wire name.
pub type OptionMap = serde_json::Map<String, serde_json::Value>;
