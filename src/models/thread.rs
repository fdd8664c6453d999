use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Speaker of one conversation turn. Anything outside the three allowed
/// roles deserializes to `Unknown` and is discarded by the merge engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    #[default]
    Assistant,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Role::Unknown)
    }
}

/// One turn in a conversation. `id` may be empty for legacy messages, in
/// which case `(text, timestamp)` is the identity used for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub text: String,
    /// ISO-8601 string. Kept as a string end to end; only parsed to decide
    /// whether an id-less message has a usable identity.
    #[serde(default)]
    pub timestamp: String,
}

impl ChatMessage {
    /// A message with no non-empty id needs non-blank text and a parsable
    /// timestamp to count as valid.
    pub fn has_usable_identity(&self) -> bool {
        if !self.id.is_empty() {
            return true;
        }
        !self.text.trim().is_empty() && parse_timestamp(&self.timestamp).is_some()
    }
}

fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc3339(raw).ok()
}

/// One persisted conversation. `metadata.tenant_id` scopes the thread to a
/// tenant; a thread without it is invisible to every tenant-scoped read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub values: Value,
}

impl Thread {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            created_at: None,
            updated_at: None,
            metadata: Map::new(),
            values: Value::Null,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.metadata.get("tenant_id").and_then(Value::as_str)
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.metadata
            .insert("tenant_id".to_string(), Value::String(tenant_id.into()));
        self
    }
}

/// One row of the record backend's `GET /threads` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRow {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub context_key: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_updated_at: Option<String>,
}
