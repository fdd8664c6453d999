use serde::Deserialize;
use serde_json::json;

use crate::models::{Thread, ThreadRow};

/// Shape of the record backend's `GET /threads` response.
#[derive(Debug, Deserialize)]
pub struct ThreadListing {
    #[serde(default)]
    pub items: Vec<ThreadRow>,
}

/// Map record-backend listing rows into `Thread` values.
///
/// Each row gets a synthesized display message derived from its `label`, so
/// the sidebar can render a title without fetching the conversation. Tenant
/// precedence: an explicit `tenant_override` beats the row's `context_key`
/// claim; with neither, the thread carries no tenant and stays invisible to
/// tenant-scoped reads.
pub fn threads_from_listing(rows: &[ThreadRow], tenant_override: Option<&str>) -> Vec<Thread> {
    rows.iter()
        .map(|row| thread_from_row(row, tenant_override))
        .collect()
}

fn thread_from_row(row: &ThreadRow, tenant_override: Option<&str>) -> Thread {
    let mut thread = Thread::new(row.id.clone());
    thread.created_at = row.created_at.clone();
    thread.updated_at = row.last_updated_at.clone();

    let tenant = tenant_override.or(row.context_key.as_deref());
    if let Some(tenant_id) = tenant {
        thread = thread.with_tenant(tenant_id);
    }

    let label = row.label.as_deref().unwrap_or("").trim();
    if !label.is_empty() {
        let timestamp = row
            .last_updated_at
            .as_deref()
            .or(row.created_at.as_deref())
            .unwrap_or("");
        thread.values = json!({
            "messages": [{
                "id": format!("{}-label", row.id),
                "role": "user",
                "text": label,
                "timestamp": timestamp,
            }]
        });
    }

    thread
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, label: Option<&str>, context_key: Option<&str>) -> ThreadRow {
        ThreadRow {
            id: id.to_string(),
            label: label.map(str::to_string),
            context_key: context_key.map(str::to_string),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            last_updated_at: Some("2024-01-02T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn maps_rows_with_synthesized_display_message() {
        let rows = vec![row("t-1", Some("Quarterly report"), Some("tenant-a"))];
        let threads = threads_from_listing(&rows, None);

        assert_eq!(threads.len(), 1);
        let thread = &threads[0];
        assert_eq!(thread.thread_id, "t-1");
        assert_eq!(thread.tenant_id(), Some("tenant-a"));
        assert_eq!(thread.updated_at.as_deref(), Some("2024-01-02T00:00:00Z"));

        let message = &thread.values["messages"][0];
        assert_eq!(message["text"], "Quarterly report");
        assert_eq!(message["timestamp"], "2024-01-02T00:00:00Z");
    }

    #[test]
    fn explicit_tenant_override_beats_row_claim() {
        let rows = vec![row("t-1", Some("Label"), Some("tenant-a"))];
        let threads = threads_from_listing(&rows, Some("tenant-b"));
        assert_eq!(threads[0].tenant_id(), Some("tenant-b"));
    }

    #[test]
    fn blank_label_produces_no_display_message() {
        let rows = vec![row("t-1", Some("   "), None)];
        let threads = threads_from_listing(&rows, None);
        assert!(threads[0].values.is_null());
        assert_eq!(threads[0].tenant_id(), None);
    }

    #[test]
    fn listing_payload_deserializes() {
        let payload = r#"{"items":[{"id":"t-1","label":"Hi","context_key":"tenant-a",
            "created_at":"2024-01-01T00:00:00Z","last_updated_at":"2024-01-02T00:00:00Z"}]}"#;
        let listing: ThreadListing = serde_json::from_str(payload).unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, "t-1");
    }
}
