use std::collections::HashSet;

use crate::models::{ChatMessage, Thread};

/// Merge two message lists into one deduplicated conversation.
///
/// `existing` is walked first, so on id collisions the already-held copy
/// wins. Candidates without a usable identity (no id, and no valid
/// text/timestamp pair) and candidates with a role outside
/// system/user/assistant are dropped. The result keeps stable insertion
/// order of first-seen entries; it is never re-sorted by timestamp.
pub fn merge_messages(existing: &[ChatMessage], incoming: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_text_ts: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for message in existing.iter().chain(incoming.iter()) {
        if !message.role.is_allowed() || !message.has_usable_identity() {
            continue;
        }

        if message.id.is_empty() {
            // Legacy messages dedupe by content identity.
            let key = (message.text.clone(), message.timestamp.clone());
            if !seen_text_ts.insert(key) {
                continue;
            }
        } else if !seen_ids.insert(message.id.clone()) {
            continue;
        }

        merged.push(message.clone());
    }

    merged
}

/// Merge two thread lists, deduplicating by `thread_id`.
///
/// `incoming` is walked first so freshly fetched data supersedes stale
/// copies carried in `existing`; leftover unique `existing` entries are
/// appended after, each side keeping its original relative order. Callers
/// rely on freshly touched threads surfacing first.
pub fn merge_thread_lists(existing: &[Thread], incoming: &[Thread]) -> Vec<Thread> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for thread in incoming.iter().chain(existing.iter()) {
        if seen.insert(thread.thread_id.as_str()) {
            merged.push(thread.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    fn msg(id: &str, role: Role, text: &str, timestamp: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            role,
            text: text.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn thread(id: &str, version: &str) -> Thread {
        let mut t = Thread::new(id).with_tenant("tenant-a");
        t.values = json!({ "version": version });
        t
    }

    #[test]
    fn dedupes_by_id_preserving_first_seen_and_insertion_order() {
        let initial = vec![
            msg("sys-1", Role::System, "System ready", "2024-01-01T00:00:00.000Z"),
            msg("user-1", Role::User, "Hello", "2024-01-01T00:00:05.000Z"),
        ];
        // Same user message re-delivered with a later timestamp.
        let update = vec![
            msg("user-1", Role::User, "Hello", "2024-01-01T00:01:00.000Z"),
            msg("assistant-1", Role::Assistant, "Hi there!", "2024-01-01T00:01:05.000Z"),
        ];

        let merged = merge_messages(&initial, &update);

        assert_eq!(merged.len(), 3);
        let ids: Vec<&str> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["sys-1", "user-1", "assistant-1"]);
        // First-seen copy wins: the original timestamp survives.
        assert_eq!(merged[1].timestamp, "2024-01-01T00:00:05.000Z");
    }

    #[test]
    fn idless_messages_dedupe_by_text_and_timestamp() {
        let a = msg("", Role::User, "same", "2024-01-01T00:00:00Z");
        let b = msg("", Role::User, "same", "2024-01-01T00:00:00Z");
        let c = msg("", Role::User, "same", "2024-01-01T00:00:01Z");

        let merged = merge_messages(&[a], &[b, c]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn drops_candidates_without_usable_identity_or_allowed_role() {
        let no_identity = msg("", Role::User, "   ", "2024-01-01T00:00:00Z");
        let bad_timestamp = msg("", Role::User, "text", "yesterday");
        let bad_role = msg("m-1", Role::Unknown, "text", "2024-01-01T00:00:00Z");
        let kept = msg("m-2", Role::Assistant, "text", "2024-01-01T00:00:00Z");

        let merged = merge_messages(&[no_identity, bad_timestamp], &[bad_role, kept]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "m-2");
    }

    #[test]
    fn merge_messages_is_idempotent() {
        let a = vec![
            msg("sys-1", Role::System, "ready", "2024-01-01T00:00:00Z"),
            msg("", Role::User, "legacy", "2024-01-01T00:00:01Z"),
        ];
        let b = vec![msg("user-1", Role::User, "hi", "2024-01-01T00:00:02Z")];

        let once = merge_messages(&a, &b);
        let twice = merge_messages(&once, &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn thread_merge_prefers_incoming_then_appends_unique_existing() {
        let existing = vec![thread("shared-thread", "old"), thread("legacy-thread", "v1")];
        let incoming = vec![thread("shared-thread", "new"), thread("fresh-thread", "v1")];

        let merged = merge_thread_lists(&existing, &incoming);

        let ids: Vec<&str> = merged.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(ids, ["shared-thread", "fresh-thread", "legacy-thread"]);
        assert_eq!(merged[0].values["version"], "new");
    }

    #[test]
    fn thread_merge_with_empty_incoming_keeps_existing_order() {
        let existing = vec![thread("a", "v1"), thread("b", "v1")];
        let merged = merge_thread_lists(&existing, &[]);
        let ids: Vec<&str> = merged.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}
