use crate::constants::STREAMING_RESOURCES;
use crate::models::UpstreamConfig;

/// Which upstream a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Graph execution: run start/stream, history.
    Streaming,
    /// Durable CRUD for threads and related entities.
    Record,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::Streaming => "streaming",
            UpstreamKind::Record => "record",
        }
    }
}

/// Run/history subpaths under `threads/{id}` belong to the streaming
/// backend and are the only paths eligible for missing-thread recovery.
pub fn is_run_scoped(segments: &[&str]) -> bool {
    segments.first() == Some(&"threads")
        && segments.len() >= 3
        && (segments[2] == "history" || segments[2].starts_with("runs"))
}

/// Streaming run paths get `accept: text/event-stream` forced.
pub fn is_stream_run(segments: &[&str]) -> bool {
    segments.first() == Some(&"threads")
        && segments.len() >= 3
        && segments[2].starts_with("runs")
        && segments.get(3) == Some(&"stream")
}

/// Decision table, evaluated in order: thread run/history subpaths and the
/// fixed streaming resource names go to the streaming backend, everything
/// else (plain thread CRUD included) to the record backend.
pub fn classify(segments: &[&str]) -> UpstreamKind {
    match segments.first() {
        Some(&"threads") => {
            if is_run_scoped(segments) {
                UpstreamKind::Streaming
            } else {
                UpstreamKind::Record
            }
        }
        Some(first) if STREAMING_RESOURCES.contains(first) => UpstreamKind::Streaming,
        _ => UpstreamKind::Record,
    }
}

/// Resolve the configured base for a kind, falling back to the other base
/// when unconfigured so the proxy stays available under partial
/// configuration. Both-missing is rejected at startup by
/// `GatewayConfig::validate`, never here.
pub fn resolve_base<'a>(upstream: &'a UpstreamConfig, kind: UpstreamKind) -> Option<&'a str> {
    let (primary, fallback) = match kind {
        UpstreamKind::Streaming => (&upstream.streaming_base, &upstream.record_base),
        UpstreamKind::Record => (&upstream.record_base, &upstream.streaming_base),
    };
    primary.as_deref().or(fallback.as_deref())
}

/// Target URL: base with a single trailing slash, joined segments, verbatim
/// query string.
pub fn build_target_url(base: &str, segments: &[&str], query: Option<&str>) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    url.push('/');
    url.push_str(&segments.join("/"));
    if let Some(qs) = query {
        if !qs.is_empty() {
            url.push('?');
            url.push_str(qs);
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(streaming: Option<&str>, record: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            streaming_base: streaming.map(str::to_string),
            record_base: record.map(str::to_string),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn thread_run_and_history_paths_go_to_streaming() {
        assert_eq!(classify(&["threads", "abc", "runs"]), UpstreamKind::Streaming);
        assert_eq!(
            classify(&["threads", "abc", "runs", "stream"]),
            UpstreamKind::Streaming
        );
        assert_eq!(
            classify(&["threads", "abc", "history"]),
            UpstreamKind::Streaming
        );
    }

    #[test]
    fn plain_thread_crud_goes_to_record() {
        assert_eq!(classify(&["threads"]), UpstreamKind::Record);
        assert_eq!(classify(&["threads", "abc"]), UpstreamKind::Record);
        assert_eq!(classify(&["threads", "abc", "state"]), UpstreamKind::Record);
    }

    #[test]
    fn streaming_resources_go_to_streaming() {
        for resource in ["assistants", "deployments", "runs", "schemas", "assets"] {
            assert_eq!(classify(&[resource, "x"]), UpstreamKind::Streaming);
        }
        assert_eq!(classify(&["users", "42"]), UpstreamKind::Record);
    }

    #[test]
    fn stream_run_detection() {
        assert!(is_stream_run(&["threads", "abc", "runs", "stream"]));
        assert!(!is_stream_run(&["threads", "abc", "runs"]));
        assert!(!is_stream_run(&["threads", "abc", "history"]));
    }

    #[test]
    fn base_resolution_falls_back_when_unconfigured() {
        let both = upstream(Some("http://stream"), Some("http://record"));
        assert_eq!(
            resolve_base(&both, UpstreamKind::Streaming),
            Some("http://stream")
        );
        assert_eq!(
            resolve_base(&both, UpstreamKind::Record),
            Some("http://record")
        );

        let stream_only = upstream(Some("http://stream"), None);
        assert_eq!(
            resolve_base(&stream_only, UpstreamKind::Record),
            Some("http://stream")
        );

        let record_only = upstream(None, Some("http://record"));
        assert_eq!(
            resolve_base(&record_only, UpstreamKind::Streaming),
            Some("http://record")
        );

        assert_eq!(resolve_base(&upstream(None, None), UpstreamKind::Record), None);
    }

    #[test]
    fn target_url_normalizes_trailing_slash_and_keeps_query() {
        assert_eq!(
            build_target_url("http://record/", &["threads", "abc"], Some("limit=10")),
            "http://record/threads/abc?limit=10"
        );
        assert_eq!(
            build_target_url("http://record", &["threads"], None),
            "http://record/threads"
        );
    }
}
