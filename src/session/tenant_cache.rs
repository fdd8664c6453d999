use std::collections::HashMap;

use crate::models::Thread;
use crate::session::merge::merge_thread_lists;

/// Keep only threads tagged with the given tenant. Threads without a
/// resolvable tenant are invisible to every tenant-scoped read.
pub fn scope_to_tenant(threads: &[Thread], tenant_id: &str) -> Vec<Thread> {
    threads
        .iter()
        .filter(|thread| thread.tenant_id() == Some(tenant_id))
        .cloned()
        .collect()
}

/// Tenant-keyed store of thread summaries.
///
/// Writes are copy-on-write: every mutation returns a new cache, so a reader
/// holding the previous value never observes a partially updated bucket.
/// Cross-tenant entries in an incoming batch are silently filtered, never
/// stored and never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantThreadCache {
    buckets: HashMap<String, Vec<Thread>>,
}

impl TenantThreadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tenant's bucket with the tenant-scoped subset of
    /// `threads`.
    pub fn write_tenant_threads(&self, tenant_id: &str, threads: &[Thread]) -> Self {
        let mut next = self.clone();
        next.buckets
            .insert(tenant_id.to_string(), scope_to_tenant(threads, tenant_id));
        next
    }

    /// The tenant's bucket, or empty for an unknown tenant.
    pub fn read_tenant_threads(&self, tenant_id: &str) -> &[Thread] {
        self.buckets
            .get(tenant_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Scope `incoming` to the tenant, merge with the existing bucket
    /// (incoming entries first), and write the result back.
    pub fn merge_tenant_threads(&self, tenant_id: &str, incoming: &[Thread]) -> Self {
        let scoped = scope_to_tenant(incoming, tenant_id);
        let merged = merge_thread_lists(self.read_tenant_threads(tenant_id), &scoped);
        let mut next = self.clone();
        next.buckets.insert(tenant_id.to_string(), merged);
        next
    }
}
