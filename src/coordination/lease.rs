//! Leadership lease: time-bounded mutual exclusion renewed by heartbeat.
//! Expiry without renewal releases the grant.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Mutual-exclusion grant with expiry.
///
/// The worker treats any `acquire` failure as "another instance is active"
/// and does not start. A failed `refresh` means the grant was lost; the
/// holder must stop claiming work.
pub trait LeadershipLease: Send + Sync {
    fn acquire(&self, key: &str, ttl: Duration) -> bool;
    fn refresh(&self, key: &str) -> bool;
    fn release(&self, key: &str);
}

#[derive(Debug, Clone)]
struct LeaseGrant {
    holder: Uuid,
    ttl: Duration,
    expires_at: Instant,
}

/// In-memory TTL lease.
///
/// One `InMemoryLease` value is one client handle with its own identity;
/// `handle()` derives further handles over the same shared lease table, which
/// is how tests model competing worker instances.
pub struct InMemoryLease {
    grants: Arc<DashMap<String, LeaseGrant>>,
    holder: Uuid,
}

impl InMemoryLease {
    pub fn new() -> Self {
        Self {
            grants: Arc::new(DashMap::new()),
            holder: Uuid::new_v4(),
        }
    }

    /// A second client handle sharing this lease table.
    pub fn handle(&self) -> Self {
        Self {
            grants: self.grants.clone(),
            holder: Uuid::new_v4(),
        }
    }
}

impl Default for InMemoryLease {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadershipLease for InMemoryLease {
    fn acquire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entry = self.grants.entry(key.to_string()).or_insert(LeaseGrant {
            holder: self.holder,
            ttl,
            expires_at: now + ttl,
        });

        if entry.holder == self.holder || entry.expires_at <= now {
            // Our own grant, a fresh insert, or an expired one: take it over.
            entry.holder = self.holder;
            entry.ttl = ttl;
            entry.expires_at = now + ttl;
            tracing::debug!("Acquired lease '{}'", key);
            true
        } else {
            tracing::debug!("Lease '{}' held by another instance", key);
            false
        }
    }

    fn refresh(&self, key: &str) -> bool {
        let now = Instant::now();
        if let Some(mut entry) = self.grants.get_mut(key) {
            // An expired grant cannot be refreshed, even by its holder.
            if entry.holder == self.holder && entry.expires_at > now {
                entry.expires_at = now + entry.ttl;
                return true;
            }
        }
        false
    }

    fn release(&self, key: &str) {
        self.grants
            .remove_if(key, |_, grant| grant.holder == self.holder);
        tracing::debug!("Released lease '{}'", key);
    }
}
