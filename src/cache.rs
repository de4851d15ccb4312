//! Keyed cache of remote query results
//!
//! Provides:
//! - `QueryKey`: logical query name plus its filter parameters
//! - `QueryCache::get_or_fetch`: serve fresh entries, fetch stale or missing ones
//! - `affected_queries`: which logical queries a mutation makes stale
//!
//! Entries never expire on their own; they go stale only through
//! `QueryCache::invalidate` or `QueryCache::clear`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;

/// Logical queries the views issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    Properties,
    AvailableProperties,
    Rentals,
    MonthlyRevenue,
    DashboardStats,
    Profile,
}

impl QueryName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::Properties => "properties",
            QueryName::AvailableProperties => "available-properties",
            QueryName::Rentals => "rentals",
            QueryName::MonthlyRevenue => "monthly-revenue",
            QueryName::DashboardStats => "dashboard-stats",
            QueryName::Profile => "profile",
        }
    }
}

/// Query name plus the parameters that distinguish one result from another
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub name: QueryName,
    pub params: Vec<String>,
}

impl QueryKey {
    pub fn new(name: QueryName) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    /// Key for a query scoped to one account; the owner is the first param
    pub fn owned(name: QueryName, owner: Uuid) -> Self {
        Self::new(name).with_param(owner)
    }

    pub fn with_param(mut self, param: impl ToString) -> Self {
        self.params.push(param.to_string());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

/// Writes the views perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateProperty,
    UpdateProperty,
    CreateRental,
    UpdateRental,
    DeactivateRental,
    UpdateProfile,
}

/// Logical queries whose cached results a mutation makes stale
pub fn affected_queries(mutation: Mutation) -> &'static [QueryName] {
    use QueryName::*;
    match mutation {
        Mutation::CreateProperty => &[Properties, AvailableProperties, DashboardStats],
        // Rentals embed the property title.
        Mutation::UpdateProperty => &[Properties, AvailableProperties, Rentals],
        Mutation::CreateRental => &[
            Rentals,
            AvailableProperties,
            Properties,
            MonthlyRevenue,
            DashboardStats,
        ],
        Mutation::UpdateRental | Mutation::DeactivateRental => &[Rentals, MonthlyRevenue, DashboardStats],
        Mutation::UpdateProfile => &[Profile],
    }
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<Value>,
    fresh: bool,
}

/// Cache of query results stored as JSON, one async lock per key.
///
/// Holding the key's lock across the fetch makes concurrent readers of the
/// same key wait for the one in-flight request instead of issuing their own.
#[derive(Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Arc<Mutex<Slot>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: &QueryKey) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock().await;
        slots.entry(key.clone()).or_default().clone()
    }

    /// Cached value for `key`, or the loader's result when missing or stale.
    ///
    /// A failed load leaves the entry as it was and returns the error.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &QueryKey, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = self.slot(key).await;
        let mut slot = slot.lock().await;

        if slot.fresh {
            if let Some(value) = &slot.value {
                debug!(key = %key, "Cache hit");
                return Ok(serde_json::from_value(value.clone())?);
            }
        }

        debug!(key = %key, "Cache miss");
        let loaded = loader().await?;
        slot.value = Some(serde_json::to_value(&loaded)?);
        slot.fresh = true;
        Ok(loaded)
    }

    /// Whether `key` currently holds a fresh value
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        let slot = {
            let slots = self.slots.lock().await;
            match slots.get(key) {
                Some(slot) => slot.clone(),
                None => return false,
            }
        };
        let slot = slot.lock().await;
        slot.fresh
    }

    /// Mark stale every key, any parameters, belonging to the given queries
    pub async fn invalidate_queries(&self, names: &[QueryName]) {
        let targets: Vec<(QueryKey, Arc<Mutex<Slot>>)> = {
            let slots = self.slots.lock().await;
            slots
                .iter()
                .filter(|(key, _)| names.contains(&key.name))
                .map(|(key, slot)| (key.clone(), slot.clone()))
                .collect()
        };

        for (key, slot) in targets {
            slot.lock().await.fresh = false;
            debug!(key = %key, "Invalidated");
        }
    }

    /// Invalidate what `mutation` affects
    pub async fn invalidate(&self, mutation: Mutation) {
        self.invalidate_queries(affected_queries(mutation)).await;
    }

    /// Drop everything, e.g. on sign-out
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_key_display() {
        let key = QueryKey::new(QueryName::MonthlyRevenue).with_param("2024-03");
        assert_eq!(key.to_string(), "monthly-revenue:2024-03");
        assert_eq!(QueryKey::new(QueryName::Rentals).to_string(), "rentals");
    }

    #[test]
    fn test_rental_creation_invalidates_rentals_and_available_properties() {
        let affected = affected_queries(Mutation::CreateRental);
        assert!(affected.contains(&QueryName::Rentals));
        assert!(affected.contains(&QueryName::AvailableProperties));
        assert!(!affected.contains(&QueryName::Profile));
    }

    #[tokio::test]
    async fn test_owners_are_cached_separately() {
        let cache = QueryCache::new();
        let first = QueryKey::owned(QueryName::Properties, Uuid::new_v4());
        let second = QueryKey::owned(QueryName::Properties, Uuid::new_v4());
        assert_ne!(first, second);

        let a: Vec<u32> = cache.get_or_fetch(&first, || async { Ok(vec![1, 2, 3]) }).await.unwrap();
        let b: Vec<u32> = cache.get_or_fetch(&second, || async { Ok(vec![]) }).await.unwrap();
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::new(QueryName::Properties);

        for _ in 0..3 {
            let value: Vec<u32> = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch_for_every_param() {
        let cache = QueryCache::new();
        let march = QueryKey::new(QueryName::MonthlyRevenue).with_param("2024-03");
        let april = QueryKey::new(QueryName::MonthlyRevenue).with_param("2024-04");

        let _: u32 = cache.get_or_fetch(&march, || async { Ok(1) }).await.unwrap();
        let _: u32 = cache.get_or_fetch(&april, || async { Ok(2) }).await.unwrap();

        cache.invalidate(Mutation::CreateRental).await;
        assert!(!cache.is_fresh(&march).await);
        assert!(!cache.is_fresh(&april).await);

        let refreshed: u32 = cache.get_or_fetch(&march, || async { Ok(10) }).await.unwrap();
        assert_eq!(refreshed, 10);
    }

    #[tokio::test]
    async fn test_unaffected_keys_stay_fresh() {
        let cache = QueryCache::new();
        let profile = QueryKey::new(QueryName::Profile);
        let _: String = cache
            .get_or_fetch(&profile, || async { Ok("Ana".to_string()) })
            .await
            .unwrap();

        cache.invalidate(Mutation::CreateProperty).await;
        assert!(cache.is_fresh(&profile).await);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = QueryCache::new();
        let key = QueryKey::new(QueryName::Rentals);

        let failed: Result<u32> = cache
            .get_or_fetch(&key, || async { Err(crate::errors::AppError::remote(503, "down")) })
            .await;
        assert!(failed.is_err());
        assert!(!cache.is_fresh(&key).await);

        let value: u32 = cache.get_or_fetch(&key, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = Arc::new(QueryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(QueryName::Properties);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&key, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(42u32)
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
