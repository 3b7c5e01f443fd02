use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::ClientResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Portfolios,
    Properties,
    Stocks,
    Dashboard,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Portfolios => "portfolios",
            Resource::Properties => "properties",
            Resource::Stocks => "stocks",
            Resource::Dashboard => "dashboard",
        };
        f.write_str(name)
    }
}

/// Optional parent-portfolio filter of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Portfolio(i64),
}

impl From<Option<i64>> for Scope {
    fn from(portfolio_id: Option<i64>) -> Self {
        portfolio_id.map(Scope::Portfolio).unwrap_or(Scope::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: Resource,
    pub scope: Scope,
}

impl QueryKey {
    pub fn new(resource: Resource, scope: impl Into<Scope>) -> Self {
        Self {
            resource,
            scope: scope.into(),
        }
    }

    pub fn all(resource: Resource) -> Self {
        Self::new(resource, Scope::All)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    stale: bool,
}

/// Point in the invalidation history of one resource
type Stamp = (u64, u64);

#[derive(Debug, Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    generations: HashMap<Resource, u64>,
    /// Bumped by `clear`
    epoch: u64,
    /// Session generation the entries belong to
    session: Option<u64>,
}

impl State {
    fn stamp(&self, resource: Resource) -> Stamp {
        (self.epoch, self.generations.get(&resource).copied().unwrap_or(0))
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }
}

/// Cache of list reads keyed by (resource, scope).
///
/// Invalidation marks every scope of a resource stale; the next read of a
/// stale or missing key goes to the server. A read that was already in
/// flight when its resource got invalidated is stored stale, so it is
/// fetched again on the next read.
#[derive(Debug, Default)]
pub struct QueryCache {
    state: Mutex<State>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `key` from cache when fresh, otherwise run `fetch` and store it
    pub async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(cached) = self.get(&key) {
            tracing::trace!("cache hit {}", key.resource);
            return Ok(cached);
        }

        let started = self.lock().stamp(key.resource);
        let value = fetch().await?;
        self.store(key, &value, Some(started))?;
        Ok(value)
    }

    /// Fresh cached value, if any
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let state = self.lock();
        let entry = state.entries.get(key).filter(|entry| !entry.stale)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> ClientResult<()> {
        self.store(key, value, None)
    }

    fn store<T: Serialize>(
        &self,
        key: QueryKey,
        value: &T,
        started: Option<Stamp>,
    ) -> ClientResult<()> {
        let value = serde_json::to_value(value)?;
        let mut state = self.lock();
        let stale = started.is_some_and(|stamp| stamp != state.stamp(key.resource));
        if stale {
            tracing::debug!("{} changed during fetch; storing result as stale", key.resource);
        }
        state.entries.insert(key, Entry { value, stale });
        Ok(())
    }

    /// Mark every cached scope of `resource` stale, including reads still in flight
    pub fn invalidate(&self, resource: Resource) -> usize {
        let mut state = self.lock();
        *state.generations.entry(resource).or_default() += 1;

        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.resource == resource {
                entry.stale = true;
                marked += 1;
            }
        }
        tracing::debug!("invalidated {} ({} cached)", resource, marked);
        marked
    }

    pub fn invalidate_all(&self, resources: &[Resource]) {
        for resource in resources {
            self.invalidate(*resource);
        }
    }

    /// `Some(true)` when cached but stale, `None` when never fetched
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.lock().entries.get(key).map(|entry| entry.stale)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop everything cached under an earlier session generation.
    /// Returns true when entries were discarded.
    pub fn follow_session(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.session == Some(generation) {
            return false;
        }

        let had_session = state.session.is_some();
        state.session = Some(generation);
        if had_session {
            tracing::debug!("session ended; dropping {} cached queries", state.entries.len());
            state.clear();
        }
        had_session
    }
}
