//! In-memory frontier and plan stores, used by the dev binary and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::plan::DiscoveryPlan;
use crate::traits::{FrontierItem, FrontierStore, PlanStore};

/// Writers surface a poisoned lock as an error. Readers take a snapshot of
/// whatever the last completed write left behind.
fn lock_for_write<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow!("{store} lock poisoned by an earlier panic"))
}

fn lock_for_read<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the last write per `(patch, id)`, insertion order preserved.
#[derive(Default)]
pub struct MemoryFrontier {
    items: Mutex<Vec<(String, FrontierItem)>>,
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self, patch_id: &str) -> Vec<FrontierItem> {
        lock_for_read(&self.items)
            .iter()
            .filter(|(patch, _)| patch == patch_id)
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Items ordered the way a crawler would pop them: highest priority first.
    pub fn by_priority(&self, patch_id: &str) -> Vec<FrontierItem> {
        let mut items = self.items(patch_id);
        items.sort_by(|a, b| b.priority.cmp(&a.priority));
        items
    }

    pub fn len(&self) -> usize {
        lock_for_read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FrontierStore for MemoryFrontier {
    async fn add_to_frontier(&self, patch_id: &str, item: FrontierItem) -> Result<()> {
        let mut items = lock_for_write(&self.items, "frontier")?;
        match items
            .iter_mut()
            .find(|(patch, existing)| patch == patch_id && existing.id == item.id)
        {
            Some((_, existing)) => *existing = item,
            None => items.push((patch_id.to_string(), item)),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPlanStore {
    plans: Mutex<HashMap<String, DiscoveryPlan>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, run_id: &str) -> Option<DiscoveryPlan> {
        lock_for_read(&self.plans).get(run_id).cloned()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn store_discovery_plan(&self, run_id: &str, plan: &DiscoveryPlan) -> Result<()> {
        lock_for_write(&self.plans, "plan store")?.insert(run_id.to_string(), plan.clone());
        Ok(())
    }
}
