//! Tracker directory — memoized identity resolution over instance inventory.
//!
//! The lookup index is a pure function of the customization list; it is
//! cached against a fingerprint of that list and rebuilt only when the list
//! actually changes.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flotilla_domain::error::FlotillaError;
use flotilla_domain::id::InstanceId;
use flotilla_domain::tracker::{TrackerCustomization, TrackerIndex, TrackerOption};

use crate::ports::TrackerInventory;

fn fingerprint(customizations: &[TrackerCustomization]) -> u64 {
    let mut hasher = DefaultHasher::new();
    customizations.hash(&mut hasher);
    hasher.finish()
}

struct CachedIndex {
    fingerprint: u64,
    index: Arc<TrackerIndex>,
}

/// Application service resolving tracker identities for editing surfaces.
pub struct TrackerService<I> {
    inventory: I,
    cached: Mutex<Option<CachedIndex>>,
}

impl<I: TrackerInventory> TrackerService<I> {
    /// Create a new service backed by the given inventory.
    pub fn new(inventory: I) -> Self {
        Self {
            inventory,
            cached: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedIndex>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current customization list.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the inventory.
    pub async fn customizations(&self) -> Result<Vec<TrackerCustomization>, FlotillaError> {
        self.inventory.list_customizations().await
    }

    /// Raw tracker domains reported by an instance.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the inventory.
    pub async fn instance_domains(
        &self,
        instance: InstanceId,
    ) -> Result<Vec<String>, FlotillaError> {
        self.inventory.list_instance_domains(instance).await
    }

    /// The current tracker index, rebuilt only when the customization list
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the inventory.
    pub async fn index(&self) -> Result<Arc<TrackerIndex>, FlotillaError> {
        let customizations = self.inventory.list_customizations().await?;
        let current = fingerprint(&customizations);
        {
            let cached = self.lock();
            if let Some(entry) = cached.as_ref() {
                if entry.fingerprint == current {
                    return Ok(Arc::clone(&entry.index));
                }
            }
        }
        let index = Arc::new(TrackerIndex::build(&customizations));
        *self.lock() = Some(CachedIndex {
            fingerprint: current,
            index: Arc::clone(&index),
        });
        Ok(index)
    }

    /// Selectable tracker options for an instance.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the inventory.
    #[tracing::instrument(skip(self))]
    pub async fn options(
        &self,
        instance: InstanceId,
    ) -> Result<Vec<TrackerOption>, FlotillaError> {
        let index = self.index().await?;
        let domains = self.inventory.list_instance_domains(instance).await?;
        Ok(index.build_options(&domains))
    }
}
