//! Tracker inventory port — customizations and raw domain inventory.

use std::future::Future;

use flotilla_domain::error::FlotillaError;
use flotilla_domain::id::InstanceId;
use flotilla_domain::tracker::TrackerCustomization;

/// Tracker identity inventory served by the management backend.
pub trait TrackerInventory {
    /// Operator-defined customizations, shared across instances.
    fn list_customizations(
        &self,
    ) -> impl Future<Output = Result<Vec<TrackerCustomization>, FlotillaError>> + Send;

    /// Raw tracker domains currently reported by an instance.
    fn list_instance_domains(
        &self,
        instance: InstanceId,
    ) -> impl Future<Output = Result<Vec<String>, FlotillaError>> + Send;
}
