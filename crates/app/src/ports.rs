//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the use-case layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod rule_backend;
pub mod tracker_inventory;

pub use rule_backend::RuleBackend;
pub use tracker_inventory::TrackerInventory;
