//! # flotilla-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound
//!   ports):
//!   - `RuleBackend` — rule CRUD, reordering, and trial evaluation on a
//!     managed instance
//!   - `TrackerInventory` — tracker customizations and per-instance raw
//!     domain inventory
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RuleService` — validated CRUD and rule duplication
//!   - `ActivationWorkflow` — preview-gated enabling of destructive rules
//!   - `RuleListService` — ordered per-instance views with optimistic
//!     reordering and rollback
//!   - `TrackerService` — memoized tracker identity resolution
//! - Orchestrate domain objects without knowing *how* the managed instance
//!   is reached
//!
//! ## Dependency rule
//! Depends on `flotilla-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
