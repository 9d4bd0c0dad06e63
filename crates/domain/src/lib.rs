//! # flotilla-domain
//!
//! Pure domain model for the flotilla torrent-automation manager.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Rules** (tracker-scoped, condition-gated single-action
//!   automations owned by a managed instance)
//! - Define **Conditions** (the opaque boolean tree gating a rule's action)
//! - Define **Tracker identities** (customizations merging raw tracker
//!   domains into operator-facing options, and the derived lookup index)
//! - Define **Previews** (trial-evaluation results with paginated examples)
//! - Define the **Rule form** (flat editable state that encodes to and
//!   decodes from the persisted rule shape, with all pre-submit validation)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod form;
pub mod preview;
pub mod rule;
pub mod tracker;
