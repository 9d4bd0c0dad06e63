//! # flotilla-adapter-http-axum
//!
//! HTTP adapter using axum — the REST surface operator UIs drive.
//!
//! ## Responsibilities
//! - Expose rule CRUD, reordering, duplication, and tracker resolution per
//!   managed instance
//! - Enforce the preview gate over HTTP: enabling a destructive rule answers
//!   `202 Accepted` with a preview session instead of committing; the UI
//!   opens its confirmation dialog on that response and drives the
//!   `more`/`confirm`/`cancel` endpoints
//! - Map domain errors to HTTP status codes
//!
//! ## Dependency rule
//! Depends on `flotilla-app` (services + ports) and `flotilla-domain` only.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
