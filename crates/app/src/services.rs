//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic
//! parameters (constructor injection), keeping this layer decoupled from
//! concrete adapters.

pub mod activation;
pub mod rule_list;
pub mod rule_service;
pub mod tracker_service;
