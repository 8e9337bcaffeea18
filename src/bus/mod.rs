//! Event bus dispatch core
//!
//! This module provides the `EventBus` itself: per-tag controllers holding the
//! subscriber set and bounded cache, the pause/resume gate with its ordered
//! pending queue, and the publish/deliver control flow.

// Core struct and constructors
mod core;

// Functionality implementations
mod impls;
mod introspection;
mod lifecycle;
mod pause;
mod publishing;
mod subscriptions;

// Re-export the main types
pub use core::EventBus;
pub use publishing::{BatchPublishOutcome, PublishOutcome};
