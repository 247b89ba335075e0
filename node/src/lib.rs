//! Sprout engine assembly.
//!
//! Wraps the verification orchestrator with what a running service needs:
//! - TOML configuration selecting the HTTP adapters and rule parameters
//! - Prometheus counters for decisions, degraded stages, points and mints
//! - an in-process event bus for recorded activities, milestones and mints

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;

pub use config::EngineConfig;
pub use engine::SproutNode;
pub use error::NodeError;
pub use event::{EngineEvent, EventBus};
pub use metrics::EngineMetrics;
