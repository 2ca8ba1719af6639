//! Metadata bridge for a Shizou media-server backend.
//!
//! The core is [`ClientManager`]: one long-lived authenticated session
//! with single-flight re-login, a sliding-expiration response cache, and
//! a retry-once-after-login wrapper around every backend call. Around it
//! sit the provider adapters (series, season, episode, image), the
//! watched-state sync, and housekeeping tasks, all consumed by a media
//! server host through the types in [`host`].

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod ids;
pub mod logging;
pub mod models;
pub mod providers;
pub mod sync;
pub mod tasks;

pub use client::{ClientManager, HttpApi, RawResponse, ShizouApi};
pub use config::{BridgeConfig, SharedConfig};
pub use error::ApiError;
