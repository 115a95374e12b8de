//! Animated fluid background engine.
//!
//! This crate handles:
//! - Blob configuration (layers, drift, breathing, symbolic geometry)
//! - The motion model
//! - An ordered blob registry with incremental updates
//! - Viewport tracking and backing-store sizing
//! - Frame scheduling with an optional frame-rate ceiling
//! - Painting blobs as layered radial gradients

pub mod blob;
pub mod config;
pub mod engine;
pub mod motion;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod viewport;

pub use blob::{Blob, BlobPatch, BreathSpec, CenterFn, CenterSpec, DriftSpec, Layer};
pub use config::EngineOptions;
pub use engine::FluidEngine;
pub use motion::{breath, drift, BreathState};
pub use registry::{BlobEntry, BlobRegistry, UpdateOutcome};
pub use renderer::{place_blob, render_frame, BlobPlacement, FrameParams};
pub use scheduler::{FrameCallback, FrameHandle, FrameHost, FrameScheduler, ManualFrameHost};
pub use viewport::{Viewport, ViewportTracker};

/// Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
