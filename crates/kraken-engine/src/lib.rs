//! Kraken Engine -- frame loop, configuration and logging setup around the
//! [`kraken_ecs`] entity/component core.
//!
//! This crate is the outer layer a game binary talks to: it loads an
//! [`EngineConfig`](config::EngineConfig), installs a `tracing` subscriber,
//! and drives a [`World`](kraken_ecs::world::World) with a
//! [`FrameLoop`](frame::FrameLoop) that runs registered systems and then the
//! entity update pass.
//!
//! # Quick Start
//!
//! ```
//! use kraken_engine::prelude::*;
//! use glam::Vec2;
//!
//! let mut frame_loop = FrameLoop::new(EngineConfig::default());
//!
//! let world = frame_loop.world_mut();
//! let id = world.spawn_named("drone");
//! world.entity_mut(id).unwrap().add_components(vec![
//!     Box::new(Agent::new()) as Box<dyn Component>,
//!     Box::new(AgentGoalComponent::for_objective(Objective::Seek(Vec2::new(5.0, 0.0)))),
//! ]);
//!
//! frame_loop.run_frames(30);
//!
//! let drone = frame_loop.world().entity(id).unwrap();
//! assert!(drone.component::<Agent>(AGENT).unwrap().position.x > 0.0);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod logging;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use kraken_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use kraken_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::frame::{FrameDiagnostics, FrameLoop, SystemFn};
    pub use crate::logging::init_tracing;
}
