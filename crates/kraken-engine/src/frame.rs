//! Frame loop driving a [`World`].
//!
//! The [`FrameLoop`] advances the simulation one frame at a time. Each frame:
//!
//! 1. The frame delta is clamped to `max_delta_time`.
//! 2. All registered systems run in registration order, each with mutable
//!    access to the [`World`] and the frame delta.
//! 3. [`World::update`] runs every entity's components and state machine.
//! 4. The frame counter and elapsed simulation time advance.
//!
//! [`FrameLoop::tick`] steps by the configured `fixed_dt`;
//! [`FrameLoop::advance`] takes a delta measured by the caller.
//!
//! # Example
//!
//! ```
//! use kraken_engine::config::EngineConfig;
//! use kraken_engine::frame::FrameLoop;
//! use kraken_ecs::prelude::*;
//!
//! let mut frame_loop = FrameLoop::new(EngineConfig::default());
//!
//! frame_loop.add_system("spawner", |world, _dt| {
//!     if world.entity_count() == 0 {
//!         world.spawn_named("player");
//!     }
//! });
//!
//! frame_loop.run_frames(10);
//!
//! assert_eq!(frame_loop.frame_count(), 10);
//! assert_eq!(frame_loop.world().entity_count(), 1);
//! ```

use std::time::{Duration, Instant};

use kraken_ecs::log::Logbook;
use kraken_ecs::world::World;

use crate::config::EngineConfig;

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Time spent in [`World::update`].
    pub world_update_time: Duration,
    /// Total time for the frame (systems + world update).
    pub total_time: Duration,
    /// Delta actually applied, after clamping.
    pub delta_time: f64,
    /// Whether the requested delta was clamped.
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// A system run once per frame before the entity update pass.
pub type SystemFn = fn(&mut World, f64);

#[derive(Debug)]
struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

/// Steps a [`World`] frame by frame, running the registered systems before
/// each entity update pass.
pub struct FrameLoop {
    world: World,
    systems: Vec<RegisteredSystem>,
    frame_counter: u64,
    /// Sum of applied deltas.
    elapsed: f64,
    config: EngineConfig,
    last_diagnostics: FrameDiagnostics,
}

impl FrameLoop {
    /// Create a frame loop over a fresh world whose log book keeps
    /// `config.log_capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Self {
        let world = World::with_logbook(Logbook::with_capacity(config.log_capacity));
        Self::with_world(world, config)
    }

    /// Create a frame loop over an existing world. The world keeps its own
    /// log book.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`EngineConfig::validate`].
    pub fn with_world(world: World, config: EngineConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid engine config: {err}");
        }
        Self {
            world,
            systems: Vec::new(),
            frame_counter: 0,
            elapsed: 0.0,
            config,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Register a system to be run each frame, after those already
    /// registered.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Run one frame of `fixed_dt` seconds.
    pub fn tick(&mut self) {
        self.step(self.config.fixed_dt, false);
    }

    /// Run one frame of `delta_time` seconds, clamped to
    /// `[0, max_delta_time]`. NaN counts as zero. Returns the delta applied.
    pub fn advance(&mut self, delta_time: f64) -> f64 {
        let max = self.config.max_delta_time;
        let applied = if delta_time.is_nan() {
            0.0
        } else {
            delta_time.clamp(0.0, max)
        };
        let clamped = applied != delta_time;
        if clamped {
            tracing::debug!(requested = delta_time, applied, "frame delta clamped");
        }
        self.step(applied, clamped);
        applied
    }

    /// Run `count` fixed-step frames.
    pub fn run_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    fn step(&mut self, delta_time: f64, clamped: bool) {
        let frame_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());

        for system in &self.systems {
            let sys_start = Instant::now();
            (system.func)(&mut self.world, delta_time);
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        let update_start = Instant::now();
        self.world.update(delta_time);
        let world_update_time = update_start.elapsed();

        self.frame_counter += 1;
        self.elapsed += delta_time;

        self.last_diagnostics = FrameDiagnostics {
            system_times,
            world_update_time,
            total_time: frame_start.elapsed(),
            delta_time,
            clamped,
        };
    }

    // -- accessors ----------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Simulated seconds so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Diagnostics from the last frame (timing per system).
    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("frame_counter", &self.frame_counter)
            .field("elapsed", &self.elapsed)
            .field("systems", &self.system_names())
            .field("entities", &self.world.entity_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
