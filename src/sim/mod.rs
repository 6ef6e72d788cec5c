//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep on a sim clock, never wall-clock time
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod entity;
pub mod events;
pub mod motion;
pub mod registry;
pub mod scheduler;
pub mod shape;
pub mod state;
pub mod tick;

pub use collision::{Body, Capabilities, ContactHandler, resolve};
pub use entity::{AlienCraft, AlienTier, Entity, EntityId, EntityKind, PickupKind, VariantProfile};
pub use events::GameEvent;
pub use motion::{Motion, wrap_position};
pub use registry::Registry;
pub use scheduler::{Scheduler, Timer, TimerOwner, TimerPayload};
pub use state::{EntityView, GamePhase, GameSession, Modifiers, SessionSnapshot, TimerStats};
pub use tick::{TickInput, beat_interval_for_level, run_frame, tick};
