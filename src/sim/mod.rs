//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, platform or network dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{BedContact, bed_contact, circles_overlap};
pub use state::{Bed, GameState, Monkey, Particle, ParticleKind};
pub use tick::{LossCause, TickInput, TickOutcome, tick};
