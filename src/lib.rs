//! Monkey's Bed - a bounce-and-catch arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions)
//! - `session`: Start / Playing / GameOver state machine
//! - `leaderboard`: Global high-score gateway and identifier masking
//! - `tasks`: Fire-and-forget execution of leaderboard calls
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod leaderboard;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tasks;
pub mod tuning;

pub use leaderboard::{
    LeaderboardEntry, LeaderboardError, LeaderboardGateway, MemoryLeaderboard, Standings,
    mask_identifier,
};
pub use session::{Phase, Session, Snapshot};
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate. Physics quantities are expressed per tick.
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Simulation clock advance per tick (1/60 s, rounded up)
    pub const TICK_MICROS: u64 = 16_667;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Downward acceleration (pixels/tick²)
    pub const GRAVITY: f32 = 0.5;

    /// Bed defaults - top edge sits BED_OFFSET above the field bottom
    pub const BED_WIDTH: f32 = 120.0;
    pub const BED_HEIGHT: f32 = 20.0;
    pub const BED_OFFSET: f32 = 40.0;

    /// Monkey defaults
    pub const MONKEY_RADIUS: f32 = 20.0;
    pub const MONKEY_START_SPIN: f32 = 0.1;
    /// Landing spin is drawn from [-SPIN_RANGE, SPIN_RANGE)
    pub const SPIN_RANGE: f32 = 0.2;

    /// First bounce peaks at 3/4 of the field height
    pub const INITIAL_BOUNCE_FRACTION: f32 = 0.75;
    /// Each unrewarded landing costs 1/8 of the field height
    pub const BOUNCE_DECAY_FRACTION: f32 = 0.125;
    /// Horizontal kick (pixels/tick) when landing on the very edge of the bed
    pub const BOUNCE_ENGLISH: f32 = 3.0;

    /// Particles spawn this far above the field top
    pub const SPAWN_Y: f32 = -20.0;
    /// Particles are culled this far below the field bottom
    pub const CULL_MARGIN: f32 = 20.0;

    /// Banana defaults
    pub const BANANA_INTERVAL_MS: u64 = 2500;
    pub const BANANA_MIN_SPEED: f32 = 3.0;
    pub const BANANA_MAX_SPEED: f32 = 6.0;
    pub const BANANA_SIZE: f32 = 20.0;
    pub const BANANA_REWARD: u64 = 10;

    /// Obstacle defaults
    pub const OBSTACLE_INTERVAL_MS: u64 = 4000;
    pub const OBSTACLE_MIN_SPEED: f32 = 2.0;
    pub const OBSTACLE_MAX_SPEED: f32 = 5.0;
    pub const OBSTACLE_SIZE: f32 = 25.0;

    /// Leaderboard length
    pub const LEADERBOARD_SIZE: usize = 10;
}
