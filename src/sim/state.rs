//! Game state and core simulation types
//!
//! One `GameState` exists per session. It is owned by the session driver and
//! passed explicitly into [`super::tick`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// The player's bed (an axis-aligned paddle)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    /// Horizontal centre
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bed {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.field_width / 2.0,
            y: tuning.bed_top(),
            width: tuning.bed_width,
            height: tuning.bed_height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Whether `x` lies strictly inside the bed's horizontal span
    #[inline]
    pub fn spans(&self, x: f32) -> bool {
        x > self.left() && x < self.right()
    }
}

/// The monkey
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Monkey {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

impl Monkey {
    /// Monkey at the field centre, launched toward the full bounce height
    pub fn launched(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(tuning.field_width / 2.0, tuning.field_height / 2.0),
            vel: Vec2::new(0.0, -tuning.launch_speed(tuning.initial_bounce_height())),
            radius: tuning.monkey_radius,
            rotation: 0.0,
            rotation_speed: tuning.monkey_start_spin,
        }
    }

    /// Y coordinate of the lower edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }
}

/// Falling particle kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Banana: scores and refills the bounce budget
    Collectible,
    /// Obstacle: ends the run
    Hazard,
}

/// A falling particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub kind: ParticleKind,
    pub pos: Vec2,
    /// Downward speed (pixels/tick), fixed at spawn
    pub vy: f32,
    /// Diameter
    pub size: f32,
}

impl Particle {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Spawn RNG; rebuilt from `seed` on deserialize
    #[serde(skip, default = "default_rng")]
    pub rng: Pcg32,
    /// Simulation clock (microseconds since the session started)
    pub clock_us: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub score: u64,
    /// Height the next bounce will reach, in [0, initial bounce height]
    pub bounce_budget: f32,
    /// A banana was caught since the last landing
    pub rewarded_since_landing: bool,
    pub bed: Bed,
    pub monkey: Monkey,
    /// Bananas (unordered)
    pub collectibles: Vec<Particle>,
    /// Obstacles (unordered)
    pub hazards: Vec<Particle>,
    /// Spawn baselines on the simulation clock
    pub last_collectible_us: u64,
    pub last_hazard_us: u64,
    /// Next entity ID
    next_id: u32,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl GameState {
    /// Fresh session state: centred bed, launched monkey, no particles
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock_us: 0,
            time_ticks: 0,
            score: 0,
            bounce_budget: tuning.initial_bounce_height(),
            rewarded_since_landing: false,
            bed: Bed::new(tuning),
            monkey: Monkey::launched(tuning),
            collectibles: Vec::new(),
            hazards: Vec::new(),
            last_collectible_us: 0,
            last_hazard_us: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Push a particle of the given kind into its set
    pub fn insert_particle(&mut self, kind: ParticleKind, pos: Vec2, vy: f32, size: f32) -> u32 {
        let id = self.next_entity_id();
        let particle = Particle {
            id,
            kind,
            pos,
            vy,
            size,
        };
        match kind {
            ParticleKind::Collectible => self.collectibles.push(particle),
            ParticleKind::Hazard => self.hazards.push(particle),
        }
        id
    }

    /// Iterate over every falling particle, bananas first
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.collectibles.iter().chain(self.hazards.iter())
    }
}
