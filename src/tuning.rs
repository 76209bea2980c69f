//! Data-driven game balance
//!
//! Every gameplay number the simulation reads comes from [`Tuning`]. The
//! defaults reproduce the classic feel; a JSON document can override any
//! subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be finite and at most 1e6 in magnitude (got {value})")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("{field} speed range is empty ({min} >= {max})")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("bed width {bed_width} does not fit in field width {field_width}")]
    BedTooWide { bed_width: f32, field_width: f32 },

    #[error("bounce fractions must lie in [0, 1]")]
    BadFraction,
}

/// Spawn and effect parameters for one kind of falling particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleTuning {
    /// Milliseconds between spawns
    pub interval_ms: u64,
    /// Fall speed range (pixels/tick), sampled uniformly at spawn
    pub min_speed: f32,
    pub max_speed: f32,
    /// Diameter
    pub size: f32,
    /// Score awarded on pickup (0 for hazards)
    pub reward: u64,
}

impl ParticleTuning {
    pub fn banana() -> Self {
        Self {
            interval_ms: BANANA_INTERVAL_MS,
            min_speed: BANANA_MIN_SPEED,
            max_speed: BANANA_MAX_SPEED,
            size: BANANA_SIZE,
            reward: BANANA_REWARD,
        }
    }

    pub fn obstacle() -> Self {
        Self {
            interval_ms: OBSTACLE_INTERVAL_MS,
            min_speed: OBSTACLE_MIN_SPEED,
            max_speed: OBSTACLE_MAX_SPEED,
            size: OBSTACLE_SIZE,
            reward: 0,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), TuningError> {
        for value in [self.min_speed, self.max_speed, self.size] {
            bounded(field, value)?;
        }
        positive(field, self.size)?;
        positive(field, self.min_speed)?;
        // Speeds are sampled from the half-open range [min, max)
        if self.min_speed >= self.max_speed {
            return Err(TuningError::InvertedRange {
                field,
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        Ok(())
    }
}

/// Complete gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub field_width: f32,
    pub field_height: f32,
    pub gravity: f32,

    pub bed_width: f32,
    pub bed_height: f32,
    /// Distance from the field bottom up to the bed's top edge
    pub bed_offset: f32,

    pub monkey_radius: f32,
    pub monkey_start_spin: f32,
    pub spin_range: f32,

    /// Bounce budget at session start, as a fraction of field height
    pub initial_bounce_fraction: f32,
    /// Budget lost per unrewarded landing, as a fraction of field height
    pub bounce_decay_fraction: f32,
    /// Horizontal speed imparted by an edge landing (0 disables drift)
    pub english: f32,

    pub spawn_y: f32,
    pub cull_margin: f32,

    pub banana: ParticleTuning,
    pub obstacle: ParticleTuning,

    pub leaderboard_size: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            gravity: GRAVITY,
            bed_width: BED_WIDTH,
            bed_height: BED_HEIGHT,
            bed_offset: BED_OFFSET,
            monkey_radius: MONKEY_RADIUS,
            monkey_start_spin: MONKEY_START_SPIN,
            spin_range: SPIN_RANGE,
            initial_bounce_fraction: INITIAL_BOUNCE_FRACTION,
            bounce_decay_fraction: BOUNCE_DECAY_FRACTION,
            english: BOUNCE_ENGLISH,
            spawn_y: SPAWN_Y,
            cull_margin: CULL_MARGIN,
            banana: ParticleTuning::banana(),
            obstacle: ParticleTuning::obstacle(),
            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        for (field, value) in [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("gravity", self.gravity),
            ("bed_width", self.bed_width),
            ("bed_height", self.bed_height),
            ("bed_offset", self.bed_offset),
            ("monkey_radius", self.monkey_radius),
            ("monkey_start_spin", self.monkey_start_spin),
            ("spin_range", self.spin_range),
            ("english", self.english),
            ("spawn_y", self.spawn_y),
            ("cull_margin", self.cull_margin),
        ] {
            bounded(field, value)?;
        }
        positive("field_width", self.field_width)?;
        positive("field_height", self.field_height)?;
        positive("gravity", self.gravity)?;
        positive("bed_width", self.bed_width)?;
        positive("bed_height", self.bed_height)?;
        positive("monkey_radius", self.monkey_radius)?;
        if self.bed_width > self.field_width {
            return Err(TuningError::BedTooWide {
                bed_width: self.bed_width,
                field_width: self.field_width,
            });
        }
        let fraction = 0.0..=1.0;
        if !fraction.contains(&self.initial_bounce_fraction)
            || !fraction.contains(&self.bounce_decay_fraction)
        {
            return Err(TuningError::BadFraction);
        }
        self.banana.validate("banana")?;
        self.obstacle.validate("obstacle")?;
        Ok(())
    }

    /// Maximum bounce budget (pixels of rise)
    #[inline]
    pub fn initial_bounce_height(&self) -> f32 {
        self.field_height * self.initial_bounce_fraction
    }

    /// Budget lost per unrewarded landing
    #[inline]
    pub fn bounce_decay(&self) -> f32 {
        self.field_height * self.bounce_decay_fraction
    }

    /// Y coordinate of the bed's top edge
    #[inline]
    pub fn bed_top(&self) -> f32 {
        self.field_height - self.bed_offset
    }

    /// Upward launch speed that peaks `height` pixels above the launch point
    #[inline]
    pub fn launch_speed(&self, height: f32) -> f32 {
        (2.0 * self.gravity * height.max(0.0)).sqrt()
    }

    /// Clamp a pointer x so the bed stays fully inside the field
    #[inline]
    pub fn clamp_bed_x(&self, x: f32) -> f32 {
        let half = self.bed_width / 2.0;
        x.clamp(half, self.field_width - half)
    }
}

/// Largest magnitude accepted for any tuning number
pub const MAX_MAGNITUDE: f32 = 1.0e6;

fn bounded(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value.abs() <= MAX_MAGNITUDE {
        Ok(())
    } else {
        Err(TuningError::OutOfRange { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}
