//! Fixed timestep simulation tick
//!
//! Advances the game by exactly one tick. Quantities are per tick (pixels,
//! pixels/tick); spawn cadence runs on the simulation clock, so the game
//! behaves the same whatever the display refresh rate.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{BedContact, bed_contact, bounce_off_walls, monkey_hits};
use super::state::{GameState, ParticleKind};
use crate::consts::TICK_MICROS;
use crate::tuning::{ParticleTuning, Tuning};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target bed x (from mouse/touch position, field coordinates)
    pub target_x: Option<f32>,
    /// Idle/demo mode - the simulation steers the bed
    pub autopilot: bool,
}

/// Why a run ended.
///
/// Declaration order is precedence order: when several causes fire in the
/// same tick the greatest one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// Reached the field bottom, or landed with no bounce left
    Grounded,
    /// Dropped past the bed level outside the bed
    FellThrough,
    /// Hit an obstacle
    Hazard,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub loss: Option<LossCause>,
    /// Monkey bounced off the bed
    pub landed: bool,
    pub collected: u32,
    pub spawned_collectibles: u32,
    pub spawned_hazards: u32,
    /// Particles that fell off the bottom
    pub culled: u32,
}

impl TickOutcome {
    /// Record a loss, keeping the highest-precedence cause
    fn lose(&mut self, cause: LossCause) {
        self.loss = self.loss.max(Some(cause));
    }

    pub fn is_lost(&self) -> bool {
        self.loss.is_some()
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    state.time_ticks += 1;
    state.clock_us += TICK_MICROS;

    // Bed follows the pointer (or the autopilot)
    let target = if input.autopilot {
        Some(autopilot_target(state, tuning))
    } else {
        input.target_x
    };
    if let Some(x) = target {
        state.bed.x = tuning.clamp_bed_x(x);
    }

    // Gravity and integration
    let monkey = &mut state.monkey;
    monkey.vel.y += tuning.gravity;
    monkey.pos += monkey.vel;
    monkey.rotation += monkey.rotation_speed;
    bounce_off_walls(monkey, tuning.field_width);

    match bed_contact(&state.monkey, &state.bed) {
        BedContact::Landed => land(state, tuning, &mut outcome),
        BedContact::Missed => outcome.lose(LossCause::FellThrough),
        BedContact::Clear => {}
    }

    let monkey = &state.monkey;
    if monkey.pos.y >= tuning.field_height - monkey.radius && monkey.vel.y >= 0.0 {
        outcome.lose(LossCause::Grounded);
    }

    spawn_due(state, tuning, &mut outcome);

    // Advance and cull against the bottom margin
    let limit = tuning.field_height + tuning.cull_margin;
    let before = state.collectibles.len() + state.hazards.len();
    for particle in state
        .collectibles
        .iter_mut()
        .chain(state.hazards.iter_mut())
    {
        particle.pos.y += particle.vy;
    }
    state.collectibles.retain(|p| p.pos.y <= limit);
    state.hazards.retain(|p| p.pos.y <= limit);
    outcome.culled = (before - state.collectibles.len() - state.hazards.len()) as u32;

    // Collisions against the monkey's settled position for this tick
    let monkey = state.monkey;

    let before = state.collectibles.len();
    state.collectibles.retain(|p| !monkey_hits(&monkey, p));
    let caught = (before - state.collectibles.len()) as u32;
    if caught > 0 {
        state.score += u64::from(caught) * tuning.banana.reward;
        state.bounce_budget = tuning.initial_bounce_height();
        state.rewarded_since_landing = true;
        outcome.collected = caught;
    }

    let before = state.hazards.len();
    state.hazards.retain(|p| !monkey_hits(&monkey, p));
    if state.hazards.len() < before {
        outcome.lose(LossCause::Hazard);
    }

    outcome
}

/// Bounce off the bed using the remaining budget
fn land(state: &mut GameState, tuning: &Tuning, outcome: &mut TickOutcome) {
    if !state.rewarded_since_landing {
        state.bounce_budget = (state.bounce_budget - tuning.bounce_decay()).max(0.0);
    }
    state.rewarded_since_landing = false;

    let bed = state.bed;
    let monkey = &mut state.monkey;
    monkey.pos.y = bed.y - monkey.radius;

    let speed = tuning.launch_speed(state.bounce_budget);
    monkey.vel.y = -speed;

    // Landing off-centre kicks the monkey away from the bed centre
    let offset = (monkey.pos.x - bed.x) / (bed.width / 2.0);
    monkey.vel.x = offset * tuning.english;

    monkey.rotation_speed = if tuning.spin_range > 0.0 {
        state
            .rng
            .random_range(-tuning.spin_range..tuning.spin_range)
    } else {
        0.0
    };

    outcome.landed = true;
    if speed <= 0.0 {
        // Nothing left to bounce with
        outcome.lose(LossCause::Grounded);
    }
}

/// Spawn a banana and/or obstacle when their intervals have elapsed
fn spawn_due(state: &mut GameState, tuning: &Tuning, outcome: &mut TickOutcome) {
    if interval_elapsed(state.clock_us, state.last_collectible_us, &tuning.banana) {
        spawn(state, tuning, ParticleKind::Collectible);
        state.last_collectible_us = state.clock_us;
        outcome.spawned_collectibles += 1;
    }
    if interval_elapsed(state.clock_us, state.last_hazard_us, &tuning.obstacle) {
        spawn(state, tuning, ParticleKind::Hazard);
        state.last_hazard_us = state.clock_us;
        outcome.spawned_hazards += 1;
    }
}

#[inline]
fn interval_elapsed(now_us: u64, last_us: u64, kind: &ParticleTuning) -> bool {
    now_us.saturating_sub(last_us) > kind.interval_ms.saturating_mul(1000)
}

fn spawn(state: &mut GameState, tuning: &Tuning, kind: ParticleKind) {
    let params = match kind {
        ParticleKind::Collectible => &tuning.banana,
        ParticleKind::Hazard => &tuning.obstacle,
    };
    let x = state.rng.random_range(0.0..tuning.field_width);
    let vy = state.rng.random_range(params.min_speed..params.max_speed);
    let id = state.insert_particle(kind, Vec2::new(x, tuning.spawn_y), vy, params.size);
    log::debug!("Spawned {:?} #{} at x={:.0} vy={:.2}", kind, id, x, vy);
}

/// Where the demo AI wants the bed this tick.
///
/// Tracks the predicted landing point, shifted so the english of an
/// off-centre landing pushes the monkey toward the nearest banana.
fn autopilot_target(state: &GameState, tuning: &Tuning) -> f32 {
    let monkey = &state.monkey;
    let g = tuning.gravity;

    let fall = (state.bed.y - monkey.bottom()).max(0.0);
    let vy = monkey.vel.y;
    let ticks_to_land = (-vy + (vy * vy + 2.0 * g * fall).sqrt()) / g;
    let landing_x = (monkey.pos.x + monkey.vel.x * ticks_to_land)
        .clamp(monkey.radius, tuning.field_width - monkey.radius);

    let nearest_banana = state
        .collectibles
        .iter()
        .filter(|b| b.pos.y < state.bed.y)
        .min_by(|a, b| {
            (a.pos.x - landing_x)
                .abs()
                .partial_cmp(&(b.pos.x - landing_x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let half = state.bed.width / 2.0;
    let nudge = nearest_banana
        .map(|b| ((b.pos.x - landing_x) / tuning.field_width * 4.0).clamp(-0.6, 0.6) * half)
        .unwrap_or(0.0);

    landing_x - nudge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Particle;
    use crate::tuning::MAX_MAGNITUDE;
    use proptest::prelude::*;

    fn fresh(seed: u64) -> (GameState, Tuning) {
        let tuning = Tuning::default();
        (GameState::new(seed, &tuning), tuning)
    }

    /// Put the monkey just above the bed, falling, so the next tick lands
    fn about_to_land(state: &mut GameState, x: f32) {
        state.monkey.pos = Vec2::new(x, 535.0);
        state.monkey.vel = Vec2::new(0.0, 10.0);
    }

    #[test]
    fn test_gravity_without_bounce() {
        let (mut state, tuning) = fresh(1);
        for _ in 0..20 {
            let vy = state.monkey.vel.y;
            let outcome = tick(&mut state, &TickInput::default(), &tuning);
            assert!(!outcome.landed);
            assert_eq!(state.monkey.vel.y, vy + tuning.gravity);
        }
    }

    #[test]
    fn test_bounce_on_centred_bed() {
        let (mut state, tuning) = fresh(1);
        about_to_land(&mut state, 400.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        assert!(outcome.landed);
        assert!(outcome.loss.is_none());
        assert!(state.monkey.vel.y < 0.0);
        assert_eq!(state.monkey.pos.y, state.bed.y - state.monkey.radius);
        assert_eq!(state.monkey.vel.x, 0.0);
        assert!(state.monkey.rotation_speed >= -tuning.spin_range);
        assert!(state.monkey.rotation_speed < tuning.spin_range);
    }

    #[test]
    fn test_unrewarded_landing_decays_budget() {
        let (mut state, tuning) = fresh(1);
        about_to_land(&mut state, 400.0);
        tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(state.bounce_budget, 375.0);
        let expected = -tuning.launch_speed(375.0);
        assert!((state.monkey.vel.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_rewarded_landing_keeps_budget() {
        let (mut state, tuning) = fresh(1);
        state.rewarded_since_landing = true;
        about_to_land(&mut state, 400.0);
        tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(state.bounce_budget, 450.0);
        assert!(!state.rewarded_since_landing);
    }

    #[test]
    fn test_budget_floors_and_grounds() {
        let (mut state, tuning) = fresh(1);
        state.bounce_budget = 30.0;
        about_to_land(&mut state, 400.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(state.bounce_budget, 0.0);
        assert_eq!(state.monkey.vel.y, 0.0);
        assert_eq!(outcome.loss, Some(LossCause::Grounded));
    }

    #[test]
    fn test_off_centre_landing_adds_english() {
        let (mut state, tuning) = fresh(1);
        about_to_land(&mut state, 430.0);
        tick(&mut state, &TickInput::default(), &tuning);

        // 30px right of centre on a 60px half-width
        assert!((state.monkey.vel.x - 0.5 * tuning.english).abs() < 1e-5);
    }

    #[test]
    fn test_fall_through_outside_bed() {
        let (mut state, tuning) = fresh(1);
        about_to_land(&mut state, 100.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert!(!outcome.landed);
        assert_eq!(outcome.loss, Some(LossCause::FellThrough));
    }

    #[test]
    fn test_bed_follows_clamped_target() {
        let (mut state, tuning) = fresh(1);
        let input = TickInput {
            target_x: Some(5.0),
            ..Default::default()
        };
        tick(&mut state, &input, &tuning);
        assert_eq!(state.bed.x, 60.0);

        let input = TickInput {
            target_x: Some(250.0),
            ..Default::default()
        };
        tick(&mut state, &input, &tuning);
        assert_eq!(state.bed.x, 250.0);
    }

    #[test]
    fn test_hazard_at_monkey_ends_run() {
        let (mut state, tuning) = fresh(1);
        // Hover: gravity cancels the velocity this tick
        state.monkey.vel = Vec2::new(0.0, -tuning.gravity);
        let pos = state.monkey.pos;
        state.insert_particle(ParticleKind::Hazard, pos, 2.0, 25.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(outcome.loss, Some(LossCause::Hazard));
        assert!(state.hazards.is_empty());
    }

    #[test]
    fn test_banana_scores_and_refills_budget() {
        let (mut state, tuning) = fresh(1);
        state.bounce_budget = 150.0;
        state.monkey.vel = Vec2::new(0.0, -tuning.gravity);
        let pos = state.monkey.pos;
        state.insert_particle(ParticleKind::Collectible, pos, 3.0, 20.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        assert_eq!(outcome.collected, 1);
        assert_eq!(state.score, 10);
        assert_eq!(state.bounce_budget, tuning.initial_bounce_height());
        assert!(state.rewarded_since_landing);
        assert!(state.collectibles.is_empty());
        assert!(outcome.loss.is_none());
    }

    #[test]
    fn test_particles_fall_and_cull() {
        let (mut state, tuning) = fresh(1);
        state.insert_particle(ParticleKind::Collectible, Vec2::new(50.0, 616.0), 3.0, 20.0);
        state.insert_particle(ParticleKind::Hazard, Vec2::new(750.0, 619.0), 3.0, 25.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);

        // 616 + 3 = 619 stays, 619 + 3 = 622 > 620 goes
        assert_eq!(outcome.culled, 1);
        assert_eq!(state.collectibles.len(), 1);
        assert_eq!(state.collectibles[0].pos.y, 619.0);
        assert!(state.hazards.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_one_banana_per_2500ms() {
        let (mut state, tuning) = fresh(42);
        let ticks = 2_500_000u64.div_ceil(TICK_MICROS);

        let mut bananas = 0;
        let mut obstacles = 0;
        for i in 1..=ticks {
            let outcome = tick(&mut state, &TickInput::default(), &tuning);
            bananas += outcome.spawned_collectibles;
            obstacles += outcome.spawned_hazards;
            if i == ticks - 1 {
                assert_eq!(bananas, 0, "spawned before 2500ms elapsed");
            }
        }

        assert_eq!(bananas, 1);
        assert_eq!(obstacles, 0);
        assert_eq!(state.collectibles.len() as u64 + state.score / 10, 1);
    }

    #[test]
    fn test_obstacle_cadence() {
        let (mut state, tuning) = fresh(9);
        let ticks = 4_000_000u64.div_ceil(TICK_MICROS);
        let obstacles: u32 = (0..ticks)
            .map(|_| tick(&mut state, &TickInput::default(), &tuning).spawned_hazards)
            .sum();
        assert_eq!(obstacles, 1);
        assert_eq!(state.last_hazard_us, state.clock_us);
    }

    #[test]
    fn test_spawned_particles_respect_tuning() {
        let (mut state, tuning) = fresh(5);
        for _ in 0..2000 {
            tick(&mut state, &TickInput::default(), &tuning);
            for p in state.particles() {
                let params = match p.kind {
                    ParticleKind::Collectible => &tuning.banana,
                    ParticleKind::Hazard => &tuning.obstacle,
                };
                assert!(p.vy >= params.min_speed && p.vy < params.max_speed);
                assert_eq!(p.size, params.size);
                assert!(p.pos.x >= 0.0 && p.pos.x < tuning.field_width);
            }
        }
    }

    #[test]
    fn test_huge_interval_never_spawns() {
        let mut tuning = Tuning::default();
        tuning.banana.interval_ms = 18_446_744_073_709_552;
        tuning.obstacle.interval_ms = u64::MAX;
        let mut state = GameState::new(3, &tuning);
        for _ in 0..300 {
            let outcome = tick(&mut state, &TickInput::default(), &tuning);
            assert_eq!(outcome.spawned_collectibles + outcome.spawned_hazards, 0);
        }
    }

    #[test]
    fn test_landing_with_widest_valid_spin() {
        let tuning = Tuning {
            spin_range: MAX_MAGNITUDE,
            english: -MAX_MAGNITUDE,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_ok());

        let mut state = GameState::new(8, &tuning);
        about_to_land(&mut state, 420.0);
        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert!(outcome.landed);
        assert!(state.monkey.rotation_speed.abs() <= MAX_MAGNITUDE);
    }

    #[test]
    fn test_loss_precedence_order() {
        assert!(LossCause::Hazard > LossCause::FellThrough);
        assert!(LossCause::FellThrough > LossCause::Grounded);
    }

    #[test]
    fn test_hazard_beats_fall_through() {
        let (mut state, tuning) = fresh(1);
        about_to_land(&mut state, 100.0);
        // Monkey ends the tick at (100, 545.5); obstacle ends at (100, 545)
        state.insert_particle(ParticleKind::Hazard, Vec2::new(100.0, 543.0), 2.0, 25.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome.loss, Some(LossCause::Hazard));
    }

    #[test]
    fn test_fall_through_beats_grounded() {
        let (mut state, tuning) = fresh(1);
        state.monkey.pos = Vec2::new(100.0, 585.0);
        state.monkey.vel = Vec2::new(0.0, 1.0);

        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome.loss, Some(LossCause::FellThrough));
    }

    #[test]
    fn test_determinism() {
        let (mut a, tuning) = fresh(99999);
        let (mut b, _) = fresh(99999);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        for _ in 0..600 {
            let oa = tick(&mut a, &input, &tuning);
            let ob = tick(&mut b, &input, &tuning);
            assert_eq!(oa, ob);
        }
        assert_eq!(a.monkey, b.monkey);
        assert_eq!(a.collectibles, b.collectibles);
        assert_eq!(a.hazards, b.hazards);
    }

    #[test]
    fn test_autopilot_keeps_monkey_up() {
        let (mut state, tuning) = fresh(2024);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        // Two full banana intervals without ever missing the bed
        for _ in 0..300 {
            let outcome = tick(&mut state, &input, &tuning);
            assert_ne!(outcome.loss, Some(LossCause::FellThrough));
        }
    }

    #[test]
    fn test_autopilot_nudges_toward_banana() {
        let (mut state, tuning) = fresh(1);
        state.monkey.pos = Vec2::new(400.0, 300.0);
        state.monkey.vel = Vec2::ZERO;
        state.collectibles.push(Particle {
            id: 99,
            kind: ParticleKind::Collectible,
            pos: Vec2::new(700.0, 100.0),
            vy: 3.0,
            size: 20.0,
        });

        // Banana to the right: bed sits left of the landing point
        let target = autopilot_target(&state, &tuning);
        assert!(target < 400.0);
        assert!(target > 400.0 - state.bed.width / 2.0);
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_under_any_pointer(
            seed in any::<u64>(),
            targets in prop::collection::vec(-100.0f32..900.0, 1..400),
        ) {
            let tuning = Tuning::default();
            let mut state = GameState::new(seed, &tuning);
            let limit = tuning.field_height + tuning.cull_margin;
            let mut last_score = 0;

            for x in targets {
                let input = TickInput { target_x: Some(x), ..Default::default() };
                let outcome = tick(&mut state, &input, &tuning);

                prop_assert!(state.bounce_budget >= 0.0);
                prop_assert!(state.bounce_budget <= tuning.initial_bounce_height());
                prop_assert!(state.score >= last_score);
                prop_assert!(state.particles().all(|p| p.pos.y <= limit));
                prop_assert!(state.bed.left() >= 0.0 && state.bed.right() <= tuning.field_width);
                last_score = state.score;

                if outcome.is_lost() {
                    break;
                }
            }
        }
    }
}
