//! Game session state machine
//!
//! `Start --start--> Playing --loss--> GameOver --start--> Playing ...`
//!
//! The session owns the simulation state and is the only thing that ticks
//! it. Leaderboard traffic is spawned as detached tasks; a slow or failing
//! gateway never holds up a transition.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::leaderboard::{LeaderboardEntry, LeaderboardGateway, Standings, mask_identifier};
use crate::sim::{Bed, GameState, LossCause, Monkey, Particle, TickInput, tick};
use crate::tasks::TaskSpawner;
use crate::tuning::Tuning;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Title screen, waiting for the first click
    Start,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for a restart click
    GameOver,
}

/// Asked for the player's identifier when a run ends; gets the final score.
/// `None` or a blank answer means "don't submit".
pub type IdentifierPrompt = Box<dyn FnMut(u64) -> Option<String>>;

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub score: u64,
    pub bounce_budget: f32,
    pub bed: Bed,
    pub monkey: Monkey,
    pub collectibles: Vec<Particle>,
    pub hazards: Vec<Particle>,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Highest score on the leaderboard
    pub best_score: Option<u64>,
    pub last_loss: Option<LossCause>,
}

/// One player's game: phase, simulation and leaderboard view
pub struct Session {
    tuning: Tuning,
    phase: Phase,
    state: GameState,
    accumulator: f32,
    /// Base seed; run N is seeded with `seed + N`
    seed: u64,
    runs: u64,
    last_loss: Option<LossCause>,
    gateway: Rc<dyn LeaderboardGateway>,
    spawner: Rc<dyn TaskSpawner>,
    prompt: IdentifierPrompt,
    standings: Rc<RefCell<Standings>>,
}

impl Session {
    /// Create a session on the start screen and fetch the leaderboard
    pub fn new(
        tuning: Tuning,
        gateway: Rc<dyn LeaderboardGateway>,
        spawner: Rc<dyn TaskSpawner>,
        prompt: IdentifierPrompt,
        seed: u64,
    ) -> Self {
        let standings = Rc::new(RefCell::new(Standings::with_limit(tuning.leaderboard_size)));
        let session = Self {
            state: GameState::new(seed, &tuning),
            tuning,
            phase: Phase::Start,
            accumulator: 0.0,
            seed,
            runs: 0,
            last_loss: None,
            gateway,
            spawner,
            prompt,
            standings,
        };
        session.refresh_leaderboard();
        session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    /// Why the most recent run ended
    pub fn last_loss(&self) -> Option<LossCause> {
        self.last_loss
    }

    /// Copy of the current leaderboard snapshot
    pub fn standings(&self) -> Standings {
        self.standings.borrow().clone()
    }

    /// Start (or restart) a run. Ignored while playing.
    pub fn start(&mut self) -> bool {
        match self.phase {
            Phase::Playing => false,
            Phase::Start | Phase::GameOver => {
                self.runs += 1;
                let seed = self.seed.wrapping_add(self.runs);
                self.state = GameState::new(seed, &self.tuning);
                self.accumulator = 0.0;
                self.last_loss = None;
                self.phase = Phase::Playing;
                log::info!("Run {} started with seed {}", self.runs, seed);
                true
            }
        }
    }

    /// Feed one display frame. Runs as many fixed ticks as the frame time
    /// covers (capped), stopping at the first loss.
    pub fn update(&mut self, frame_dt: f32, input: &TickInput) -> Option<LossCause> {
        if self.phase != Phase::Playing {
            return None;
        }

        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
            if let Some(cause) = self.step(input) {
                return Some(cause);
            }
        }
        None
    }

    /// Run exactly one fixed tick (no-op outside `Playing`)
    pub fn step(&mut self, input: &TickInput) -> Option<LossCause> {
        if self.phase != Phase::Playing {
            return None;
        }

        let outcome = tick(&mut self.state, input, &self.tuning);
        if outcome.collected > 0 {
            log::debug!("Banana! score={}", self.state.score);
        }
        if let Some(cause) = outcome.loss {
            self.game_over(cause);
        }
        outcome.loss
    }

    /// Build the render snapshot
    pub fn snapshot(&self) -> Snapshot {
        let standings = self.standings.borrow();
        Snapshot {
            phase: self.phase,
            score: self.state.score,
            bounce_budget: self.state.bounce_budget,
            bed: self.state.bed,
            monkey: self.state.monkey,
            collectibles: self.state.collectibles.clone(),
            hazards: self.state.hazards.clone(),
            leaderboard: standings.entries.clone(),
            best_score: standings.top_score(),
            last_loss: self.last_loss,
        }
    }

    fn game_over(&mut self, cause: LossCause) {
        self.phase = Phase::GameOver;
        self.last_loss = Some(cause);
        self.accumulator = 0.0;

        let score = self.state.score;
        log::info!("Game over ({:?}) with score {}", cause, score);

        let identifier = (self.prompt)(score)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        match identifier {
            Some(raw) => self.submit_score(&raw, score),
            None => log::info!("No identifier given, score not submitted"),
        }
    }

    /// Spawn submit-then-refresh; failures are logged and dropped
    fn submit_score(&self, raw_identifier: &str, score: u64) {
        let entry = LeaderboardEntry::new(mask_identifier(raw_identifier), score);
        let gateway = Rc::clone(&self.gateway);
        let standings = Rc::clone(&self.standings);
        let limit = self.tuning.leaderboard_size;

        self.spawner.spawn(Box::pin(async move {
            let identifier = entry.identifier.clone();
            if let Err(e) = gateway.submit(entry).await {
                log::error!("Error saving score: {}", e);
                return;
            }
            log::info!("Saved score {} for {}", score, identifier);
            refresh(gateway.as_ref(), &standings, limit).await;
        }));
    }

    fn refresh_leaderboard(&self) {
        let gateway = Rc::clone(&self.gateway);
        let standings = Rc::clone(&self.standings);
        let limit = self.tuning.leaderboard_size;

        self.spawner.spawn(Box::pin(async move {
            refresh(gateway.as_ref(), &standings, limit).await;
        }));
    }
}

async fn refresh(gateway: &dyn LeaderboardGateway, standings: &RefCell<Standings>, limit: usize) {
    match gateway.fetch_top(limit).await {
        Ok(entries) => {
            let count = entries.len();
            standings.borrow_mut().replace(entries);
            log::info!("Loaded {} leaderboard entries", count);
        }
        Err(e) => log::error!("Error loading leaderboard: {}", e),
    }
}
