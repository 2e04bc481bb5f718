//! Level attempt state machine
//!
//! ```text
//! Idle -> (start) -> Running -> LifeLost -> Running
//!                            -> LevelCleared -> (choice) -> Running | Idle
//!                            -> GameOver     -> (choice) -> Running | Idle
//! ```
//!
//! Only `Running` advances the simulation. The host calls [`Session::frame`]
//! once per display frame and schedules another frame only while
//! [`Frame::schedule_next`] is true.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::error::BrickfallError;
use crate::input::InputLatch;
use crate::progress::{KeyValueStore, LevelStatus, ProgressStore, UserProgress, level_status, level_statuses};
use crate::sim::{GameEvent, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Menus; nothing is being simulated
    Idle,
    /// Ticking once per frame
    Running,
    /// Level beaten, waiting for Next Level / Main Menu
    LevelCleared { level: u32, next_level: u32 },
    /// Out of lives, waiting for Replay / Main Menu
    GameOver { level: u32 },
}

/// Player choice on the end-of-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    NextLevel,
    Replay,
    MainMenu,
}

/// Result of one display frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub events: Vec<GameEvent>,
    /// Whether the host should request another frame
    pub schedule_next: bool,
}

/// One player's play session
pub struct Session<S: KeyValueStore> {
    tuning: Tuning,
    progress: ProgressStore<S>,
    user: Option<String>,
    /// Progress for anonymous play (not persisted)
    guest_unlocked: u32,
    phase: Phase,
    state: Option<GameState>,
    input: InputLatch,
    rng: Pcg32,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(tuning: Tuning, store: S, seed: u64) -> Self {
        let tuning = tuning.sanitized();
        let progress = ProgressStore::new(store, tuning.max_level);
        Self {
            tuning,
            progress,
            user: None,
            guest_unlocked: 1,
            phase: Phase::Idle,
            state: None,
            input: InputLatch::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Read-only snapshot for rendering
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Where input handlers record paddle intent
    pub fn input_mut(&mut self) -> &mut InputLatch {
        &mut self.input
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressStore<S> {
        &mut self.progress
    }

    // --- Profiles ---

    pub fn register(&mut self, username: &str) -> Result<(), BrickfallError> {
        self.progress.register(username)
    }

    pub fn login(&mut self, username: &str) -> Result<UserProgress, BrickfallError> {
        let progress = self.progress.login(username)?;
        self.cancel();
        self.user = Some(username.trim().to_string());
        log::info!(
            "Logged in as {} (level {})",
            username.trim(),
            progress.last_unlocked_level
        );
        Ok(progress)
    }

    /// Log in, creating the profile on first use
    pub fn sign_in(&mut self, username: &str) -> Result<UserProgress, BrickfallError> {
        match self.login(username) {
            Err(BrickfallError::UnknownUser(_)) => {
                self.register(username)?;
                self.login(username)
            }
            result => result,
        }
    }

    /// Auto-login as the last profile, if any
    pub fn resume_last_user(&mut self) -> Option<UserProgress> {
        let name = self.progress.last_user()?;
        self.login(&name).ok()
    }

    pub fn logout(&mut self) {
        self.cancel();
        self.progress.logout();
        self.user = None;
        self.guest_unlocked = 1;
    }

    /// Stored progress of the current player (guest progress when logged out)
    pub fn current_progress(&self) -> UserProgress {
        match &self.user {
            Some(name) => self.progress.get(name),
            None => UserProgress {
                last_unlocked_level: self.guest_unlocked,
            },
        }
    }

    /// Highest level the current player may start
    pub fn unlocked_level(&self) -> u32 {
        self.current_progress().frontier(self.tuning.max_level)
    }

    /// Level select grid for the current player
    pub fn level_statuses(&self) -> Vec<(u32, LevelStatus)> {
        let progress = self.current_progress();
        level_statuses(progress.last_unlocked_level, self.tuning.max_level)
    }

    // --- State machine ---

    /// Set up a fresh attempt and start running
    ///
    /// Out-of-range levels are clamped; locked levels fall back to the
    /// frontier. Returns the level actually started.
    pub fn start(&mut self, level: u32) -> u32 {
        let frontier = self.unlocked_level();
        let mut level = self.tuning.clamp_level(level);
        if level_status(level, frontier) == LevelStatus::Locked {
            log::warn!("Level {} is locked, starting frontier level {}", level, frontier);
            level = frontier;
        }

        self.state = Some(GameState::new(level, &self.tuning, &mut self.rng));
        self.input.clear();
        self.phase = Phase::Running;
        log::info!("Starting level {}", level);
        level
    }

    /// Start the player's frontier level
    pub fn play(&mut self) -> u32 {
        self.start(self.unlocked_level())
    }

    /// Run one tick if running
    pub fn frame(&mut self) -> Frame {
        if self.phase != Phase::Running {
            return Frame::default();
        }
        let Some(state) = self.state.as_mut() else {
            self.phase = Phase::Idle;
            return Frame::default();
        };

        let input = TickInput {
            paddle: self.input.take_intent(),
        };
        let events = tick(state, &input, &self.tuning, &mut self.rng);
        let level = state.level;

        match events.last() {
            Some(GameEvent::LevelCleared { next_level }) => {
                let next_level = *next_level;
                self.unlock(level);
                self.phase = Phase::LevelCleared { level, next_level };
            }
            Some(GameEvent::GameOver) => {
                self.phase = Phase::GameOver { level };
            }
            _ => {}
        }

        Frame {
            events,
            schedule_next: self.phase == Phase::Running,
        }
    }

    fn unlock(&mut self, cleared_level: u32) {
        match &self.user {
            Some(name) => {
                self.progress.record_clear(name, cleared_level);
            }
            None => {
                let next = cleared_level.saturating_add(1).min(self.tuning.max_level.saturating_add(1));
                self.guest_unlocked = self.guest_unlocked.max(next);
            }
        }
    }

    /// Resolve an end-of-level choice. Returns the level started, if any.
    pub fn choose(&mut self, choice: MenuChoice) -> Option<u32> {
        match (choice, self.phase) {
            (MenuChoice::NextLevel, Phase::LevelCleared { next_level, .. }) => {
                Some(self.start(next_level))
            }
            (MenuChoice::Replay, Phase::LevelCleared { level, .. })
            | (MenuChoice::Replay, Phase::GameOver { level }) => Some(self.start(level)),
            (MenuChoice::MainMenu, _) => {
                self.cancel();
                None
            }
            (choice, phase) => {
                log::debug!("Ignoring {:?} in {:?}", choice, phase);
                None
            }
        }
    }

    /// Tear down the attempt (screen switch); no further tick will run
    pub fn cancel(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Session cancelled");
        }
        self.input.clear();
        self.phase = Phase::Idle;
    }
}
