#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round driver that owns the world, the systems, the random source and the clock.

mod config;

pub use config::{
    ConfigError, RoundConfig, SessionConfig, DEFAULT_CATCHERS, DEFAULT_GRID_SIDE,
    DEFAULT_POWERUPS_PER_KIND, DEFAULT_SEED,
};

use maze_chase_core::{
    CellCoord, Clock, Command, Direction, Event, PowerupKind, RoundStatus, SystemClock,
};
use maze_chase_system_catcher_ai::CatcherAi;
use maze_chase_system_maze_generation::MazeGeneration;
use maze_chase_system_placement::{Config as PlacementConfig, Placement};
use maze_chase_system_teleport::{SearchBudget, Teleport, SEARCH_TIME_LIMIT};
use maze_chase_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Interactive maze round: the single entry point adapters talk to.
///
/// Every operation submits commands to the world and routes the resulting
/// events through the systems until no system has anything left to say.
#[derive(Debug)]
pub struct Session<C = SystemClock> {
    world: World,
    round: RoundConfig,
    seed: u64,
    rng: ChaCha8Rng,
    clock: C,
    maze_generation: MazeGeneration,
    placement: Placement,
    catcher_ai: CatcherAi,
    teleport: Teleport,
}

impl Session<SystemClock> {
    /// Starts a session measured against wall-clock time.
    #[must_use]
    pub fn with_system_clock(config: SessionConfig) -> Self {
        Self::new(config, SystemClock::new())
    }
}

impl<C: Clock> Session<C> {
    /// Creates a session and sets up its first round.
    pub fn new(config: SessionConfig, clock: C) -> Self {
        let round = config.round();
        let mut session = Self {
            world: World::new(),
            round,
            seed: config.seed(),
            rng: ChaCha8Rng::seed_from_u64(config.seed()),
            clock,
            maze_generation: MazeGeneration::new(),
            placement: Placement::new(placement_config(round)),
            catcher_ai: CatcherAi::new(),
            teleport: Teleport::new(),
        };
        let _ = session.reset_round(round);
        session
    }

    /// Discards the current round and builds a fresh one from `round`.
    pub fn reset_round(&mut self, round: RoundConfig) -> &World {
        self.round = round;
        self.placement = Placement::new(placement_config(round));

        let events = self.pump(vec![Command::ConfigureRound {
            dimensions: round.dimensions(),
            player_start: round.player_start(),
            goal: round.goal(),
        }]);

        let catchers = count(&events, |event| matches!(event, Event::CatcherSpawned { .. }));
        let powerups = count(&events, |event| matches!(event, Event::PowerupSpawned { .. }));
        tracing::info!(
            seed = self.seed,
            rows = round.rows(),
            columns = round.columns(),
            catchers,
            powerups,
            "round reset"
        );

        &self.world
    }

    /// Advances the round by one tick at the clock's current time.
    ///
    /// Catchers move first, then collisions, power-up pickups, the goal and
    /// invisibility expiry are resolved. Finished rounds produce no events.
    pub fn tick(&mut self) -> Vec<Event> {
        if query::status(&self.world) != RoundStatus::InProgress {
            return Vec::new();
        }

        let now = self.clock.now();
        let mut events = self.pump(vec![Command::Tick { now }]);
        events.extend(self.pump(vec![Command::ResolveInteractions]));

        for event in &events {
            match event {
                Event::PlayerCaught { catcher, cell } => {
                    tracing::info!(catcher = catcher.get(), ?cell, "player caught");
                }
                Event::GoalReached { cell } => tracing::info!(?cell, "goal reached"),
                Event::PowerupCollected { kind, .. } => {
                    tracing::debug!(kind = kind.label(), "power-up collected");
                }
                Event::InvisibilityExpired => tracing::debug!("invisibility expired"),
                _ => {}
            }
        }

        events
    }

    /// Moves the player one cell; walls leave the player where it stands.
    pub fn move_player(&mut self, direction: Direction) -> CellCoord {
        let _ = self.pump(vec![Command::MovePlayer { direction }]);
        query::player(&self.world).cell
    }

    /// Uses one held power-up of `kind`.
    ///
    /// Teleportation delegates to [`Session::request_teleport`].
    pub fn activate_powerup(&mut self, kind: PowerupKind) -> bool {
        match kind {
            PowerupKind::Invisibility => {
                let at = self.clock.now();
                let events = self.pump(vec![Command::ActivateInvisibility { at }]);
                events.iter().any(|event| match event {
                    Event::InvisibilityActivated { expires_at } => {
                        tracing::debug!(?expires_at, "invisibility activated");
                        true
                    }
                    _ => false,
                })
            }
            PowerupKind::Teleportation => self.request_teleport(),
        }
    }

    /// Teleports the player toward the goal, spending one held charge on success.
    ///
    /// Returns `false` when the request is rejected or the player stays put.
    pub fn request_teleport(&mut self) -> bool {
        let events = self.pump(vec![Command::BeginTeleport]);
        let mut moved = false;
        for event in &events {
            match event {
                Event::TeleportRejected { reason } => {
                    tracing::debug!(?reason, "teleport rejected");
                }
                Event::PlayerTeleported { from, to, route } => {
                    tracing::info!(?from, ?to, ?route, "player teleported");
                    moved = true;
                }
                Event::TeleportFailed { at, route } => {
                    tracing::info!(?at, ?route, "teleport failed");
                }
                _ => {}
            }
        }
        moved
    }

    /// Authoritative state of the current round.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration of the current round.
    #[must_use]
    pub fn round(&self) -> RoundConfig {
        self.round
    }

    /// Seed the session's random source was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Time source driving the session.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Catcher decision state, exposed for inspection.
    #[must_use]
    pub fn catcher_ai(&self) -> &CatcherAi {
        &self.catcher_ai
    }

    fn pump(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = commands;

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            if events.is_empty() {
                break;
            }

            self.dispatch(&events, &mut pending);
            log.extend(events);
        }

        log
    }

    fn dispatch(&mut self, events: &[Event], out: &mut Vec<Command>) {
        self.maze_generation.handle(events, &mut self.rng, out);
        self.placement.handle(events, &mut self.rng, out);

        let catcher_view = query::catcher_view(&self.world);
        self.catcher_ai.handle(
            events,
            &catcher_view,
            query::maze(&self.world),
            query::player(&self.world).cell,
            &mut self.rng,
            out,
        );

        let budget = SearchBudget::new(&self.clock, SEARCH_TIME_LIMIT);
        self.teleport.handle(
            events,
            query::maze(&self.world),
            query::goal(&self.world).cell(),
            &budget,
            &mut self.rng,
            out,
        );
    }
}

fn placement_config(round: RoundConfig) -> PlacementConfig {
    PlacementConfig::new(round.catchers(), round.powerups_per_kind())
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}
