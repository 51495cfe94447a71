use std::{
    collections::{hash_map::DefaultHasher, HashMap, VecDeque},
    hash::{Hash, Hasher},
    time::Duration,
};

use maze_chase_core::{
    CellCoord, Clock, Direction, Event, ManualClock, Maze, PowerupKind, RoundStatus,
};
use maze_chase_session::{RoundConfig, Session, SessionConfig};
use maze_chase_world::query;

fn session(seed: u64, round: RoundConfig) -> Session<ManualClock> {
    Session::new(SessionConfig::new(seed, round), ManualClock::default())
}

fn path_between(maze: &Maze, from: CellCoord, to: CellCoord) -> Vec<Direction> {
    let dimensions = maze.dimensions();
    let mut came_from: HashMap<CellCoord, (CellCoord, Direction)> = HashMap::new();
    let mut queue = VecDeque::from([from]);

    while let Some(cell) = queue.pop_front() {
        if cell == to {
            break;
        }
        for direction in maze.open_directions(cell) {
            let Some(next) = dimensions.neighbor(cell, direction) else {
                continue;
            };
            if next == from || came_from.contains_key(&next) {
                continue;
            }
            let _ = came_from.insert(next, (cell, direction));
            queue.push_back(next);
        }
    }

    let mut path = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let (previous, direction) = came_from[&cursor];
        path.push(direction);
        cursor = previous;
    }
    path.reverse();
    path
}

fn walk_to(session: &mut Session<ManualClock>, target: CellCoord) {
    let start = query::player(session.world()).cell;
    let path = path_between(query::maze(session.world()), start, target);
    for direction in path {
        let _ = session.move_player(direction);
    }
    assert_eq!(query::player(session.world()).cell, target);
}

fn first_powerup(session: &Session<ManualClock>, kind: PowerupKind) -> CellCoord {
    query::powerup_view(session.world())
        .uncollected()
        .find(|powerup| powerup.kind == kind)
        .map(|powerup| powerup.cell)
        .expect("reference round places both kinds")
}

fn collected(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::PowerupCollected { .. }))
        .count()
}

#[test]
fn new_session_builds_reference_round() {
    let session = session(1, RoundConfig::default());
    let world = session.world();

    assert_eq!(query::maze(world).passage_count(), 399);
    assert_eq!(query::player(world).cell, CellCoord::new(0, 0));
    assert_eq!(query::goal(world).cell(), CellCoord::new(19, 19));
    assert_eq!(query::catcher_view(world).len(), 3);
    assert_eq!(query::powerup_view(world).into_vec().len(), 6);
    assert_eq!(query::status(world), RoundStatus::InProgress);
    assert!(!query::is_game_over(world));

    for catcher in query::catcher_view(world).iter() {
        assert!(session.catcher_ai().mode(catcher.id).is_some());
    }
}

#[test]
fn wall_clock_session_plays_a_round() {
    let round = RoundConfig::new(8, 8, 0, 1).expect("valid round");
    let mut session = Session::with_system_clock(SessionConfig::new(11, round));
    assert_eq!(query::maze(session.world()).passage_count(), 63);

    let start = session.clock().now();
    for _ in 0..30 {
        let _ = session.tick();
    }

    let world = session.world();
    assert_eq!(query::tick_index(world), 30);
    assert!(query::now(world) >= start);
    assert!(query::now(world) <= session.clock().now());
}

#[test]
fn moves_into_walls_leave_player_in_place() {
    let mut session = session(2, RoundConfig::default());
    let start = query::player(session.world()).cell;
    assert_eq!(session.move_player(Direction::Up), start);
    assert_eq!(session.move_player(Direction::Left), start);
}

#[test]
fn activation_without_charge_is_rejected() {
    let mut session = session(3, RoundConfig::default());
    assert!(!session.activate_powerup(PowerupKind::Invisibility));
    assert!(!session.activate_powerup(PowerupKind::Teleportation));
    assert!(!session.request_teleport());
    assert_eq!(query::player(session.world()).cell, CellCoord::new(0, 0));
}

#[test]
fn invisibility_lasts_exactly_five_seconds() {
    let mut session = session(4, RoundConfig::default());
    let cell = first_powerup(&session, PowerupKind::Invisibility);
    walk_to(&mut session, cell);

    let events = session.tick();
    assert_eq!(collected(&events), 1);
    assert_eq!(
        query::held_powerups(session.world()).count(PowerupKind::Invisibility),
        1
    );

    session.clock().set(Duration::from_millis(100));
    assert!(session.activate_powerup(PowerupKind::Invisibility));
    assert!(query::player(session.world()).is_invisible());
    assert_eq!(
        query::held_powerups(session.world()).count(PowerupKind::Invisibility),
        0
    );

    session.clock().set(Duration::from_millis(5_099));
    let events = session.tick();
    assert!(!events.contains(&Event::InvisibilityExpired));
    assert!(query::player(session.world()).is_invisible());

    session.clock().set(Duration::from_millis(5_100));
    let events = session.tick();
    assert!(events.contains(&Event::InvisibilityExpired));
    assert!(!query::player(session.world()).is_invisible());
}

#[test]
fn collected_powerup_counts_once() {
    let mut session = session(5, RoundConfig::default());
    let cell = first_powerup(&session, PowerupKind::Teleportation);
    walk_to(&mut session, cell);

    let mut total = 0;
    for _ in 0..3 {
        session.clock().advance(Duration::from_millis(16));
        total += collected(&session.tick());
    }

    assert_eq!(total, 1);
    assert_eq!(
        query::held_powerups(session.world()).count(PowerupKind::Teleportation),
        1
    );
}

#[test]
fn teleport_spends_charge_only_when_player_moves() {
    for seed in 0..6 {
        let mut session = session(seed, RoundConfig::default());
        let cell = first_powerup(&session, PowerupKind::Teleportation);
        walk_to(&mut session, cell);
        let _ = session.tick();

        let before = query::player(session.world()).cell;
        let moved = session.activate_powerup(PowerupKind::Teleportation);
        let after = query::player(session.world());

        assert!(!after.teleporting);
        if moved {
            assert_ne!(after.cell, before, "seed {seed}");
            assert_eq!(after.held.count(PowerupKind::Teleportation), 0);
        } else {
            assert_eq!(after.cell, before, "seed {seed}");
            assert_eq!(after.held.count(PowerupKind::Teleportation), 1);
        }
    }
}

#[test]
fn caught_round_ignores_further_input() {
    // One row of three cells: the only catcher cell lies between start and goal.
    let round = RoundConfig::new(1, 3, 1, 0).expect("valid round");
    let mut session = session(6, round);
    let catcher_cell = query::catcher_view(session.world())
        .iter()
        .map(|catcher| catcher.cell)
        .next()
        .expect("one catcher fits");
    assert_eq!(catcher_cell, CellCoord::new(1, 0));

    assert_eq!(session.move_player(Direction::Right), catcher_cell);
    let events = session.tick();
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::PlayerCaught { .. })));
    assert!(query::is_game_over(session.world()));

    assert!(session.tick().is_empty());
    assert_eq!(session.move_player(Direction::Right), catcher_cell);
    assert_eq!(query::status(session.world()), RoundStatus::Caught);
}

#[test]
fn reaching_goal_wins_round() {
    let round = RoundConfig::new(1, 2, 0, 0).expect("valid round");
    let mut session = session(7, round);

    assert_eq!(session.move_player(Direction::Right), CellCoord::new(1, 0));
    let events = session.tick();
    assert!(events.contains(&Event::GoalReached {
        cell: CellCoord::new(1, 0)
    }));
    assert_eq!(query::status(session.world()), RoundStatus::Won);
    assert!(!query::is_game_over(session.world()));
    assert!(session.tick().is_empty());
}

#[test]
fn won_round_restarts_with_fresh_state() {
    let round = RoundConfig::new(1, 2, 0, 0).expect("valid round");
    let mut session = session(7, round);

    for played in 1..=3 {
        assert_eq!(session.move_player(Direction::Right), CellCoord::new(1, 0));
        let events = session.tick();
        assert!(events.contains(&Event::GoalReached {
            cell: CellCoord::new(1, 0)
        }));
        assert_eq!(query::tick_index(session.world()), 1, "round {played}");

        let world = session.reset_round(round);
        assert_eq!(query::status(world), RoundStatus::InProgress);
        assert_eq!(query::player(world).cell, CellCoord::new(0, 0));
        assert_eq!(query::tick_index(world), 0);
    }
}

#[test]
fn reset_round_rebuilds_everything() {
    let mut session = session(8, RoundConfig::default());
    let cell = first_powerup(&session, PowerupKind::Invisibility);
    walk_to(&mut session, cell);
    let _ = session.tick();

    let round = RoundConfig::new(10, 12, 2, 1).expect("valid round");
    let world = session.reset_round(round);

    assert_eq!(query::dimensions(world).columns(), 12);
    assert_eq!(query::dimensions(world).rows(), 10);
    assert_eq!(query::maze(world).passage_count(), 119);
    assert_eq!(query::player(world).cell, CellCoord::new(0, 0));
    assert_eq!(query::goal(world).cell(), CellCoord::new(11, 9));
    assert_eq!(query::catcher_view(world).len(), 2);
    assert_eq!(query::powerup_view(world).into_vec().len(), 2);
    assert_eq!(
        query::held_powerups(world).count(PowerupKind::Invisibility),
        0
    );
    assert_eq!(session.round(), round);
}

#[test]
fn deterministic_replay_produces_identical_runs() {
    let first = replay(0x5eed);
    let second = replay(0x5eed);
    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Frame {
    player: CellCoord,
    catchers: Vec<CellCoord>,
    status: RoundStatus,
    events: usize,
}

#[derive(Debug, PartialEq, Eq)]
struct ReplayOutcome {
    frames: Vec<Frame>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.frames.hash(&mut hasher);
        hasher.finish()
    }
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut session = session(seed, RoundConfig::default());
    let goal = query::goal(session.world()).cell();
    let path = path_between(query::maze(session.world()), CellCoord::new(0, 0), goal);
    let mut steps = path.into_iter();
    let mut frames = Vec::new();

    for tick in 0..600u32 {
        session.clock().advance(Duration::from_millis(16));
        if tick % 4 == 0 {
            if let Some(direction) = steps.next() {
                let _ = session.move_player(direction);
            }
        }
        let events = session.tick();

        let world = session.world();
        frames.push(Frame {
            player: query::player(world).cell,
            catchers: query::catcher_view(world)
                .iter()
                .map(|catcher| catcher.cell)
                .collect(),
            status: query::status(world),
            events: events.len(),
        });
    }

    ReplayOutcome { frames }
}
