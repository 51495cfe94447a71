#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic catcher decision system that proposes one step per throttled catcher.

use std::collections::{BTreeMap, VecDeque};

use maze_chase_core::{
    CatcherId, CatcherView, CellCoord, Command, Direction, Event, GridDimensions, Maze,
    CATCHER_HISTORY_LEN,
};
use rand::Rng;

const MOVE_DELAY_TICKS: std::ops::RangeInclusive<u32> = 10..=18;
const MODE_SWITCH_DECISIONS: std::ops::RangeInclusive<u32> = 10..=15;
const WANDER_STEPS: std::ops::RangeInclusive<u32> = 5..=10;
const HUNT_PROBABILITY: f64 = 0.7;
const PATROL_PROBABILITY: f64 = 0.8;

/// Behaviour a catcher follows when it picks its next step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatcherMode {
    /// Close in on the player most of the time.
    Hunt,
    /// Head toward a random cell, choosing a new one once it is reached.
    Patrol {
        /// Cell currently patrolled toward; catchers that start patrolling have none.
        target: Option<CellCoord>,
    },
    /// Drift randomly for a limited number of decisions.
    Wander {
        /// Random decisions remaining before the catcher falls back to its default.
        steps_left: u32,
    },
}

impl CatcherMode {
    fn draw<R>(dimensions: GridDimensions, entering: bool, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        match rng.gen_range(0..3) {
            0 => Self::Hunt,
            1 => Self::Patrol {
                target: if entering {
                    random_cell(dimensions, rng)
                } else {
                    None
                },
            },
            _ => Self::Wander {
                steps_left: if entering {
                    rng.gen_range(WANDER_STEPS)
                } else {
                    0
                },
            },
        }
    }

    fn steer<R>(
        &mut self,
        cell: CellCoord,
        player: CellCoord,
        dimensions: GridDimensions,
        options: &[(Direction, CellCoord)],
        rng: &mut R,
    ) -> Option<(Direction, CellCoord)>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Hunt => {
                if rng.gen_bool(HUNT_PROBABILITY) {
                    closest_to(options, player)
                } else {
                    None
                }
            }
            Self::Patrol {
                target: Some(target),
            } => {
                if !rng.gen_bool(PATROL_PROBABILITY) {
                    return None;
                }
                let choice = closest_to(options, *target);
                if cell == *target {
                    if let Some(next) = random_cell(dimensions, rng) {
                        *target = next;
                    }
                }
                choice
            }
            Self::Patrol { target: None } => None,
            Self::Wander { steps_left } => {
                if *steps_left == 0 {
                    return None;
                }
                *steps_left -= 1;
                pick_uniform(options, rng)
            }
        }
    }
}

/// Pure system that owns every catcher's decision state and emits step commands.
#[derive(Debug, Default)]
pub struct CatcherAi {
    dimensions: GridDimensions,
    brains: BTreeMap<CatcherId, Brain>,
    permitted: Vec<(Direction, CellCoord)>,
    fresh: Vec<(Direction, CellCoord)>,
}

impl CatcherAi {
    /// Creates an empty decision system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit catcher step commands.
    ///
    /// Brains are rebuilt when a round is configured and created as catchers
    /// spawn. Decisions are only taken for batches that advance time.
    pub fn handle<R>(
        &mut self,
        events: &[Event],
        catchers: &CatcherView,
        maze: &Maze,
        player: CellCoord,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        let mut advanced = false;
        for event in events {
            match event {
                Event::RoundConfigured { dimensions, .. } => {
                    self.dimensions = *dimensions;
                    self.brains.clear();
                }
                Event::CatcherSpawned { catcher, .. } => {
                    let brain = Brain::spawn(self.dimensions, rng);
                    let _ = self.brains.insert(*catcher, brain);
                }
                Event::TimeAdvanced { .. } => advanced = true,
                _ => {}
            }
        }

        if !advanced {
            return;
        }

        for catcher in catchers.iter() {
            let Some(brain) = self.brains.get_mut(&catcher.id) else {
                continue;
            };
            if !brain.throttle() {
                continue;
            }

            self.permitted.clear();
            self.permitted.extend(maze.open_directions(catcher.cell).filter_map(|direction| {
                maze.dimensions()
                    .neighbor(catcher.cell, direction)
                    .map(|next| (direction, next))
            }));

            if let Some((direction, next)) = brain.decide(
                catcher.cell,
                player,
                self.dimensions,
                &self.permitted,
                &mut self.fresh,
                rng,
            ) {
                tracing::trace!(
                    catcher = catcher.id.get(),
                    ?direction,
                    mode = ?brain.mode,
                    "catcher step"
                );
                brain.remember(next);
                out.push(Command::StepCatcher {
                    catcher: catcher.id,
                    direction,
                });
            }
        }
    }

    /// Recent positions of a catcher, oldest first.
    #[must_use]
    pub fn history(&self, catcher: CatcherId) -> Option<Vec<CellCoord>> {
        self.brains
            .get(&catcher)
            .map(|brain| brain.history.iter().copied().collect())
    }

    /// Behaviour the catcher currently follows.
    #[must_use]
    pub fn mode(&self, catcher: CatcherId) -> Option<CatcherMode> {
        self.brains.get(&catcher).map(|brain| brain.mode)
    }

    /// Number of ticks between two decisions of the catcher.
    #[must_use]
    pub fn move_delay(&self, catcher: CatcherId) -> Option<u32> {
        self.brains.get(&catcher).map(|brain| brain.move_delay)
    }
}

#[derive(Clone, Debug)]
struct Brain {
    move_delay: u32,
    ticks_waited: u32,
    history: VecDeque<CellCoord>,
    mode: CatcherMode,
    decisions_since_switch: u32,
}

impl Brain {
    fn spawn<R>(dimensions: GridDimensions, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let move_delay = rng.gen_range(MOVE_DELAY_TICKS);
        let mode = CatcherMode::draw(dimensions, false, rng);
        Self {
            move_delay,
            ticks_waited: 0,
            history: VecDeque::with_capacity(CATCHER_HISTORY_LEN + 1),
            mode,
            decisions_since_switch: 0,
        }
    }

    fn throttle(&mut self) -> bool {
        self.ticks_waited = self.ticks_waited.saturating_add(1);
        if self.ticks_waited < self.move_delay {
            return false;
        }
        self.ticks_waited = 0;
        true
    }

    fn decide<R>(
        &mut self,
        cell: CellCoord,
        player: CellCoord,
        dimensions: GridDimensions,
        permitted: &[(Direction, CellCoord)],
        fresh: &mut Vec<(Direction, CellCoord)>,
        rng: &mut R,
    ) -> Option<(Direction, CellCoord)>
    where
        R: Rng + ?Sized,
    {
        if permitted.is_empty() {
            return None;
        }

        self.decisions_since_switch = self.decisions_since_switch.saturating_add(1);
        if self.decisions_since_switch >= rng.gen_range(MODE_SWITCH_DECISIONS) {
            self.decisions_since_switch = 0;
            self.mode = CatcherMode::draw(dimensions, true, rng);
        }

        fresh.clear();
        fresh.extend(
            permitted
                .iter()
                .copied()
                .filter(|(_, next)| !self.history.contains(next)),
        );
        let options = if fresh.is_empty() {
            permitted
        } else {
            fresh.as_slice()
        };

        self.mode
            .steer(cell, player, dimensions, options, rng)
            .or_else(|| pick_uniform(options, rng))
    }

    fn remember(&mut self, cell: CellCoord) {
        self.history.push_back(cell);
        while self.history.len() > CATCHER_HISTORY_LEN {
            let _ = self.history.pop_front();
        }
    }
}

fn closest_to(
    options: &[(Direction, CellCoord)],
    target: CellCoord,
) -> Option<(Direction, CellCoord)> {
    let mut best: Option<((Direction, CellCoord), u32)> = None;
    for option in options {
        let distance = option.1.manhattan_distance(target);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((*option, distance));
        }
    }
    best.map(|(option, _)| option)
}

fn pick_uniform<R>(
    options: &[(Direction, CellCoord)],
    rng: &mut R,
) -> Option<(Direction, CellCoord)>
where
    R: Rng + ?Sized,
{
    if options.is_empty() {
        return None;
    }
    Some(options[rng.gen_range(0..options.len())])
}

fn random_cell<R>(dimensions: GridDimensions, rng: &mut R) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    if dimensions.columns() == 0 || dimensions.rows() == 0 {
        return None;
    }
    Some(CellCoord::new(
        rng.gen_range(0..dimensions.columns()),
        rng.gen_range(0..dimensions.rows()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn brain(mode: CatcherMode) -> Brain {
        Brain {
            move_delay: 10,
            ticks_waited: 0,
            history: VecDeque::new(),
            mode,
            decisions_since_switch: 0,
        }
    }

    #[test]
    fn closest_prefers_scan_order_on_ties() {
        let origin = CellCoord::new(1, 1);
        let options = [
            (Direction::Up, CellCoord::new(1, 0)),
            (Direction::Right, CellCoord::new(2, 1)),
            (Direction::Down, CellCoord::new(1, 2)),
        ];
        // Up and Right are both two steps from (2, 0).
        assert_eq!(
            closest_to(&options, CellCoord::new(2, 0)),
            Some((Direction::Up, CellCoord::new(1, 0)))
        );
        assert_eq!(closest_to(&[], origin), None);
    }

    #[test]
    fn throttle_fires_once_per_delay() {
        let mut brain = brain(CatcherMode::Hunt);
        let fired: Vec<bool> = (0..25).map(|_| brain.throttle()).collect();
        assert_eq!(fired.iter().filter(|fired| **fired).count(), 2);
        assert!(fired[9]);
        assert!(fired[19]);
    }

    #[test]
    fn history_keeps_latest_entries() {
        let mut brain = brain(CatcherMode::Hunt);
        for column in 0..8 {
            brain.remember(CellCoord::new(column, 0));
        }
        let history: Vec<_> = brain.history.iter().copied().collect();
        assert_eq!(
            history,
            (3..8).map(|column| CellCoord::new(column, 0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn wander_counts_down_then_falls_through() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let options = [(Direction::Left, CellCoord::new(0, 0))];
        let mut mode = CatcherMode::Wander { steps_left: 1 };
        let dimensions = GridDimensions::new(2, 1);
        let origin = CellCoord::new(1, 0);

        assert!(mode.steer(origin, origin, dimensions, &options, &mut rng).is_some());
        assert_eq!(mode, CatcherMode::Wander { steps_left: 0 });
        assert!(mode.steer(origin, origin, dimensions, &options, &mut rng).is_none());
    }

    fn crossroads(cell: CellCoord) -> [(Direction, CellCoord); 4] {
        [
            (Direction::Up, CellCoord::new(cell.column(), cell.row() - 1)),
            (Direction::Right, CellCoord::new(cell.column() + 1, cell.row())),
            (Direction::Down, CellCoord::new(cell.column(), cell.row() + 1)),
            (Direction::Left, CellCoord::new(cell.column() - 1, cell.row())),
        ]
    }

    #[test]
    fn hunt_steers_toward_player_seven_times_in_ten() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let dimensions = GridDimensions::new(5, 5);
        let cell = CellCoord::new(2, 2);
        let player = CellCoord::new(4, 2);
        let options = crossroads(cell);
        let toward = (Direction::Right, CellCoord::new(3, 2));

        let mut steered = 0;
        for _ in 0..1_000 {
            let mut mode = CatcherMode::Hunt;
            if let Some(choice) = mode.steer(cell, player, dimensions, &options, &mut rng) {
                assert_eq!(choice, toward);
                steered += 1;
            }
            assert_eq!(mode, CatcherMode::Hunt);
        }
        assert!((620..=780).contains(&steered), "steered {steered} of 1000");
    }

    #[test]
    fn hunting_decision_prefers_the_player_side() {
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let dimensions = GridDimensions::new(5, 5);
        let cell = CellCoord::new(2, 2);
        let player = CellCoord::new(2, 0);
        let options = crossroads(cell);
        let mut fresh = Vec::new();

        let mut toward = 0;
        for _ in 0..1_000 {
            let mut brain = brain(CatcherMode::Hunt);
            let choice = brain.decide(cell, player, dimensions, &options, &mut fresh, &mut rng);
            if choice == Some((Direction::Up, CellCoord::new(2, 1))) {
                toward += 1;
            }
        }
        // Steered 70% of the time, plus a quarter of the uniform fallbacks.
        assert!((700..=850).contains(&toward), "moved toward {toward} of 1000");
    }

    #[test]
    fn patrol_draws_new_target_on_arrival() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let dimensions = GridDimensions::new(20, 20);
        let cell = CellCoord::new(5, 5);
        let options = crossroads(cell);

        let mut steered = 0;
        let mut retargeted = 0;
        for _ in 0..1_000 {
            let mut mode = CatcherMode::Patrol { target: Some(cell) };
            let choice = mode.steer(cell, cell, dimensions, &options, &mut rng);
            let CatcherMode::Patrol {
                target: Some(target),
            } = mode
            else {
                panic!("patrol keeps a target, got {mode:?}");
            };
            assert!(dimensions.contains(target));

            if choice.is_some() {
                steered += 1;
                if target != cell {
                    retargeted += 1;
                }
            } else {
                assert_eq!(target, cell, "only a steered decision retargets");
            }
        }
        assert!((720..=880).contains(&steered), "steered {steered} of 1000");
        assert!(retargeted + 10 >= steered, "retargeted {retargeted} of {steered}");
    }

    #[test]
    fn patrol_keeps_target_until_reached() {
        let mut rng = ChaCha8Rng::seed_from_u64(24);
        let dimensions = GridDimensions::new(5, 5);
        let cell = CellCoord::new(2, 2);
        let target = CellCoord::new(0, 2);
        let options = crossroads(cell);

        for _ in 0..100 {
            let mut mode = CatcherMode::Patrol {
                target: Some(target),
            };
            if let Some(choice) = mode.steer(cell, cell, dimensions, &options, &mut rng) {
                assert_eq!(choice, (Direction::Left, CellCoord::new(1, 2)));
            }
            assert_eq!(
                mode,
                CatcherMode::Patrol {
                    target: Some(target)
                }
            );
        }
    }

    #[test]
    fn mode_switches_every_ten_to_fifteen_decisions() {
        let mut rng = ChaCha8Rng::seed_from_u64(25);
        let dimensions = GridDimensions::new(5, 5);
        let cell = CellCoord::new(2, 2);
        let options = crossroads(cell);
        let mut fresh = Vec::new();
        let mut brain = brain(CatcherMode::Hunt);

        let mut gaps = Vec::new();
        let mut since_switch = 0;
        let mut entered = [false; 3];
        for _ in 0..20_000 {
            let _ = brain.decide(cell, cell, dimensions, &options, &mut fresh, &mut rng);
            since_switch += 1;
            if brain.decisions_since_switch != 0 {
                continue;
            }
            gaps.push(since_switch);
            since_switch = 0;

            // The decision that switched has already steered once in the new mode.
            match brain.mode {
                CatcherMode::Hunt => entered[0] = true,
                CatcherMode::Patrol { target } => {
                    let target = target.expect("entering patrol draws a target");
                    assert!(dimensions.contains(target));
                    entered[1] = true;
                }
                CatcherMode::Wander { steps_left } => {
                    assert!((4..=10).contains(&steps_left), "steps left {steps_left}");
                    entered[2] = true;
                }
            }
        }

        assert!(gaps.len() > 1_000);
        assert!(gaps.iter().all(|gap| (10..=15).contains(gap)), "gaps {gaps:?}");
        assert_eq!(gaps.iter().min(), Some(&10));
        assert_eq!(gaps.iter().max(), Some(&15));
        assert_eq!(entered, [true; 3]);
    }

    #[test]
    fn entering_wander_draws_five_to_ten_steps() {
        let mut rng = ChaCha8Rng::seed_from_u64(26);
        let dimensions = GridDimensions::new(5, 5);
        let mut drawn = Vec::new();
        for _ in 0..300 {
            match CatcherMode::draw(dimensions, true, &mut rng) {
                CatcherMode::Wander { steps_left } => drawn.push(steps_left),
                CatcherMode::Patrol { target } => assert!(target.is_some()),
                CatcherMode::Hunt => {}
            }
        }
        assert!(drawn.iter().all(|steps| WANDER_STEPS.contains(steps)));
        assert!(drawn.contains(&5) && drawn.contains(&10));
    }

    #[test]
    fn patrol_without_target_falls_through() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let options = [(Direction::Left, CellCoord::new(0, 0))];
        let mut mode = CatcherMode::Patrol { target: None };
        let origin = CellCoord::new(1, 0);
        assert!(mode
            .steer(origin, origin, GridDimensions::new(2, 1), &options, &mut rng)
            .is_none());
    }

    #[test]
    fn recent_cells_are_avoided_when_alternatives_exist() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let cell = CellCoord::new(1, 1);
        let permitted = [
            (Direction::Up, CellCoord::new(1, 0)),
            (Direction::Down, CellCoord::new(1, 2)),
        ];
        let mut fresh = Vec::new();
        for _ in 0..50 {
            let mut brain = brain(CatcherMode::Wander { steps_left: 3 });
            brain.remember(CellCoord::new(1, 0));
            let choice = brain.decide(
                cell,
                cell,
                GridDimensions::new(3, 3),
                &permitted,
                &mut fresh,
                &mut rng,
            );
            assert_eq!(choice, Some((Direction::Down, CellCoord::new(1, 2))));
        }
    }

    #[test]
    fn dead_end_backtracks_into_history() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut brain = brain(CatcherMode::Hunt);
        brain.remember(CellCoord::new(0, 0));
        let permitted = [(Direction::Left, CellCoord::new(0, 0))];
        let mut fresh = Vec::new();
        let choice = brain.decide(
            CellCoord::new(1, 0),
            CellCoord::new(1, 0),
            GridDimensions::new(2, 1),
            &permitted,
            &mut fresh,
            &mut rng,
        );
        assert_eq!(choice, Some((Direction::Left, CellCoord::new(0, 0))));
    }

    #[test]
    fn walled_in_catcher_does_not_decide() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut brain = brain(CatcherMode::Hunt);
        let mut fresh = Vec::new();
        let cell = CellCoord::new(0, 0);
        assert!(brain
            .decide(cell, cell, GridDimensions::new(1, 1), &[], &mut fresh, &mut rng)
            .is_none());
        assert_eq!(brain.decisions_since_switch, 0);
    }
}
