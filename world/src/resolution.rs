//! End-of-tick predicates comparing entity coordinates.
//!
//! These functions operate on snapshots only so that adapters can evaluate
//! them without holding a mutable world.

use std::time::Duration;

use maze_chase_core::{
    CatcherId, CatcherView, Goal, PlayerSnapshot, PowerupSnapshot, PowerupView,
    INVISIBILITY_DURATION,
};

/// Reports whether a visible player shares a cell with any catcher.
#[must_use]
pub fn check_collision(player: &PlayerSnapshot, catchers: &CatcherView) -> bool {
    catcher_on_player(player, catchers).is_some()
}

/// First catcher, in identifier order, standing on the visible player's cell.
#[must_use]
pub fn catcher_on_player(player: &PlayerSnapshot, catchers: &CatcherView) -> Option<CatcherId> {
    if player.is_invisible() {
        return None;
    }
    catchers
        .iter()
        .find(|catcher| catcher.cell == player.cell)
        .map(|catcher| catcher.id)
}

/// Uncollected power-ups lying on the player's cell.
pub fn collectable_powerups<'a>(
    player: &'a PlayerSnapshot,
    powerups: &'a PowerupView,
) -> impl Iterator<Item = &'a PowerupSnapshot> + 'a {
    powerups
        .uncollected()
        .filter(move |powerup| powerup.cell == player.cell)
}

/// Reports whether the player stands on the goal.
#[must_use]
pub fn reached_goal(player: &PlayerSnapshot, goal: Goal) -> bool {
    player.cell == goal.cell()
}

/// Reports whether an active invisibility effect has run its course at `now`.
#[must_use]
pub fn invisibility_expired(player: &PlayerSnapshot, now: Duration) -> bool {
    player
        .invisible_since
        .is_some_and(|since| now.saturating_sub(since) >= INVISIBILITY_DURATION)
}
