#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Maze Chase adapters.

mod text;

pub use text::{rasterize, TextBackend};

use anyhow::Result as AnyResult;
use maze_chase_core::{
    CatcherView, CellCoord, Event, FallbackReason, Goal, HeldPowerups, Maze, PlayerSnapshot,
    PowerupKind, PowerupView, RoundStatus, TeleportRoute, Walls,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Channels quantized to bytes, as terminals and image formats expect.
    #[must_use]
    pub fn to_rgb_u8(self) -> [u8; 3] {
        [
            quantize(self.red),
            quantize(self.green),
            quantize(self.blue),
        ]
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Colors used for every scene element.
pub mod palette {
    use super::Color;

    /// Background behind the maze.
    pub const BACKGROUND: Color = Color::from_rgb_u8(255, 255, 255);
    /// Maze walls.
    pub const WALL: Color = Color::from_rgb_u8(0, 0, 0);
    /// The player.
    pub const PLAYER: Color = Color::from_rgb_u8(255, 0, 0);
    /// The goal cell.
    pub const GOAL: Color = Color::from_rgb_u8(0, 255, 0);
    /// Catchers.
    pub const CATCHER: Color = Color::from_rgb_u8(0, 0, 255);
    /// Invisibility power-ups.
    pub const INVISIBILITY: Color = Color::from_rgb_u8(160, 32, 240);
    /// Teleportation power-ups.
    pub const TELEPORTATION: Color = Color::from_rgb_u8(255, 165, 0);
    /// Status messages.
    pub const MESSAGE: Color = Color::from_rgb_u8(255, 255, 0);
}

/// Role of a marker drawn on top of the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The cell the player must reach.
    Goal,
    /// A power-up waiting to be collected.
    Powerup(PowerupKind),
    /// A catcher.
    Catcher,
    /// The player.
    Player {
        /// Whether catchers currently ignore the player.
        invisible: bool,
    },
}

impl MarkerKind {
    /// Single character used by text backends.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Goal => 'G',
            Self::Powerup(PowerupKind::Invisibility) => 'I',
            Self::Powerup(PowerupKind::Teleportation) => 'T',
            Self::Catcher => 'C',
            Self::Player { invisible: false } => '@',
            Self::Player { invisible: true } => 'o',
        }
    }

    const fn layer(self) -> u8 {
        match self {
            Self::Goal => 0,
            Self::Powerup(_) => 1,
            Self::Catcher => 2,
            Self::Player { .. } => 3,
        }
    }
}

/// Entity drawn inside a single maze cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    /// Role of the marker.
    pub kind: MarkerKind,
    /// Cell the marker sits in.
    pub cell: CellCoord,
    /// Fill color of the marker.
    pub color: Color,
    /// Radius expressed as a fraction of the cell length.
    pub radius: f32,
}

impl Marker {
    /// Creates a marker with the default look for its kind.
    #[must_use]
    pub fn new(kind: MarkerKind, cell: CellCoord) -> Self {
        let (color, radius) = match kind {
            MarkerKind::Goal => (palette::GOAL, 0.5),
            MarkerKind::Powerup(PowerupKind::Invisibility) => (palette::INVISIBILITY, 0.25),
            MarkerKind::Powerup(PowerupKind::Teleportation) => (palette::TELEPORTATION, 0.25),
            MarkerKind::Catcher => (palette::CATCHER, 1.0 / 3.0),
            MarkerKind::Player { invisible: false } => (palette::PLAYER, 1.0 / 3.0),
            MarkerKind::Player { invisible: true } => (palette::PLAYER.lighten(0.6), 1.0 / 3.0),
        };
        Self {
            kind,
            cell,
            color,
            radius,
        }
    }
}

/// Counters and status line shown next to the maze.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Hud {
    /// Power-ups the player carries.
    pub held: HeldPowerups,
    /// Lifecycle of the round.
    pub status: RoundStatus,
    /// Most recent message worth showing to the player.
    pub message: Option<String>,
}

/// Scene description combining the maze walls, its inhabitants and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Number of maze columns.
    pub columns: u32,
    /// Number of maze rows.
    pub rows: u32,
    /// Wall flags for every cell in row-major order.
    pub walls: Vec<Walls>,
    /// Entities to draw, sorted so later markers are drawn on top.
    pub markers: Vec<Marker>,
    /// Counters and status line.
    pub hud: Hud,
}

impl Scene {
    /// Captures a scene from read-only round snapshots.
    #[must_use]
    pub fn new(
        maze: &Maze,
        goal: Goal,
        player: PlayerSnapshot,
        catchers: &CatcherView,
        powerups: &PowerupView,
        status: RoundStatus,
    ) -> Self {
        let dimensions = maze.dimensions();
        let walls = dimensions
            .cells()
            .map(|cell| maze.cell(cell).map_or(Walls::ALL, |cell| cell.walls()))
            .collect();

        let mut markers = Vec::with_capacity(2 + catchers.len());
        markers.push(Marker::new(MarkerKind::Goal, goal.cell()));
        markers.extend(
            powerups
                .uncollected()
                .map(|powerup| Marker::new(MarkerKind::Powerup(powerup.kind), powerup.cell)),
        );
        markers.extend(
            catchers
                .iter()
                .map(|catcher| Marker::new(MarkerKind::Catcher, catcher.cell)),
        );
        markers.push(Marker::new(
            MarkerKind::Player {
                invisible: player.is_invisible(),
            },
            player.cell,
        ));
        markers.sort_by_key(|marker| marker.kind.layer());

        Self {
            columns: dimensions.columns(),
            rows: dimensions.rows(),
            walls,
            markers,
            hud: Hud {
                held: player.held,
                status,
                message: None,
            },
        }
    }

    /// Wall flags of the provided cell, if it lies inside the maze.
    #[must_use]
    pub fn walls_at(&self, cell: CellCoord) -> Option<Walls> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let index = usize::try_from(cell.row()).ok()? * usize::try_from(self.columns).ok()?
            + usize::try_from(cell.column()).ok()?;
        self.walls.get(index).copied()
    }

    /// Marker drawn on top within the provided cell.
    #[must_use]
    pub fn top_marker(&self, cell: CellCoord) -> Option<&Marker> {
        self.markers.iter().rev().find(|marker| marker.cell == cell)
    }
}

/// Player-facing message describing an event, if it deserves one.
#[must_use]
pub fn event_message(event: &Event) -> Option<String> {
    let message = match event {
        Event::PowerupCollected { kind, .. } => format!("Collected {} power-up!", kind.label()),
        Event::PlayerCaught { .. } => "CAUGHT! The round is over.".to_owned(),
        Event::GoalReached { .. } => "CONGRATULATIONS! You reached the goal!".to_owned(),
        Event::InvisibilityActivated { .. } => "Invisibility activated!".to_owned(),
        Event::InvisibilityExpired => "Invisibility expired!".to_owned(),
        Event::PlayerTeleported { route, .. } => match fallback_note(*route) {
            Some(note) => format!("Teleported! ({note})"),
            None => "Teleported!".to_owned(),
        },
        Event::TeleportFailed { route, .. } => match fallback_note(*route) {
            Some(note) => format!("Teleportation failed - no clear path forward! ({note})"),
            None => "Teleportation failed!".to_owned(),
        },
        _ => return None,
    };
    Some(message)
}

fn fallback_note(route: TeleportRoute) -> Option<&'static str> {
    match route {
        TeleportRoute::Direct => None,
        TeleportRoute::Fallback { reason } => Some(match reason {
            FallbackReason::TimedOut => "path search timed out, used backup teleport",
            FallbackReason::NoProgress => "path led away from the goal, used forward teleport",
            FallbackReason::FrontierExhausted => "no path found, used forward teleport",
        }),
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            clear_color,
            scene,
        }
    }
}

/// Decision returned by the scene update closure after every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Keep presenting frames.
    Continue,
    /// Present this frame and stop.
    Exit,
}

/// Rendering backend capable of presenting Maze Chase scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until the update closure asks it to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta
    /// and may mutate the scene before it is presented, allowing adapters to
    /// animate world snapshots deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) -> FrameControl;
}

/// Errors that can occur when constructing rendering backends.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Frames must be presented at a positive interval.
    InvalidFrameInterval {
        /// Provided interval that failed validation.
        frame_every: u64,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameInterval { frame_every } => {
                write!(f, "frame_every must be positive (received {frame_every})")
            }
        }
    }
}

impl Error for RenderingError {}
