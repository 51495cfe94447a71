//! Plain-text rasterizer and a backend that writes frames to any `io::Write`.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use maze_chase_core::{CellCoord, Direction, PowerupKind, RoundStatus};

use crate::{
    FrameControl, Marker, MarkerKind, Presentation, RenderingBackend, RenderingError, Scene,
};

const CORNER: char = '+';
const HORIZONTAL: &str = "---";
const VERTICAL: char = '|';
const OPEN: &str = "   ";

/// Draws the maze walls and markers of `scene` as ASCII art.
///
/// Every cell is three characters wide; the marker on top of a cell is drawn
/// in its centre. A player sharing a cell with a catcher is drawn as `X`.
#[must_use]
pub fn rasterize(scene: &Scene) -> String {
    render_grid(scene, None)
}

fn render_grid(scene: &Scene, paint: Option<fn(&Marker, char) -> String>) -> String {
    let mut out = String::new();

    for row in 0..scene.rows {
        for column in 0..scene.columns {
            out.push(CORNER);
            let walled = wall(scene, CellCoord::new(column, row), Direction::Up);
            out.push_str(if walled { HORIZONTAL } else { OPEN });
        }
        out.push(CORNER);
        out.push('\n');

        for column in 0..scene.columns {
            let cell = CellCoord::new(column, row);
            out.push(if wall(scene, cell, Direction::Left) {
                VERTICAL
            } else {
                ' '
            });
            out.push(' ');
            match scene.top_marker(cell) {
                Some(marker) => {
                    let glyph = glyph_for(scene, marker);
                    match paint {
                        Some(paint) => out.push_str(&paint(marker, glyph)),
                        None => out.push(glyph),
                    }
                }
                None => out.push(' '),
            }
            out.push(' ');
        }
        let last = CellCoord::new(scene.columns.saturating_sub(1), row);
        out.push(if wall(scene, last, Direction::Right) {
            VERTICAL
        } else {
            ' '
        });
        out.push('\n');
    }

    if scene.rows > 0 {
        let bottom = scene.rows - 1;
        for column in 0..scene.columns {
            out.push(CORNER);
            let walled = wall(scene, CellCoord::new(column, bottom), Direction::Down);
            out.push_str(if walled { HORIZONTAL } else { OPEN });
        }
        out.push(CORNER);
        out.push('\n');
    }

    out
}

fn wall(scene: &Scene, cell: CellCoord, direction: Direction) -> bool {
    scene
        .walls_at(cell)
        .map_or(true, |walls| walls.has(direction))
}

fn glyph_for(scene: &Scene, marker: &Marker) -> char {
    let shared_with_catcher = matches!(marker.kind, MarkerKind::Player { .. })
        && scene
            .markers
            .iter()
            .any(|other| other.kind == MarkerKind::Catcher && other.cell == marker.cell);
    if shared_with_catcher {
        'X'
    } else {
        marker.kind.glyph()
    }
}

fn ansi_paint(marker: &Marker, glyph: char) -> String {
    let [red, green, blue] = marker.color.to_rgb_u8();
    format!("\x1b[38;2;{red};{green};{blue}m{glyph}\x1b[0m")
}

fn hud_line(scene: &Scene) -> String {
    let status = match scene.hud.status {
        RoundStatus::InProgress => "in progress",
        RoundStatus::Caught => "caught",
        RoundStatus::Won => "won",
    };
    format!(
        "Invisibility: {}  Teleport: {}  Status: {}",
        scene.hud.held.count(PowerupKind::Invisibility),
        scene.hud.held.count(PowerupKind::Teleportation),
        status
    )
}

/// Backend that prints frames as text, one every `frame_every` updates.
#[derive(Debug)]
pub struct TextBackend<W> {
    writer: W,
    frame_delta: Duration,
    frame_every: u64,
    ansi_colors: bool,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing to `writer`, simulating `frame_delta` per update.
    ///
    /// Returns an error when `frame_every` is zero.
    pub fn new(
        writer: W,
        frame_delta: Duration,
        frame_every: u64,
    ) -> Result<Self, RenderingError> {
        if frame_every == 0 {
            return Err(RenderingError::InvalidFrameInterval { frame_every });
        }

        Ok(Self {
            writer,
            frame_delta,
            frame_every,
            ansi_colors: false,
        })
    }

    /// Colors markers with 24-bit ANSI escape sequences.
    #[must_use]
    pub fn with_ansi_colors(mut self, enabled: bool) -> Self {
        self.ansi_colors = enabled;
        self
    }

    /// Consumes the backend, returning its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_frame(&mut self, scene: &Scene, frame: u64) -> AnyResult<()> {
        let grid = if self.ansi_colors {
            render_grid(scene, Some(ansi_paint))
        } else {
            rasterize(scene)
        };

        writeln!(self.writer, "frame {frame}").context("writing frame header")?;
        self.writer
            .write_all(grid.as_bytes())
            .context("writing maze")?;
        writeln!(self.writer, "{}", hud_line(scene)).context("writing status line")?;
        if let Some(message) = &scene.hud.message {
            writeln!(self.writer, "{message}").context("writing message")?;
        }
        Ok(())
    }

    /// Runs the frame loop without consuming the backend.
    pub fn run_in_place<F>(
        &mut self,
        presentation: Presentation,
        mut update_scene: F,
    ) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) -> FrameControl,
    {
        let Presentation { title, mut scene, .. } = presentation;
        writeln!(self.writer, "{title}").context("writing title")?;

        let mut frame = 0_u64;
        loop {
            let control = update_scene(self.frame_delta, &mut scene);
            frame += 1;

            let last = control == FrameControl::Exit;
            if last || frame % self.frame_every == 0 {
                self.write_frame(&scene, frame)?;
            }
            if last {
                break;
            }
        }

        self.writer.flush().context("flushing frames")?;
        Ok(())
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn run<F>(mut self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) -> FrameControl,
    {
        self.run_in_place(presentation, update_scene)
    }
}
