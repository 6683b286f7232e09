//! Scrolling row display on stdout.

use std::io::{self, Stdout, Write};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{queue, terminal};
use pt_engine::{RowRenderer, RowView};
use tracing::warn;

use super::cell_format::{format_command, format_param, format_period, format_sample, CELL_WIDTH};

/// Width assumed when the terminal size is unknown.
const FALLBACK_WIDTH: usize = 80;

/// One coloured run of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<Color>,
}

impl Segment {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

/// Lay out one row: hex row number, then as many cells as fit in `width`.
///
/// Every fourth row number is highlighted; muted channels are greyed out.
pub fn row_segments(view: &RowView<'_>, width: usize) -> Vec<Segment> {
    let label = format!("{:02X}", view.row);
    let mut segments = vec![if view.row % 4 == 0 {
        Segment::colored(label, Color::Yellow)
    } else {
        Segment::plain(label)
    }];

    let mut space = width.saturating_sub(3);
    for (cell, &muted) in view.cells.iter().zip(view.muted) {
        if space < CELL_WIDTH + 1 {
            break;
        }
        let tint = |color: Color| if muted { Color::DarkGrey } else { color };
        segments.push(Segment::plain("|"));
        let period = format_period(cell.period);
        segments.push(if muted {
            Segment::colored(period, Color::DarkGrey)
        } else {
            Segment::plain(period)
        });
        segments.push(Segment::colored(format_sample(cell.sample), tint(Color::Blue)));
        segments.push(Segment::colored(
            format_command(cell.effect.command),
            tint(Color::Magenta),
        ));
        segments.push(Segment::colored(format_param(cell.effect.param), tint(Color::Yellow)));
        space -= CELL_WIDTH + 1;
    }
    segments.push(Segment::plain("|"));
    segments
}

/// Prints each row as it plays.
pub struct TerminalRenderer {
    out: Stdout,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    fn draw(&mut self, view: &RowView<'_>) -> io::Result<()> {
        let width = terminal::size()
            .map(|(w, _)| w as usize)
            .unwrap_or(FALLBACK_WIDTH);
        let mut out = self.out.lock();
        for segment in row_segments(view, width) {
            match segment.color {
                Some(color) => queue!(
                    out,
                    SetForegroundColor(color),
                    Print(segment.text),
                    ResetColor
                )?,
                None => queue!(out, Print(segment.text))?,
            }
        }
        // Raw mode needs the explicit carriage return
        queue!(out, Print("\r\n"))?;
        out.flush()
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRenderer for TerminalRenderer {
    fn render(&mut self, view: &RowView<'_>) {
        if let Err(e) = self.draw(view) {
            warn!(error = %e, "row render failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_ir::{Cell, Effect};

    fn text(segments: &[Segment]) -> String {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn cells() -> Vec<Cell> {
        vec![
            Cell {
                sample: 1,
                period: 428,
                effect: Effect::set_volume(0x20),
            },
            Cell::empty(),
        ]
    }

    fn view<'a>(row: usize, cells: &'a [Cell], muted: &'a [bool]) -> RowView<'a> {
        RowView {
            position: 0,
            pattern: 0,
            row,
            cells,
            muted,
            bpm: 125,
        }
    }

    #[test]
    fn row_layout() {
        let cells = cells();
        let segments = row_segments(&view(0x1A, &cells, &[false, false]), 80);
        assert_eq!(text(&segments), "1A|01AC 1C20|         |");
        assert_eq!(segments[0].color, None);
    }

    #[test]
    fn beat_rows_are_highlighted() {
        let cells = cells();
        let segments = row_segments(&view(0x10, &cells, &[false, false]), 80);
        assert_eq!(segments[0].color, Some(Color::Yellow));
    }

    #[test]
    fn muted_channels_are_grey() {
        let cells = cells();
        let segments = row_segments(&view(1, &cells, &[true, false]), 80);
        assert!(segments[2..6].iter().all(|s| s.color == Some(Color::DarkGrey)));
        assert_eq!(segments[7].color, None);
        assert_eq!(segments[8].color, Some(Color::Blue));
    }

    #[test]
    fn narrow_terminals_truncate() {
        let cells = cells();
        let segments = row_segments(&view(1, &cells, &[false, false]), 20);
        assert_eq!(text(&segments), "01|01AC 1C20|");
    }
}
