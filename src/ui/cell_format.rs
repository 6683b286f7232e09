//! Cell text for the row display.
//!
//! Every field has a fixed width; empty fields are blank rather than
//! zero so a sparse pattern reads at a glance.

/// Characters one cell takes, not counting its separator.
pub const CELL_WIDTH: usize = 9;

/// Period in hex, blank when there is no note.
pub fn format_period(period: u16) -> String {
    if period > 0 {
        format!("{:04X}", period)
    } else {
        " ".repeat(4)
    }
}

/// Sample number in hex, right-aligned.
pub fn format_sample(sample: u8) -> String {
    if sample > 0 {
        format!("{:>2X}", sample)
    } else {
        " ".repeat(2)
    }
}

pub fn format_command(command: u8) -> String {
    if command > 0 {
        format!("{:X}", command & 0x0F)
    } else {
        " ".to_string()
    }
}

pub fn format_param(param: u8) -> String {
    if param > 0 {
        format!("{:02X}", param)
    } else {
        " ".repeat(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_ir::{Cell, Effect};

    fn format_cell(cell: &Cell) -> String {
        format_period(cell.period)
            + &format_sample(cell.sample)
            + &format_command(cell.effect.command)
            + &format_param(cell.effect.param)
    }

    #[test]
    fn full_cell() {
        let cell = Cell {
            sample: 0x1F,
            period: 428,
            effect: Effect::new(0xC, 0x20),
        };
        assert_eq!(format_cell(&cell), "01AC1FC20");
    }

    #[test]
    fn blank_fields() {
        assert_eq!(format_cell(&Cell::empty()), " ".repeat(CELL_WIDTH));
        let cell = Cell {
            sample: 3,
            period: 0,
            effect: Effect::new(0, 0x37),
        };
        assert_eq!(format_cell(&cell), "     3 37");
    }

    #[test]
    fn fixed_width() {
        let cell = Cell {
            sample: 1,
            period: 0xFFF,
            effect: Effect::set_tempo(0x7D),
        };
        assert_eq!(format_cell(&cell).len(), CELL_WIDTH);
    }
}
