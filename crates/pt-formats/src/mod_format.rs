//! ProTracker MOD format parser.
//!
//! Layout (big-endian):
//!
//! | offset | size      | field                                 |
//! |--------|-----------|---------------------------------------|
//! | 0      | 20        | title                                 |
//! | 20     | 31 * 30   | sample descriptors                    |
//! | 950    | 1         | song length                           |
//! | 951    | 1         | restart position                      |
//! | 952    | 128       | pattern sequence table                |
//! | 1080   | 4         | format tag                            |
//! | 1084   | n * 64 * c * 4 | patterns                         |
//! | ...    |           | 8-bit PCM, in descriptor order        |

use pt_ir::{
    fit, Cell, Effect, Module, Pattern, Sample, MAX_SEQUENCE_LENGTH, MAX_VOLUME,
    ROWS_PER_PATTERN, SAMPLE_COUNT,
};
use tracing::debug;

use crate::cursor::ByteCursor;
use crate::FormatError;

/// Load a MOD file from bytes.
///
/// Nothing is returned unless the whole file parsed; a short read anywhere
/// fails with [`FormatError::MalformedModule`].
pub fn load_mod(data: &[u8]) -> Result<Module, FormatError> {
    let mut cur = ByteCursor::new(data);

    let title = cur.read_string(20)?;

    let mut samples = Vec::with_capacity(SAMPLE_COUNT);
    for _ in 0..SAMPLE_COUNT {
        samples.push(parse_sample_header(&mut cur)?);
    }

    let song_length = cur.read_u8()?;
    let restart_position = cur.read_u8()?;
    let sequence_table: [u8; MAX_SEQUENCE_LENGTH] = cur.read_array()?;

    let format_tag: [u8; 4] = cur.read_array()?;
    let channel_count =
        channels_for_tag(&format_tag).ok_or_else(|| FormatError::UnsupportedFormat {
            tag: String::from_utf8_lossy(&format_tag).into_owned(),
        })?;

    if song_length == 0 {
        return Err(FormatError::EmptySong);
    }

    // Every stored entry counts, including those past the song length
    let pattern_count = sequence_table.iter().copied().max().unwrap_or(0) as usize + 1;
    let mut patterns = Vec::with_capacity(pattern_count);
    for _ in 0..pattern_count {
        patterns.push(parse_pattern(&mut cur, channel_count)?);
    }

    for sample in &mut samples {
        let bytes = cur.take(sample.length as usize * 2)?;
        sample.set_pcm8(bytes);
    }

    debug!(
        title = %title,
        channels = channel_count,
        patterns = pattern_count,
        song_length,
        trailing = cur.remaining(),
        "parsed module"
    );

    Ok(Module {
        title: fit(&title),
        format_tag,
        channel_count,
        song_length,
        restart_position,
        sequence_table,
        patterns,
        samples,
    })
}

/// Resolve the channel count from the 4-byte format tag.
pub fn channels_for_tag(tag: &[u8; 4]) -> Option<u8> {
    let channels = match tag {
        b"M.K." | b"M!K!" | b"M&K!" => 4,
        b"CD81" | b"OKTA" | b"OCTA" => 8,
        [d, b'C', b'H', b'N'] if d.is_ascii_digit() => d - b'0',
        [hi, lo, b'C', b'H'] if hi.is_ascii_digit() && lo.is_ascii_digit() => {
            (hi - b'0') * 10 + (lo - b'0')
        }
        [b'T', b'D', b'Z', d] if d.is_ascii_digit() => d - b'0',
        _ => return None,
    };
    (channels > 0).then_some(channels)
}

/// Parse a sample descriptor (30 bytes). PCM is attached later.
fn parse_sample_header(cur: &mut ByteCursor<'_>) -> Result<Sample, FormatError> {
    let name = cur.read_string(22)?;
    let length = cur.read_u16_be()?;
    let finetune = decode_finetune(cur.read_u8()?);
    let volume = cur.read_u8()?.min(MAX_VOLUME);
    let loop_start = cur.read_u16_be()?;
    let loop_length = cur.read_u16_be()?;

    let mut sample = Sample::default();
    sample.name = fit(&name);
    sample.length = length;
    sample.finetune = finetune;
    sample.volume = volume;
    sample.loop_start = loop_start;
    sample.loop_length = loop_length;
    Ok(sample)
}

/// Finetune nibble: bit 3 is the sign, bits 0-2 the magnitude.
fn decode_finetune(byte: u8) -> i8 {
    let nibble = byte & 0x0F;
    let magnitude = (nibble & 0x07) as i8;
    if nibble & 0x08 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Parse a pattern (64 rows of `channels` cells).
fn parse_pattern(cur: &mut ByteCursor<'_>, channels: u8) -> Result<Pattern, FormatError> {
    let mut pattern = Pattern::new(channels);
    for row in 0..ROWS_PER_PATTERN {
        for ch in 0..channels {
            *pattern.cell_mut(row, ch) = parse_cell(cur.read_u32_be()?);
        }
    }
    Ok(pattern)
}

/// Unpack a cell word.
///
/// ```text
/// ssss pppp pppp pppp ssss eeee aaaa aaaa
/// ```
/// The sample number is split across the top nibbles of bytes 0 and 2.
fn parse_cell(word: u32) -> Cell {
    let sample_hi = ((word >> 28) & 0x0F) as u8;
    let sample_lo = ((word >> 12) & 0x0F) as u8;
    Cell {
        sample: (sample_hi << 4) | sample_lo,
        period: ((word >> 16) & 0x0FFF) as u16,
        effect: Effect::new(((word >> 8) & 0x0F) as u8, (word & 0xFF) as u8),
    }
}
