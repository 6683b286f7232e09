//! Effect column commands.
//!
//! A MOD cell carries a 4-bit command and an 8-bit parameter. The player
//! acts on [`EffectKind::SetVolume`] and [`EffectKind::SetTempo`]; every
//! other command is decoded and kept so it can be displayed, but does
//! nothing during playback.

use core::fmt;

/// Raw effect column value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Effect {
    /// Command nibble (0x0-0xF)
    pub command: u8,
    /// Parameter byte
    pub param: u8,
}

impl Effect {
    /// Build an effect, masking the command to its low nibble.
    pub const fn new(command: u8, param: u8) -> Self {
        Self {
            command: command & 0x0F,
            param,
        }
    }

    /// Shorthand for a `Cxx` set-volume effect.
    pub const fn set_volume(volume: u8) -> Self {
        Self::new(0xC, volume)
    }

    /// Shorthand for an `Fxx` set-tempo effect.
    pub const fn set_tempo(bpm: u8) -> Self {
        Self::new(0xF, bpm)
    }

    /// Classify the command nibble.
    pub fn kind(&self) -> EffectKind {
        EffectKind::from_command(self.command, self.param)
    }

    /// True for an all-zero column (`000`).
    pub fn is_empty(&self) -> bool {
        self.command == 0 && self.param == 0
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}{:02X}", self.command, self.param)
    }
}

/// ProTracker effect commands, by command nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// `000`: empty column
    None,
    /// `0xy`
    Arpeggio,
    /// `1xx`
    PortaUp,
    /// `2xx`
    PortaDown,
    /// `3xx`
    TonePorta,
    /// `4xy`
    Vibrato,
    /// `5xy`
    TonePortaVolSlide,
    /// `6xy`
    VibratoVolSlide,
    /// `7xy`
    Tremolo,
    /// `8xx`
    SetPan,
    /// `9xx`
    SampleOffset,
    /// `Axy`
    VolumeSlide,
    /// `Bxx`
    PositionJump,
    /// `Cxx`: set channel volume
    SetVolume,
    /// `Dxx`
    PatternBreak,
    /// `Exy`
    Extended,
    /// `Fxx`: set tempo (the whole parameter range is read as BPM)
    SetTempo,
}

impl EffectKind {
    /// Map a command nibble to its kind.
    pub fn from_command(command: u8, param: u8) -> Self {
        match command & 0x0F {
            0x0 if param == 0 => EffectKind::None,
            0x0 => EffectKind::Arpeggio,
            0x1 => EffectKind::PortaUp,
            0x2 => EffectKind::PortaDown,
            0x3 => EffectKind::TonePorta,
            0x4 => EffectKind::Vibrato,
            0x5 => EffectKind::TonePortaVolSlide,
            0x6 => EffectKind::VibratoVolSlide,
            0x7 => EffectKind::Tremolo,
            0x8 => EffectKind::SetPan,
            0x9 => EffectKind::SampleOffset,
            0xA => EffectKind::VolumeSlide,
            0xB => EffectKind::PositionJump,
            0xC => EffectKind::SetVolume,
            0xD => EffectKind::PatternBreak,
            0xE => EffectKind::Extended,
            _ => EffectKind::SetTempo,
        }
    }

    /// Whether playback reacts to this command.
    pub fn is_implemented(self) -> bool {
        matches!(self, EffectKind::SetVolume | EffectKind::SetTempo)
    }
}
