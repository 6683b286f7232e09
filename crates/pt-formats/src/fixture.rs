//! Synthetic MOD images for tests.
//!
//! Builds the exact byte layout `load_mod` reads, so tests can exercise the
//! parser and the engine without binary fixture files.

/// One sample descriptor plus its 8-bit PCM.
#[derive(Clone, Debug)]
pub struct SampleSpec {
    pub name: String,
    /// Raw finetune byte (sign-magnitude low nibble)
    pub finetune: u8,
    pub volume: u8,
    /// Loop start in words
    pub loop_start: u16,
    /// Loop length in words
    pub loop_length: u16,
    /// Signed 8-bit PCM; padded to an even length when written
    pub pcm: Vec<i8>,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            finetune: 0,
            volume: 64,
            loop_start: 0,
            loop_length: 1,
            pcm: Vec::new(),
        }
    }
}

/// A cell as the builder writes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellSpec {
    pub sample: u8,
    pub period: u16,
    pub command: u8,
    pub param: u8,
}

impl CellSpec {
    pub fn note(period: u16, sample: u8) -> Self {
        Self {
            sample,
            period,
            ..Default::default()
        }
    }

    pub fn with_effect(mut self, command: u8, param: u8) -> Self {
        self.command = command;
        self.param = param;
        self
    }

    fn encode(&self) -> [u8; 4] {
        [
            (self.sample & 0xF0) | ((self.period >> 8) as u8 & 0x0F),
            self.period as u8,
            ((self.sample & 0x0F) << 4) | (self.command & 0x0F),
            self.param,
        ]
    }
}

/// Builder for a complete MOD byte image.
#[derive(Clone, Debug)]
pub struct ModBuilder {
    title: String,
    tag: [u8; 4],
    channels: usize,
    song_length: u8,
    restart: u8,
    sequence: [u8; 128],
    samples: Vec<SampleSpec>,
    patterns: Vec<Vec<CellSpec>>,
}

impl ModBuilder {
    /// A module with the given tag and channel count, one empty pattern and
    /// a one-entry sequence.
    pub fn new(tag: &[u8; 4], channels: usize) -> Self {
        Self {
            title: String::new(),
            tag: *tag,
            channels,
            song_length: 1,
            restart: 0,
            sequence: [0; 128],
            samples: vec![SampleSpec::default(); 31],
            patterns: Vec::new(),
        }
    }

    /// Four-channel `M.K.` module.
    pub fn four_channel() -> Self {
        Self::new(b"M.K.", 4)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set the played sequence; entries past it stay 0.
    pub fn sequence(mut self, order: &[u8]) -> Self {
        self.sequence = [0; 128];
        self.sequence[..order.len()].copy_from_slice(order);
        self.song_length = order.len() as u8;
        self
    }

    /// Write a stored-but-unplayed sequence entry.
    pub fn sequence_entry(mut self, index: usize, pattern: u8) -> Self {
        self.sequence[index] = pattern;
        self
    }

    pub fn song_length(mut self, len: u8) -> Self {
        self.song_length = len;
        self
    }

    pub fn restart(mut self, position: u8) -> Self {
        self.restart = position;
        self
    }

    /// Replace sample slot `number` (1-based).
    pub fn sample(mut self, number: usize, spec: SampleSpec) -> Self {
        self.samples[number - 1] = spec;
        self
    }

    /// Put a cell into a pattern, creating empty patterns as needed.
    pub fn cell(mut self, pattern: usize, row: usize, channel: usize, cell: CellSpec) -> Self {
        self.ensure_pattern(pattern);
        self.patterns[pattern][row * self.channels + channel] = cell;
        self
    }

    fn ensure_pattern(&mut self, index: usize) {
        while self.patterns.len() <= index {
            self.patterns.push(vec![CellSpec::default(); 64 * self.channels]);
        }
    }

    /// Produce the byte image.
    pub fn build(mut self) -> Vec<u8> {
        let pattern_count = *self.sequence.iter().max().unwrap_or(&0) as usize + 1;
        self.ensure_pattern(pattern_count - 1);

        let mut out = Vec::new();
        push_text(&mut out, &self.title, 20);
        for s in &self.samples {
            let words = s.pcm.len().div_ceil(2);
            push_text(&mut out, &s.name, 22);
            out.extend_from_slice(&(words as u16).to_be_bytes());
            out.push(s.finetune);
            out.push(s.volume);
            out.extend_from_slice(&s.loop_start.to_be_bytes());
            out.extend_from_slice(&s.loop_length.to_be_bytes());
        }
        out.push(self.song_length);
        out.push(self.restart);
        out.extend_from_slice(&self.sequence);
        out.extend_from_slice(&self.tag);
        for pattern in &self.patterns[..pattern_count] {
            for cell in pattern {
                out.extend_from_slice(&cell.encode());
            }
        }
        for s in &self.samples {
            out.extend(s.pcm.iter().map(|&b| b as u8));
            if s.pcm.len() % 2 == 1 {
                out.push(0);
            }
        }
        out
    }
}

fn push_text(out: &mut Vec<u8>, text: &str, width: usize) {
    let bytes = text.as_bytes();
    let n = bytes.len().min(width);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + width - n, 0);
}
