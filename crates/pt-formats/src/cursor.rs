//! Forward-only reader over an immutable byte slice.

use crate::FormatError;

/// Sequential, bounds-checked reader. Every read either yields exactly the
/// requested bytes or fails with [`FormatError::MalformedModule`].
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if n > self.remaining() {
            return Err(FormatError::MalformedModule {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Consume `n` bytes of text, cut at the first NUL and right-trimmed.
    pub fn read_string(&mut self, n: usize) -> Result<String, FormatError> {
        let bytes = self.take(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_position() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_u8().unwrap(), 0x12);
        assert_eq!(cur.read_u16_be().unwrap(), 0x3456);
        assert_eq!(cur.read_u32_be().unwrap(), 0x789ABCDE);
        assert_eq!(cur.position(), 7);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn overrun_is_malformed() {
        let data = [1, 2, 3];
        let mut cur = ByteCursor::new(&data);
        cur.read_u16_be().unwrap();
        assert_eq!(
            cur.read_u16_be(),
            Err(FormatError::MalformedModule {
                offset: 2,
                needed: 2,
                remaining: 1
            })
        );
    }

    #[test]
    fn failed_read_does_not_consume() {
        let data = [1, 2, 3];
        let mut cur = ByteCursor::new(&data);
        assert!(cur.take(4).is_err());
        assert_eq!(cur.position(), 0);
        assert_eq!(cur.take(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn strings_stop_at_nul() {
        let data = *b"hello  \0junk\0";
        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_string(data.len()).unwrap(), "hello");
    }
}
