//! Little-endian field access
//!
//! Records are decoded field by field at fixed offsets rather than by
//! reinterpreting memory, so nothing here depends on host alignment or
//! byte order.

use alloc::vec::Vec;

/// Errors that can occur while decoding a record body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Fewer bytes than the structure needs
    Truncated,
    /// A count field disagrees with the bytes present
    CountMismatch,
    /// Magic does not belong to the requested record kind
    WrongMagic,
}

/// Cursor over a record's bytes
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading at offset 0
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Start reading at `pos`
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Take the next `n` bytes
    pub fn slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::Truncated)?;
        let out = self.buf.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(out)
    }

    /// Take the next `N` bytes as an array
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.slice(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }
}

/// Appends little-endian fields to a byte vector
pub struct WireWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> WireWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.out.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.out.extend_from_slice(data);
        self
    }

    /// Append `n` zero bytes
    pub fn pad(&mut self, n: usize) -> &mut Self {
        self.out.resize(self.out.len() + n, 0);
        self
    }
}

/// Read a little-endian u32 at `offset`, if present
pub fn u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Overwrite the little-endian u32 at `offset`; no-op when out of range
pub fn put_u32_at(buf: &mut [u8], offset: usize, value: u32) {
    if let Some(slot) = buf.get_mut(offset..offset + 4) {
        slot.copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_reader_little_endian_fields() {
        let buf = [0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB, 0x7F];
        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.u32(), Ok(0x1234_5678));
        assert_eq!(reader.u16(), Ok(0xABCD));
        assert_eq!(reader.u8(), Ok(0x7F));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.u8(), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_reader_truncated_does_not_advance() {
        let buf = [1, 2, 3];
        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.u32(), Err(DecodeError::Truncated));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_writer_layout() {
        let mut out = vec![];
        WireWriter::new(&mut out).u32(0xA140_C5AD).u16(0x0102).u8(9).pad(1);
        assert_eq!(out, [0xAD, 0xC5, 0x40, 0xA1, 0x02, 0x01, 9, 0]);
    }

    #[test]
    fn test_u32_at_bounds() {
        let mut buf = [0u8; 8];
        put_u32_at(&mut buf, 4, 0xDEAD_BEEF);
        assert_eq!(u32_at(&buf, 4), Some(0xDEAD_BEEF));
        assert_eq!(u32_at(&buf, 5), None);
        put_u32_at(&mut buf, 6, 1);
        assert_eq!(u32_at(&buf, 4), Some(0xDEAD_BEEF));
    }
}
