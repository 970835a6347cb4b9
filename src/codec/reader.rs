use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use super::types::Position;

/// Longest string accepted by `read_string` (u16 length prefix)
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Little-endian binary reader over a seekable stream
pub struct BinaryReader<R> {
    inner: R,
}

impl<R: Read + Seek> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(eof)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.inner.read_u16::<LittleEndian>().map_err(eof)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.inner.read_u32::<LittleEndian>().map_err(eof)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(eof)?;
        Ok(buf)
    }

    /// Read a string (u16 length prefix + UTF-8 bytes)
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16_le()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidString)
    }

    /// Read a map position (u16 x, u16 y, u8 z)
    pub fn read_position(&mut self) -> Result<Position> {
        Ok(Position {
            x: self.read_u16_le()?,
            y: self.read_u16_le()?,
            z: self.read_u8()?,
        })
    }
}

fn eof(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof
    } else {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = BinaryReader::new(Cursor::new(&data[..]));

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0302);
        assert_eq!(reader.read_u32_le().unwrap(), 0x07060504);
        assert!(matches!(reader.read_u8(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_read_string() {
        let data = [0x05, 0x00, b'h', b'e', b'l', b'l', b'o'];
        let mut reader = BinaryReader::new(Cursor::new(&data[..]));
        assert_eq!(reader.read_string().unwrap(), "hello");
    }

    #[test]
    fn test_read_string_truncated() {
        let data = [0x09, 0x00, b'h', b'i'];
        let mut reader = BinaryReader::new(Cursor::new(&data[..]));
        assert!(matches!(reader.read_string(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_read_position_and_seek() {
        let data = [0xAA, 0x64, 0x00, 0xC8, 0x00, 0x07];
        let mut reader = BinaryReader::new(Cursor::new(&data[..]));
        reader.seek(1).unwrap();
        assert_eq!(reader.read_position().unwrap(), Position::new(100, 200, 7));
        assert_eq!(reader.position().unwrap(), 6);
    }
}
