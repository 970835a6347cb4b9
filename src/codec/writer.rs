use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use super::reader::MAX_STRING_LEN;
use super::types::Position;

/// Little-endian binary writer over a seekable stream
pub struct BinaryWriter<W> {
    inner: W,
}

impl BinaryWriter<Cursor<Vec<u8>>> {
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl<W: Write + Seek> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.inner.write_all(bytes)?)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        Ok(self.inner.write_u8(v)?)
    }

    pub fn write_u16_le(&mut self, v: u16) -> Result<()> {
        Ok(self.inner.write_u16::<LittleEndian>(v)?)
    }

    pub fn write_u32_le(&mut self, v: u32) -> Result<()> {
        Ok(self.inner.write_u32::<LittleEndian>(v)?)
    }

    /// Overwrite a u16 written earlier at `at`, then return to the current position
    pub fn patch_u16_le(&mut self, at: u64, v: u16) -> Result<()> {
        let resume = self.position()?;
        self.seek(at)?;
        self.write_u16_le(v)?;
        self.seek(resume)
    }

    /// Write a string (u16 length prefix + UTF-8 bytes)
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        if s.len() > MAX_STRING_LEN {
            return Err(Error::StringTooLong { len: s.len(), max: MAX_STRING_LEN });
        }
        self.write_u16_le(s.len() as u16)?;
        self.write_bytes(s.as_bytes())
    }

    /// Write a map position (u16 x, u16 y, u8 z)
    pub fn write_position(&mut self, pos: Position) -> Result<()> {
        self.write_u16_le(pos.x)?;
        self.write_u16_le(pos.y)?;
        self.write_u8(pos.z)
    }
}
