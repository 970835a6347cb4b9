//! OTMM minimap file format.
//!
//! Layout (little-endian):
//!
//! ```text
//! u32  signature "OTMM"
//! u16  data start offset (back-patched once the header is written)
//! u16  format version
//! u32  flags (reserved, 0)
//! str  description            (version 1: u16 length + UTF-8)
//! --- at data start, repeated:
//! u16 x, u16 y, u8 z          block origin
//! u16 len                     compressed length
//! [u8; len]                   zlib-compressed tile payload (BLOCK_BYTES)
//! --- terminated by the invalid position (65535, 65535, MAX_Z + 1)
//! ```

use std::io::{Read, Seek, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::state::tile::BLOCK_BYTES;
use super::reader::BinaryReader;
use super::types::Position;
use super::writer::BinaryWriter;

/// "OTMM" as a little-endian u32
pub const OTMM_SIGNATURE: u32 = u32::from_le_bytes(*b"OTMM");
pub const OTMM_VERSION: u16 = 1;
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 3;

/// Parsed OTMM header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtmmHeader {
    pub data_start: u16,
    pub version: u16,
    pub flags: u32,
    pub description: String,
}

/// One decoded block record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub position: Position,
    /// Uncompressed tile payload, always `BLOCK_BYTES` long
    pub payload: Vec<u8>,
}

pub fn compress_block(payload: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), Compression::new(level));
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Inflate a block and require exactly `BLOCK_BYTES` of output
pub fn decompress_block(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(BLOCK_BYTES);
    ZlibDecoder::new(data)
        .take(BLOCK_BYTES as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptBlock(format!("zlib error: {}", e)))?;
    if out.len() != BLOCK_BYTES {
        return Err(Error::BlockSizeMismatch { expected: BLOCK_BYTES, actual: out.len() });
    }
    Ok(out)
}

/// Streaming OTMM encoder
pub struct OtmmWriter<W> {
    writer: BinaryWriter<W>,
    level: u32,
    blocks: usize,
}

impl<W: Write + Seek> OtmmWriter<W> {
    /// Write the header and position the stream at the first record
    pub fn new(inner: W, description: &str, level: u32) -> Result<Self> {
        let mut writer = BinaryWriter::new(inner);
        let header_start = writer.position()?;

        writer.write_u32_le(OTMM_SIGNATURE)?;
        let start_slot = writer.position()?;
        writer.write_u16_le(0)?;
        writer.write_u16_le(OTMM_VERSION)?;
        writer.write_u32_le(0)?;
        writer.write_string(description)?;

        let data_start = writer.position()? - header_start;
        let data_start = u16::try_from(data_start)
            .map_err(|_| Error::StringTooLong { len: description.len(), max: u16::MAX as usize })?;
        writer.patch_u16_le(start_slot, data_start)?;

        Ok(Self { writer, level, blocks: 0 })
    }

    /// Append one block record from its raw tile payload
    pub fn write_block(&mut self, origin: Position, payload: &[u8]) -> Result<()> {
        if payload.len() != BLOCK_BYTES {
            return Err(Error::BlockSizeMismatch { expected: BLOCK_BYTES, actual: payload.len() });
        }
        let compressed = compress_block(payload, self.level)?;
        // zlib output for a 3 KiB payload is bounded far below 64 KiB
        assert!(
            compressed.len() <= u16::MAX as usize,
            "compressed block of {} bytes does not fit the record length",
            compressed.len()
        );

        self.writer.write_position(origin)?;
        self.writer.write_u16_le(compressed.len() as u16)?;
        self.writer.write_bytes(&compressed)?;
        self.blocks += 1;
        Ok(())
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    /// Write the terminator and hand back the stream
    pub fn finish(mut self) -> Result<W> {
        self.writer.write_position(Position::INVALID)?;
        self.writer.flush()?;
        Ok(self.writer.into_inner())
    }
}

/// Streaming OTMM decoder
pub struct OtmmReader<R> {
    reader: BinaryReader<R>,
    header: OtmmHeader,
    finished: bool,
}

impl<R: Read + Seek> OtmmReader<R> {
    /// Validate the header and seek to the first record
    pub fn new(inner: R) -> Result<Self> {
        let mut reader = BinaryReader::new(inner);
        let header_start = reader.position()?;

        let signature = reader.read_u32_le()?;
        if signature != OTMM_SIGNATURE {
            return Err(Error::InvalidSignature { found: signature });
        }

        let data_start = reader.read_u16_le()?;
        let version = reader.read_u16_le()?;
        let flags = reader.read_u32_le()?;

        let description = match version {
            1 => reader.read_string()?,
            v => return Err(Error::UnsupportedVersion(v)),
        };

        reader.seek(header_start + data_start as u64)?;

        Ok(Self {
            reader,
            header: OtmmHeader { data_start, version, flags, description },
            finished: false,
        })
    }

    pub fn header(&self) -> &OtmmHeader {
        &self.header
    }

    /// Next block, `Ok(None)` at the terminator.
    ///
    /// An error means the record is truncated or corrupt; the stream
    /// must not be read further.
    pub fn next_block(&mut self) -> Result<Option<BlockRecord>> {
        if self.finished {
            return Ok(None);
        }

        let position = self.reader.read_position().inspect_err(|_| self.finished = true)?;
        if !position.is_valid() {
            self.finished = true;
            return Ok(None);
        }

        let record = self.read_payload().inspect_err(|_| self.finished = true)?;
        Ok(Some(BlockRecord { position, payload: record }))
    }

    fn read_payload(&mut self) -> Result<Vec<u8>> {
        let len = self.reader.read_u16_le()? as usize;
        let compressed = self.reader.read_bytes(len)?;
        decompress_block(&compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn payload(fill: u8) -> Vec<u8> {
        let mut p = vec![0u8; BLOCK_BYTES];
        for (i, b) in p.iter_mut().enumerate() {
            *b = if i % 3 == 1 { fill } else { 1 };
        }
        p
    }

    fn encode(blocks: &[(Position, Vec<u8>)]) -> Vec<u8> {
        let mut w = OtmmWriter::new(Cursor::new(Vec::new()), "OTMM 1.0", DEFAULT_COMPRESSION_LEVEL).unwrap();
        for (pos, p) in blocks {
            w.write_block(*pos, p).unwrap();
        }
        w.finish().unwrap().into_inner()
    }

    #[test]
    fn test_header_layout() {
        let data = encode(&[]);
        assert_eq!(&data[0..4], b"OTMM");
        let data_start = u16::from_le_bytes([data[4], data[5]]);
        // 4 + 2 + 2 + 4 + (2 + 8)
        assert_eq!(data_start, 22);
        assert_eq!(u16::from_le_bytes([data[6], data[7]]), OTMM_VERSION);
        assert_eq!(&data[22..], &[0xFF, 0xFF, 0xFF, 0xFF, MAX_Z_PLUS_ONE]);
    }

    const MAX_Z_PLUS_ONE: u8 = crate::codec::MAX_Z + 1;

    #[test]
    fn test_records_roundtrip() {
        let blocks = vec![
            (Position::new(0, 0, 0), payload(3)),
            (Position::new(32000, 64, 7), payload(200)),
        ];
        let data = encode(&blocks);

        let mut reader = OtmmReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.header().description, "OTMM 1.0");
        assert_eq!(reader.header().flags, 0);

        let mut read = Vec::new();
        while let Some(rec) = reader.next_block().unwrap() {
            read.push((rec.position, rec.payload));
        }
        assert_eq!(read, blocks);
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_bad_signature() {
        let mut data = encode(&[]);
        data[0] = b'X';
        assert!(matches!(
            OtmmReader::new(Cursor::new(data)),
            Err(Error::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = encode(&[]);
        data[6] = 2;
        assert!(matches!(
            OtmmReader::new(Cursor::new(data)),
            Err(Error::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_truncated_record() {
        let data = encode(&[(Position::new(0, 0, 1), payload(9)), (Position::new(32, 0, 1), payload(8))]);
        let cut = data.len() - 5 - 4;
        let mut reader = OtmmReader::new(Cursor::new(data[..cut].to_vec())).unwrap();

        assert!(reader.next_block().unwrap().is_some());
        assert!(matches!(reader.next_block(), Err(Error::UnexpectedEof)));
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_wrong_payload_size() {
        let short = compress_block(&[0u8; 100], 3).unwrap();
        assert!(matches!(
            decompress_block(&short),
            Err(Error::BlockSizeMismatch { expected: BLOCK_BYTES, actual: 100 })
        ));

        let long = compress_block(&vec![0u8; BLOCK_BYTES + 10], 3).unwrap();
        assert!(matches!(decompress_block(&long), Err(Error::BlockSizeMismatch { .. })));

        assert!(matches!(decompress_block(&[1, 2, 3, 4]), Err(Error::CorruptBlock(_))));
    }
}
