pub mod reader;
pub mod writer;
pub mod types;
pub mod otmm;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::*;
pub use otmm::{
    OtmmReader, OtmmWriter, OtmmHeader, BlockRecord,
    OTMM_SIGNATURE, OTMM_VERSION, DEFAULT_COMPRESSION_LEVEL,
    compress_block, decompress_block,
};
