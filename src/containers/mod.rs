pub mod chunk_table;
pub mod header;
pub mod mslm;

#[cfg(test)]
pub mod test_support;

pub use chunk_table::{ChunkKind, FileChunk};
pub use mslm::{mod_name_from_path, ModPackage, ReadOutcome};
