use std::fmt;
use std::io::{Read, Seek};

use serde::Serialize;

use crate::{binary_utils::BoundedReader, error::UnpackResult};

/// Which of the three fixed tables a chunk was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Texture,
    Script,
    Code,
}

impl ChunkKind {
    /// Table order inside the container
    pub const TABLE_ORDER: [ChunkKind; 3] = [ChunkKind::Texture, ChunkKind::Script, ChunkKind::Code];

    pub fn is_texture(self) -> bool {
        self == ChunkKind::Texture
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Texture => write!(f, "texture"),
            ChunkKind::Script => write!(f, "script"),
            ChunkKind::Code => write!(f, "code"),
        }
    }
}

/// One named payload in the data region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    /// Relative output path, may contain `/` or `\`
    pub name: String,
    /// Offset from the start of the data region
    pub offset: u32,
    pub length: u32,
    pub kind: ChunkKind,
}

impl FileChunk {
    pub fn is_texture(&self) -> bool {
        self.kind.is_texture()
    }

    /// Offset of the first byte after this chunk, relative to the data region
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }
}

/// Reads one chunk table and appends its entries to `chunks`.
///
/// Layout: `count:i32`, then per entry `name_len:i32, name, offset:i32, length:i32`.
pub fn read_chunk_table<R: Read + Seek>(
    reader: &mut BoundedReader<R>,
    kind: ChunkKind,
    chunks: &mut Vec<FileChunk>,
) -> UnpackResult<()> {
    let count = reader.read_length("chunk count")?;

    for _ in 0..count {
        let name_len = reader.read_length("chunk name length")?;
        let name_bytes = reader.read_bytes(name_len as usize)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let offset = reader.read_length("chunk offset")?;
        let length = reader.read_length("chunk length")?;

        chunks.push(FileChunk {
            name,
            offset,
            length,
            kind,
        });
    }

    Ok(())
}
