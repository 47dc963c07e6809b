use super::{chunk_table::ChunkKind, header::MAGIC};

/// Assembles MSLM byte streams for tests
pub struct ContainerBuilder {
    version: Vec<u8>,
    tables: [Vec<(String, u32, u32)>; 3],
    data: Vec<u8>,
    assembly: Vec<u8>,
}

fn table_index(kind: ChunkKind) -> usize {
    match kind {
        ChunkKind::Texture => 0,
        ChunkKind::Script => 1,
        ChunkKind::Code => 2,
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        ContainerBuilder {
            version: b"v1.2.3".to_vec(),
            tables: Default::default(),
            data: Vec::new(),
            assembly: Vec::new(),
        }
    }

    pub fn version(mut self, version: &[u8]) -> Self {
        self.version = version.to_vec();
        self
    }

    /// Declares a chunk and appends its payload to the data region
    pub fn chunk(mut self, kind: ChunkKind, name: &str, payload: &[u8]) -> Self {
        let offset = self.data.len() as u32;
        self.tables[table_index(kind)].push((name.to_string(), offset, payload.len() as u32));
        self.data.extend_from_slice(payload);
        self
    }

    pub fn texture(self, name: &str, payload: &[u8]) -> Self {
        self.chunk(ChunkKind::Texture, name, payload)
    }

    pub fn script(self, name: &str, payload: &[u8]) -> Self {
        self.chunk(ChunkKind::Script, name, payload)
    }

    pub fn code(self, name: &str, payload: &[u8]) -> Self {
        self.chunk(ChunkKind::Code, name, payload)
    }

    /// Declares a chunk without touching the data region
    pub fn raw_chunk(mut self, kind: ChunkKind, name: &str, offset: u32, length: u32) -> Self {
        self.tables[table_index(kind)].push((name.to_string(), offset, length));
        self
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn assembly(mut self, bytes: &[u8]) -> Self {
        self.assembly = bytes.to_vec();
        self
    }

    pub fn data_region_offset(&self) -> u64 {
        let tables: usize = self
            .tables
            .iter()
            .map(|table| 4 + table.iter().map(|(name, _, _)| 12 + name.len()).sum::<usize>())
            .sum();
        (MAGIC.len() + self.version.len() + tables) as u64
    }

    pub fn build(self) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(&self.version);

        for table in &self.tables {
            bytes.extend((table.len() as i32).to_le_bytes());
            for (name, offset, length) in table {
                bytes.extend((name.len() as i32).to_le_bytes());
                bytes.extend(name.as_bytes());
                bytes.extend(offset.to_le_bytes());
                bytes.extend(length.to_le_bytes());
            }
        }

        bytes.extend(&self.data);
        bytes.extend((self.assembly.len() as i32).to_le_bytes());
        bytes.extend(&self.assembly);
        bytes
    }
}
