//! JSON record of what an unpack run wrote, with payload checksums.

use std::{fs::File, hash::Hasher, io, path::Path};

use serde::Serialize;
use twox_hash::XxHash64;

use crate::{chunk_extractor::ExportedChunk, containers::ChunkKind, containers::ModPackage};

/// 64-bit XxHash of a payload
pub fn xxhash64(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::default();
    hasher.write(bytes);
    hasher.finish()
}

fn hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: ChunkKind,
    pub offset: u32,
    pub length: u32,
    pub xxhash64: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractionManifest {
    #[serde(rename = "mod")]
    pub mod_name: String,
    pub version: String,
    pub data_region_offset: u64,
    pub assembly_length: usize,
    pub assembly_xxhash64: String,
    pub chunks: Vec<ManifestEntry>,
}

impl ExtractionManifest {
    pub fn new(package: &ModPackage, exported: &[ExportedChunk]) -> Self {
        let chunks = exported
            .iter()
            .map(|entry| ManifestEntry {
                name: entry.chunk.name.clone(),
                kind: entry.chunk.kind,
                offset: entry.chunk.offset,
                length: entry.chunk.length,
                xxhash64: hex(entry.payload_hash),
                output: entry.output.to_string_lossy().replace('\\', "/"),
            })
            .collect();

        ExtractionManifest {
            mod_name: package.name.clone(),
            version: package.version.text().to_string(),
            data_region_offset: package.data_region_offset,
            assembly_length: package.assembly.len(),
            assembly_xxhash64: hex(xxhash64(&package.assembly)),
            chunks,
        }
    }

    /// Writes `<output_dir>/<mod>.manifest.json`
    pub fn write(&self, output_dir: &Path) -> io::Result<()> {
        let output_path = output_dir.join(format!("{}.manifest.json", self.mod_name));
        let file = File::create(&output_path)?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        Ok(())
    }
}
