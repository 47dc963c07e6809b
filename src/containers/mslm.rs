//! MSLM mod source containers
//!
//! ```text
//! "MSLM" | version | textures | scripts | codes | data region | asm_len:i32 | asm
//! ```
//!
//! Chunk payloads are addressed relative to the start of the data region,
//! which directly follows the code table.

use std::io::{Read, Seek};
use std::path::Path;

use super::{
    chunk_table::{read_chunk_table, ChunkKind, FileChunk},
    header::{read_magic, read_version, VersionInfo},
};
use crate::{binary_utils::BoundedReader, error::UnpackResult, report::Reporter};

/// A parsed container. Built once per run and read-only afterwards.
#[derive(Debug)]
pub struct ModPackage {
    pub name: String,
    pub version: VersionInfo,
    /// Textures, then scripts, then codes, each in declaration order
    pub chunks: Vec<FileChunk>,
    /// Absolute position of the data region in the source
    pub data_region_offset: u64,
    /// Managed assembly embedded after the data region
    pub assembly: Vec<u8>,
}

/// Result of reading a file that may or may not be an MSLM container.
/// Fatal problems are reported through the surrounding `Result` instead.
#[derive(Debug)]
pub enum ReadOutcome {
    NotRecognized,
    Parsed(ModPackage),
}

impl ModPackage {
    pub fn read<R: Read + Seek>(
        reader: &mut BoundedReader<R>,
        name: &str,
        reporter: &dyn Reporter,
    ) -> UnpackResult<ReadOutcome> {
        if !read_magic(reader)? {
            return Ok(ReadOutcome::NotRecognized);
        }

        let version = read_version(reader, reporter)?;
        reporter.info(&format!(
            "Reading {} built with version {}",
            name,
            version.text()
        ));

        let mut chunks = Vec::new();
        for kind in ChunkKind::TABLE_ORDER {
            read_chunk_table(reader, kind, &mut chunks)?;
        }
        log::debug!("{} declares {} chunks", name, chunks.len());

        let data_region_offset = reader.position();
        let assembly = read_assembly(reader, &chunks)?;
        log::debug!("{} embeds a {} byte assembly", name, assembly.len());

        Ok(ReadOutcome::Parsed(ModPackage {
            name: name.to_string(),
            version,
            chunks,
            data_region_offset,
            assembly,
        }))
    }

    /// Absolute source position of a chunk's first byte
    pub fn chunk_position(&self, chunk: &FileChunk) -> u64 {
        self.data_region_offset + chunk.offset as u64
    }
}

/// Skips the data region and reads the length-prefixed assembly.
///
/// The skip is relative to the cursor and sized from the last declared chunk
/// only. Chunk payloads are later read by absolute seeks from the data region
/// start, so they do not depend on this skip landing anywhere in particular.
fn read_assembly<R: Read + Seek>(
    reader: &mut BoundedReader<R>,
    chunks: &[FileChunk],
) -> UnpackResult<Vec<u8>> {
    if let Some(last) = chunks.last() {
        reader.skip(last.end())?;
    }

    let length = reader.read_length("assembly length")?;
    reader.read_bytes(length as usize)
}

/// Mod name used for the `.dll`/`.cs` outputs: the file name without extension
pub fn mod_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mod".to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        containers::test_support::ContainerBuilder, error::UnpackError, report::MemoryReporter,
    };

    fn parse(bytes: Vec<u8>) -> UnpackResult<ReadOutcome> {
        let reporter = MemoryReporter::default();
        let mut reader = BoundedReader::new(Cursor::new(bytes), "Test.sml").unwrap();
        ModPackage::read(&mut reader, "Test", &reporter)
    }

    fn parsed(bytes: Vec<u8>) -> ModPackage {
        match parse(bytes).unwrap() {
            ReadOutcome::Parsed(package) => package,
            ReadOutcome::NotRecognized => panic!("container was not recognised"),
        }
    }

    #[test]
    fn chunks_follow_table_order() {
        let bytes = ContainerBuilder::new()
            .texture("t1.png", b"one")
            .texture("t2.png", b"two")
            .script("s1.txt", b"script")
            .code("c1.gml", b"code")
            .code("c2.gml", b"more code")
            .code("c3.gml", b"")
            .assembly(b"MZasm")
            .build();

        let package = parsed(bytes);

        let kinds: Vec<ChunkKind> = package.chunks.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChunkKind::Texture,
                ChunkKind::Texture,
                ChunkKind::Script,
                ChunkKind::Code,
                ChunkKind::Code,
                ChunkKind::Code,
            ]
        );
        assert_eq!(package.chunks[3].name, "c1.gml");
        assert_eq!(package.assembly, b"MZasm".to_vec());
        assert_eq!(package.version.number(), "1.2.3");
    }

    #[test]
    fn data_region_starts_after_code_table() {
        let builder = ContainerBuilder::new().script("a.txt", b"hello");
        let expected = builder.data_region_offset();

        let package = parsed(builder.build());

        assert_eq!(package.data_region_offset, expected);
        assert_eq!(package.chunk_position(&package.chunks[0]), expected);
    }

    #[test]
    fn empty_tables_read_assembly_directly() {
        let bytes = ContainerBuilder::new().assembly(&[1, 2, 3, 4, 5]).build();

        let package = parsed(bytes);

        assert!(package.chunks.is_empty());
        assert_eq!(package.assembly, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn skip_uses_last_chunk_extent_only() {
        // The last chunk sits at offset 0, so only its length is skipped even
        // though an earlier chunk extends further into the data region.
        let bytes = ContainerBuilder::new()
            .raw_chunk(ChunkKind::Texture, "big.png", 0, 6)
            .raw_chunk(ChunkKind::Script, "small.txt", 0, 2)
            .data(b"ab")
            .assembly(b"xyz")
            .build();

        let package = parsed(bytes);
        assert_eq!(package.assembly, b"xyz".to_vec());
    }

    #[test]
    fn foreign_magic_is_not_recognised() {
        let mut bytes = b"ABCD".to_vec();
        bytes.extend([0u8; 64]);

        assert!(matches!(parse(bytes).unwrap(), ReadOutcome::NotRecognized));
    }

    #[test]
    fn oversized_texture_length_is_truncation() {
        let bytes = ContainerBuilder::new()
            .raw_chunk(ChunkKind::Texture, "huge.png", 0, 4096)
            .data(&[0; 16])
            .assembly(b"")
            .build();

        assert!(matches!(
            parse(bytes),
            Err(UnpackError::TruncatedInput { requested: 4096, .. })
        ));
    }

    #[test]
    fn truncated_assembly_is_fatal() {
        let mut bytes = ContainerBuilder::new().assembly(b"0123456789").build();
        bytes.truncate(bytes.len() - 3);

        assert!(matches!(
            parse(bytes),
            Err(UnpackError::TruncatedInput { requested: 10, remaining: 7, .. })
        ));
    }

    #[test]
    fn version_is_logged_through_reporter() {
        let reporter = MemoryReporter::default();
        let bytes = ContainerBuilder::new().version(b"v0.8.2.10").build();
        let mut reader = BoundedReader::new(Cursor::new(bytes), "Test.sml").unwrap();

        ModPackage::read(&mut reader, "Test", &reporter).unwrap();

        assert_eq!(
            reporter.infos.borrow()[0],
            "Reading Test built with version v0.8.2.10"
        );
    }

    #[test]
    fn mod_name_strips_extension() {
        assert_eq!(mod_name_from_path(Path::new("mods/Cool Mod.sml")), "Cool Mod");
        assert_eq!(mod_name_from_path(Path::new("Plain")), "Plain");
    }
}
