use std::{
    fs,
    io::{Cursor, Read, Seek},
    path::{Component, Path, PathBuf},
};

use image::ImageOutputFormat;

use crate::{
    binary_utils::BoundedReader,
    containers::{FileChunk, ModPackage},
    error::{ChunkDecodeError, UnpackError, UnpackResult},
    manifest::xxhash64,
    report::Reporter,
};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Options for writing chunks to disk
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Run re-encoded textures through oxipng
    pub optimise_png: bool,
    /// Write `<mod>.manifest.json` next to the extracted files
    pub write_manifest: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            optimise_png: false,
            write_manifest: true,
        }
    }
}

/// A chunk that has been written to disk
#[derive(Debug, Clone)]
pub struct ExportedChunk {
    pub chunk: FileChunk,
    /// Output path relative to the output directory
    pub output: PathBuf,
    /// Bytes read from the data region
    pub payload_len: usize,
    pub payload_hash: u64,
}

/// Turns a chunk name into a relative path.
///
/// Both `/` and `\` separate directories. Components that would leave the
/// output directory are rejected.
pub fn chunk_output_path(name: &str) -> UnpackResult<PathBuf> {
    let mut path = PathBuf::new();

    for part in name.split(&['/', '\\'][..]) {
        if part.is_empty() || part == "." {
            continue;
        }

        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(normal)), None) => path.push(normal),
            _ => {
                return Err(UnpackError::UnsafeChunkPath {
                    name: name.to_string(),
                })
            }
        }
    }

    if path.as_os_str().is_empty() {
        return Err(UnpackError::UnsafeChunkPath {
            name: name.to_string(),
        });
    }
    Ok(path)
}

/// Writes every chunk of a package below an output directory
pub struct ChunkExtractor<'a> {
    output_dir: &'a Path,
    config: &'a ExtractConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> ChunkExtractor<'a> {
    pub fn new(output_dir: &'a Path, config: &'a ExtractConfig, reporter: &'a dyn Reporter) -> Self {
        ChunkExtractor {
            output_dir,
            config,
            reporter,
        }
    }

    /// Extracts chunks in list order. The first failure aborts the run;
    /// files written before it stay on disk.
    pub fn extract_all<R: Read + Seek>(
        &self,
        reader: &mut BoundedReader<R>,
        package: &ModPackage,
    ) -> UnpackResult<Vec<ExportedChunk>> {
        let mut exported = Vec::with_capacity(package.chunks.len());
        for chunk in &package.chunks {
            exported.push(self.extract_chunk(reader, package, chunk)?);
        }
        Ok(exported)
    }

    fn extract_chunk<R: Read + Seek>(
        &self,
        reader: &mut BoundedReader<R>,
        package: &ModPackage,
        chunk: &FileChunk,
    ) -> UnpackResult<ExportedChunk> {
        log::debug!("{} chunk {} ({} bytes)", chunk.kind, chunk.name, chunk.length);
        reader.seek_to(package.chunk_position(chunk))?;
        let payload = reader.read_bytes(chunk.length as usize)?;

        let relative = chunk_output_path(&chunk.name)?;
        let output_path = self.output_dir.join(&relative);
        self.reporter
            .info(&format!("Exporting {}", output_path.display()));

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if chunk.is_texture() {
            self.write_texture(&output_path, chunk, &payload)?;
        } else {
            write_text(&output_path, chunk, &payload)?;
        }

        Ok(ExportedChunk {
            chunk: chunk.clone(),
            output: relative,
            payload_len: payload.len(),
            payload_hash: xxhash64(&payload),
        })
    }

    fn write_texture(&self, path: &Path, chunk: &FileChunk, payload: &[u8]) -> UnpackResult<()> {
        let png = encode_png(payload).map_err(|cause| UnpackError::ChunkDecode {
            name: chunk.name.clone(),
            cause,
        })?;

        let png = if self.config.optimise_png {
            self.optimise_png(path, png)
        } else {
            png
        };

        fs::write(path, png)?;
        Ok(())
    }

    fn optimise_png(&self, path: &Path, png: Vec<u8>) -> Vec<u8> {
        let mut options = oxipng::Options::from_preset(2);
        options.bit_depth_reduction = true;
        options.interlace = None;

        match oxipng::optimize_from_memory(&png, &options) {
            Ok(optimised) => optimised,
            Err(e) => {
                self.reporter.warn(&format!(
                    "oxipng optimisation failed for {}: {}. File saved unoptimised.",
                    path.display(),
                    e
                ));
                png
            }
        }
    }
}

/// Decodes any supported image format and re-encodes it as PNG
fn encode_png(payload: &[u8]) -> Result<Vec<u8>, ChunkDecodeError> {
    let image = image::load_from_memory(payload)?;

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
    Ok(png)
}

fn write_text(path: &Path, chunk: &FileChunk, payload: &[u8]) -> UnpackResult<()> {
    let body = payload.strip_prefix(&UTF8_BOM[..]).unwrap_or(payload);

    let text = String::from_utf8(body.to_vec()).map_err(|e| UnpackError::ChunkDecode {
        name: chunk.name.clone(),
        cause: ChunkDecodeError::from(e),
    })?;

    fs::write(path, text)?;
    Ok(())
}
