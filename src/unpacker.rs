use std::{
    fs::{self, File},
    path::Path,
};

use crate::{
    binary_utils::BoundedReader,
    chunk_extractor::{ChunkExtractor, ExportedChunk, ExtractConfig},
    containers::{mod_name_from_path, ModPackage, ReadOutcome},
    decompiler::{Decompiler, ModuleKind},
    error::UnpackResult,
    manifest::ExtractionManifest,
    report::Reporter,
};

#[derive(Debug)]
pub struct UnpackSummary {
    pub mod_name: String,
    pub version: String,
    pub exported: Vec<ExportedChunk>,
    pub assembly_len: usize,
    /// `None` when decompilation was skipped
    pub module_kind: Option<ModuleKind>,
}

#[derive(Debug)]
pub enum UnpackOutcome {
    /// The input is not an MSLM container; nothing was written
    NotRecognized,
    Unpacked(UnpackSummary),
}

/// Runs one unpack: parse, extract chunks, then hand the assembly to the
/// decompiler.
pub struct ModUnpacker<'a> {
    config: &'a ExtractConfig,
    decompiler: Option<&'a dyn Decompiler>,
    reporter: &'a dyn Reporter,
}

impl<'a> ModUnpacker<'a> {
    pub fn new(
        config: &'a ExtractConfig,
        decompiler: Option<&'a dyn Decompiler>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        ModUnpacker {
            config,
            decompiler,
            reporter,
        }
    }

    pub fn unpack(&self, input: &Path, output_dir: &Path) -> UnpackResult<UnpackOutcome> {
        let mod_name = mod_name_from_path(input);

        let Some((package, exported)) = self.read_and_extract(input, &mod_name, output_dir)?
        else {
            return Ok(UnpackOutcome::NotRecognized);
        };

        if self.config.write_manifest {
            ExtractionManifest::new(&package, &exported).write(output_dir)?;
        }

        let dll_path = output_dir.join(format!("{}.dll", mod_name));
        let module_kind = match self.decompiler {
            Some(decompiler) => {
                let module = decompiler.decompile(&package.assembly)?;
                self.reporter.info(&format!(
                    "Decompiled {} ({:?} module)",
                    mod_name, module.kind
                ));
                fs::write(&dll_path, &module.module_bytes)?;
                fs::write(
                    output_dir.join(format!("{}.cs", mod_name)),
                    &module.source,
                )?;
                Some(module.kind)
            }
            None => {
                fs::write(&dll_path, &package.assembly)?;
                None
            }
        };

        Ok(UnpackOutcome::Unpacked(UnpackSummary {
            mod_name,
            version: package.version.text().to_string(),
            exported,
            assembly_len: package.assembly.len(),
            module_kind,
        }))
    }

    /// The input handle lives only inside this call and is closed on every
    /// return path.
    fn read_and_extract(
        &self,
        input: &Path,
        mod_name: &str,
        output_dir: &Path,
    ) -> UnpackResult<Option<(ModPackage, Vec<ExportedChunk>)>> {
        let source_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        let mut reader = BoundedReader::new(File::open(input)?, source_name)?;

        let package = match ModPackage::read(&mut reader, mod_name, self.reporter)? {
            ReadOutcome::Parsed(package) => package,
            ReadOutcome::NotRecognized => return Ok(None),
        };

        let exported =
            ChunkExtractor::new(output_dir, self.config, self.reporter).extract_all(&mut reader, &package)?;
        Ok(Some((package, exported)))
    }
}
