use std::{io::Write, process::Command};

use super::{reserialize, DecompiledModule, Decompiler, ModuleKind};
use crate::error::DecompileError;

/// Runs a command-line decompiler (`ilspycmd` by default) on a temporary
/// copy of the assembly and takes its standard output as the source text.
pub struct ExternalDecompiler {
    program: String,
}

impl ExternalDecompiler {
    pub fn new(program: impl Into<String>) -> Self {
        ExternalDecompiler {
            program: program.into(),
        }
    }
}

impl Default for ExternalDecompiler {
    fn default() -> Self {
        Self::new("ilspycmd")
    }
}

impl Decompiler for ExternalDecompiler {
    fn decompile(&self, assembly: &[u8]) -> Result<DecompiledModule, DecompileError> {
        let kind = ModuleKind::detect(assembly)?;

        let mut file = tempfile::Builder::new()
            .prefix("mslm-")
            .suffix(".dll")
            .tempfile()?;
        file.write_all(assembly)?;
        file.flush()?;

        let output = Command::new(&self.program)
            .arg(file.path())
            .output()
            .map_err(|cause| DecompileError::Launch {
                program: self.program.clone(),
                cause,
            })?;

        if !output.status.success() {
            return Err(DecompileError::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(DecompiledModule {
            kind,
            module_bytes: reserialize(kind, assembly),
            source: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
