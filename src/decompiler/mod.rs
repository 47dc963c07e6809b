//! Hand-off of the embedded assembly to an external decompiler.
//!
//! The unpacker only depends on [`Decompiler`]; how source text is produced
//! is up to the implementation.

mod external;
pub mod pe;

pub use external::ExternalDecompiler;
pub use pe::ModuleKind;

use crate::error::DecompileError;

/// Output of a decompiler for one assembly
#[derive(Debug, Clone)]
pub struct DecompiledModule {
    pub kind: ModuleKind,
    /// Bytes to write as `<mod>.dll`
    pub module_bytes: Vec<u8>,
    /// Source text for the whole module, written as `<mod>.cs`
    pub source: String,
}

pub trait Decompiler {
    fn decompile(&self, assembly: &[u8]) -> Result<DecompiledModule, DecompileError>;
}

/// Produces the bytes written as the mod's `.dll`.
///
/// Mixed modules must keep their native sections and relocations exactly, so
/// neither branch rewrites the image.
pub fn reserialize(kind: ModuleKind, assembly: &[u8]) -> Vec<u8> {
    match kind {
        ModuleKind::IlOnly => assembly.to_vec(),
        ModuleKind::Mixed => {
            log::debug!("assembly contains native code, keeping image as-is");
            assembly.to_vec()
        }
    }
}
