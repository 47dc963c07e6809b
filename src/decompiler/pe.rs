//! Minimal PE/COFF walk to find the CLI header flags of a managed module.

use std::io::Cursor;

use crate::{binary_utils::BoundedReader, error::DecompileError, error::UnpackError};

const PE_POINTER_OFFSET: u64 = 0x3C;
const COFF_HEADER_LEN: u64 = 20;
const SECTION_HEADER_LEN: u64 = 40;
const PE32_MAGIC: u16 = 0x10B;
const PE32_PLUS_MAGIC: u16 = 0x20B;
/// Index of the CLI runtime header in the data directories
const CLI_HEADER_DIRECTORY: u64 = 14;
/// Offset of `Flags` inside the CLI header
const CLI_FLAGS_OFFSET: u64 = 16;
const COMIMAGE_FLAGS_ILONLY: u32 = 0x1;

/// Whether a managed module carries native code next to its IL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Pure IL, e.g. a C# assembly
    IlOnly,
    /// IL plus native code, e.g. C++/CLI
    Mixed,
}

struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

impl Section {
    fn file_offset(&self, rva: u32) -> Option<u64> {
        let extent = self.virtual_size.max(self.raw_size);
        let delta = rva.checked_sub(self.virtual_address)?;
        (delta < extent).then(|| self.raw_pointer as u64 + delta as u64)
    }
}

fn truncated(err: UnpackError) -> DecompileError {
    DecompileError::Truncated(err.to_string())
}

impl ModuleKind {
    pub fn detect(assembly: &[u8]) -> Result<ModuleKind, DecompileError> {
        let mut reader = BoundedReader::new(Cursor::new(assembly), "assembly")?;

        if reader.read_bytes(2).map_err(truncated)? != b"MZ" {
            return Err(DecompileError::NotPortableExecutable);
        }
        reader.seek_to(PE_POINTER_OFFSET).map_err(truncated)?;
        let pe_offset = reader.read_u32_le().map_err(truncated)? as u64;
        reader.seek_to(pe_offset).map_err(truncated)?;
        if reader.read_bytes(4).map_err(truncated)? != b"PE\0\0" {
            return Err(DecompileError::NotPortableExecutable);
        }

        let coff_start = reader.position();
        reader.seek_to(coff_start + 2).map_err(truncated)?;
        let section_count = reader.read_u16_le().map_err(truncated)?;
        reader.seek_to(coff_start + 16).map_err(truncated)?;
        let optional_header_len = reader.read_u16_le().map_err(truncated)? as u64;

        let optional_start = coff_start + COFF_HEADER_LEN;
        reader.seek_to(optional_start).map_err(truncated)?;
        let directories_start = match reader.read_u16_le().map_err(truncated)? {
            PE32_MAGIC => optional_start + 96,
            PE32_PLUS_MAGIC => optional_start + 112,
            _ => return Err(DecompileError::NotPortableExecutable),
        };

        // NumberOfRvaAndSizes sits right before the directories
        reader.seek_to(directories_start - 4).map_err(truncated)?;
        if (reader.read_u32_le().map_err(truncated)? as u64) <= CLI_HEADER_DIRECTORY {
            return Err(DecompileError::NotManaged);
        }
        reader
            .seek_to(directories_start + CLI_HEADER_DIRECTORY * 8)
            .map_err(truncated)?;
        let cli_rva = reader.read_u32_le().map_err(truncated)?;
        if cli_rva == 0 {
            return Err(DecompileError::NotManaged);
        }

        let mut sections = Vec::with_capacity(section_count as usize);
        let table_start = optional_start + optional_header_len;
        for i in 0..section_count as u64 {
            reader
                .seek_to(table_start + i * SECTION_HEADER_LEN + 8)
                .map_err(truncated)?;
            sections.push(Section {
                virtual_size: reader.read_u32_le().map_err(truncated)?,
                virtual_address: reader.read_u32_le().map_err(truncated)?,
                raw_size: reader.read_u32_le().map_err(truncated)?,
                raw_pointer: reader.read_u32_le().map_err(truncated)?,
            });
        }

        let cli_offset = sections
            .iter()
            .find_map(|section| section.file_offset(cli_rva))
            .ok_or(DecompileError::NotManaged)?;
        reader
            .seek_to(cli_offset + CLI_FLAGS_OFFSET)
            .map_err(truncated)?;
        let flags = reader.read_u32_le().map_err(truncated)?;

        Ok(if flags & COMIMAGE_FLAGS_ILONLY != 0 {
            ModuleKind::IlOnly
        } else {
            ModuleKind::Mixed
        })
    }
}
