use std::{io, process::ExitStatus, string::FromUtf8Error};

use image::ImageError;
use thiserror::Error;

/// Fatal failures while reading a container or materializing its chunks.
///
/// "Not an MSLM file" is deliberately absent: that is a normal outcome,
/// see [`crate::containers::mslm::ReadOutcome`].
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("cannot read {requested} bytes in {input} ({remaining} remaining)")]
    TruncatedInput {
        requested: u64,
        remaining: u64,
        input: String,
    },
    #[error("negative {field} ({value}) in {input}")]
    InvalidLength {
        field: &'static str,
        value: i32,
        input: String,
    },
    #[error("chunk name {name:?} does not resolve to a path inside the output directory")]
    UnsafeChunkPath { name: String },
    #[error("failed to decode chunk {name}: {cause}")]
    ChunkDecode {
        name: String,
        #[source]
        cause: ChunkDecodeError,
    },
    #[error("decompilation failed: {0}")]
    Decompile(#[from] DecompileError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ChunkDecodeError {
    #[error("invalid UTF-8 text: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("invalid image data: {0}")]
    Image(#[from] ImageError),
}

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("assembly is not a PE image")]
    NotPortableExecutable,
    #[error("assembly has no CLI header")]
    NotManaged,
    #[error("assembly headers are truncated: {0}")]
    Truncated(String),
    #[error("failed to launch {program}: {cause}")]
    Launch {
        program: String,
        #[source]
        cause: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type UnpackResult<T> = Result<T, UnpackError>;
