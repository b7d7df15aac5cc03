//! Error type shared by every loader and the draw pass.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading, uploading or drawing a scene.
///
/// Parse errors abort the whole scene; draw errors abort the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed scene entry: {0}")]
    MalformedEntry(String),

    #[error("malformed definition: {0}")]
    MalformedDefinition(String),

    #[error("malformed usage: {0}")]
    MalformedUsage(String),

    #[error("malformed object descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("unknown primitive: {0:?}")]
    UnknownPrimitive(String),

    #[error("unknown entry type: {0:?}")]
    UnknownEntryType(String),

    #[error("vertex data incomplete: {len} components do not fit a stride of {stride}")]
    IncompleteVertexData { len: usize, stride: u32 },

    #[error("shader compile failed: {0}")]
    CompileError(String),

    #[error("shader link failed: {0}")]
    LinkError(String),

    #[error("uniform values must have 1 to 4 components, got {0}")]
    InvalidUniformArity(usize),

    #[error("texture decode failed: {0}")]
    DecodeError(String),

    #[error("unsupported texture channel count: {0}")]
    UnsupportedChannelCount(u8),

    #[error("model load failed: {0}")]
    ModelLoadError(String),

    #[error("too many texture units: {needed} needed, at most {max} available")]
    TooManyTextureUnits { needed: u32, max: u32 },

    #[error("operation not applicable: {0}")]
    NotApplicable(&'static str),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scene has not been allocated on the GPU")]
    NotAllocated,

    #[error("GL error 0x{0:04X}")]
    Gl(u32),

    #[error("GPU resource creation failed: {0}")]
    GpuResource(String),

    #[error("window error: {0}")]
    Window(String),
}
