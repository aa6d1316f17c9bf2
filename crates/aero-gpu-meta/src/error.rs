use thiserror::Error;
use tracing::{debug, warn};

use crate::format::Format;
use crate::hw_gen::HwGen;
use crate::resource::ImageType;

pub type Result<T> = std::result::Result<T, MetaError>;

/// Failure reported by a [`crate::view::ViewFactory`] while constructing a transient view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("out of host memory")]
    OutOfHostMemory,

    #[error("out of device memory")]
    OutOfDeviceMemory,

    #[error("invalid view: {0}")]
    Invalid(&'static str),

    #[error("encoded view has {len} dwords, more than the {max} a surface binding holds")]
    TooLarge { len: usize, max: usize },
}

/// Failure reported by the dynamic-state writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriterError {
    #[error("state writer out of space ({requested} bytes requested)")]
    OutOfSpace { requested: usize },

    #[error("invalid blob alignment {0}")]
    BadAlignment(u32),
}

/// Coarse failure taxonomy shared by every meta operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    UnsupportedCombination,
    Unaligned,
    UnsupportedBitDepth,
    Unimplemented,
    ResourceConstruction,
    InvalidState,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("image type mismatch (src={src:?}, dst={dst:?})")]
    ImageTypeMismatch { src: ImageType, dst: ImageType },

    #[error("cannot convert between {src:?} and {dst:?}: compressed formats must match exactly")]
    CompressedFormatMismatch { src: Format, dst: Format },

    #[error(
        "invalid resolve (src_samples={src_samples}, dst_samples={dst_samples}, src_format={src_format:?}, dst_format={dst_format:?})"
    )]
    InvalidResolve {
        src_samples: u32,
        dst_samples: u32,
        src_format: Format,
        dst_format: Format,
    },

    #[error("no raw format for {0}-byte texels")]
    UnsupportedTexelSize(u32),

    #[error("coordinate {0} does not fit in a 32-bit draw parameter")]
    CoordinateOverflow(u64),

    #[error("offset={offset} size={size} is not 4-byte aligned")]
    Unaligned { offset: u64, size: u64 },

    #[error("unaligned buffer copy is unsupported on {gen:?}")]
    UnalignedCopyUnsupported { gen: HwGen },

    #[error("image to buffer copy with {bytes} bytes per texel is unsupported on {gen:?}")]
    UnsupportedBitDepth { gen: HwGen, bytes: u32 },

    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    #[error("view creation failed: {0}")]
    View(#[from] ViewError),

    #[error("state writer failed: {0}")]
    Writer(#[from] WriterError),

    #[error("surface state has {found} dwords, expected {expected}")]
    SurfaceLength { expected: usize, found: usize },

    #[error("no framebuffer is bound")]
    NoFramebuffer,

    #[error("attachment {index} is not part of the bound framebuffer")]
    AttachmentOutOfRange { index: u32 },

    #[error("the bound framebuffer has no depth/stencil attachment")]
    NoDepthStencilAttachment,
}

impl MetaError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ImageTypeMismatch { .. }
            | Self::CompressedFormatMismatch { .. }
            | Self::InvalidResolve { .. }
            | Self::UnsupportedTexelSize(_)
            | Self::CoordinateOverflow(_) => ErrorClass::UnsupportedCombination,
            Self::Unaligned { .. } | Self::UnalignedCopyUnsupported { .. } => ErrorClass::Unaligned,
            Self::UnsupportedBitDepth { .. } => ErrorClass::UnsupportedBitDepth,
            Self::Unavailable(_) => ErrorClass::Unimplemented,
            Self::View(_) | Self::Writer(_) | Self::SurfaceLength { .. } => {
                ErrorClass::ResourceConstruction
            }
            Self::NoFramebuffer
            | Self::AttachmentOutOfRange { .. }
            | Self::NoDepthStencilAttachment => ErrorClass::InvalidState,
        }
    }
}

/// Error sink of a recording context.
///
/// The first recorded error sticks until [`CmdStatus::reset`]; a context carrying an error must not
/// be submitted but may keep recording.
#[derive(Debug, Default, Clone)]
pub struct CmdStatus {
    first: Option<MetaError>,
    suppressed: u32,
}

impl CmdStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, err: MetaError) {
        match &self.first {
            None => {
                warn!(error = %err, class = ?err.class(), "meta operation failed");
                self.first = Some(err);
            }
            Some(first) => {
                self.suppressed = self.suppressed.saturating_add(1);
                debug!(error = %err, first = %first, "meta operation failed again");
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.first.is_none()
    }

    pub fn error(&self) -> Option<&MetaError> {
        self.first.as_ref()
    }

    /// Number of errors dropped because an earlier one was already recorded.
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    pub fn result(&self) -> std::result::Result<(), &MetaError> {
        match &self.first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn reset(&mut self) {
        self.first = None;
        self.suppressed = 0;
    }
}
