//! `aero-gpu-meta` records transfer and clear commands as disguised draws.
//!
//! Hardware without fixed-function copy, fill, clear or resolve units still has a 3D pipeline.
//! Every such operation is expressed as a [`MetaOperation`]: a point list or a rectangle drawn with
//! one of a small set of meta shaders, with hand-built surface state aliasing the real memory.
//!
//! The crate covers:
//! - per-generation surface-state field placement (see [`hw_gen`]),
//! - surface binding construction on top of a device [`ViewFactory`] (see [`MetaCmd`]),
//! - the block-compressed destination fixup (see [`layout::adjust_compressed_dst`]),
//! - the operations themselves: `copy_buffer`, `copy_image`, `copy_buffer_to_image`,
//!   `copy_image_to_buffer`, `update_buffer`, `fill_buffer`, `clear_color_image`,
//!   `clear_depth_stencil_image`, the attachment clears, `depth_stencil_op` and `resolve_image`.
//!
//! Draws are handed to a [`MetaDispatcher`]; [`MetaDrawLog`] is an in-memory one.

mod builder;
mod cmd;
mod ops;

pub mod dispatch;
pub mod error;
pub mod format;
pub mod hw_gen;
pub mod layout;
pub mod meta;
pub mod resource;
pub mod view;

pub use cmd::MetaCmd;
pub use dispatch::{MetaDispatcher, MetaDrawLog, RelocList, RelocRecord};
pub use error::{CmdStatus, ErrorClass, MetaError, Result, ViewError, WriterError};
pub use format::Format;
pub use hw_gen::{GenTable, HwGen};
pub use meta::{
    BindingSlot, DepthStencilState, GeometryMode, HizOp, MetaOperation, RelocFlags, RelocTarget,
    Relocation, ShaderId, SurfaceBinding, WriterKind,
};
pub use ops::{
    BufferCopy, BufferImageCopy, ClearColor, Filter, ImageBlit, ImageCopy, ImageResolve,
};
pub use view::{EncodedView, ViewFactory};
