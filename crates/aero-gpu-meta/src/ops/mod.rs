//! Operation orchestrators and the region types they take.
//!
//! Every operation validates its call-level preconditions first and fails without touching any
//! region. Past that point regions are independent: a binding that cannot be built fails only the
//! unit it belongs to and the remaining units are still recorded.

mod clear;
mod copy;
mod fill;
mod resolve;

use crate::error::{MetaError, Result};
use crate::resource::{Extent3d, ImageSubresource, Offset3d};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageCopy {
    pub src_subresource: ImageSubresource,
    pub src_offset: Offset3d,
    pub dst_subresource: ImageSubresource,
    pub dst_offset: Offset3d,
    pub extent: Extent3d,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    pub image_subresource: ImageSubresource,
    pub image_offset: Offset3d,
    pub image_extent: Extent3d,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageResolve {
    pub src_subresource: ImageSubresource,
    pub src_offset: Offset3d,
    pub dst_subresource: ImageSubresource,
    pub dst_offset: Offset3d,
    pub extent: Extent3d,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageBlit {
    pub src_subresource: ImageSubresource,
    pub src_offsets: [Offset3d; 2],
    pub dst_subresource: ImageSubresource,
    pub dst_offsets: [Offset3d; 2],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

/// Clear color as the caller specifies it. The meta shader only sees the raw bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearColor {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}

impl ClearColor {
    pub fn to_raw(self) -> [u32; 4] {
        match self {
            ClearColor::Float(v) => bytemuck::cast(v),
            ClearColor::Int(v) => bytemuck::cast(v),
            ClearColor::Uint(v) => v,
        }
    }
}

/// Narrows a byte offset or size, already divided into draw units, to a draw parameter.
fn draw_units(value: u64, unit: u64) -> Result<u32> {
    let units = value / unit;
    u32::try_from(units).map_err(|_| MetaError::CoordinateOverflow(units))
}
