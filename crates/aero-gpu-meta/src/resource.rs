//! Resources the meta operations read from and write to.

use std::sync::Arc;

use bitflags::bitflags;

use crate::format::Format;
use crate::layout::ImageLayout;

/// Identity of the memory object backing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub mem: MemHandle,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    D1,
    D2,
    D3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImageAspect {
    #[default]
    Color,
    Depth,
    Stencil,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ImageAspectFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Access layout an image is in when a command touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLayout {
    General,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    DepthStencilReadOnlyOptimal,
    ShaderReadOnlyOptimal,
    TransferSourceOptimal,
    TransferDestinationOptimal,
}

impl AccessLayout {
    pub fn is_depth_stencil_optimal(self) -> bool {
        matches!(
            self,
            AccessLayout::DepthStencilAttachmentOptimal | AccessLayout::DepthStencilReadOnlyOptimal
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub ty: ImageType,
    pub format: Format,
    pub mip_levels: u32,
    pub array_size: u32,
    pub samples: u32,
    pub layout: ImageLayout,
    pub mem: MemHandle,
}

impl Image {
    pub fn is_arrayed(&self) -> bool {
        self.array_size > 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Offset3d {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageSubresource {
    pub aspect: ImageAspect,
    pub mip_level: u32,
    pub array_layer: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceRange {
    pub aspect: ImageAspect,
    pub base_mip_level: u32,
    pub mip_levels: u32,
    pub base_array_layer: u32,
    pub array_size: u32,
}

impl SubresourceRange {
    /// Every mip level and layer of `aspect`.
    pub fn all(aspect: ImageAspect) -> Self {
        Self {
            aspect,
            base_mip_level: 0,
            mip_levels: u32::MAX,
            base_array_layer: 0,
            array_size: u32::MAX,
        }
    }
}

/// A 3D rectangle inside an attachment; z selects array layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect3d {
    pub offset: Offset3d,
    pub extent: Extent3d,
}

/// One view of the currently bound framebuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub image: Arc<Image>,
    pub mip_level: u32,
    pub base_array_layer: u32,
}

/// Attachments of the subpass being recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Framebuffer {
    pub color: Vec<AttachmentRef>,
    pub depth_stencil: Option<AttachmentRef>,
}
