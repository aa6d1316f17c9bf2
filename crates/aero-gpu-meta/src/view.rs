//! View construction seam.
//!
//! The device knows how to encode a buffer range or an image subresource into hardware surface
//! state; the meta path only borrows the encoded words. A view is created, its words are copied
//! into a [`crate::meta::SurfaceBinding`] and the view is dropped before the binding call returns.

use crate::error::ViewError;
use crate::format::Format;
use crate::resource::{Image, ImageAspect, ImageType};

/// A constructed view. Dropping it releases the view.
pub trait EncodedView {
    fn words(&self) -> &[u32];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageViewType {
    D1,
    D1Array,
    D2,
    D2Array,
    D3,
}

impl ImageViewType {
    /// View type covering the whole of an image with `array_size` layers.
    pub fn for_image(ty: ImageType, array_size: u32) -> Self {
        match (ty, array_size > 1) {
            (ImageType::D1, false) => ImageViewType::D1,
            (ImageType::D1, true) => ImageViewType::D1Array,
            (ImageType::D2, false) => ImageViewType::D2,
            (ImageType::D2, true) => ImageViewType::D2Array,
            (ImageType::D3, _) => ImageViewType::D3,
        }
    }
}

/// Formatted view of `range` bytes. The memory is attached through the binding's relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferViewDesc {
    pub format: Format,
    pub range: u64,
    pub stride: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewDesc<'a> {
    pub image: &'a Image,
    pub view_type: ImageViewType,
    pub format: Format,
    pub aspect: ImageAspect,
    pub base_mip_level: u32,
    /// `u32::MAX` for every remaining level.
    pub mip_levels: u32,
    pub base_array_layer: u32,
    /// `u32::MAX` for every remaining layer.
    pub array_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentViewDesc<'a> {
    pub image: &'a Image,
    pub format: Format,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub array_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilViewDesc<'a> {
    pub image: &'a Image,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub array_size: u32,
}

pub trait ViewFactory {
    type View: EncodedView;

    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<Self::View, ViewError>;

    fn create_image_view(&self, desc: &ImageViewDesc<'_>) -> Result<Self::View, ViewError>;

    fn create_color_attachment_view(
        &self,
        desc: &AttachmentViewDesc<'_>,
    ) -> Result<Self::View, ViewError>;

    fn create_depth_stencil_view(
        &self,
        desc: &DepthStencilViewDesc<'_>,
    ) -> Result<Self::View, ViewError>;
}

impl<T: ViewFactory + ?Sized> ViewFactory for &T {
    type View = T::View;

    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<Self::View, ViewError> {
        (**self).create_buffer_view(desc)
    }

    fn create_image_view(&self, desc: &ImageViewDesc<'_>) -> Result<Self::View, ViewError> {
        (**self).create_image_view(desc)
    }

    fn create_color_attachment_view(
        &self,
        desc: &AttachmentViewDesc<'_>,
    ) -> Result<Self::View, ViewError> {
        (**self).create_color_attachment_view(desc)
    }

    fn create_depth_stencil_view(
        &self,
        desc: &DepthStencilViewDesc<'_>,
    ) -> Result<Self::View, ViewError> {
        (**self).create_depth_stencil_view(desc)
    }
}
