//! Surface binding builder.
//!
//! Each `bind_*` call creates a transient view through the context's [`ViewFactory`], copies the
//! encoded words into a [`SurfaceBinding`], attaches the relocation for the backing memory and
//! drops the view. On failure the error goes to the context's sink and the binding is left
//! invalid; callers never look at the words of an invalid binding.

use crate::cmd::MetaCmd;
use crate::error::{MetaError, Result, ViewError};
use crate::format::Format;
use crate::hw_gen::{GenTable, SURFACE_STATE_MAX_DWORDS};
use crate::layout::adjust_compressed_dst;
use crate::meta::{Relocation, SurfaceBinding, WriterKind};
use crate::resource::{Buffer, Image, ImageAspect, SubresourceRange};
use crate::view::{
    AttachmentViewDesc, BufferViewDesc, DepthStencilViewDesc, EncodedView, ImageViewDesc,
    ImageViewType, ViewFactory,
};

/// Copies `words` into `binding`, zero-filling the rest.
///
/// Surface state must match the generation's length exactly; other packets only have to fit.
fn load_words(
    table: &GenTable,
    words: &[u32],
    surface_state: bool,
    binding: &mut SurfaceBinding,
) -> Result<()> {
    if words.len() > SURFACE_STATE_MAX_DWORDS {
        return Err(ViewError::TooLarge {
            len: words.len(),
            max: SURFACE_STATE_MAX_DWORDS,
        }
        .into());
    }
    if surface_state && words.len() != table.surface_dwords {
        return Err(MetaError::SurfaceLength {
            expected: table.surface_dwords,
            found: words.len(),
        });
    }

    binding.surface = [0; SURFACE_STATE_MAX_DWORDS];
    binding.surface[..words.len()].copy_from_slice(words);
    binding.surface_len = words.len();
    Ok(())
}

impl<F: ViewFactory, D> MetaCmd<F, D> {
    pub fn bind_buffer_as_source(
        &mut self,
        buf: &Buffer,
        format: Format,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let result = self.encode_buffer_view(buf.size, format, binding);
        self.finish_binding(result.map(|()| Relocation::read(buf.mem)), binding)
    }

    pub fn bind_buffer_as_destination(
        &mut self,
        buf: &Buffer,
        format: Format,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let result = self.encode_buffer_view(buf.size, format, binding);
        self.finish_binding(result.map(|()| Relocation::write(buf.mem)), binding)
    }

    /// Binds a range of a command-stream writer that is still being recorded. The range starts at
    /// the beginning of the writer and spans `size` bytes.
    pub fn bind_writer_range_as_source(
        &mut self,
        writer: WriterKind,
        size: u64,
        format: Format,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let result = self.encode_buffer_view(size, format, binding);
        self.finish_binding(result.map(|()| Relocation::writer(writer)), binding)
    }

    /// Binds every mip level and layer of `img` for sampling.
    pub fn bind_image_as_source(
        &mut self,
        img: &Image,
        format: Format,
        aspect: ImageAspect,
        binding: &mut SurfaceBinding,
    ) -> bool {
        self.bind_image_range_as_source(img, format, &SubresourceRange::all(aspect), binding)
    }

    pub fn bind_image_range_as_source(
        &mut self,
        img: &Image,
        format: Format,
        range: &SubresourceRange,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let desc = ImageViewDesc {
            image: img,
            view_type: ImageViewType::for_image(img.ty, img.array_size),
            format,
            aspect: range.aspect,
            base_mip_level: range.base_mip_level,
            mip_levels: range.mip_levels,
            base_array_layer: range.base_array_layer,
            array_size: range.array_size,
        };
        let result = self
            .views()
            .create_image_view(&desc)
            .map_err(MetaError::from)
            .and_then(|view| load_words(self.table(), view.words(), true, binding));
        self.finish_binding(result.map(|()| Relocation::read(img.mem)), binding)
    }

    /// Binds one layer of one mip level of `img` as a color render target.
    ///
    /// Block-compressed images are rewritten to block units afterwards, see
    /// [`adjust_compressed_dst`].
    pub fn bind_image_as_destination(
        &mut self,
        img: &Image,
        format: Format,
        lod: u32,
        layer: u32,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let desc = AttachmentViewDesc {
            image: img,
            format,
            mip_level: lod,
            base_array_layer: layer,
            array_size: 1,
        };
        let result = self
            .views()
            .create_color_attachment_view(&desc)
            .map_err(MetaError::from)
            .and_then(|view| load_words(self.table(), view.words(), true, binding));
        if !self.finish_binding(result.map(|()| Relocation::write(img.mem)), binding) {
            return false;
        }

        if img.layout.format.is_compressed() {
            adjust_compressed_dst(self.table(), &img.layout, binding);
        }
        true
    }

    /// Binds one layer of one mip level of a depth/stencil image.
    pub fn bind_depth_stencil_view(
        &mut self,
        img: &Image,
        lod: u32,
        layer: u32,
        binding: &mut SurfaceBinding,
    ) -> bool {
        let desc = DepthStencilViewDesc {
            image: img,
            mip_level: lod,
            base_array_layer: layer,
            array_size: 1,
        };
        let result = self
            .views()
            .create_depth_stencil_view(&desc)
            .map_err(MetaError::from)
            .and_then(|view| load_words(self.table(), view.words(), false, binding));
        self.finish_binding(result.map(|()| Relocation::write(img.mem)), binding)
    }

    fn encode_buffer_view(
        &self,
        size: u64,
        format: Format,
        binding: &mut SurfaceBinding,
    ) -> Result<()> {
        // never undershoot the last element
        let stride = format.size();
        let range = size
            .checked_next_multiple_of(u64::from(stride))
            .ok_or(MetaError::CoordinateOverflow(size))?;

        let view = self.views().create_buffer_view(&BufferViewDesc {
            format,
            range,
            stride,
        })?;
        load_words(self.table(), view.words(), true, binding)
    }

    fn finish_binding(&mut self, result: Result<Relocation>, binding: &mut SurfaceBinding) -> bool {
        match result {
            Ok(reloc) => {
                binding.reloc = Some(reloc);
                binding.valid = true;
                true
            }
            Err(err) => {
                binding.invalidate();
                self.fail(err);
                false
            }
        }
    }
}
