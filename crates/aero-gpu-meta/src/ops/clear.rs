use tracing::debug;

use super::ClearColor;
use crate::cmd::MetaCmd;
use crate::dispatch::MetaDispatcher;
use crate::error::MetaError;
use crate::format::Format;
use crate::meta::{DepthStencilState, GeometryMode, HizOp, MetaOperation, ShaderId};
use crate::resource::{
    AccessLayout, Image, ImageAspect, ImageAspectFlags, Rect3d, SubresourceRange,
};
use crate::view::ViewFactory;

impl<F: ViewFactory, D: MetaDispatcher> MetaCmd<F, D> {
    /// Draws `meta` once per mip level and layer of `range`, clamped to the image.
    ///
    /// Color ranges re-bind the destination per layer. Depth/stencil ranges bind a depth/stencil
    /// view per layer and release it after the draw. When `meta` carries a Hi-Z op, levels that
    /// cannot use Hi-Z are skipped.
    fn clear_image(
        &mut self,
        img: &Image,
        format: Format,
        meta: &mut MetaOperation,
        range: &SubresourceRange,
    ) {
        if range.base_mip_level >= img.mip_levels || range.base_array_layer >= img.array_size {
            debug!(?range, mip_levels = img.mip_levels, array_size = img.array_size, "empty clear");
            return;
        }

        let mip_levels = (img.mip_levels - range.base_mip_level).min(range.mip_levels);
        let array_size = (img.array_size - range.base_array_layer).min(range.array_size);
        let hiz_op = meta.ds.map_or(HizOp::Nop, |ds| ds.hiz_op);

        for lod in range.base_mip_level..range.base_mip_level + mip_levels {
            meta.dst.lod = lod;
            meta.dst.layer = range.base_array_layer;

            meta.width = img.layout.level_width(lod);
            meta.height = img.layout.level_height(lod);

            if hiz_op != HizOp::Nop && !img.layout.can_enable_hiz(lod) {
                debug!(lod, ?hiz_op, "Hi-Z unavailable on level, skipping");
                continue;
            }

            for layer in range.base_array_layer..range.base_array_layer + array_size {
                meta.dst.layer = layer;

                if range.aspect == ImageAspect::Color {
                    self.bind_image_as_destination(img, format, lod, layer, &mut meta.dst);
                    self.draw_meta(meta);
                } else {
                    let stencil_ref = meta.clear_values[1];
                    let ds = meta.ds.get_or_insert_with(DepthStencilState::default);
                    self.bind_depth_stencil_view(img, lod, layer, &mut ds.view);
                    ds.aspect = range.aspect;
                    ds.stencil_ref = stencil_ref;

                    self.draw_meta(meta);

                    if let Some(ds) = meta.ds.as_mut() {
                        ds.view.invalidate();
                    }
                }
            }
        }
    }

    pub fn clear_color_image(
        &mut self,
        img: &Image,
        color: ClearColor,
        ranges: &[SubresourceRange],
    ) {
        let mut meta = MetaOperation::new(GeometryMode::FullScreenRect);
        meta.shader = Some(ShaderId::ClearColor);
        meta.samples = img.samples;
        meta.clear_values = color.to_raw();

        for range in ranges {
            self.clear_image(img, img.layout.format, &mut meta, range);
        }
    }

    pub fn clear_depth_stencil_image(
        &mut self,
        img: &Image,
        layout: AccessLayout,
        depth: f32,
        stencil: u32,
        ranges: &[SubresourceRange],
    ) {
        let mut meta = MetaOperation::new(GeometryMode::DepthStencilRect);
        meta.shader = Some(ShaderId::ClearDepth);
        meta.samples = img.samples;
        meta.clear_values[0] = depth.to_bits();
        meta.clear_values[1] = stencil;
        meta.ds = Some(DepthStencilState {
            optimal: layout.is_depth_stencil_optimal(),
            ..DepthStencilState::default()
        });

        for range in ranges {
            self.clear_image(img, img.layout.format, &mut meta, range);
        }
    }

    /// Runs a Hi-Z clear or resolve over the depth aspect of `img`.
    ///
    /// Does nothing unless the image has a Hi-Z surface, the range is the depth aspect and `op`
    /// is not [`HizOp::Nop`].
    pub fn depth_stencil_op(&mut self, op: HizOp, img: &Image, range: &SubresourceRange) {
        if op == HizOp::Nop || !img.layout.has_hiz() || range.aspect != ImageAspect::Depth {
            return;
        }

        let mut meta = MetaOperation::new(GeometryMode::DepthStencilRect);
        meta.samples = img.samples;
        meta.ds = Some(DepthStencilState {
            aspect: ImageAspect::Depth,
            hiz_op: op,
            optimal: true,
            ..DepthStencilState::default()
        });

        self.clear_image(img, img.layout.format, &mut meta, range);
    }

    /// Clears whole layers of a color attachment of the bound framebuffer.
    ///
    /// Only the z range of each rectangle is honored; x/y are ignored.
    pub fn clear_color_attachment(&mut self, index: u32, color: ClearColor, rects: &[Rect3d]) {
        let Some(framebuffer) = self.framebuffer().cloned() else {
            self.fail(MetaError::NoFramebuffer);
            return;
        };
        let Some(attachment) = framebuffer.color.get(index as usize) else {
            self.fail(MetaError::AttachmentOutOfRange { index });
            return;
        };

        for rect in rects {
            let range = SubresourceRange {
                aspect: ImageAspect::Color,
                base_mip_level: attachment.mip_level,
                mip_levels: 1,
                base_array_layer: attachment.base_array_layer.saturating_add(rect.offset.z),
                array_size: rect.extent.depth,
            };
            self.clear_color_image(&attachment.image, color, &[range]);
        }
    }

    /// Clears whole layers of the depth and/or stencil aspect of the bound depth/stencil
    /// attachment.
    pub fn clear_depth_stencil_attachment(
        &mut self,
        aspects: ImageAspectFlags,
        layout: AccessLayout,
        depth: f32,
        stencil: u32,
        rects: &[Rect3d],
    ) {
        let Some(framebuffer) = self.framebuffer().cloned() else {
            self.fail(MetaError::NoFramebuffer);
            return;
        };
        let Some(attachment) = framebuffer.depth_stencil.as_ref() else {
            self.fail(MetaError::NoDepthStencilAttachment);
            return;
        };

        for rect in rects {
            let mut range = SubresourceRange {
                aspect: ImageAspect::Depth,
                base_mip_level: attachment.mip_level,
                mip_levels: 1,
                base_array_layer: attachment.base_array_layer.saturating_add(rect.offset.z),
                array_size: rect.extent.depth,
            };

            if aspects.contains(ImageAspectFlags::DEPTH) {
                self.clear_depth_stencil_image(&attachment.image, layout, depth, stencil, &[range]);
            }
            if aspects.contains(ImageAspectFlags::STENCIL) {
                range.aspect = ImageAspect::Stencil;
                self.clear_depth_stencil_image(&attachment.image, layout, depth, stencil, &[range]);
            }
        }
    }
}
