use super::ImageResolve;
use crate::cmd::MetaCmd;
use crate::dispatch::MetaDispatcher;
use crate::error::MetaError;
use crate::meta::{GeometryMode, MetaOperation, ShaderId};
use crate::resource::{Image, ImageAspect};
use crate::view::ViewFactory;

impl<F: ViewFactory, D: MetaDispatcher> MetaCmd<F, D> {
    /// Resolves a multisampled image into a single-sampled one of the same format.
    pub fn resolve_image(&mut self, src: &Image, dst: &Image, regions: &[ImageResolve]) {
        let invalid = MetaError::InvalidResolve {
            src_samples: src.samples,
            dst_samples: dst.samples,
            src_format: src.layout.format,
            dst_format: dst.layout.format,
        };
        if src.samples <= 1 || dst.samples > 1 || src.layout.format != dst.layout.format {
            self.fail(invalid);
            return;
        }
        let Some(shader) = ShaderId::resolve_for_samples(src.samples) else {
            self.fail(invalid);
            return;
        };
        let Some(format) = src.layout.format.raw() else {
            self.fail(MetaError::UnsupportedTexelSize(src.layout.format.size()));
            return;
        };

        let mut meta = MetaOperation::new(GeometryMode::FullScreenRect);
        meta.shader = Some(shader);
        meta.samples = 1;

        self.bind_image_as_source(src, format, ImageAspect::Color, &mut meta.src);

        for region in regions {
            for slice in 0..region.extent.depth {
                meta.src.lod = region.src_subresource.mip_level;
                meta.src.layer = region.src_subresource.array_layer.saturating_add(slice);
                meta.src.x = region.src_offset.x;
                meta.src.y = region.src_offset.y;

                meta.dst.lod = region.dst_subresource.mip_level;
                meta.dst.layer = region.dst_subresource.array_layer.saturating_add(slice);
                meta.dst.x = region.dst_offset.x;
                meta.dst.y = region.dst_offset.y;

                meta.width = region.extent.width;
                meta.height = region.extent.height;

                let (lod, layer) = (meta.dst.lod, meta.dst.layer);
                self.bind_image_as_destination(dst, format, lod, layer, &mut meta.dst);
                self.draw_meta(&meta);
            }
        }
    }
}
