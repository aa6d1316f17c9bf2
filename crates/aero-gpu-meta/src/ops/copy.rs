use tracing::debug;

use super::{draw_units, BufferCopy, BufferImageCopy, Filter, ImageBlit, ImageCopy};
use crate::cmd::MetaCmd;
use crate::dispatch::MetaDispatcher;
use crate::error::MetaError;
use crate::format::{mem_dword_aligned, Format};
use crate::meta::{GeometryMode, MetaOperation, ShaderId};
use crate::resource::{Buffer, Image, ImageAspect, ImageType};
use crate::view::ViewFactory;

/// Copy shader for the kind of `img`; `array` is set when a region spans more than one layer.
fn image_copy_shader(img: &Image, array: bool) -> ShaderId {
    match img.ty {
        ImageType::D1 if array => ShaderId::Copy1dArray,
        ImageType::D1 => ShaderId::Copy1d,
        ImageType::D2 if img.samples > 1 => ShaderId::Copy2dMs,
        ImageType::D2 if array => ShaderId::Copy2dArray,
        ImageType::D2 => ShaderId::Copy2d,
        ImageType::D3 => ShaderId::Copy2dArray,
    }
}

/// Image-to-buffer shader and the buffer view format for a raw image format.
///
/// The buffer format is ignored by the hardware; only its stride matters.
fn writeback_shader(raw: Format) -> Option<(ShaderId, Format)> {
    match raw {
        Format::R8Uint => Some((ShaderId::CopyR8ToMem, Format::R8G8B8A8Uint)),
        Format::R16Uint => Some((ShaderId::CopyR16ToMem, Format::R8G8B8A8Uint)),
        Format::R32Uint => Some((ShaderId::CopyR32ToMem, Format::R32G32B32A32Uint)),
        Format::R32G32Uint => Some((ShaderId::CopyR32G32ToMem, Format::R32G32B32A32Uint)),
        Format::R32G32B32A32Uint => {
            Some((ShaderId::CopyR32G32B32A32ToMem, Format::R32G32B32A32Uint))
        }
        _ => None,
    }
}

impl<F: ViewFactory, D: MetaDispatcher> MetaCmd<F, D> {
    pub fn copy_buffer(&mut self, src: &Buffer, dst: &Buffer, regions: &[BufferCopy]) {
        let table = self.table();

        let mut meta = MetaOperation::new(GeometryMode::Points);
        meta.height = 1;
        meta.samples = 1;

        let mut bound_format = None;
        for region in regions {
            // CopyMem works on dwords with a 16-byte element stride, CopyMemUnaligned on bytes
            // with a 4-byte one
            let (shader, format, unit) =
                if mem_dword_aligned(region.src_offset, region.dst_offset, region.size) {
                    (ShaderId::CopyMem, Format::R32G32B32A32Uint, 4)
                } else if table.unaligned_mem_copy {
                    (ShaderId::CopyMemUnaligned, Format::R8G8B8A8Uint, 1)
                } else {
                    debug!(
                        src_offset = region.src_offset,
                        dst_offset = region.dst_offset,
                        size = region.size,
                        "unaligned buffer copy"
                    );
                    self.fail(MetaError::UnalignedCopyUnsupported { gen: table.gen });
                    continue;
                };

            let units = draw_units(region.src_offset, unit).and_then(|src_x| {
                Ok((
                    src_x,
                    draw_units(region.dst_offset, unit)?,
                    draw_units(region.size, unit)?,
                ))
            });
            let (src_x, dst_x, width) = match units {
                Ok(units) => units,
                Err(err) => {
                    self.fail(err);
                    continue;
                }
            };

            meta.shader = Some(shader);
            meta.src.x = src_x;
            meta.dst.x = dst_x;
            meta.width = width;

            // a failed binding is rebuilt even when the format did not change
            if bound_format != Some(format) || !meta.src.valid || !meta.dst.valid {
                bound_format = Some(format);
                self.bind_buffer_as_source(src, format, &mut meta.src);
                self.bind_buffer_as_destination(dst, format, &mut meta.dst);
            }

            self.draw_meta(&meta);
        }
    }

    pub fn copy_image(&mut self, src: &Image, dst: &Image, regions: &[ImageCopy]) {
        if src.ty != dst.ty {
            self.fail(MetaError::ImageTypeMismatch {
                src: src.ty,
                dst: dst.ty,
            });
            return;
        }

        let src_format = src.layout.format;
        let dst_format = dst.layout.format;
        let raw_format = if src_format == dst_format {
            match src_format.raw() {
                Some(raw) => Some(raw),
                None => {
                    self.fail(MetaError::UnsupportedTexelSize(src_format.size()));
                    return;
                }
            }
        } else if src_format.is_compressed() || dst_format.is_compressed() {
            self.fail(MetaError::CompressedFormatMismatch {
                src: src_format,
                dst: dst_format,
            });
            return;
        } else {
            None
        };

        let mut meta = MetaOperation::new(GeometryMode::FullScreenRect);
        self.bind_image_as_source(
            src,
            raw_format.unwrap_or(src_format),
            ImageAspect::Color,
            &mut meta.src,
        );
        meta.samples = dst.samples;

        // raw copies address whole blocks
        let (bw, bh) = match raw_format {
            Some(_) => (src_format.block_width(), src_format.block_height()),
            None => (1, 1),
        };

        for region in regions {
            meta.shader = Some(image_copy_shader(src, region.extent.depth > 1));

            meta.src.lod = region.src_subresource.mip_level;
            meta.src.layer = region
                .src_subresource
                .array_layer
                .saturating_add(region.src_offset.z);
            meta.src.x = region.src_offset.x / bw;
            meta.src.y = region.src_offset.y / bh;

            meta.dst.lod = region.dst_subresource.mip_level;
            meta.dst.layer = region
                .dst_subresource
                .array_layer
                .saturating_add(region.dst_offset.z);
            meta.dst.x = region.dst_offset.x / bw;
            meta.dst.y = region.dst_offset.y / bh;

            meta.width = region.extent.width / bw;
            meta.height = region.extent.height / bh;

            for _ in 0..region.extent.depth {
                let (lod, layer) = (meta.dst.lod, meta.dst.layer);
                self.bind_image_as_destination(
                    dst,
                    raw_format.unwrap_or(dst_format),
                    lod,
                    layer,
                    &mut meta.dst,
                );
                self.draw_meta(&meta);

                meta.src.layer = meta.src.layer.saturating_add(1);
                meta.dst.layer = meta.dst.layer.saturating_add(1);
            }
        }
    }

    /// Filtered blits have no meta shader; the call always fails.
    pub fn blit_image(&mut self, src: &Image, dst: &Image, regions: &[ImageBlit], filter: Filter) {
        debug!(
            src_format = ?src.layout.format,
            dst_format = ?dst.layout.format,
            regions = regions.len(),
            ?filter,
            "blit requested"
        );
        self.fail(MetaError::Unavailable("filtered image blit"));
    }

    pub fn copy_buffer_to_image(&mut self, buf: &Buffer, img: &Image, regions: &[BufferImageCopy]) {
        let Some(format) = img.layout.format.raw() else {
            self.fail(MetaError::UnsupportedTexelSize(img.layout.format.size()));
            return;
        };
        let bw = img.layout.format.block_width();
        let bh = img.layout.format.block_height();

        let mut meta = MetaOperation::new(GeometryMode::FullScreenRect);
        meta.shader = Some(ShaderId::CopyMemToImage);
        meta.samples = img.samples;

        self.bind_buffer_as_source(buf, format, &mut meta.src);

        for region in regions {
            meta.src.x = match draw_units(region.buffer_offset, u64::from(format.size())) {
                Ok(x) => x,
                Err(err) => {
                    self.fail(err);
                    continue;
                }
            };

            meta.dst.lod = region.image_subresource.mip_level;
            meta.dst.layer = region
                .image_subresource
                .array_layer
                .saturating_add(region.image_offset.z);
            meta.dst.x = region.image_offset.x / bw;
            meta.dst.y = region.image_offset.y / bh;

            meta.width = region.image_extent.width / bw;
            meta.height = region.image_extent.height / bh;

            for _ in 0..region.image_extent.depth {
                let (lod, layer) = (meta.dst.lod, meta.dst.layer);
                self.bind_image_as_destination(img, format, lod, layer, &mut meta.dst);
                self.draw_meta(&meta);

                meta.src.x = meta
                    .src
                    .x
                    .saturating_add(meta.width.saturating_mul(meta.height));
                meta.dst.layer = meta.dst.layer.saturating_add(1);
            }
        }
    }

    pub fn copy_image_to_buffer(&mut self, img: &Image, buf: &Buffer, regions: &[BufferImageCopy]) {
        let table = self.table();
        let img_format = img.layout.format;

        let Some((raw, (shader, buf_format))) = img_format
            .raw()
            .and_then(|raw| writeback_shader(raw).map(|selected| (raw, selected)))
        else {
            self.fail(MetaError::UnsupportedTexelSize(img_format.size()));
            return;
        };
        if raw.size() < table.min_mem_writeback_texel_size {
            debug!(bytes = img_format.size(), gen = ?table.gen, "image to buffer copy");
            self.fail(MetaError::UnsupportedBitDepth {
                gen: table.gen,
                bytes: img_format.size(),
            });
            return;
        }
        let bw = img_format.block_width();
        let bh = img_format.block_height();

        let mut meta = MetaOperation::new(GeometryMode::Points);
        meta.shader = Some(shader);
        meta.samples = 1;

        self.bind_image_as_source(img, raw, ImageAspect::Color, &mut meta.src);
        self.bind_buffer_as_destination(buf, buf_format, &mut meta.dst);

        for region in regions {
            meta.src.lod = region.image_subresource.mip_level;
            meta.src.layer = region
                .image_subresource
                .array_layer
                .saturating_add(region.image_offset.z);
            meta.src.x = region.image_offset.x / bw;
            meta.src.y = region.image_offset.y / bh;

            meta.dst.x = match draw_units(region.buffer_offset, u64::from(raw.size())) {
                Ok(x) => x,
                Err(err) => {
                    self.fail(err);
                    continue;
                }
            };
            meta.width = region.image_extent.width / bw;
            meta.height = region.image_extent.height / bh;

            for _ in 0..region.image_extent.depth {
                self.draw_meta(&meta);

                meta.src.layer = meta.src.layer.saturating_add(1);
                meta.dst.x = meta
                    .dst
                    .x
                    .saturating_add(meta.width.saturating_mul(meta.height));
            }
        }
    }
}
