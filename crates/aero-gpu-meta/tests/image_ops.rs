#![cfg(not(target_arch = "wasm32"))]

mod common;

use aero_gpu_meta::resource::{Extent3d, ImageSubresource, ImageType, Offset3d};
use aero_gpu_meta::{
    BufferImageCopy, ErrorClass, Filter, Format, GeometryMode, HwGen, ImageBlit, ImageCopy,
    ImageResolve, MetaCmd, MetaDrawLog, MetaError, RelocFlags, ShaderId, ViewError,
};
use common::MockViews;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn layer(array_layer: u32) -> ImageSubresource {
    ImageSubresource {
        array_layer,
        ..ImageSubresource::default()
    }
}

fn extent(width: u32, height: u32, depth: u32) -> Extent3d {
    Extent3d {
        width,
        height,
        depth,
    }
}

fn copy_region(src_layer: u32, dst_layer: u32, depth: u32) -> ImageCopy {
    ImageCopy {
        src_subresource: layer(src_layer),
        dst_subresource: layer(dst_layer),
        extent: extent(16, 16, depth),
        ..ImageCopy::default()
    }
}

#[test]
fn copy_image_rejects_mismatched_types() {
    let views = MockViews::new(HwGen::Gen7);
    let src = common::image_2d(1, Format::R8G8B8A8Unorm, 16, 16, 1, 1);
    let mut dst = common::image_2d(2, Format::R8G8B8A8Unorm, 16, 16, 1, 1);
    dst.ty = ImageType::D3;

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &[copy_region(0, 0, 1)]);

    assert_eq!(
        cmd.status(),
        Err(&MetaError::ImageTypeMismatch {
            src: ImageType::D2,
            dst: ImageType::D3
        })
    );
    assert!(cmd.dispatcher().draws().is_empty());
    assert_eq!(views.created(), 0);
}

#[test]
fn copy_image_rejects_format_conversion_of_compressed_images() {
    let views = MockViews::new(HwGen::Gen7);
    let src = common::image_2d(1, Format::Bc3Unorm, 16, 16, 1, 1);
    let dst = common::image_2d(2, Format::R32G32B32A32Uint, 16, 16, 1, 1);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &[copy_region(0, 0, 1)]);

    let err = cmd.status().unwrap_err();
    assert_eq!(err.class(), ErrorClass::UnsupportedCombination);
    assert!(matches!(err, MetaError::CompressedFormatMismatch { .. }));
    assert!(cmd.dispatcher().draws().is_empty());
}

#[test]
fn same_format_copy_goes_through_the_raw_format_per_layer() {
    let views = MockViews::new(HwGen::Gen7);
    let src = common::image_2d(1, Format::R8G8B8A8Unorm, 16, 16, 1, 4);
    let dst = common::image_2d(2, Format::R8G8B8A8Unorm, 16, 16, 1, 6);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &[copy_region(1, 2, 3)]);
    assert!(cmd.is_valid());

    let draws = cmd.dispatcher().draws();
    assert_eq!(draws.len(), 3);
    for (i, draw) in draws.iter().enumerate() {
        let i = i as u32;
        assert_eq!(draw.mode, GeometryMode::FullScreenRect);
        assert_eq!(draw.shader, Some(ShaderId::Copy2dArray));
        assert_eq!(draw.src.layer, 1 + i);
        assert_eq!(draw.dst.layer, 2 + i);
        assert_eq!((draw.width, draw.height), (16, 16));
    }

    // the source is bound once, the destination once per layer
    assert_eq!(views.created(), 4);
    assert_eq!(views.live(), 0);

    let table = HwGen::Gen7.table();
    assert_eq!(table.min_array_element.extract(&draws[2].dst.surface), 4);
    assert_eq!(draws[2].dst.reloc.unwrap().flags, RelocFlags::WRITE);
}

#[test]
fn region_failures_do_not_stop_later_regions() {
    let regions = [
        copy_region(0, 0, 1),
        copy_region(0, 1, 1),
        copy_region(0, 2, 1),
        copy_region(0, 3, 1),
    ];
    let src = common::image_2d(1, Format::R32Uint, 16, 16, 1, 1);
    let dst = common::image_2d(2, Format::R32Uint, 16, 16, 1, 4);

    let baseline = MockViews::new(HwGen::Gen6);
    let mut cmd = MetaCmd::new(HwGen::Gen6, &baseline, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &regions);
    assert!(cmd.is_valid());
    assert_eq!(cmd.dispatcher().draws().len(), 4);

    // view 1 is the source, view 3 the destination of the second region
    let views = MockViews::new(HwGen::Gen6);
    views.fail_at(3);
    let mut cmd = MetaCmd::new(HwGen::Gen6, &views, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &regions);

    assert_eq!(
        cmd.status(),
        Err(&MetaError::View(ViewError::OutOfDeviceMemory))
    );
    assert_eq!(cmd.error_sink().suppressed(), 0);
    let layers: Vec<u32> = cmd.dispatcher().draws().iter().map(|d| d.dst.layer).collect();
    assert_eq!(layers, vec![0, 2, 3]);
    assert_eq!(views.live(), 0);
}

#[test]
fn failed_source_binding_suppresses_every_draw() {
    let views = MockViews::new(HwGen::Gen7);
    views.fail_at(1);
    let src = common::image_2d(1, Format::R32Uint, 16, 16, 1, 1);
    let dst = common::image_2d(2, Format::R32Uint, 16, 16, 1, 1);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image(&src, &dst, &[copy_region(0, 0, 1), copy_region(0, 0, 1)]);

    assert!(!cmd.is_valid());
    assert!(cmd.dispatcher().draws().is_empty());
    // destinations were still attempted
    assert_eq!(views.created(), 3);
}

#[test]
fn buffer_to_compressed_image_addresses_blocks() {
    let views = MockViews::new(HwGen::Gen7);
    let buf = common::buffer(1, 64 * 1024);
    let img = common::image_2d(2, Format::Bc3Unorm, 130, 130, 1, 3);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_buffer_to_image(
        &buf,
        &img,
        &[BufferImageCopy {
            buffer_offset: 4096,
            image_subresource: layer(0),
            image_offset: Offset3d { x: 8, y: 4, z: 0 },
            image_extent: extent(128, 128, 2),
        }],
    );
    assert!(cmd.is_valid());

    let draws = cmd.dispatcher().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].shader, Some(ShaderId::CopyMemToImage));
    assert_eq!((draws[0].dst.x, draws[0].dst.y), (2, 1));
    assert_eq!((draws[0].width, draws[0].height), (32, 32));
    assert_eq!(draws[0].src.x, 4096 / 16);
    assert_eq!(draws[1].src.x, 4096 / 16 + 32 * 32);

    let table = HwGen::Gen7.table();
    for draw in draws {
        assert_eq!(table.width.extract(&draw.dst.surface), 32);
        assert_eq!(table.height.extract(&draw.dst.surface), 32);
        assert_eq!(table.min_array_element.extract(&draw.dst.surface), 0);
    }

    // layer 0 needs no offset, layer 1 is folded into the relocation and X/Y offsets
    assert_eq!(draws[0].dst.reloc.unwrap().offset, 0);
    let tile = img.layout.slice_tile_offset(0, 1);
    assert_eq!(draws[1].dst.layer, 1);
    assert_eq!(draws[1].dst.reloc.unwrap().offset, tile.offset);
    assert_eq!(table.x_offset.extract(&draws[1].dst.surface), (tile.x / 4) >> 2);
    assert_eq!(table.y_offset.extract(&draws[1].dst.surface), (tile.y / 4) >> 1);
}

#[test]
fn image_to_buffer_picks_shader_by_texel_size() {
    let views = MockViews::new(HwGen::Gen7);
    let buf = common::buffer(1, 4096);
    let img = common::image_2d(2, Format::R16Sfloat, 16, 16, 1, 2);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image_to_buffer(
        &img,
        &buf,
        &[BufferImageCopy {
            buffer_offset: 64,
            image_subresource: layer(0),
            image_offset: Offset3d::default(),
            image_extent: extent(8, 4, 2),
        }],
    );
    assert!(cmd.is_valid());

    let draws = cmd.dispatcher().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].mode, GeometryMode::Points);
    assert_eq!(draws[0].shader, Some(ShaderId::CopyR16ToMem));
    assert_eq!((draws[0].dst.x, draws[1].dst.x), (32, 32 + 8 * 4));
    assert_eq!((draws[0].src.layer, draws[1].src.layer), (0, 1));
    assert_eq!(draws[0].samples, 1);
}

#[test]
fn image_to_buffer_needs_dword_texels_on_gen6() {
    let buf = common::buffer(1, 4096);
    let region = BufferImageCopy {
        image_extent: extent(4, 4, 1),
        ..BufferImageCopy::default()
    };

    for (format, ok) in [
        (Format::R8Uint, false),
        (Format::R16Unorm, false),
        (Format::R32Sfloat, true),
        (Format::Bc1RgbaUnorm, true),
    ] {
        let views = MockViews::new(HwGen::Gen6);
        let img = common::image_2d(2, format, 16, 16, 1, 1);
        let mut cmd = MetaCmd::new(HwGen::Gen6, &views, MetaDrawLog::new());
        cmd.copy_image_to_buffer(&img, &buf, &[region]);

        assert_eq!(cmd.is_valid(), ok, "{format:?}");
        if !ok {
            assert_eq!(
                cmd.status(),
                Err(&MetaError::UnsupportedBitDepth {
                    gen: HwGen::Gen6,
                    bytes: format.size()
                })
            );
            assert_eq!(views.created(), 0);
        }
    }
}

#[test]
fn texel_sizes_without_raw_format_are_rejected() {
    let views = MockViews::new(HwGen::Gen7);
    let buf = common::buffer(1, 4096);
    let img = common::image_2d(2, Format::R32G32B32Sfloat, 16, 16, 1, 1);
    let other = common::image_2d(3, Format::R32G32B32Sfloat, 16, 16, 1, 1);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.copy_image_to_buffer(&img, &buf, &[BufferImageCopy::default()]);
    cmd.copy_buffer_to_image(&buf, &img, &[BufferImageCopy::default()]);
    cmd.copy_image(&img, &other, &[copy_region(0, 0, 1)]);

    assert_eq!(cmd.status(), Err(&MetaError::UnsupportedTexelSize(12)));
    assert_eq!(cmd.error_sink().suppressed(), 2);
    assert!(cmd.dispatcher().draws().is_empty());
}

#[test]
fn blit_is_unavailable() {
    let views = MockViews::new(HwGen::Gen7);
    let src = common::image_2d(1, Format::R8G8B8A8Unorm, 16, 16, 1, 1);
    let dst = common::image_2d(2, Format::R8G8B8A8Unorm, 32, 32, 1, 1);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.blit_image(&src, &dst, &[ImageBlit::default()], Filter::Linear);

    let err = cmd.status().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unimplemented);
    assert!(cmd.dispatcher().draws().is_empty());
    assert_eq!(views.created(), 0);
}

fn resolve_region(depth: u32) -> ImageResolve {
    ImageResolve {
        src_subresource: layer(0),
        src_offset: Offset3d { x: 4, y: 8, z: 0 },
        dst_subresource: layer(1),
        dst_offset: Offset3d { x: 1, y: 2, z: 0 },
        extent: extent(12, 6, depth),
    }
}

#[test]
fn resolve_walks_array_slices() {
    let views = MockViews::new(HwGen::Gen7);
    let src = common::multisampled(common::image_2d(1, Format::R8G8B8A8Unorm, 16, 16, 1, 2), 4);
    let dst = common::image_2d(2, Format::R8G8B8A8Unorm, 16, 16, 1, 3);

    let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
    cmd.resolve_image(&src, &dst, &[resolve_region(2)]);
    assert!(cmd.is_valid());

    let draws = cmd.dispatcher().draws();
    assert_eq!(draws.len(), 2);
    for (slice, draw) in draws.iter().enumerate() {
        let slice = slice as u32;
        assert_eq!(draw.shader, Some(ShaderId::Resolve4x));
        assert_eq!(draw.samples, 1);
        assert_eq!((draw.src.layer, draw.dst.layer), (slice, 1 + slice));
        assert_eq!((draw.src.x, draw.src.y, draw.dst.x, draw.dst.y), (4, 8, 1, 2));
        assert_eq!((draw.width, draw.height), (12, 6));
    }
}

#[test]
fn resolve_shaders_are_distinct_per_sample_count() {
    let mut shaders = Vec::new();
    for samples in [2, 4, 8, 16] {
        let views = MockViews::new(HwGen::Gen7);
        let src = common::multisampled(common::image_2d(1, Format::R32Uint, 16, 16, 1, 1), samples);
        let dst = common::image_2d(2, Format::R32Uint, 16, 16, 1, 2);

        let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
        cmd.resolve_image(&src, &dst, &[resolve_region(1)]);
        assert!(cmd.is_valid(), "samples={samples}");
        shaders.push(cmd.dispatcher().draws()[0].shader.unwrap());
    }

    for (i, shader) in shaders.iter().enumerate() {
        assert!(!shaders[i + 1..].contains(shader));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolve_preconditions(
        src_samples in prop::sample::select(vec![1u32, 2, 4, 8, 16]),
        dst_samples in prop::sample::select(vec![1u32, 2, 4]),
        same_format in any::<bool>(),
    ) {
        let views = MockViews::new(HwGen::Gen7);
        let src = common::multisampled(
            common::image_2d(1, Format::R8G8B8A8Unorm, 16, 16, 1, 1),
            src_samples,
        );
        let dst_format = if same_format { Format::R8G8B8A8Unorm } else { Format::B8G8R8A8Unorm };
        let dst = common::multisampled(common::image_2d(2, dst_format, 16, 16, 1, 2), dst_samples);

        let mut cmd = MetaCmd::new(HwGen::Gen7, &views, MetaDrawLog::new());
        cmd.resolve_image(&src, &dst, &[resolve_region(1)]);

        let ok = src_samples > 1 && dst_samples <= 1 && same_format;
        prop_assert_eq!(cmd.is_valid(), ok);
        if ok {
            prop_assert_eq!(cmd.dispatcher().draws().len(), 1);
        } else {
            let is_invalid_resolve = matches!(cmd.status(), Err(MetaError::InvalidResolve { .. }));
            prop_assert!(is_invalid_resolve);
            prop_assert_eq!(views.created(), 0);
        }
    }
}
