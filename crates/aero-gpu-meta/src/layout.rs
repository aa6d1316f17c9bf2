//! Miptree layout of an image in memory and the compressed-destination fixup built on it.

use tracing::trace;

use crate::format::Format;
use crate::hw_gen::GenTable;
use crate::meta::SurfaceBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tiling {
    Linear,
    X,
    Y,
    W,
}

impl Tiling {
    /// Tile width in bytes and height in rows.
    pub fn tile_dims(self) -> (u32, u32) {
        match self {
            Tiling::Linear => (1, 1),
            Tiling::X => (512, 8),
            Tiling::Y => (128, 32),
            Tiling::W => (64, 64),
        }
    }

    fn pitch_alignment(self) -> u32 {
        match self {
            Tiling::Linear => 64,
            tiled => tiled.tile_dims().0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuxSurface {
    #[default]
    None,
    /// Bit `n` of `enabled_levels` is set when Hi-Z can be used on mip level `n`.
    Hiz { enabled_levels: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LevelOrigin {
    pub x: u32,
    pub y: u32,
}

/// Byte offset of the tile containing a slice plus the slice origin inside that tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileOffset {
    pub offset: u64,
    /// In pixels.
    pub x: u32,
    /// In pixels.
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLayout {
    pub format: Format,
    pub tiling: Tiling,
    pub width0: u32,
    pub height0: u32,
    pub block_width: u32,
    pub block_height: u32,
    pub block_size: u32,
    /// Row pitch in bytes.
    pub bo_stride: u32,
    /// Distance between two array slices, in pixel rows.
    pub layer_height: u32,
    pub levels: Vec<LevelOrigin>,
    pub aux: AuxSurface,
}

fn align_u32(v: u32, a: u32) -> u32 {
    v.div_ceil(a) * a
}

fn minify(v: u32, level: u32) -> u32 {
    v.checked_shr(level).unwrap_or(0).max(1)
}

impl ImageLayout {
    /// Lays out a 2D miptree: level 1 below level 0, later levels stacked right of level 1.
    pub fn new(format: Format, tiling: Tiling, width0: u32, height0: u32, mip_levels: u32) -> Self {
        let block_width = format.block_width();
        let block_height = format.block_height();
        let (align_i, align_j) = if format.is_compressed() {
            (block_width, block_height)
        } else {
            (4, 2)
        };

        let mip_levels = mip_levels.max(1);
        let level_w = |l: u32| align_u32(minify(width0, l), align_i);
        let level_h = |l: u32| align_u32(minify(height0, l), align_j);

        let mut levels: Vec<LevelOrigin> = Vec::with_capacity(mip_levels as usize);
        let mut right_column_height = 0u32;
        for l in 0..mip_levels {
            let origin = match l {
                0 => LevelOrigin { x: 0, y: 0 },
                1 => LevelOrigin { x: 0, y: level_h(0) },
                2 => LevelOrigin {
                    x: level_w(1),
                    y: level_h(0),
                },
                _ => {
                    let prev = levels[l as usize - 1];
                    LevelOrigin {
                        x: prev.x,
                        y: prev.y + level_h(l - 1),
                    }
                }
            };
            if l >= 2 {
                right_column_height += level_h(l);
            }
            levels.push(origin);
        }

        let mut width = level_w(0);
        let mut layer_height = level_h(0);
        if mip_levels > 1 {
            layer_height += level_h(1).max(right_column_height);
        }
        if mip_levels > 2 {
            width = width.max(level_w(1) + level_w(2));
        }

        let bo_stride = align_u32(
            width / block_width * format.size(),
            tiling.pitch_alignment(),
        );

        Self {
            format,
            tiling,
            width0,
            height0,
            block_width,
            block_height,
            block_size: format.size(),
            bo_stride,
            layer_height,
            levels,
            aux: AuxSurface::None,
        }
    }

    pub fn with_hiz(mut self, enabled_levels: u32) -> Self {
        self.aux = AuxSurface::Hiz { enabled_levels };
        self
    }

    pub fn has_hiz(&self) -> bool {
        matches!(self.aux, AuxSurface::Hiz { .. })
    }

    pub fn can_enable_hiz(&self, level: u32) -> bool {
        match self.aux {
            AuxSurface::Hiz { enabled_levels } => {
                enabled_levels.checked_shr(level).unwrap_or(0) & 1 != 0
            }
            AuxSurface::None => false,
        }
    }

    pub fn level_width(&self, level: u32) -> u32 {
        minify(self.width0, level)
    }

    pub fn level_height(&self, level: u32) -> u32 {
        minify(self.height0, level)
    }

    /// Pixel position of `slice` of `level` within the miptree.
    pub fn slice_pos(&self, level: u32, slice: u32) -> (u32, u32) {
        let origin = self
            .levels
            .get(level as usize)
            .copied()
            .unwrap_or_default();
        (origin.x, origin.y + slice * self.layer_height)
    }

    pub fn slice_tile_offset(&self, level: u32, slice: u32) -> TileOffset {
        let (x, y) = self.slice_pos(level, slice);

        // bytes / rows
        let x = x / self.block_width * self.block_size;
        let y = y / self.block_height;

        let (tile_w, tile_h) = self.tiling.tile_dims();
        let offset = u64::from(y - y % tile_h) * u64::from(self.bo_stride)
            + u64::from(x - x % tile_w) * u64::from(tile_h);

        TileOffset {
            offset,
            x: (x % tile_w) / self.block_size * self.block_width,
            y: (y % tile_h) * self.block_height,
        }
    }
}

/// Rewrites a color-attachment surface of a block-compressed image so it addresses blocks.
///
/// The width and height fields are converted to block units. A non-zero array layer cannot be
/// reached through the minimum array element once the surface is in block units, so the layer is
/// folded into the relocation offset and the X/Y offset fields instead. Those fields drop the low
/// 2 bits of X and the low bit of Y, which is lossy for images of 16x16 and smaller.
pub fn adjust_compressed_dst(table: &GenTable, layout: &ImageLayout, dst: &mut SurfaceBinding) {
    let bw = layout.block_width;
    let bh = layout.block_height;

    // the size fields hold the real values minus 1
    let w = table.width.extract(&dst.surface);
    let h = table.height.extract(&dst.surface);
    let layer = table.min_array_element.extract(&dst.surface);

    let w = (w + bw) / bw - 1;
    let h = (h + bh) / bh - 1;
    table.width.insert(&mut dst.surface, w);
    table.height.insert(&mut dst.surface, h);

    if layer == 0 {
        return;
    }

    let tile = layout.slice_tile_offset(0, layer);
    if let Some(reloc) = dst.reloc.as_mut() {
        reloc.offset = tile.offset;
    }

    let x_offset = (tile.x / bw) >> 2;
    let y_offset = (tile.y / bh) >> 1;
    trace!(layer, tile_offset = tile.offset, x_offset, y_offset, "folded compressed layer");

    table.min_array_element.clear(&mut dst.surface);
    table.x_offset.insert(&mut dst.surface, x_offset);
    table.y_offset.insert(&mut dst.surface, y_offset);
}
