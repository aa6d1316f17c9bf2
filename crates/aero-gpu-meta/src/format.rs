//! Pixel formats understood by the meta path and the untyped formats used to move raw bytes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R8Unorm,
    R8Uint,
    R16Unorm,
    R16Uint,
    R16Sfloat,
    R8G8B8A8Unorm,
    R8G8B8A8Srgb,
    R8G8B8A8Uint,
    B8G8R8A8Unorm,
    R32Uint,
    R32Sfloat,
    R16G16B16A16Sfloat,
    R32G32Uint,
    R32G32Sfloat,
    R32G32B32Sfloat,
    R32G32B32A32Uint,
    R32G32B32A32Sfloat,
    D16Unorm,
    D32Sfloat,
    S8Uint,
    Bc1RgbaUnorm,
    Bc2Unorm,
    Bc3Unorm,
    Bc7Unorm,
}

impl Format {
    /// Bytes per texel, or per block for compressed formats.
    pub fn size(self) -> u32 {
        use Format::*;
        match self {
            R8Unorm | R8Uint | S8Uint => 1,
            R16Unorm | R16Uint | R16Sfloat | D16Unorm => 2,
            R8G8B8A8Unorm | R8G8B8A8Srgb | R8G8B8A8Uint | B8G8R8A8Unorm | R32Uint | R32Sfloat
            | D32Sfloat => 4,
            R16G16B16A16Sfloat | R32G32Uint | R32G32Sfloat | Bc1RgbaUnorm => 8,
            R32G32B32Sfloat => 12,
            R32G32B32A32Uint | R32G32B32A32Sfloat | Bc2Unorm | Bc3Unorm | Bc7Unorm => 16,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            Format::Bc1RgbaUnorm | Format::Bc2Unorm | Format::Bc3Unorm | Format::Bc7Unorm
        )
    }

    pub fn block_width(self) -> u32 {
        if self.is_compressed() {
            4
        } else {
            1
        }
    }

    pub fn block_height(self) -> u32 {
        if self.is_compressed() {
            4
        } else {
            1
        }
    }

    pub fn is_depth_stencil(self) -> bool {
        matches!(self, Format::D16Unorm | Format::D32Sfloat | Format::S8Uint)
    }

    /// Untyped integer format with the same texel size, used to copy bytes without any
    /// per-channel conversion.
    pub fn raw_for_texel_size(size: u32) -> Option<Format> {
        match size {
            1 => Some(Format::R8Uint),
            2 => Some(Format::R16Uint),
            4 => Some(Format::R32Uint),
            8 => Some(Format::R32G32Uint),
            16 => Some(Format::R32G32B32A32Uint),
            _ => None,
        }
    }

    pub fn raw(self) -> Option<Format> {
        Self::raw_for_texel_size(self.size())
    }
}

/// Whether a buffer copy can take the dword path.
pub fn mem_dword_aligned(src_offset: u64, dst_offset: u64, size: u64) -> bool {
    (src_offset | dst_offset | size) & 0x3 == 0
}
