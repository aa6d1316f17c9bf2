//! Per-generation placement of the SURFACE_STATE fields the meta path rewrites, plus the few
//! shader capabilities that differ between generations.
//!
//! Everything that depends on the hardware generation goes through [`GenTable`]; adding a
//! generation means adding a table, not another branch.

/// Largest SURFACE_STATE encoding among the supported generations, in dwords.
pub const SURFACE_STATE_MAX_DWORDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HwGen {
    Gen6,
    Gen7,
}

impl HwGen {
    pub const ALL: [HwGen; 2] = [HwGen::Gen6, HwGen::Gen7];

    pub fn table(self) -> &'static GenTable {
        match self {
            HwGen::Gen6 => &GEN6_TABLE,
            HwGen::Gen7 => &GEN7_TABLE,
        }
    }
}

/// A bit range inside one dword of an encoded surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub dword: usize,
    pub shift: u32,
    pub mask: u32,
}

impl BitField {
    pub const fn new(dword: usize, shift: u32, bits: u32) -> Self {
        assert!(dword < SURFACE_STATE_MAX_DWORDS);
        assert!(bits > 0 && shift + bits <= 32);
        let mask = if bits == 32 {
            u32::MAX
        } else {
            ((1u32 << bits) - 1) << shift
        };
        Self { dword, shift, mask }
    }

    pub fn extract(&self, words: &[u32; SURFACE_STATE_MAX_DWORDS]) -> u32 {
        (words[self.dword] & self.mask) >> self.shift
    }

    /// Positions `value` inside the field; bits that do not fit are dropped.
    pub fn pack(&self, value: u32) -> u32 {
        value.wrapping_shl(self.shift) & self.mask
    }

    pub fn clear(&self, words: &mut [u32; SURFACE_STATE_MAX_DWORDS]) {
        words[self.dword] &= !self.mask;
    }

    pub fn insert(&self, words: &mut [u32; SURFACE_STATE_MAX_DWORDS], value: u32) {
        self.clear(words);
        words[self.dword] |= self.pack(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenTable {
    pub gen: HwGen,
    /// Whether the byte-granular buffer copy shader exists.
    pub unaligned_mem_copy: bool,
    /// Smallest texel size the image-to-buffer shaders can write back.
    pub min_mem_writeback_texel_size: u32,
    /// Length of a SURFACE_STATE on this generation.
    pub surface_dwords: usize,
    /// Stored as width - 1.
    pub width: BitField,
    /// Stored as height - 1.
    pub height: BitField,
    pub min_array_element: BitField,
    /// In units of 4 pixels.
    pub x_offset: BitField,
    /// In units of 2 rows.
    pub y_offset: BitField,
}

// Sandy Bridge PRM, volume 4 part 1, SURFACE_STATE.
static GEN6_TABLE: GenTable = GenTable {
    gen: HwGen::Gen6,
    unaligned_mem_copy: false,
    min_mem_writeback_texel_size: 4,
    surface_dwords: 6,
    width: BitField::new(2, 6, 13),
    height: BitField::new(2, 19, 13),
    min_array_element: BitField::new(4, 17, 11),
    x_offset: BitField::new(5, 25, 7),
    y_offset: BitField::new(5, 20, 4),
};

// Ivy Bridge PRM, volume 4 part 1, RENDER_SURFACE_STATE.
static GEN7_TABLE: GenTable = GenTable {
    gen: HwGen::Gen7,
    unaligned_mem_copy: true,
    min_mem_writeback_texel_size: 1,
    surface_dwords: 8,
    width: BitField::new(2, 0, 14),
    height: BitField::new(2, 16, 14),
    min_array_element: BitField::new(4, 18, 11),
    x_offset: BitField::new(5, 25, 7),
    y_offset: BitField::new(5, 20, 4),
};
