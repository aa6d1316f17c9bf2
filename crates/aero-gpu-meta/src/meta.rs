//! The meta operation descriptor handed to the dispatcher.
//!
//! A [`MetaOperation`] is a copy, fill, clear or resolve disguised as a draw. The geometry is
//! picked by [`GeometryMode`], the work by [`ShaderId`], and the memory by two
//! [`SurfaceBinding`]s whose real addresses are patched in at submission through their
//! [`Relocation`]s.

use bitflags::bitflags;

use crate::hw_gen::SURFACE_STATE_MAX_DWORDS;
use crate::resource::{ImageAspect, MemHandle};

/// Shape of the disguised draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryMode {
    /// One point per element; the vertex shader does the work.
    Points,
    /// A rectangle covering `width` x `height`; the fragment shader does the work.
    FullScreenRect,
    /// A rectangle rasterized against a depth/stencil view only.
    DepthStencilRect,
}

/// Meta shader variants, prebuilt once per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    /// Untyped dword copy; expects a 16-byte element stride.
    CopyMem,
    /// Untyped byte copy; expects a 4-byte element stride.
    CopyMemUnaligned,
    FillMem,
    CopyR8ToMem,
    CopyR16ToMem,
    CopyR32ToMem,
    CopyR32G32ToMem,
    CopyR32G32B32A32ToMem,
    Copy1d,
    Copy1dArray,
    Copy2d,
    Copy2dArray,
    Copy2dMs,
    CopyMemToImage,
    ClearColor,
    ClearDepth,
    Resolve2x,
    Resolve4x,
    Resolve8x,
    Resolve16x,
}

impl ShaderId {
    /// Whether the shader samples or loads from the source binding.
    pub fn reads_source(self) -> bool {
        !matches!(
            self,
            ShaderId::FillMem | ShaderId::ClearColor | ShaderId::ClearDepth
        )
    }

    pub fn resolve_for_samples(samples: u32) -> Option<ShaderId> {
        match samples {
            2 => Some(ShaderId::Resolve2x),
            4 => Some(ShaderId::Resolve4x),
            8 => Some(ShaderId::Resolve8x),
            16 => Some(ShaderId::Resolve16x),
            _ => None,
        }
    }
}

/// Command-stream writers a binding can point into instead of a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterKind {
    Batch,
    State,
    Instruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocTarget {
    Memory(MemHandle),
    /// A range of a writer that is still being recorded.
    Writer(WriterKind),
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct RelocFlags: u32 {
        const WRITE = 1 << 0;
        const TARGET_IS_WRITER = 1 << 1;
    }
}

/// A deferred address patch for an encoded surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relocation {
    pub target: RelocTarget,
    pub offset: u64,
    pub flags: RelocFlags,
}

impl Relocation {
    pub fn read(mem: MemHandle) -> Self {
        Self {
            target: RelocTarget::Memory(mem),
            offset: 0,
            flags: RelocFlags::empty(),
        }
    }

    pub fn write(mem: MemHandle) -> Self {
        Self {
            target: RelocTarget::Memory(mem),
            offset: 0,
            flags: RelocFlags::WRITE,
        }
    }

    pub fn writer(writer: WriterKind) -> Self {
        Self {
            target: RelocTarget::Writer(writer),
            offset: 0,
            flags: RelocFlags::TARGET_IS_WRITER,
        }
    }
}

/// An encoded surface plus the coordinates the meta shader addresses it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBinding {
    /// False until the binding was built successfully; an invalid binding is never consumed.
    pub valid: bool,
    pub surface: [u32; SURFACE_STATE_MAX_DWORDS],
    pub surface_len: usize,
    pub reloc: Option<Relocation>,

    pub lod: u32,
    pub layer: u32,
    pub x: u32,
    pub y: u32,
}

impl Default for SurfaceBinding {
    fn default() -> Self {
        Self {
            valid: false,
            surface: [0; SURFACE_STATE_MAX_DWORDS],
            surface_len: 0,
            reloc: None,
            lod: 0,
            layer: 0,
            x: 0,
            y: 0,
        }
    }
}

impl SurfaceBinding {
    pub fn words(&self) -> &[u32] {
        &self.surface[..self.surface_len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.words())
    }

    /// Drops the encoded state but keeps the coordinates.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.surface = [0; SURFACE_STATE_MAX_DWORDS];
        self.surface_len = 0;
        self.reloc = None;
    }
}

/// Which binding of a [`MetaOperation`] a relocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSlot {
    Source,
    Destination,
    DepthStencil,
}

/// Hierarchical-Z operation performed by a depth/stencil meta draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HizOp {
    #[default]
    Nop,
    Clear,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilState {
    pub view: SurfaceBinding,
    pub stencil_ref: u32,
    pub aspect: ImageAspect,
    pub hiz_op: HizOp,
    /// The image is in a depth/stencil optimal layout.
    pub optimal: bool,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            view: SurfaceBinding::default(),
            stencil_ref: 0,
            aspect: ImageAspect::Depth,
            hiz_op: HizOp::Nop,
            optimal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaOperation {
    pub mode: GeometryMode,
    /// `None` only for Hi-Z operations, which need no shader.
    pub shader: Option<ShaderId>,

    pub width: u32,
    pub height: u32,
    pub samples: u32,

    /// Raw color channels, or `[depth bits, stencil, 0, 0]`.
    pub clear_values: [u32; 4],

    pub src: SurfaceBinding,
    pub dst: SurfaceBinding,
    pub ds: Option<DepthStencilState>,
}

impl MetaOperation {
    pub fn new(mode: GeometryMode) -> Self {
        Self {
            mode,
            shader: None,
            width: 0,
            height: 0,
            samples: 0,
            clear_values: [0; 4],
            src: SurfaceBinding::default(),
            dst: SurfaceBinding::default(),
            ds: None,
        }
    }

    pub fn uses_source(&self) -> bool {
        self.mode != GeometryMode::DepthStencilRect
            && self.shader.is_some_and(ShaderId::reads_source)
    }

    pub fn uses_destination(&self) -> bool {
        self.mode != GeometryMode::DepthStencilRect
    }

    /// Whether every binding this operation consumes was built successfully.
    pub fn is_ready(&self) -> bool {
        match self.mode {
            GeometryMode::DepthStencilRect => self.ds.is_some_and(|ds| ds.view.valid),
            GeometryMode::Points | GeometryMode::FullScreenRect => {
                self.shader.is_some()
                    && (!self.uses_source() || self.src.valid)
                    && self.dst.valid
            }
        }
    }

    /// Relocations of every binding the operation consumes.
    pub fn relocations(&self) -> impl Iterator<Item = (BindingSlot, Relocation)> + '_ {
        let src = self
            .uses_source()
            .then_some(self.src.reloc)
            .flatten()
            .map(|r| (BindingSlot::Source, r));
        let dst = self
            .uses_destination()
            .then_some(self.dst.reloc)
            .flatten()
            .map(|r| (BindingSlot::Destination, r));
        let ds = self
            .ds
            .filter(|_| self.mode == GeometryMode::DepthStencilRect)
            .and_then(|ds| ds.view.reloc)
            .map(|r| (BindingSlot::DepthStencil, r));
        src.into_iter().chain(dst).chain(ds)
    }
}
