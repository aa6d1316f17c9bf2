//! Shared helpers for `aero-gpu-meta` integration tests.
//!
//! [`MockViews`] encodes surface state with the real per-generation field table so the
//! compressed-destination fixup sees realistic words. [`SoftGpu`] replays the buffer draws of a
//! [`MetaDrawLog`] against plain byte vectors.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use aero_gpu_meta::layout::{ImageLayout, Tiling};
use aero_gpu_meta::resource::{Buffer, Image, ImageType, MemHandle};
use aero_gpu_meta::view::{
    AttachmentViewDesc, BufferViewDesc, DepthStencilViewDesc, EncodedView, ImageViewDesc,
    ViewFactory,
};
use aero_gpu_meta::{
    Format, GeometryMode, HwGen, MetaDrawLog, MetaOperation, RelocTarget, ShaderId, ViewError,
    WriterKind,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub const KIND_BUFFER: u32 = 0xb0;
pub const KIND_IMAGE: u32 = 0x1a;
pub const KIND_ATTACHMENT: u32 = 0xa7;
pub const KIND_DEPTH_STENCIL: u32 = 0xd5;

pub struct MockView {
    words: Vec<u32>,
    live: Rc<Cell<usize>>,
}

impl EncodedView for MockView {
    fn words(&self) -> &[u32] {
        &self.words
    }
}

impl Drop for MockView {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// View factory encoding generation-correct surface state.
///
/// Word 0 tags the view kind; the width, height and minimum array element fields sit where the
/// generation's table puts them.
pub struct MockViews {
    gen: HwGen,
    live: Rc<Cell<usize>>,
    created: Cell<usize>,
    fail_at: Cell<Option<usize>>,
    surface_dwords: Cell<Option<usize>>,
}

impl MockViews {
    pub fn new(gen: HwGen) -> Self {
        Self {
            gen,
            live: Rc::new(Cell::new(0)),
            created: Cell::new(0),
            fail_at: Cell::new(None),
            surface_dwords: Cell::new(None),
        }
    }

    /// Makes the `n`-th view creation (1-based, counting every kind) fail.
    pub fn fail_at(&self, n: usize) {
        self.fail_at.set(Some(n));
    }

    /// Emits surface state of `len` dwords instead of the generation's length.
    pub fn force_surface_dwords(&self, len: usize) {
        self.surface_dwords.set(Some(len));
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    fn make(&self, words: Vec<u32>) -> Result<MockView, ViewError> {
        let n = self.created.get() + 1;
        self.created.set(n);
        if self.fail_at.get() == Some(n) {
            return Err(ViewError::OutOfDeviceMemory);
        }

        self.live.set(self.live.get() + 1);
        Ok(MockView {
            words,
            live: Rc::clone(&self.live),
        })
    }

    fn surface(&self, kind: u32, width: u32, height: u32, layer: u32) -> Vec<u32> {
        let table = self.gen.table();
        let mut words = [0u32; aero_gpu_meta::hw_gen::SURFACE_STATE_MAX_DWORDS];
        words[0] = kind;
        table.width.insert(&mut words, width.saturating_sub(1));
        table.height.insert(&mut words, height.saturating_sub(1));
        table.min_array_element.insert(&mut words, layer);

        let len = self.surface_dwords.get().unwrap_or(table.surface_dwords);
        words[..len].to_vec()
    }
}

impl ViewFactory for MockViews {
    type View = MockView;

    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<MockView, ViewError> {
        assert_eq!(desc.range % u64::from(desc.stride), 0);
        let elements = (desc.range / u64::from(desc.stride)) as u32;
        self.make(self.surface(KIND_BUFFER, elements, 1, 0))
    }

    fn create_image_view(&self, desc: &ImageViewDesc<'_>) -> Result<MockView, ViewError> {
        let layout = &desc.image.layout;
        let lod = desc.base_mip_level;
        self.make(self.surface(
            KIND_IMAGE,
            layout.level_width(lod),
            layout.level_height(lod),
            desc.base_array_layer,
        ))
    }

    fn create_color_attachment_view(
        &self,
        desc: &AttachmentViewDesc<'_>,
    ) -> Result<MockView, ViewError> {
        let layout = &desc.image.layout;
        assert_eq!(desc.array_size, 1);
        self.make(self.surface(
            KIND_ATTACHMENT,
            layout.level_width(desc.mip_level),
            layout.level_height(desc.mip_level),
            desc.base_array_layer,
        ))
    }

    fn create_depth_stencil_view(
        &self,
        desc: &DepthStencilViewDesc<'_>,
    ) -> Result<MockView, ViewError> {
        self.make(vec![
            KIND_DEPTH_STENCIL,
            desc.mip_level,
            desc.base_array_layer,
            desc.array_size,
        ])
    }
}

pub fn buffer(mem: u64, size: u64) -> Buffer {
    Buffer {
        mem: MemHandle(mem),
        size,
    }
}

pub fn image_2d(
    mem: u64,
    format: Format,
    width: u32,
    height: u32,
    mip_levels: u32,
    array_size: u32,
) -> Image {
    Image {
        ty: ImageType::D2,
        format,
        mip_levels,
        array_size,
        samples: 1,
        layout: ImageLayout::new(format, Tiling::Y, width, height, mip_levels),
        mem: MemHandle(mem),
    }
}

pub fn multisampled(mut img: Image, samples: u32) -> Image {
    img.samples = samples;
    img
}

/// Executes the buffer draws of a [`MetaDrawLog`] and remembers color clears per subresource.
#[derive(Default)]
pub struct SoftGpu {
    allocs: HashMap<MemHandle, Vec<u8>>,
    /// `(memory, lod, layer)` -> raw clear color and the cleared extent.
    pub cleared: HashMap<(MemHandle, u32, u32), ([u32; 4], u32, u32)>,
}

impl SoftGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, mem: u64, bytes: Vec<u8>) -> Buffer {
        let size = bytes.len() as u64;
        self.allocs.insert(MemHandle(mem), bytes);
        buffer(mem, size)
    }

    pub fn bytes(&self, buf: &Buffer) -> &[u8] {
        &self.allocs[&buf.mem]
    }

    pub fn replay(&mut self, log: &MetaDrawLog) {
        for meta in log.draws() {
            self.execute(meta, log.state());
        }
    }

    fn source_bytes(&self, meta: &MetaOperation, state: &[u8]) -> Vec<u8> {
        match meta.src.reloc.map(|r| r.target) {
            Some(RelocTarget::Memory(mem)) => self.allocs[&mem].clone(),
            Some(RelocTarget::Writer(WriterKind::State)) => state.to_vec(),
            other => panic!("unexpected source {other:?}"),
        }
    }

    fn destination(&mut self, meta: &MetaOperation) -> MemHandle {
        match meta.dst.reloc.map(|r| r.target) {
            Some(RelocTarget::Memory(mem)) => mem,
            other => panic!("unexpected destination {other:?}"),
        }
    }

    fn execute(&mut self, meta: &MetaOperation, state: &[u8]) {
        match (meta.mode, meta.shader) {
            (GeometryMode::Points, Some(ShaderId::CopyMem)) => {
                let src = self.source_bytes(meta, state);
                let mem = self.destination(meta);
                let dst = self.allocs.get_mut(&mem).unwrap();
                let (s, d, n) = (
                    meta.src.x as usize * 4,
                    meta.dst.x as usize * 4,
                    meta.width as usize * 4,
                );
                dst[d..d + n].copy_from_slice(&src[s..s + n]);
            }
            (GeometryMode::Points, Some(ShaderId::CopyMemUnaligned)) => {
                let src = self.source_bytes(meta, state);
                let mem = self.destination(meta);
                let dst = self.allocs.get_mut(&mem).unwrap();
                let (s, d, n) = (meta.src.x as usize, meta.dst.x as usize, meta.width as usize);
                dst[d..d + n].copy_from_slice(&src[s..s + n]);
            }
            (GeometryMode::Points, Some(ShaderId::FillMem)) => {
                let mem = self.destination(meta);
                let dst = self.allocs.get_mut(&mem).unwrap();
                let word = meta.clear_values[0].to_le_bytes();
                let start = meta.dst.x as usize * 4;
                for chunk in dst[start..start + meta.width as usize * 4].chunks_exact_mut(4) {
                    chunk.copy_from_slice(&word);
                }
            }
            (GeometryMode::FullScreenRect, Some(ShaderId::ClearColor)) => {
                let mem = self.destination(meta);
                self.cleared.insert(
                    (mem, meta.dst.lod, meta.dst.layer),
                    (meta.clear_values, meta.width, meta.height),
                );
            }
            _ => {}
        }
    }
}
