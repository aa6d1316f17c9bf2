//! Dispatch seam and an in-memory dispatcher.

use crate::error::WriterError;
use crate::meta::{BindingSlot, MetaOperation, Relocation};

/// Turns completed meta operations into commands of the active command stream.
pub trait MetaDispatcher {
    /// Emits the disguised draw. The relocations of every consumed binding are taken over by the
    /// dispatcher and resolved at submission.
    fn draw_meta(&mut self, meta: &MetaOperation);

    /// Appends `data` to the dynamic-state writer and returns its byte offset there.
    fn write_state_blob(&mut self, alignment: u32, data: &[u8]) -> Result<u32, WriterError>;
}

impl<T: MetaDispatcher + ?Sized> MetaDispatcher for &mut T {
    fn draw_meta(&mut self, meta: &MetaOperation) {
        (**self).draw_meta(meta)
    }

    fn write_state_blob(&mut self, alignment: u32, data: &[u8]) -> Result<u32, WriterError> {
        (**self).write_state_blob(alignment, data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocRecord {
    /// Index of the draw the relocation was taken from.
    pub draw: usize,
    pub slot: BindingSlot,
    pub reloc: Relocation,
}

/// Append-only list of pending address patches.
#[derive(Debug, Default, Clone)]
pub struct RelocList {
    records: Vec<RelocRecord>,
}

impl RelocList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RelocRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelocRecord> {
        self.records.iter()
    }

    pub fn for_draw(&self, draw: usize) -> impl Iterator<Item = &RelocRecord> {
        self.records.iter().filter(move |r| r.draw == draw)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

pub const DEFAULT_STATE_LIMIT: usize = 64 * 1024;

/// Dispatcher that records draws, relocations and the dynamic-state blob instead of emitting
/// hardware commands.
#[derive(Debug, Clone)]
pub struct MetaDrawLog {
    draws: Vec<MetaOperation>,
    relocs: RelocList,
    state: Vec<u8>,
    state_limit: usize,
}

impl Default for MetaDrawLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaDrawLog {
    pub fn new() -> Self {
        Self::with_state_limit(DEFAULT_STATE_LIMIT)
    }

    pub fn with_state_limit(state_limit: usize) -> Self {
        Self {
            draws: Vec::new(),
            relocs: RelocList::new(),
            state: Vec::new(),
            state_limit,
        }
    }

    pub fn draws(&self) -> &[MetaOperation] {
        &self.draws
    }

    pub fn relocs(&self) -> &RelocList {
        &self.relocs
    }

    /// Contents of the dynamic-state writer.
    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.relocs.clear();
        self.state.clear();
    }
}

impl MetaDispatcher for MetaDrawLog {
    fn draw_meta(&mut self, meta: &MetaOperation) {
        let draw = self.draws.len();
        for (slot, reloc) in meta.relocations() {
            self.relocs.push(RelocRecord { draw, slot, reloc });
        }
        self.draws.push(*meta);
    }

    fn write_state_blob(&mut self, alignment: u32, data: &[u8]) -> Result<u32, WriterError> {
        if !alignment.is_power_of_two() {
            return Err(WriterError::BadAlignment(alignment));
        }
        let out_of_space = WriterError::OutOfSpace {
            requested: data.len(),
        };

        let start = self
            .state
            .len()
            .checked_next_multiple_of(alignment as usize)
            .ok_or(out_of_space.clone())?;
        let end = start.checked_add(data.len()).ok_or(out_of_space.clone())?;
        if end > self.state_limit {
            return Err(out_of_space);
        }
        let offset = u32::try_from(start).map_err(|_| out_of_space)?;

        self.state.resize(start, 0);
        self.state.extend_from_slice(data);
        Ok(offset)
    }
}
