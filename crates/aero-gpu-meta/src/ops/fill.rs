use tracing::debug;

use super::draw_units;
use crate::cmd::MetaCmd;
use crate::dispatch::MetaDispatcher;
use crate::error::{MetaError, Result};
use crate::format::Format;
use crate::meta::{GeometryMode, MetaOperation, ShaderId, WriterKind};
use crate::resource::Buffer;
use crate::view::ViewFactory;

/// CopyMem and FillMem are untyped but expect a 16-byte element stride.
const MEM_FORMAT: Format = Format::R32G32B32A32Uint;

/// Alignment of inline update data in the dynamic-state writer.
const UPDATE_BLOB_ALIGNMENT: u32 = 32;

fn check_dword_range(offset: u64, size: u64) -> Result<()> {
    if (offset | size) & 3 != 0 {
        debug!(offset, size, "unaligned buffer range");
        return Err(MetaError::Unaligned { offset, size });
    }
    Ok(())
}

impl<F: ViewFactory, D: MetaDispatcher> MetaCmd<F, D> {
    /// Writes `data` into `dst` at `offset`. The data is staged in the dynamic-state writer and
    /// copied from there by a CopyMem draw.
    pub fn update_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8]) {
        let size = data.len() as u64;
        if let Err(err) = check_dword_range(offset, size) {
            self.fail(err);
            return;
        }
        if size == 0 {
            return;
        }

        let units = draw_units(offset, 4).and_then(|x| Ok((x, draw_units(size, 4)?)));
        let (dst_x, width) = match units {
            Ok(units) => units,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        let blob_offset = match self
            .dispatcher_mut()
            .write_state_blob(UPDATE_BLOB_ALIGNMENT, data)
        {
            Ok(offset) => offset,
            Err(err) => {
                self.fail(err.into());
                return;
            }
        };

        let mut meta = MetaOperation::new(GeometryMode::Points);
        meta.shader = Some(ShaderId::CopyMem);
        meta.src.x = blob_offset / 4;
        meta.dst.x = dst_x;
        meta.width = width;
        meta.height = 1;
        meta.samples = 1;

        self.bind_writer_range_as_source(
            WriterKind::State,
            u64::from(blob_offset) + size,
            MEM_FORMAT,
            &mut meta.src,
        );
        self.bind_buffer_as_destination(dst, MEM_FORMAT, &mut meta.dst);

        self.draw_meta(&meta);
    }

    /// Fills `size` bytes of `dst` at `offset` with the repeated 32-bit `data`.
    pub fn fill_buffer(&mut self, dst: &Buffer, offset: u64, size: u64, data: u32) {
        if let Err(err) = check_dword_range(offset, size) {
            self.fail(err);
            return;
        }
        if size == 0 {
            return;
        }

        let units = draw_units(offset, 4).and_then(|x| Ok((x, draw_units(size, 4)?)));
        let (dst_x, width) = match units {
            Ok(units) => units,
            Err(err) => {
                self.fail(err);
                return;
            }
        };

        let mut meta = MetaOperation::new(GeometryMode::Points);
        meta.shader = Some(ShaderId::FillMem);
        meta.clear_values[0] = data;
        meta.dst.x = dst_x;
        meta.width = width;
        meta.height = 1;
        meta.samples = 1;

        self.bind_buffer_as_destination(dst, MEM_FORMAT, &mut meta.dst);

        self.draw_meta(&meta);
    }
}
