//! The recording context meta operations are issued on.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::dispatch::MetaDispatcher;
use crate::error::{CmdStatus, MetaError};
use crate::hw_gen::{GenTable, HwGen};
use crate::meta::MetaOperation;
use crate::resource::Framebuffer;

/// A command-recording context as far as meta operations are concerned.
///
/// Owns the error sink. A context whose status carries an error must not be submitted, but every
/// operation stays safe to call on it.
pub struct MetaCmd<F, D> {
    gen: HwGen,
    views: F,
    dispatcher: D,
    framebuffer: Option<Arc<Framebuffer>>,
    status: CmdStatus,
}

impl<F, D> MetaCmd<F, D> {
    pub fn new(gen: HwGen, views: F, dispatcher: D) -> Self {
        Self {
            gen,
            views,
            dispatcher,
            framebuffer: None,
            status: CmdStatus::new(),
        }
    }

    pub fn gen(&self) -> HwGen {
        self.gen
    }

    pub(crate) fn table(&self) -> &'static GenTable {
        self.gen.table()
    }

    pub fn views(&self) -> &F {
        &self.views
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn into_parts(self) -> (F, D, CmdStatus) {
        (self.views, self.dispatcher, self.status)
    }

    /// Framebuffer the attachment clears operate on.
    pub fn bind_framebuffer(&mut self, framebuffer: Option<Arc<Framebuffer>>) {
        self.framebuffer = framebuffer;
    }

    pub fn framebuffer(&self) -> Option<&Arc<Framebuffer>> {
        self.framebuffer.as_ref()
    }

    pub fn status(&self) -> Result<(), &MetaError> {
        self.status.result()
    }

    pub fn error_sink(&self) -> &CmdStatus {
        &self.status
    }

    /// Whether the recorded commands may be submitted.
    pub fn is_valid(&self) -> bool {
        self.status.is_ok()
    }

    pub fn reset_status(&mut self) {
        self.status.reset();
    }

    pub(crate) fn fail(&mut self, err: MetaError) {
        self.status.fail(err);
    }
}

impl<F, D: MetaDispatcher> MetaCmd<F, D> {
    /// Hands `meta` to the dispatcher unless one of its bindings failed to build.
    pub(crate) fn draw_meta(&mut self, meta: &MetaOperation) -> bool {
        if !meta.is_ready() {
            debug!(
                shader = ?meta.shader,
                mode = ?meta.mode,
                src_valid = meta.src.valid,
                dst_valid = meta.dst.valid,
                "skipping meta draw with an unusable binding"
            );
            return false;
        }

        trace!(
            shader = ?meta.shader,
            mode = ?meta.mode,
            width = meta.width,
            height = meta.height,
            samples = meta.samples,
            "meta draw"
        );
        self.dispatcher.draw_meta(meta);
        true
    }
}
