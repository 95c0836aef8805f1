//! The change-propagation wavefront driver.

use std::collections::{HashSet, VecDeque};

use crate::arena::ValueArenas;
use crate::calc::CalcContext;
use crate::error::{Diagnostics, Fault};
use crate::meta::MetaTable;
use crate::table::{record, typed_record, ParamTable};
use crate::types::{ParamId, Scalar};

/// Per-mutation propagation state: the FIFO work queue and, when safety
/// checks are on, the membership-tested set of ids already visited on
/// the current wavefront.
///
/// Both buffers are cleared, not deallocated, at the start of each
/// mutation, amortizing their allocation across the table lifetime.
#[derive(Debug, Default)]
pub(crate) struct Wavefront {
    queue: VecDeque<ParamId>,
    seen: HashSet<ParamId>,
}

impl Wavefront {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Start a wavefront rooted at `root`.
    pub(crate) fn begin(&mut self, root: ParamId, safety_checks: bool) {
        self.reset();
        if safety_checks {
            self.seen.insert(root);
        }
    }

    /// Clear both buffers without seeding a root.
    pub(crate) fn reset(&mut self) {
        self.queue.clear();
        self.seen.clear();
    }

    pub(crate) fn pop(&mut self) -> Option<ParamId> {
        self.queue.pop_front()
    }

    /// Enqueue every id in `children` for recomputation.
    ///
    /// With safety checks on, enqueueing an id already visited on this
    /// wavefront aborts as a cyclic update. A graph that reaches one
    /// parameter through more than one path per write is treated the
    /// same as a cycle; with checks off such duplicates recompute and
    /// collapse under change suppression instead.
    pub(crate) fn enqueue_children(&mut self, children: &[ParamId], diag: &Diagnostics) {
        for &child in children {
            if diag.safety_checks && !self.seen.insert(child) {
                diag.fatal("propagate", Fault::CyclicUpdate { id: child });
            }
            self.queue.push_back(child);
        }
    }

    pub(crate) fn footprint(&self) -> usize {
        let id_size = core::mem::size_of::<ParamId>();
        self.queue
            .capacity()
            .saturating_mul(id_size)
            .saturating_add(self.seen.capacity().saturating_mul(id_size))
    }
}

/// Store `raw` into the parameter's arena slot and enqueue its children
/// when the write passes change suppression.
///
/// Shared by root writes and calculation output writes; this is the one
/// place the changed-or-always-update decision is made.
pub(crate) fn write_and_propagate(
    meta: &MetaTable,
    arenas: &mut ValueArenas,
    wave: &mut Wavefront,
    diag: &Diagnostics,
    op: &'static str,
    id: ParamId,
    raw: u64,
) {
    let meta = record(meta, diag, op, id);
    let Some(width) = meta.tag.width() else {
        diag.fatal(op, Fault::FreeSlot { id })
    };
    let changed = arenas.write(width, meta.val_idx, raw);
    if changed || meta.always_update() {
        wave.enqueue_children(meta.links.children(), diag);
    }
}

impl ParamTable {
    /// Write a root parameter and propagate the change.
    ///
    /// When this returns, every parameter transitively reachable from
    /// `id` has been recomputed in the breadth-first order induced by
    /// the work queue, once per wavefront visit that passed change
    /// suppression. A write that leaves the stored bit pattern
    /// unchanged performs no calculation calls unless the root carries
    /// `ALWAYS_UPDATE`.
    pub fn set_root<T: Scalar>(&mut self, id: ParamId, value: T) {
        tracing::trace!("set_root: {:?}", id);
        {
            let ParamTable {
                meta,
                arenas,
                wave,
                diag,
                ..
            } = self;
            let record = typed_record(meta, diag, "set_root", id, T::TAG);
            if diag.safety_checks && record.has_calc() {
                diag.fatal("set_root", Fault::NotARoot { id });
            }
            wave.begin(id, diag.safety_checks);
            write_and_propagate(meta, arenas, wave, diag, "set_root", id, value.to_raw());
        }
        self.drain();
    }

    /// Drain the work queue, recomputing each dequeued output.
    pub(crate) fn drain(&mut self) {
        while let Some(id) = self.wave.pop() {
            tracing::trace!("recompute: {:?}", id);
            self.invoke_calc(id, "propagate");
        }
    }

    /// Run the calculation that produces `id`, viewing the parameter's
    /// parents as inputs and its sibling set as outputs.
    pub(crate) fn invoke_calc(&mut self, id: ParamId, op: &'static str) {
        let ParamTable {
            meta,
            arenas,
            calcs,
            wave,
            diag,
        } = self;
        let record = record(meta, diag, op, id);
        if diag.safety_checks {
            if !record.has_calc() {
                diag.fatal(op, Fault::MissingCalculation { id });
            }
            if !calcs.is_registered(record.calc) {
                diag.fatal(
                    op,
                    Fault::UnknownCalc {
                        id: record.calc,
                        len: calcs.len(),
                    },
                );
            }
        }
        let calc = calcs.get_mut(record.calc);
        let mut ctx = CalcContext::new(
            meta,
            arenas,
            wave,
            diag,
            record.links.parents(),
            record.links.siblings(),
        );
        calc(&mut ctx);
    }
}
