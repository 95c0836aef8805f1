//! [`ParamTable`] implementation.

use std::io::Write;
use std::ops::{Index, IndexMut};

use crate::arena::ValueArenas;
use crate::calc::CalcRegistry;
use crate::error::{Diagnostics, Fault};
use crate::meta::{Meta, MetaTable};
use crate::types::{ParamId, Scalar, TypeTag};

pub(crate) mod edges;
pub(crate) mod init;
pub(crate) mod propagate;

use propagate::Wavefront;

/// The reactive parameter table.
///
/// One instance owns a DAG of typed scalar parameters: roots written by
/// the host and derived values recomputed from registered calculations.
/// Writing a root propagates to every transitively dependent derived
/// value before the call returns; reads then observe the converged
/// state.
///
/// The table is single-threaded: no operation suspends, calculation
/// callbacks run on the caller's thread, and hosts needing shared
/// access must serialize externally.
#[derive(Debug)]
pub struct ParamTable {
    pub(crate) meta: MetaTable,
    pub(crate) arenas: ValueArenas,
    pub(crate) calcs: CalcRegistry,
    pub(crate) wave: Wavefront,
    pub(crate) diag: Diagnostics,
}

impl ParamTable {
    /// An empty table. `capacity_hint` pre-sizes the metadata table and
    /// the propagation work queue; growth past the hint is transparent.
    pub fn new(capacity_hint: u16) -> Self {
        Self {
            meta: MetaTable::with_capacity(usize::from(capacity_hint)),
            arenas: ValueArenas::new(),
            calcs: CalcRegistry::default(),
            wave: Wavefront::with_capacity(usize::from(capacity_hint)),
            diag: Diagnostics::new(),
        }
    }

    /// Whether usage-error validation is performed.
    pub fn safety_checks_enabled(&self) -> bool {
        self.diag.safety_checks
    }

    /// Toggle usage-error validation.
    ///
    /// On (the default), every public operation validates id range,
    /// liveness, type tags, root-vs-derived discipline, adjacency sizes,
    /// and wavefront cycles, aborting with a diagnostic on violation.
    /// Off, the checks are skipped and invalid input leads to undefined
    /// results.
    pub fn set_safety_checks(&mut self, enabled: bool) {
        self.diag.safety_checks = enabled;
    }

    /// Replace the diagnostic text sink (default: standard error).
    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.diag.set_sink(sink);
    }

    /// Type-checked read of the parameter's current value.
    pub fn get<T: Scalar>(&self, id: ParamId) -> T {
        let meta = typed_record(&self.meta, &self.diag, "get", id, T::TAG);
        let Some(width) = meta.tag.width() else {
            self.diag.fatal("get", Fault::FreeSlot { id })
        };
        T::from_raw(self.arenas.read(width, meta.val_idx))
    }

    /// Number of metadata slots ever allocated, free slots included.
    pub fn param_count(&self) -> usize {
        self.meta.len()
    }

    /// Whether the slot holds a live parameter.
    pub fn is_used(&self, id: ParamId) -> bool {
        if self.diag.safety_checks && self.meta.get(id).is_none() {
            self.diag.fatal(
                "is_used",
                Fault::IdOutOfRange {
                    id,
                    len: self.meta.len(),
                },
            );
        }
        self.meta[id].is_used()
    }

    /// The parameter's parents (calculation inputs).
    pub fn parents(&self, id: ParamId) -> &[ParamId] {
        record(&self.meta, &self.diag, "parents", id).links.parents()
    }

    /// The parameter's sibling set (co-outputs of its calculation).
    pub fn siblings(&self, id: ParamId) -> &[ParamId] {
        record(&self.meta, &self.diag, "siblings", id).links.siblings()
    }

    /// The parameter's children (dependents recomputed when it changes).
    pub fn children(&self, id: ParamId) -> &[ParamId] {
        record(&self.meta, &self.diag, "children", id).links.children()
    }

    /// Best-effort byte count across all owned buffers, for host-side
    /// diagnostics.
    pub fn total_memory_footprint(&self) -> usize {
        core::mem::size_of::<Self>()
            .saturating_add(self.arenas.footprint())
            .saturating_add(self.meta.footprint())
            .saturating_add(self.calcs.footprint())
            .saturating_add(self.wave.footprint())
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Index<ParamId> for MetaTable {
    type Output = Meta;

    fn index(&self, id: ParamId) -> &Meta {
        match self.get(id) {
            Some(meta) => meta,
            None => panic!("paratable: id {id} is outside the parameter list"),
        }
    }
}

impl IndexMut<ParamId> for MetaTable {
    fn index_mut(&mut self, id: ParamId) -> &mut Meta {
        match self.get_mut(id) {
            Some(meta) => meta,
            None => panic!("paratable: id {id} is outside the parameter list"),
        }
    }
}

/// Fetch the record for `id`, validating range and liveness when safety
/// checks are on. With checks off the access is a raw index.
pub(crate) fn record<'a>(
    meta: &'a MetaTable,
    diag: &Diagnostics,
    op: &'static str,
    id: ParamId,
) -> &'a Meta {
    if diag.safety_checks {
        let len = meta.len();
        let Some(record) = meta.get(id) else {
            diag.fatal(op, Fault::IdOutOfRange { id, len })
        };
        if !record.is_used() {
            diag.fatal(op, Fault::FreeSlot { id });
        }
        record
    } else {
        &meta[id]
    }
}

/// [`record`] plus a type-tag match against `expected`.
pub(crate) fn typed_record<'a>(
    meta: &'a MetaTable,
    diag: &Diagnostics,
    op: &'static str,
    id: ParamId,
    expected: TypeTag,
) -> &'a Meta {
    let record = record(meta, diag, op, id);
    if diag.safety_checks && record.tag != expected {
        diag.fatal(
            op,
            Fault::TypeMismatch {
                id,
                expected,
                found: record.tag,
            },
        );
    }
    record
}
