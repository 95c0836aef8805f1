//! Parameter and calculation initialization.
#![allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]

use crate::arena::Width;
use crate::calc::CalcContext;
use crate::consts::MAX_PARAM_COUNT;
use crate::error::Fault;
use crate::flags::ParamFlags;
use crate::links::SpliceError;
use crate::meta::Meta;
use crate::table::{record, ParamTable};
use crate::types::{CalcId, OutputSpec, ParamId, Scalar};

impl ParamTable {
    /// Register a calculation callback, returning its stable id.
    ///
    /// Callbacks read their declared inputs and write their declared
    /// outputs through the [`CalcContext`] they receive; they must not
    /// touch parameters outside those edges except through the
    /// context's read helpers.
    pub fn register_calc<F>(&mut self, calc: F) -> CalcId
    where
        F: FnMut(&mut CalcContext<'_>) + 'static,
    {
        match self.calcs.push(Box::new(calc)) {
            Some(id) => id,
            None => self.diag.fatal("register_calc", Fault::RegistryFull),
        }
    }

    /// Create a root parameter holding `value`.
    ///
    /// Roots carry no calculation and are written by the host through
    /// [`set_root`](ParamTable::set_root). `always_update` makes every
    /// later write propagate even when the value did not change.
    pub fn init_root<T: Scalar>(&mut self, value: T, always_update: bool) -> ParamId {
        let op = "init_root";
        self.check_capacity(op, 1);
        let val_idx = self.alloc_value(op, T::WIDTH, value.to_raw());
        let record = Meta::new(T::TAG, val_idx, CalcId::NULL, ParamFlags::root(always_update));
        self.meta.push(record)
    }

    /// Create a derived parameter computed by `calc` from `parents`.
    ///
    /// The new parameter becomes the calculation's sole output (its own
    /// single sibling), is appended as a child of every parent, and is
    /// populated by one immediate calculation run. The run cannot
    /// propagate further: the new id has no children yet.
    pub fn init_derived<T: Scalar>(
        &mut self,
        always_update: bool,
        calc: CalcId,
        parents: &[ParamId],
    ) -> ParamId {
        let op = "init_derived";
        self.check_calc_registered(op, calc);
        self.check_parents(op, parents);
        self.check_capacity(op, 1);

        let new_id = ParamId::new(self.meta.len() as u16);
        let val_idx = self.alloc_value(op, T::WIDTH, 0);
        let mut record = Meta::new(
            T::TAG,
            val_idx,
            calc,
            ParamFlags::derived(always_update, !parents.is_empty()),
        );
        self.splice(op, new_id, record.links.extend_parents(parents), parents.len(), 1);
        self.splice(op, new_id, record.links.push_sibling(new_id), parents.len(), 1);
        record.refresh_presence();
        let id = self.meta.push(record);

        self.wire_children(parents, &[id]);
        self.wave.reset();
        self.invoke_calc(id, op);
        id
    }

    /// Create a set of co-output parameters sharing one calculation.
    ///
    /// Every output lists the whole set (itself included) as siblings,
    /// every parent gains every output as a child, and one immediate
    /// calculation run populates the entire set.
    pub fn init_derived_linked(
        &mut self,
        calc: CalcId,
        parents: &[ParamId],
        outputs: &[OutputSpec],
    ) -> Vec<ParamId> {
        let op = "init_derived_linked";
        self.check_calc_registered(op, calc);
        self.check_parents(op, parents);
        if outputs.is_empty() {
            return Vec::new();
        }
        self.check_capacity(op, outputs.len());

        let base = self.meta.len();
        let ids: Vec<ParamId> = (0..outputs.len())
            .map(|offset| ParamId::new((base + offset) as u16))
            .collect();
        for (spec, &id) in outputs.iter().zip(&ids) {
            let Some(width) = spec.tag.width() else {
                self.diag
                    .fatal(op, Fault::UnstorableTag { tag: spec.tag })
            };
            let val_idx = self.alloc_value(op, width, 0);
            let mut record = Meta::new(
                spec.tag,
                val_idx,
                calc,
                ParamFlags::derived(spec.always_update, !parents.is_empty()),
            );
            self.splice(op, id, record.links.extend_parents(parents), parents.len(), outputs.len());
            self.splice(op, id, record.links.extend_siblings(&ids), parents.len(), outputs.len());
            record.refresh_presence();
            self.meta.push(record);
        }

        self.wire_children(parents, &ids);
        self.wave.reset();
        self.invoke_calc(ids[0], op);
        ids
    }

    fn check_calc_registered(&self, op: &'static str, calc: CalcId) {
        if self.diag.safety_checks && !self.calcs.is_registered(calc) {
            self.diag.fatal(
                op,
                Fault::UnknownCalc {
                    id: calc,
                    len: self.calcs.len(),
                },
            );
        }
    }

    fn check_parents(&self, op: &'static str, parents: &[ParamId]) {
        if self.diag.safety_checks {
            for &parent in parents {
                record(&self.meta, &self.diag, op, parent);
            }
        }
    }

    fn check_capacity(&self, op: &'static str, extra: usize) {
        let total = self.meta.len().checked_add(extra);
        if !matches!(total, Some(total) if total <= MAX_PARAM_COUNT) {
            self.diag.fatal(op, Fault::TableFull);
        }
    }

    fn alloc_value(&mut self, op: &'static str, width: Width, raw: u64) -> u16 {
        match self.arenas.append(width, raw) {
            Some(val_idx) => val_idx,
            None => self.diag.fatal(op, Fault::TableFull),
        }
    }

    pub(crate) fn splice(
        &self,
        op: &'static str,
        id: ParamId,
        result: Result<(), SpliceError>,
        parents: usize,
        siblings: usize,
    ) {
        match result {
            Ok(()) => {}
            Err(SpliceError::Overflow) => self.diag.fatal(
                op,
                Fault::LinkOverflow {
                    id,
                    parents,
                    siblings,
                },
            ),
            Err(SpliceError::Underflow { region, pos }) => {
                self.diag.fatal(op, Fault::LinkUnderflow { id, region, pos })
            }
        }
    }

    /// Bulk-append `outputs` to every parent's children region,
    /// skipping edges that already exist (a parent listed for several
    /// inputs still gains each child once).
    fn wire_children(&mut self, parents: &[ParamId], outputs: &[ParamId]) {
        for &parent in parents {
            let parent_record = &mut self.meta[parent];
            let fresh: Vec<ParamId> = outputs
                .iter()
                .copied()
                .filter(|&output| parent_record.links.find_child(output).is_none())
                .collect();
            if !fresh.is_empty() {
                parent_record.links.extend_children(&fresh);
                parent_record.refresh_presence();
            }
        }
    }
}
