//! Calculation registry and the restricted callback view.

use educe::Educe;

use crate::arena::ValueArenas;
use crate::consts::MAX_CALC_COUNT;
use crate::error::{Diagnostics, Fault};
use crate::meta::MetaTable;
use crate::table::propagate::{write_and_propagate, Wavefront};
use crate::table::typed_record;
use crate::types::{CalcId, ParamId, Scalar};

pub(crate) type ParamCalc = Box<dyn FnMut(&mut CalcContext<'_>) + 'static>;

/// Append-only list of calculation callbacks keyed by [`CalcId`].
#[derive(Educe, Default)]
#[educe(Debug)]
pub(crate) struct CalcRegistry {
    #[educe(Debug(ignore))]
    calcs: Vec<ParamCalc>,
}

impl CalcRegistry {
    pub(crate) fn len(&self) -> usize {
        self.calcs.len()
    }

    pub(crate) fn is_registered(&self, id: CalcId) -> bool {
        id.to_usize() < self.calcs.len()
    }

    /// Append `calc`, returning its assigned id, or `None` once the
    /// 16-bit id space is exhausted.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn push(&mut self, calc: ParamCalc) -> Option<CalcId> {
        let len = self.calcs.len();
        if len >= MAX_CALC_COUNT {
            return None;
        }
        self.calcs.push(calc);
        Some(CalcId::new(len as u16))
    }

    /// The callback for `id`. Callers validate registration first when
    /// safety checks are on; otherwise an unknown id panics on index.
    pub(crate) fn get_mut(&mut self, id: CalcId) -> &mut ParamCalc {
        &mut self.calcs[id.to_usize()]
    }

    pub(crate) fn footprint(&self) -> usize {
        self.calcs
            .capacity()
            .saturating_mul(core::mem::size_of::<ParamCalc>())
    }
}

/// The view a calculation callback works through.
///
/// It exposes the callback's declared inputs (the derived value's
/// parents) and outputs (its sibling set) by local position, plus reads
/// of unrelated parameters. It deliberately exposes nothing else: a
/// callback cannot re-enter the table's mutation API, register
/// calculations, or rewire edges.
pub struct CalcContext<'t> {
    meta: &'t MetaTable,
    arenas: &'t mut ValueArenas,
    wave: &'t mut Wavefront,
    diag: &'t Diagnostics,
    inputs: &'t [ParamId],
    outputs: &'t [ParamId],
}

impl<'t> CalcContext<'t> {
    pub(crate) fn new(
        meta: &'t MetaTable,
        arenas: &'t mut ValueArenas,
        wave: &'t mut Wavefront,
        diag: &'t Diagnostics,
        inputs: &'t [ParamId],
        outputs: &'t [ParamId],
    ) -> Self {
        Self {
            meta,
            arenas,
            wave,
            diag,
            inputs,
            outputs,
        }
    }

    /// Read the input at `local` position in the declared parents list.
    pub fn input<T: Scalar>(&self, local: usize) -> T {
        if self.diag.safety_checks && local >= self.inputs.len() {
            self.diag.fatal(
                "input",
                Fault::InputOutOfRange {
                    index: local,
                    len: self.inputs.len(),
                },
            );
        }
        self.get(self.inputs[local])
    }

    /// Write the output at `local` position in the declared sibling set.
    ///
    /// The write applies change suppression: downstream children are
    /// enqueued only when the stored bit pattern changed or the output
    /// parameter carries `ALWAYS_UPDATE`.
    pub fn set_output<T: Scalar>(&mut self, local: usize, value: T) {
        if self.diag.safety_checks && local >= self.outputs.len() {
            self.diag.fatal(
                "set_output",
                Fault::OutputOutOfRange {
                    index: local,
                    len: self.outputs.len(),
                },
            );
        }
        let id = self.outputs[local];
        typed_record(self.meta, self.diag, "set_output", id, T::TAG);
        write_and_propagate(
            self.meta,
            self.arenas,
            self.wave,
            self.diag,
            "set_output",
            id,
            value.to_raw(),
        );
    }

    /// Type-checked read of any parameter, declared input or not.
    pub fn get<T: Scalar>(&self, id: ParamId) -> T {
        let meta = typed_record(self.meta, self.diag, "get", id, T::TAG);
        let Some(width) = meta.tag.width() else {
            self.diag.fatal("get", Fault::FreeSlot { id })
        };
        T::from_raw(self.arenas.read(width, meta.val_idx))
    }

    /// The declared input ids, for variadic callbacks.
    pub fn inputs(&self) -> &[ParamId] {
        self.inputs
    }

    /// The `[start, end)` slice of the declared input ids.
    pub fn input_range(&self, start: usize, end: usize) -> &[ParamId] {
        match self.inputs.get(start..end) {
            Some(ids) => ids,
            None => self.diag.fatal(
                "input_range",
                Fault::InputOutOfRange {
                    index: end,
                    len: self.inputs.len(),
                },
            ),
        }
    }

    /// Number of declared inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of declared outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}
