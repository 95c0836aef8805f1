//! Usage-fault taxonomy and diagnostic emission.

use std::cell::RefCell;
use std::io::{self, Write};

use educe::Educe;

use crate::types::{CalcId, ParamId, TypeTag};

/// Adjacency region named in underflow diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The `[0, siblings_start)` region.
    Parents,
    /// The `[siblings_start, children_start)` region.
    Siblings,
    /// The `[children_start, len)` region.
    Children,
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Region::Parents => "parents",
            Region::Siblings => "siblings",
            Region::Children => "children",
        };
        f.write_str(name)
    }
}

/// Contract violations detected while safety checks are enabled.
///
/// Every variant is fatal: the table writes one diagnostic line to its
/// sink and aborts. With safety checks disabled none of these are looked
/// for and the operations proceed with undefined results on bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// The id does not address a metadata slot.
    #[error("id {id} is outside the parameter list (len {len})")]
    IdOutOfRange {
        /// Offending identifier.
        id: ParamId,
        /// Current metadata table length.
        len: usize,
    },
    /// The id addresses a slot that was released or never initialized.
    #[error("id {id} is a free slot")]
    FreeSlot {
        /// Offending identifier.
        id: ParamId,
    },
    /// The parameter's stored kind differs from the requested one.
    #[error("id {id} is not a {expected} value (found {found})")]
    TypeMismatch {
        /// Offending identifier.
        id: ParamId,
        /// Tag requested by the caller.
        expected: TypeTag,
        /// Tag recorded in metadata.
        found: TypeTag,
    },
    /// A derived value was written as if it were a root.
    #[error("id {id} is a derived value and cannot be written directly")]
    NotARoot {
        /// Offending identifier.
        id: ParamId,
    },
    /// The calc id does not address a registered calculation.
    #[error("calc id {id} has not been registered (registry len {len})")]
    UnknownCalc {
        /// Offending calculation id.
        id: CalcId,
        /// Current registry length.
        len: usize,
    },
    /// Propagation reached a parameter that carries no calculation.
    #[error("id {id} was enqueued for recomputation but has no calculation")]
    MissingCalculation {
        /// Offending identifier.
        id: ParamId,
    },
    /// The calculation registry exhausted its 16-bit id space.
    #[error("calculation registry is full")]
    RegistryFull,
    /// The metadata table exhausted its 16-bit id space.
    #[error("parameter table is full")]
    TableFull,
    /// Appending a parent or sibling would push the byte cursors past 255.
    #[error("id {id} exceeds 255 combined parents and siblings ({parents} parents, {siblings} siblings)")]
    LinkOverflow {
        /// Parameter whose adjacency overflowed.
        id: ParamId,
        /// Requested parents count.
        parents: usize,
        /// Requested siblings count.
        siblings: usize,
    },
    /// Deleting from an adjacency region that has no such entry.
    #[error("id {id} has no {region} entry at position {pos}")]
    LinkUnderflow {
        /// Parameter whose adjacency was spliced.
        id: ParamId,
        /// Region the delete addressed.
        region: Region,
        /// Offending position within the region.
        pos: usize,
    },
    /// A calculation addressed an input slot past its declared parents.
    #[error("input index {index} is outside the declared inputs (len {len})")]
    InputOutOfRange {
        /// Local index passed by the calculation.
        index: usize,
        /// Declared input count.
        len: usize,
    },
    /// A calculation addressed an output slot past its declared siblings.
    #[error("output index {index} is outside the declared outputs (len {len})")]
    OutputOutOfRange {
        /// Local index passed by the calculation.
        index: usize,
        /// Declared output count.
        len: usize,
    },
    /// A linked-output descriptor named a kind with no storage.
    #[error("type tag {tag} is not a storable kind")]
    UnstorableTag {
        /// The offending tag (only `None` qualifies).
        tag: TypeTag,
    },
    /// Propagation re-entered a parameter already visited on this wavefront.
    #[error("cyclic update: id {id} was already visited on the current wavefront")]
    CyclicUpdate {
        /// Identifier reached twice.
        id: ParamId,
    },
}

/// Per-table diagnostic state: the safety toggle and the text sink.
///
/// Both are instance fields rather than process globals so independent
/// tables can be configured independently. The sink sits behind a
/// `RefCell` so read paths can emit diagnostics without taking `&mut`
/// on the whole table.
#[derive(Educe)]
#[educe(Debug)]
pub(crate) struct Diagnostics {
    pub(crate) safety_checks: bool,
    #[educe(Debug(ignore))]
    sink: RefCell<Box<dyn Write + Send>>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        Self {
            safety_checks: true,
            sink: RefCell::new(Box::new(io::stderr())),
        }
    }

    pub(crate) fn set_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.sink = RefCell::new(sink);
    }

    /// Emit the diagnostic line for `fault` and abort.
    pub(crate) fn fatal(&self, op: &'static str, fault: Fault) -> ! {
        {
            let mut sink = self.sink.borrow_mut();
            let _ = writeln!(sink, "FATAL: paratable: {op}: {fault}");
            let _ = sink.flush();
        }
        panic!("paratable: {op}: {fault}");
    }

    /// Emit a non-fatal diagnostic line.
    pub(crate) fn warn(&self, op: &'static str, message: core::fmt::Arguments<'_>) {
        let mut sink = self.sink.borrow_mut();
        let _ = writeln!(sink, "warn: paratable: {op}: {message}");
    }
}
