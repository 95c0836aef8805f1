//! Per-parameter metadata records.

use crate::flags::ParamFlags;
use crate::links::Links;
use crate::types::{CalcId, ParamId, TypeTag};

/// One parameter's record: type tag, arena slot, calculation, flags, and
/// the owned adjacency region.
///
/// The record holds an index into the width-keyed arena rather than the
/// value itself, keeping every record the same size regardless of the
/// stored kind.
#[derive(Debug, Clone)]
pub(crate) struct Meta {
    pub(crate) tag: TypeTag,
    pub(crate) val_idx: u16,
    pub(crate) calc: CalcId,
    pub(crate) flags: ParamFlags,
    pub(crate) links: Links,
}

impl Meta {
    pub(crate) fn new(tag: TypeTag, val_idx: u16, calc: CalcId, flags: ParamFlags) -> Self {
        Self {
            tag,
            val_idx,
            calc,
            flags,
            links: Links::new(),
        }
    }

    pub(crate) fn is_used(&self) -> bool {
        self.flags.contains(ParamFlags::IS_USED)
    }

    pub(crate) fn has_calc(&self) -> bool {
        self.flags.contains(ParamFlags::HAS_CALCULATION)
    }

    pub(crate) fn always_update(&self) -> bool {
        self.flags.contains(ParamFlags::ALWAYS_UPDATE)
    }

    /// Re-derive the presence bits from the adjacency regions.
    ///
    /// Called after any splice so `HAS_PARENT`/`HAS_SIBLINGS`/
    /// `HAS_CHILDREN` stay equivalent to region non-emptiness.
    pub(crate) fn refresh_presence(&mut self) {
        self.flags
            .set(ParamFlags::HAS_PARENT, self.links.parents_len() > 0);
        self.flags
            .set(ParamFlags::HAS_SIBLINGS, self.links.siblings_len() > 0);
        self.flags
            .set(ParamFlags::HAS_CHILDREN, self.links.children_len() > 0);
    }
}

/// Appendable record list indexed by [`ParamId`]. Records are never
/// reordered, so ids stay stable for the table lifetime.
#[derive(Debug, Default)]
pub(crate) struct MetaTable {
    records: Vec<Meta>,
}

impl MetaTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn push(&mut self, meta: Meta) -> ParamId {
        let id = ParamId::new(self.records.len() as u16);
        self.records.push(meta);
        id
    }

    pub(crate) fn get(&self, id: ParamId) -> Option<&Meta> {
        self.records.get(id.to_usize())
    }

    pub(crate) fn get_mut(&mut self, id: ParamId) -> Option<&mut Meta> {
        self.records.get_mut(id.to_usize())
    }

    /// Iterate records for footprint accounting.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Meta> {
        self.records.iter()
    }

    /// Best-effort byte count of the record list and every owned
    /// adjacency buffer.
    pub(crate) fn footprint(&self) -> usize {
        let records = self
            .records
            .capacity()
            .saturating_mul(core::mem::size_of::<Meta>());
        self.iter()
            .fold(records, |sum, meta| sum.saturating_add(meta.links.footprint()))
    }
}
