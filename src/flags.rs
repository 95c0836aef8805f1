//! Per-parameter flag bits.

use bitflags::bitflags;

bitflags! {
    /// Presence and behavior bits kept in every metadata record.
    ///
    /// The `HAS_*` bits are derived state: each is set exactly when the
    /// corresponding adjacency region is non-empty (or, for
    /// `HAS_CALCULATION`, when the record's calc id is meaningful).
    pub struct ParamFlags: u8 {
        /// The slot holds a live parameter. Clear means free.
        const IS_USED = 0x01;
        /// Propagate from this parameter even when a write leaves its
        /// bit pattern unchanged.
        const ALWAYS_UPDATE = 0x02;
        /// The children region is non-empty.
        const HAS_CHILDREN = 0x04;
        /// The parents region is non-empty.
        const HAS_PARENT = 0x08;
        /// The siblings region is non-empty.
        const HAS_SIBLINGS = 0x10;
        /// The record's calc id selects a registered calculation.
        const HAS_CALCULATION = 0x20;
    }
}

impl ParamFlags {
    /// Flags for a freshly initialized root parameter.
    pub(crate) fn root(always_update: bool) -> Self {
        let mut flags = ParamFlags::IS_USED;
        flags.set(ParamFlags::ALWAYS_UPDATE, always_update);
        flags
    }

    /// Flags for a freshly initialized derived parameter.
    pub(crate) fn derived(always_update: bool, has_parent: bool) -> Self {
        let mut flags =
            ParamFlags::IS_USED | ParamFlags::HAS_CALCULATION | ParamFlags::HAS_SIBLINGS;
        flags.set(ParamFlags::ALWAYS_UPDATE, always_update);
        flags.set(ParamFlags::HAS_PARENT, has_parent);
        flags
    }
}
