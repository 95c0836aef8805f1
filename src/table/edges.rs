//! Externally-managed adjacency maintenance and slot release.

use crate::error::Fault;
use crate::flags::ParamFlags;
use crate::table::{record, ParamTable};
use crate::types::{ParamId, TypeTag};

impl ParamTable {
    /// Append `child` to `parent`'s children region.
    ///
    /// Adding a child that is already present is not an error: callers
    /// managing ownership externally legitimately re-assert edges. The
    /// duplicate is skipped, with a `warn:` diagnostic when safety
    /// checks are on.
    pub fn add_child(&mut self, parent: ParamId, child: ParamId) {
        let op = "add_child";
        if self.diag.safety_checks {
            record(&self.meta, &self.diag, op, parent);
            record(&self.meta, &self.diag, op, child);
        }
        let parent_record = &mut self.meta[parent];
        if parent_record.links.find_child(child).is_some() {
            if self.diag.safety_checks {
                self.diag.warn(
                    op,
                    format_args!("id {child} is already a child of id {parent}"),
                );
            }
            return;
        }
        parent_record.links.push_child(child);
        parent_record.refresh_presence();
    }

    /// Remove `child` from `parent`'s children region.
    ///
    /// Removing an absent child is skipped, warning under safety
    /// checks like [`add_child`](ParamTable::add_child).
    pub fn remove_child(&mut self, parent: ParamId, child: ParamId) {
        let op = "remove_child";
        if self.diag.safety_checks {
            record(&self.meta, &self.diag, op, parent);
        }
        let parent_record = &mut self.meta[parent];
        match parent_record.links.find_child(child) {
            Some(pos) => {
                let _ = parent_record.links.delete_child(pos);
                parent_record.refresh_presence();
            }
            None => {
                if self.diag.safety_checks {
                    self.diag.warn(
                        op,
                        format_args!("id {child} is not a child of id {parent}"),
                    );
                }
            }
        }
    }

    /// Append `parent` to `child`'s parents region.
    ///
    /// Parents are positional calculation inputs, so the same parent
    /// may appear more than once and no duplicate check applies. The
    /// complementary children edge is the caller's to maintain via
    /// [`add_child`](ParamTable::add_child). Pushing the combined
    /// parents + siblings count past 255 aborts.
    pub fn add_parent(&mut self, child: ParamId, parent: ParamId) {
        let op = "add_parent";
        if self.diag.safety_checks {
            record(&self.meta, &self.diag, op, child);
            record(&self.meta, &self.diag, op, parent);
        }
        let child_record = &mut self.meta[child];
        let parents = child_record.links.parents_len().saturating_add(1);
        let siblings = child_record.links.siblings_len();
        let result = child_record.links.push_parent(parent);
        self.splice(op, child, result, parents, siblings);
        self.meta[child].refresh_presence();
    }

    /// Remove the first occurrence of `parent` from `child`'s parents
    /// region, shifting later inputs down one position.
    ///
    /// Removing an absent parent is skipped, with a `warn:`
    /// diagnostic when safety checks are on.
    pub fn remove_parent(&mut self, child: ParamId, parent: ParamId) {
        let op = "remove_parent";
        if self.diag.safety_checks {
            record(&self.meta, &self.diag, op, child);
        }
        let child_record = &mut self.meta[child];
        match child_record.links.find_parent(parent) {
            Some(pos) => {
                let _ = child_record.links.delete_parent(pos);
                child_record.refresh_presence();
            }
            None => {
                if self.diag.safety_checks {
                    self.diag.warn(
                        op,
                        format_args!("id {parent} is not a parent of id {child}"),
                    );
                }
            }
        }
    }

    /// Mark the slot free.
    ///
    /// The id is never handed out again and the arena slot is not
    /// reclaimed; any later typed access through the id aborts. Edges
    /// referring to the released parameter are left for the caller to
    /// maintain via [`remove_child`](ParamTable::remove_child).
    pub fn release(&mut self, id: ParamId) {
        let op = "release";
        if self.diag.safety_checks && self.meta.get(id).is_none() {
            self.diag.fatal(
                op,
                Fault::IdOutOfRange {
                    id,
                    len: self.meta.len(),
                },
            );
        }
        let record = &mut self.meta[id];
        if !record.is_used() {
            if self.diag.safety_checks {
                self.diag
                    .warn(op, format_args!("id {id} is already a free slot"));
            }
            return;
        }
        record.flags.remove(ParamFlags::IS_USED);
        record.tag = TypeTag::None;
    }
}
