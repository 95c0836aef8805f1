//! Graph wiring: linked outputs, edge maintenance, release, accounting.

use std::io::Write;
use std::sync::{Arc, Mutex};

use paratable::prelude::*;
use quickcheck_macros::quickcheck;

/// Sink capturing diagnostics for assertion.
#[derive(Clone, Default)]
struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn linked_outputs_share_one_calculation() {
    let mut table = ParamTable::new(8);
    let divmod = table.register_calc(|c| {
        let a: u64 = c.input(0);
        let b: u64 = c.input(1);
        c.set_output(0, a / b);
        c.set_output(1, a % b != 0);
    });
    let a = table.init_root(17u64, false);
    let b = table.init_root(5u64, false);
    let outputs = table.init_derived_linked(
        divmod,
        &[a, b],
        &[
            OutputSpec::new(TypeTag::U64),
            OutputSpec::new(TypeTag::Bool),
        ],
    );
    let &[quot, inexact] = outputs.as_slice() else {
        panic!("expected two outputs");
    };

    assert_eq!(table.get::<u64>(quot), 3);
    assert!(table.get::<bool>(inexact));
    // The set is its own sibling list, shared verbatim.
    assert_eq!(table.siblings(quot), &[quot, inexact]);
    assert_eq!(table.siblings(inexact), &[quot, inexact]);
    assert_eq!(table.parents(quot), &[a, b]);
    assert_eq!(table.children(a), &[quot, inexact]);

    table.set_root(a, 25u64);
    assert_eq!(table.get::<u64>(quot), 5);
    assert!(!table.get::<bool>(inexact));
}

#[test]
fn single_output_derived_is_its_own_sole_sibling() {
    let mut table = ParamTable::new(8);
    let double = table.register_calc(|c| {
        let v: i32 = c.input(0);
        c.set_output(0, v * 2);
    });
    let root = table.init_root(-4i32, false);
    let doubled = table.init_derived::<i32>(false, double, &[root]);

    assert_eq!(table.get::<i32>(doubled), -8);
    assert_eq!(table.siblings(doubled), &[doubled]);
    assert_eq!(table.parents(doubled), &[root]);
    assert_eq!(table.children(root), &[doubled]);
    assert!(table.children(doubled).is_empty());
}

#[test]
fn duplicate_parent_wires_a_single_child_edge() {
    let mut table = ParamTable::new(8);
    let square = table.register_calc(|c| {
        let v: u64 = c.input(0);
        let w: u64 = c.input(1);
        c.set_output(0, v * w);
    });
    let x = table.init_root(9u64, false);
    let squared = table.init_derived::<u64>(false, square, &[x, x]);

    assert_eq!(table.get::<u64>(squared), 81);
    assert_eq!(table.parents(squared), &[x, x]);
    assert_eq!(table.children(x), &[squared]);

    table.set_root(x, 12u64);
    assert_eq!(table.get::<u64>(squared), 144);
}

#[test]
fn child_maintenance_is_idempotent_with_warnings() {
    let sink = CaptureSink::default();
    let mut table = ParamTable::new(8);
    table.set_diagnostic_sink(Box::new(sink.clone()));

    let a = table.init_root(1u8, false);
    let b = table.init_root(2u8, false);

    table.add_child(a, b);
    assert_eq!(table.children(a), &[b]);
    assert!(sink.contents().is_empty());

    table.add_child(a, b);
    assert_eq!(table.children(a), &[b]);
    assert!(sink.contents().contains("warn: paratable: add_child"));

    table.remove_child(a, b);
    assert!(table.children(a).is_empty());

    table.remove_child(a, b);
    assert!(sink.contents().contains("warn: paratable: remove_child"));
}

#[test]
fn parent_maintenance_pairs_with_child_maintenance() {
    let sink = CaptureSink::default();
    let mut table = ParamTable::new(8);
    table.set_diagnostic_sink(Box::new(sink.clone()));

    let sum = table.register_calc(|c| {
        let total = (0..c.input_count()).map(|n| c.input::<u64>(n)).sum::<u64>();
        c.set_output(0, total);
    });
    let x = table.init_root(3u64, false);
    let y = table.init_root(4u64, false);
    let total = table.init_derived::<u64>(false, sum, &[x]);
    assert_eq!(table.get::<u64>(total), 3);

    // Re-wire the derived value to take a second input.
    table.add_parent(total, y);
    table.add_child(y, total);
    assert_eq!(table.parents(total), &[x, y]);
    table.set_root(y, 5u64);
    assert_eq!(table.get::<u64>(total), 8);

    // Duplicate parents are positional inputs, not a set.
    table.add_parent(total, y);
    assert_eq!(table.parents(total), &[x, y, y]);
    table.remove_parent(total, y);
    assert_eq!(table.parents(total), &[x, y]);
    assert!(!sink.contents().contains("warn: paratable: remove_parent"));

    table.remove_parent(total, total);
    assert!(sink.contents().contains("warn: paratable: remove_parent"));
    assert_eq!(table.parents(total), &[x, y]);
}

#[test]
fn released_slot_reports_free_and_warns_on_rerelease() {
    let sink = CaptureSink::default();
    let mut table = ParamTable::new(8);
    table.set_diagnostic_sink(Box::new(sink.clone()));

    let a = table.init_root(1u8, false);
    let b = table.init_root(2u8, false);
    assert!(table.is_used(a));

    table.release(a);
    assert!(!table.is_used(a));
    assert!(table.is_used(b));

    table.release(a);
    assert!(sink.contents().contains("warn: paratable: release"));

    // Ids are never recycled: a later init gets a fresh slot.
    let c = table.init_root(3u8, false);
    assert_ne!(c, a);
    assert_eq!(table.param_count(), 3);
}

#[test]
fn footprint_is_nonzero_and_grows() {
    let mut table = ParamTable::new(4);
    let initial = table.total_memory_footprint();
    assert!(initial > 0);

    for n in 0..64 {
        table.init_root(n as u64, false);
    }
    assert!(table.total_memory_footprint() > initial);
}

#[test]
fn safety_off_runs_valid_operations_identically() {
    let mut table = ParamTable::new(8);
    table.set_safety_checks(false);
    assert!(!table.safety_checks_enabled());

    let sum = table.register_calc(|c| {
        let a: f64 = c.input(0);
        let b: f64 = c.input(1);
        c.set_output(0, a + b);
    });
    let x = table.init_root(1.5f64, false);
    let y = table.init_root(2.25f64, false);
    let total = table.init_derived::<f64>(false, sum, &[x, y]);

    assert_eq!(table.get::<f64>(total), 3.75);
    table.set_root(x, 10.0f64);
    assert_eq!(table.get::<f64>(total), 12.25);
}

#[test]
fn safety_off_collapses_duplicate_enqueues_via_suppression() {
    // Two co-outputs feeding one consumer enqueue it twice per
    // wavefront; with checks off the second visit recomputes the same
    // value and stops there.
    let mut table = ParamTable::new(8);
    table.set_safety_checks(false);

    let split = table.register_calc(|c| {
        let v: u32 = c.input(0);
        c.set_output(0, v / 2);
        c.set_output(1, v - v / 2);
    });
    let sum = table.register_calc(|c| {
        let a: u32 = c.input(0);
        let b: u32 = c.input(1);
        c.set_output(0, a + b);
    });
    let v = table.init_root(10u32, false);
    let halves = table.init_derived_linked(
        split,
        &[v],
        &[OutputSpec::new(TypeTag::U32), OutputSpec::new(TypeTag::U32)],
    );
    let rejoined = table.init_derived::<u32>(false, sum, &[halves[0], halves[1]]);

    assert_eq!(table.get::<u32>(rejoined), 10);
    table.set_root(v, 25u32);
    assert_eq!(table.get::<u32>(rejoined), 25);
}

#[quickcheck]
fn edges_stay_bidirectional(pairs: Vec<(u8, u8)>) -> bool {
    let mut table = ParamTable::new(16);
    let sum = table.register_calc(|c| {
        let a: u64 = c.input(0);
        let b: u64 = c.input(1);
        c.set_output(0, a.wrapping_add(b));
    });
    let roots: Vec<ParamId> = (0..5).map(|n: i32| table.init_root(n as u64, false)).collect();

    let mut ids = roots.clone();
    for (a, b) in pairs.into_iter().take(32) {
        let pa = ids[usize::from(a) % ids.len()];
        let pb = ids[usize::from(b) % ids.len()];
        let derived = table.init_derived::<u64>(false, sum, &[pa, pb]);
        ids.push(derived);
    }

    ids.iter().all(|&id| {
        let parents_ok = table
            .parents(id)
            .iter()
            .all(|&parent| table.children(parent).contains(&id));
        let children_ok = table
            .children(id)
            .iter()
            .all(|&child| table.parents(child).contains(&id));
        parents_ok && children_ok
    })
}
