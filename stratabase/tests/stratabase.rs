// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `stratabase` crate.
//!
//! These exercise the public store and accessor API end to end: resolution
//! order across layers, list layering, notification counts, release, and the
//! ordering of notifications caused by handlers that write back.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use stratabase::{
    Layer, ListChange, ObjectId, StrataError, Stratabase, StratabaseConfigBuilder,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn counter() -> (Rc<Cell<usize>>, impl Fn(&()) + 'static) {
    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    (count, move |_: &()| sink.set(sink.get() + 1))
}

const G1: ObjectId = ObjectId::from_u128(0x61);
const G2: ObjectId = ObjectId::from_u128(0x62);

#[test]
fn resolution_walks_down_as_layers_are_cleared() {
    init_tracing();
    let strata = Stratabase::new();
    let access = strata.property_access::<&str>(G1, "Name");

    strata.set_baseline_value(G1, "Name", "base");
    strata.set_override_value(2, G1, "Name", "two");
    strata.set_override_value(5, G1, "Name", "five");
    assert_eq!(access.get_value(), Some("five"));

    strata.obliterate_property_storage_in_layer(5, G1, "Name");
    assert_eq!(access.get_value(), Some("two"));

    strata.obliterate_property_storage_in_layer(2, G1, "Name");
    assert_eq!(access.get_value(), Some("base"));

    strata.obliterate_property_storage_in_baseline(G1, "Name");
    assert!(!access.is_set());
    assert_eq!(access.get_value(), None);
}

#[test]
fn accessors_for_one_pair_observe_the_same_state() {
    init_tracing();
    let strata = Stratabase::new();
    let first = strata.property_access::<i32>(G1, "X");
    let second = strata.property_access::<i32>(G1, "X");

    first.set_override_value(0, 7);
    assert_eq!(second.get_value(), Some(7));
    assert_eq!(second.active_layer(), Some(Layer::Override(0)));
    assert_eq!(strata.manager(G1).map(|m| m.access_count()), Some(2));
}

#[test]
fn insert_into_override_shifts_later_elements() {
    init_tracing();
    let strata = Stratabase::new();
    for value in [1, 2, 3] {
        strata.add_element_into_baseline_list(G2, "L", value);
    }

    assert!(strata.insert_element_into_override_layer_list(0, G2, "L", 1, 9));
    assert_eq!(
        strata.materialized_list::<i32>(Layer::Override(0), G2, "L"),
        Some(vec![1, 9, 2, 3])
    );
    assert_eq!(
        strata.materialized_list::<i32>(Layer::Override(4), G2, "L"),
        Some(vec![1, 9, 2, 3])
    );
    assert_eq!(strata.try_get_baseline_list::<i32>(G2, "L"), Some(vec![1, 2, 3]));
}

#[test]
fn baseline_round_trip() {
    init_tracing();
    let strata = Stratabase::new();
    strata.set_baseline_value(G1, "X", 42);
    assert_eq!(strata.try_get_baseline_value::<i32>(G1, "X"), Some(42));

    let access = strata.property_access::<i32>(G1, "X");
    assert!(access.clear_baseline_value());
    assert_eq!(strata.try_get_baseline_value::<i32>(G1, "X"), None);
    assert!(matches!(
        strata.get_baseline_value::<i32>(G1, "X"),
        Err(StrataError::Absent { .. })
    ));
}

#[test]
fn value_changed_fires_once_per_effective_change() {
    init_tracing();
    let strata = Stratabase::new();
    let access = strata.property_access::<i32>(G1, "X");
    let (changes, handler) = counter();
    access.value_changed().subscribe(handler);

    assert!(access.set_baseline_value(1));
    assert_eq!(changes.get(), 1);
    assert!(!access.set_baseline_value(1));
    assert_eq!(changes.get(), 1);
    assert!(access.set_baseline_value(2));
    assert_eq!(changes.get(), 2);
}

#[test]
fn released_accessors_stop_receiving_events() {
    init_tracing();
    let strata = Stratabase::new();
    let access = strata.property_access::<i32>(G1, "X");
    let (changes, handler) = counter();
    access.value_changed().subscribe(handler);

    strata.set_baseline_value(G1, "X", 1);
    assert_eq!(changes.get(), 1);

    access.release();
    strata.set_baseline_value(G1, "X", 2);
    strata.set_override_value(0, G1, "X", 3);
    assert_eq!(changes.get(), 1);

    drop(access);
    assert_eq!(strata.manager_count(), 0);
    assert_eq!(strata.try_get_override_value::<i32>(0, G1, "X"), Some(3));
}

#[test]
fn count_scenario() {
    init_tracing();
    let strata = Stratabase::new();
    let count = strata.property_access::<i32>(G1, "Count");

    strata.set_baseline_value(G1, "Count", 10);
    assert_eq!(count.get_value(), Some(10));
    count.set_override_value(0, 20);
    assert_eq!(count.get_value(), Some(20));
    count.set_override_value(1, 30);
    assert_eq!(count.get_value(), Some(30));
    count.clear_override_value(1);
    assert_eq!(count.get_value(), Some(20));
    count.clear_override_value(0);
    assert_eq!(count.get_value(), Some(10));
}

#[test]
fn tags_scenario() {
    init_tracing();
    let strata = Stratabase::new();
    let tags = strata.list_access::<String>(G2, "Tags");
    tags.add_element_to_baseline("a".into());
    tags.add_element_to_baseline("b".into());

    assert!(tags.insert_element_into_override_layer(0, 1, "x".into()));
    assert_eq!(tags.materialized_elements(Layer::Override(0)).unwrap(), ["a", "x", "b"]);
    assert_eq!(tags.elements(), ["a", "x", "b"]);

    assert!(tags.remove_element_from_override_layer(0, &"x".into()));
    assert_eq!(tags.materialized_elements(Layer::Override(0)).unwrap(), ["a", "b"]);
    assert_eq!(tags.elements(), ["a", "b"]);
}

#[test]
fn writes_from_handlers_are_delivered_after_the_current_notification() {
    init_tracing();
    let strata = Stratabase::new();
    let first = strata.property_access::<i32>(G1, "X");
    let second = strata.property_access::<i32>(G1, "X");
    let log = Rc::new(RefCell::new(Vec::new()));

    {
        let strata = strata.clone();
        let log = log.clone();
        first.value_changed().subscribe(move |()| {
            let value = strata.try_get_baseline_value::<i32>(G1, "X");
            log.borrow_mut().push(("first", value));
            if value == Some(1) {
                strata.set_baseline_value(G1, "X", 2);
            }
        });
    }
    {
        let strata = strata.clone();
        let log = log.clone();
        second.value_changed().subscribe(move |()| {
            let value = strata.try_get_baseline_value::<i32>(G1, "X");
            log.borrow_mut().push(("second", value));
        });
    }

    strata.set_baseline_value(G1, "X", 1);

    // Storage already holds 2 when the second accessor hears about the first
    // write, but it hears about both writes, in order, without nesting.
    assert_eq!(
        *log.borrow(),
        [
            ("first", Some(1)),
            ("second", Some(2)),
            ("first", Some(2)),
            ("second", Some(2)),
        ]
    );
    assert_eq!(first.get_value(), Some(2));
}

#[test]
fn list_cache_skips_deferred_changes_it_already_reloaded() {
    init_tracing();
    let strata = Stratabase::new();
    let writer = strata.list_access::<i32>(G2, "L");
    let reader = strata.list_access::<i32>(G2, "L");
    let log = Rc::new(RefCell::new(Vec::new()));

    {
        let strata = strata.clone();
        writer.elements_changed().subscribe(move |change| {
            if *change == ListChange::Reset {
                strata.add_element_into_baseline_list(G2, "L", 2);
            }
        });
    }
    {
        let log = log.clone();
        reader
            .elements_changed()
            .subscribe(move |change: &ListChange<i32>| log.borrow_mut().push(change.clone()));
    }

    // The reader loads [1, 2] when it first sees the list appear, so the
    // deferred insert of 2 must not be applied to it a second time.
    writer.add_element_to_baseline(1);
    assert_eq!(writer.elements(), [1, 2]);
    assert_eq!(reader.elements(), [1, 2]);
    assert_eq!(*log.borrow(), [ListChange::Reset]);

    reader.add_element_to_baseline(3);
    assert_eq!(
        *log.borrow(),
        [ListChange::Reset, ListChange::Inserted { index: 2, value: 3 }]
    );
    assert_eq!(writer.elements(), [1, 2, 3]);
}

#[test]
fn layer_limit_rejects_out_of_range_overrides() {
    init_tracing();
    let strata =
        Stratabase::with_config(StratabaseConfigBuilder::new().override_layer_limit(1).build());
    let access = strata.property_access::<i32>(G1, "X");

    assert!(access.set_override_value(0, 1));
    assert!(!access.set_override_value(1, 2));
    assert_eq!(access.get_value(), Some(1));
    assert_eq!(strata.override_layer_count(), 1);
}

#[test]
fn clear_all_resets_every_accessor() {
    init_tracing();
    let strata = Stratabase::new();
    let x = strata.property_access::<i32>(G1, "X");
    let tags = strata.list_access::<i32>(G2, "Tags");
    x.set_override_value(3, 1);
    tags.add_element_to_baseline(1);

    let (changes, handler) = counter();
    x.value_changed().subscribe(handler);
    let is_set = Rc::new(Cell::new(true));
    {
        let is_set = is_set.clone();
        tags.is_set_changed().subscribe(move |set| is_set.set(*set));
    }

    strata.clear_all();
    assert_eq!(changes.get(), 1);
    assert!(!x.is_set());
    assert!(!is_set.get());
    assert!(tags.is_empty());
    assert_eq!(strata.override_layer_count(), 0);
    assert!(strata.object_ids().is_empty());
}

#[test]
fn obliterating_a_layer_reveals_lower_values() {
    init_tracing();
    let strata = Stratabase::new();
    let a = strata.property_access::<i32>(G1, "X");
    let b = strata.property_access::<i32>(G2, "X");
    strata.set_baseline_value(G1, "X", 1);
    strata.set_override_value(0, G1, "X", 10);
    strata.set_baseline_value(G2, "X", 2);
    strata.set_override_value(0, G2, "X", 20);

    assert!(strata.obliterate_layer(Layer::Override(0)));
    assert_eq!(a.get_value(), Some(1));
    assert_eq!(b.get_value(), Some(2));
    assert!(!strata.obliterate_layer(Layer::Override(0)));
}

#[test]
fn lower_layer_list_edits_compose_into_higher_layers() {
    init_tracing();
    let strata = Stratabase::new();
    strata.add_element_into_baseline_list(G2, "Tags", "a");
    strata.add_element_into_baseline_list(G2, "Tags", "b");
    assert!(strata.insert_element_into_override_layer_list(0, G2, "Tags", 1, "x"));

    strata.add_element_into_baseline_list(G2, "Tags", "c");
    assert_eq!(
        strata.materialized_list::<&str>(Layer::Override(0), G2, "Tags"),
        Some(vec!["a", "x", "b", "c"])
    );

    let other = ObjectId::from_u128(0x63);
    strata.add_element_into_baseline_list(other, "Tags", "a");
    strata.add_element_into_override_layer_list(1, other, "Tags", "y");
    strata.add_element_into_override_layer_list(0, other, "Tags", "x");
    assert_eq!(
        strata.materialized_list::<&str>(Layer::Override(1), other, "Tags"),
        Some(vec!["a", "x", "y"])
    );
    assert_eq!(
        strata.try_get_override_layer_list::<&str>(0, other, "Tags"),
        Some(vec!["a", "x"])
    );
}

#[test]
fn any_override_index_is_writable() {
    init_tracing();
    let strata = Stratabase::new();
    let access = strata.property_access::<i32>(G1, "X");

    assert!(access.set_override_value(1_000_000_000, 1));
    assert!(strata.set_override_value(usize::MAX, G1, "X", 2));
    assert_eq!(access.get_value(), Some(2));
    assert_eq!(access.active_layer(), Some(Layer::Override(usize::MAX)));
    assert_eq!(strata.get_override_value::<i32>(usize::MAX, G1, "X"), Ok(2));

    assert!(access.clear_override_value(usize::MAX));
    assert_eq!(access.get_value(), Some(1));

    let tags = strata.list_access::<u8>(G2, "Tags");
    assert!(tags.add_element_to_override_layer(usize::MAX, 7));
    assert_eq!(tags.elements(), [7]);
}

#[test]
fn interrupted_dispatch_drops_the_queued_notifications() {
    init_tracing();
    let strata = Stratabase::new();
    let x = strata.property_access::<i32>(G1, "X");
    let y = strata.property_access::<i32>(G1, "Y");
    let z = strata.property_access::<i32>(G2, "Z");
    let (y_changes, handler) = counter();
    y.value_changed().subscribe(handler);
    let (z_changes, handler) = counter();
    z.value_changed().subscribe(handler);

    let armed = Rc::new(Cell::new(true));
    {
        let strata = strata.clone();
        let armed = armed.clone();
        x.value_changed().subscribe(move |()| {
            if armed.replace(false) {
                strata.set_baseline_value(G1, "Y", 1);
                panic!("handler failure");
            }
        });
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        strata.set_baseline_value(G1, "X", 1);
    }));
    assert!(outcome.is_err());
    assert_eq!(strata.try_get_baseline_value::<i32>(G1, "Y"), Some(1));

    // The next write dispatches normally and does not replay the write to Y.
    strata.set_baseline_value(G2, "Z", 1);
    assert_eq!(z_changes.get(), 1);
    assert_eq!(y_changes.get(), 0);
}
