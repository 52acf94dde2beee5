//! Serialization tests.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn entry_array_round_trips_with_group_and_meta() {
    let tick = ManualTick::new();
    let mut source = identity(&tick)
        .metadata(|v: &i64| serde_json::json!({ "square": v * v }))
        .group_by(|v: &i64| if *v < 3 { "low" } else { "high" }.to_string())
        .build()
        .unwrap();
    for x in 1..=4 {
        source.invoke(x).unwrap();
    }
    let json = source.serialize_history().unwrap();

    let mut target = identity(&tick).build().unwrap();
    target.deserialize_history(&json).unwrap();
    assert_eq!(target.get_history(), source.get_history());
}

#[test]
fn full_state_survives_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let tick = ManualTick::new();
    let mut source = identity(&tick).call_now(0).build().unwrap();
    for x in 1..=3 {
        source.invoke(x).unwrap();
    }
    source.undo(2);
    source.save_state(&path).unwrap();

    let mut target = identity(&tick).build().unwrap();
    target.load_state(&path).unwrap();
    assert_eq!(target.export_state(), source.export_state());
    assert_eq!(target.redo(2), Some(3));
}

#[test]
fn rejected_import_changes_nothing() {
    let tick = ManualTick::new();
    let mut exec = identity(&tick).build().unwrap();
    exec.invoke(1).unwrap();
    let before = exec.export_state();

    assert!(exec.import_history(r#"{"value": 1}"#).is_err());
    assert_eq!(exec.export_state(), before);
}
