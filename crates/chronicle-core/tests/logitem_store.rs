use chronicle_core::storage::LogitemStore;

#[test]
fn keystrokes_within_gap_merge_into_one_record() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "Inbox", "h").unwrap();
    store.append_keystroke(1_050, "Chrome", "Inbox", "e").unwrap();
    store.append_keystroke(1_100, "Chrome", "Inbox", "l").unwrap();
    store.append_keystroke(1_150, "Chrome", "Inbox", "l").unwrap();
    store.append_keystroke(1_200, "Chrome", "Inbox", "o").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].keylogs, "hello");
    assert_eq!(items[0].timestamp, 1_000);
}

#[test]
fn application_change_rotates() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "Inbox", "a").unwrap();
    store.append_keystroke(1_001, "TextEdit", "Inbox", "b").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].app_name, "TextEdit");
    assert_eq!(items[1].app_name, "Chrome");
}

#[test]
fn window_title_change_rotates() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "Inbox", "a").unwrap();
    store.append_keystroke(1_001, "Chrome", "Compose", "b").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].window_title, "Compose");
    assert_eq!(items[1].window_title, "Inbox");
}

#[test]
fn gap_is_measured_from_record_creation_and_is_inclusive() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(0, "Chrome", "Inbox", "a").unwrap();
    // Exactly at the bound: still the same record.
    store.append_keystroke(60_000, "Chrome", "Inbox", "b").unwrap();
    // One past the bound (measured from the record's creation at t=0).
    store.append_keystroke(60_001, "Chrome", "Inbox", "c").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].keylogs, "c");
    assert_eq!(items[1].keylogs, "ab");
}

#[test]
fn rotation_scenario_produces_three_records_newest_first() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "A", "a").unwrap();
    store.append_keystroke(2_000, "Chrome", "A", "b").unwrap();
    store.append_keystroke(2_001, "Chrome", "B", "c").unwrap();
    store.append_keystroke(62_002, "Chrome", "B", "d").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].keylogs, "d");
    assert_eq!(items[1].keylogs, "c");
    assert_eq!(items[2].keylogs, "ab");
    assert_eq!(items[0].timestamp, 62_002);
    assert_eq!(items[1].timestamp, 2_001);
    assert_eq!(items[2].timestamp, 1_000);
}

#[test]
fn oscillation_faster_than_the_gap_still_rotates_per_transition() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "A", "a").unwrap();
    store.append_keystroke(1_001, "Slack", "B", "b").unwrap();
    store.append_keystroke(1_002, "Chrome", "A", "c").unwrap();

    // Only the most-recent record is consulted, so returning to Chrome/A
    // starts a third record instead of merging into the first.
    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].keylogs, "c");
}

#[test]
fn superseded_records_are_never_mutated_again() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "A", "a").unwrap();
    store.append_keystroke(1_001, "Chrome", "B", "b").unwrap();
    store.append_keystroke(1_002, "Chrome", "B", "c").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items[1].keylogs, "a");
    assert_eq!(items[0].keylogs, "bc");
}

#[test]
fn get_since_threshold_is_inclusive() {
    let store = LogitemStore::new().unwrap();

    store.append_keystroke(1_000, "Chrome", "A", "a").unwrap();
    store.append_keystroke(70_000, "Chrome", "A", "b").unwrap();
    store.append_keystroke(140_000, "Chrome", "A", "c").unwrap();

    let items = store.get_since(70_000).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].timestamp, 140_000);
    assert_eq!(items[1].timestamp, 70_000);

    assert!(store.get_since(140_001).unwrap().is_empty());
    assert_eq!(store.get_since(0).unwrap().len(), 3);
}

#[test]
fn export_import_round_trip_reproduces_the_records() {
    let store = LogitemStore::new().unwrap();
    store.append_keystroke(1_000, "Chrome", "A", "hello").unwrap();
    store.append_keystroke(70_000, "TextEdit", "Notes", "world").unwrap();

    let blob = store.export_bytes().unwrap();
    let restored = LogitemStore::import(&blob).unwrap();

    assert_eq!(restored.get_all().unwrap(), store.get_all().unwrap());
    assert_eq!(restored.len().unwrap(), 2);
}

#[test]
fn imported_store_keeps_accepting_keystrokes() {
    let store = LogitemStore::new().unwrap();
    store.append_keystroke(1_000, "Chrome", "A", "ab").unwrap();

    let blob = store.export_bytes().unwrap();
    let restored = LogitemStore::import(&blob).unwrap();
    restored.append_keystroke(1_500, "Chrome", "A", "c").unwrap();

    let items = restored.get_all().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].keylogs, "abc");
}

#[test]
fn import_rejects_garbage() {
    assert!(LogitemStore::import(b"definitely not a database").is_err());
    assert!(LogitemStore::import(b"").is_err());
}

#[test]
fn custom_rotation_gap_is_honored() {
    let store = LogitemStore::with_rotation_gap(10).unwrap();

    store.append_keystroke(0, "Chrome", "A", "a").unwrap();
    store.append_keystroke(10, "Chrome", "A", "b").unwrap();
    store.append_keystroke(21, "Chrome", "A", "c").unwrap();

    let items = store.get_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].keylogs, "ab");
    assert_eq!(items[0].keylogs, "c");
}

#[test]
fn empty_store_round_trips() {
    let store = LogitemStore::new().unwrap();
    assert!(store.is_empty().unwrap());

    let blob = store.export_bytes().unwrap();
    let restored = LogitemStore::import(&blob).unwrap();
    assert!(restored.is_empty().unwrap());
}
