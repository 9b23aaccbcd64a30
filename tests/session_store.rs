//! Integration tests for the session store backed by real files.
//!
//! Each test opens a store on a temporary directory, mutates it, and
//! reopens it to check what survives a restart.

use std::collections::BTreeSet;
use std::time::Duration;

use session_store::{
    FileStorage, LocalityFilter, RsvpStatus, SessionCommand, SessionState, SessionStore,
    StateStorage, parse,
};

fn open(dir: &std::path::Path) -> SessionStore {
    SessionStore::builder().base_dir(dir).open()
}

/// Full session: pick a chapter, like, RSVP, join and follow; restart and
/// check everything was restored.
#[test]
fn session_survives_restart() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");

    let store = open(tmp.path());
    store.set_selected_locality("boulder");
    store.toggle_liked_post("post-1");
    store.toggle_liked_post("post-2");
    store.toggle_liked_post("post-1");
    store.set_rsvp_status("event-1", RsvpStatus::Going);
    store.set_rsvp_status("event-2", RsvpStatus::Maybe);
    store.toggle_joined_group("group-1");
    store.toggle_followed_user("user-1");
    store.close().expect("close should succeed");

    let store = open(tmp.path());
    let state = store.state();
    assert_eq!(state.selected_locality, LocalityFilter::from("boulder"));
    assert_eq!(state.liked_post_ids, BTreeSet::from(["post-2".to_owned()]));
    assert_eq!(store.rsvp_status("event-1"), RsvpStatus::Going);
    assert_eq!(store.rsvp_status("event-2"), RsvpStatus::Maybe);
    assert!(store.is_group_joined("group-1"));
    assert!(store.is_following("user-1"));
}

/// The record on disk is plain JSON under the `appState` key with
/// camelCase fields.
#[test]
fn record_layout_on_disk() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");
    let store = open(tmp.path());
    store.toggle_joined_group("g1");

    let raw = std::fs::read_to_string(tmp.path().join("appState.json"))
        .expect("record file should exist");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("record is JSON");
    assert_eq!(value["selectedLocality"], "all");
    assert_eq!(value["joinedGroupIds"], serde_json::json!(["g1"]));
    assert_eq!(value["rsvpStatusByEventId"], serde_json::json!({}));

    assert_eq!(parse(&raw).expect("record parses"), store.state());
}

/// A corrupt record is discarded silently and replaced on the next write.
#[test]
fn corrupt_record_is_replaced() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");
    std::fs::write(tmp.path().join("appState.json"), b"this is not valid json!!!")
        .expect("write corrupt file");

    let store = open(tmp.path());
    assert_eq!(store.state(), SessionState::default());

    store.set_selected_locality("denver");
    let raw = FileStorage::new(tmp.path())
        .read("appState")
        .expect("read should succeed")
        .expect("record should exist");
    assert_eq!(
        parse(&raw).expect("record parses").selected_locality,
        LocalityFilter::from("denver")
    );
}

/// A record file that is not even UTF-8 is a corrupt record, not a broken
/// medium: the store starts from defaults and keeps writing.
#[test]
fn non_utf8_record_is_replaced() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");
    let record = tmp.path().join("appState.json");
    std::fs::write(&record, [0xff, 0xfe, b'{']).expect("write corrupt file");

    let store = open(tmp.path());
    assert_eq!(store.state(), SessionState::default());
    assert!(store.is_persistent(), "a corrupt record must not disable storage");
    assert!(!record.exists(), "the corrupt record is discarded at open");

    store.toggle_liked_post("p1");
    let raw = std::fs::read(&record).expect("record should be rewritten");
    assert!(parse(&raw).expect("record parses").is_post_liked("p1"));
}

/// An unknown locality id is accepted and filters everything out.
#[test]
fn unknown_locality_yields_empty_views() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");
    let store = open(tmp.path());
    let events = [("e1", "boulder"), ("e2", "denver")];

    assert_eq!(store.selected_locality().filter(events, |(_, l)| *l).count(), 2);

    store.set_selected_locality("atlantis");
    assert_eq!(store.selected_locality().filter(events, |(_, l)| *l).count(), 0);

    store.set_selected_locality("all");
    assert_eq!(store.selected_locality(), LocalityFilter::All);
}

/// Commands arriving as JSON from the presentation layer.
#[test]
fn dispatches_json_commands() {
    let tmp = tempfile::tempdir().expect("failed to create tmpdir");
    let store = open(tmp.path());

    let cmd: SessionCommand = serde_json::from_str(
        r#"{"type": "ToggleFollowedUser", "data": {"user_id": "user-7"}}"#,
    )
    .expect("command should deserialize");
    store.execute(cmd);

    assert!(store.is_following("user-7"));
}

/// Subscribers are notified after each mutation.
#[tokio::test]
async fn subscribers_observe_changes() {
    let store = SessionStore::builder().open();
    let mut rx = store.subscribe();

    store.toggle_liked_post("p1");

    tokio::time::timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("notification should arrive")
        .expect("store is still alive");
    assert!(rx.borrow_and_update().is_post_liked("p1"));
}
