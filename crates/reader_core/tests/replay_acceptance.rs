use std::sync::Arc;

use reader_core::{BridgeError, ChannelRemote, ReaderBridge, RequestKind, Settings};
use shared::{domain::Cfi, protocol::ReaderEvent};

const SESSION_LOG: &[&str] = &[
    r#"{"type":"onStarted"}"#,
    r#"{"type":"onNavigationLoaded","toc":[{"id":"c1","href":"c1.xhtml","label":"Loomings","subitems":[]}]}"#,
    r#"{"type":"onLocationsReady","epubKey":"moby-dick","locations":"[\"epubcfi(/6/2!/4/1:0)\",\"epubcfi(/6/4!/4/1:0)\",\"epubcfi(/6/6!/4/1:0)\"]"}"#,
    r#"{"type":"onReady","totalLocations":3,"currentLocation":{"start":{"cfi":"epubcfi(/6/2!/4/1:0)","href":"c1.xhtml","index":1},"end":{"cfi":"epubcfi(/6/2!/4/1:200)"},"atStart":true},"progress":0}"#,
    r#"{"type":"onRendered","section":{"index":1}}"#,
    r#"{"type":"onBeginning"}"#,
    r#"{"type":"onLocationChange","totalLocations":3,"currentLocation":{"start":{"cfi":"epubcfi(/6/4!/4/1:0)"},"end":{"cfi":"epubcfi(/6/4!/4/1:90)"}},"progress":33}"#,
    r#"{"type":"onOrientationChange","orientation":"landscape"}"#,
];

#[test]
fn reading_session_replay_acceptance() {
    let mut bridge = ReaderBridge::new(&Settings::default());
    let (remote, scripts) = ChannelRemote::bounded(16);
    bridge.register_remote(Arc::new(remote));
    let mut events = bridge.subscribe_events();

    for message in SESSION_LOG {
        bridge.handle_message(message).expect("replay message");
    }

    let state = bridge.snapshot();
    assert!(state.is_ready);
    assert_eq!(state.key, "moby-dick");
    assert_eq!(state.locations.len(), 3);
    assert_eq!(state.total_locations, 3);
    assert_eq!(state.progress, 33);
    assert!(!state.at_start, "location change recomputes the boundary flags");
    assert!(!state.at_end);
    assert_eq!(
        state
            .current_location
            .as_ref()
            .map(|location| location.start.cfi.clone()),
        Some(Cfi::from("epubcfi(/6/4!/4/1:0)"))
    );

    let mut tags = Vec::new();
    while let Ok(event) = events.try_recv() {
        tags.push(event.tag());
    }
    assert_eq!(tags.len(), SESSION_LOG.len());
    assert_eq!(tags.first(), Some(&"onStarted"));
    assert_eq!(tags.last(), Some(&"onOrientationChange"));

    bridge.go_to_location_with_number(2).expect("navigate");
    bridge.search("whale").expect("search");
    let live = bridge.in_flight(RequestKind::Search).expect("search in flight");

    let dispatched: Vec<String> = scripts.try_iter().map(|script| script.into_string()).collect();
    assert_eq!(dispatched.len(), 2);
    assert!(dispatched[0].contains("cfiFromLocation(2)"));
    assert!(dispatched[1].contains(&format!(r#"("whale", {}); true;"#, live.0)));

    let answer = format!(
        r#"{{"type":"onSearch","requestId":{},"results":[{{"cfi":"epubcfi(/6/6!/4/1:3)","excerpt":"the white whale"}}]}}"#,
        live.0
    );
    bridge.handle_message(&answer).expect("search answer");
    assert_eq!(bridge.state().search_results.len(), 1);
    assert_eq!(bridge.in_flight(RequestKind::Search), None);
}

#[test]
fn failed_display_is_surfaced_to_the_host() {
    let mut bridge = ReaderBridge::default();
    let mut events = bridge.subscribe_events();

    bridge
        .handle_message(r#"{"type":"onStarted"}"#)
        .expect("started");
    let err = bridge
        .handle_message(r#"{"type":"onDisplayError","reason":"Book could not be loaded"}"#)
        .expect_err("display failure");

    assert!(matches!(err, BridgeError::Display { .. }));
    assert_eq!(
        bridge.state().display_error.as_deref(),
        Some("Book could not be loaded")
    );
    assert_eq!(events.try_recv().expect("started"), ReaderEvent::Started);
    assert!(matches!(
        events.try_recv().expect("display error"),
        ReaderEvent::DisplayError { .. }
    ));

    bridge
        .handle_message(r#"{"type":"onStarted"}"#)
        .expect("restart");
    assert_eq!(bridge.state().display_error, None);
}

#[test]
fn full_script_queue_drops_commands_without_blocking() {
    let mut bridge = ReaderBridge::default();
    let (remote, scripts) = ChannelRemote::bounded(1);
    bridge.register_remote(Arc::new(remote));

    bridge.go_next();
    bridge.go_next();
    bridge.search("whale").expect("dropped search is not an error");

    assert_eq!(scripts.try_iter().count(), 1);
    assert_eq!(bridge.in_flight(RequestKind::Search), None);
}
