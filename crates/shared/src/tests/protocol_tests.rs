use super::*;
use crate::domain::LocationPoint;

#[test]
fn decodes_ready_with_renderer_location_object() {
    let raw = r#"{
        "type": "onReady",
        "totalLocations": 120,
        "currentLocation": {
            "start": {"cfi": "epubcfi(/6/4!/4/2/1:0)", "href": "ch1.xhtml", "index": 1,
                      "location": 3, "percentage": 0.02, "displayed": {"page": 1, "total": 9}},
            "end": {"cfi": "epubcfi(/6/4!/4/10/1:20)"},
            "atStart": true
        },
        "progress": 0.456
    }"#;

    let event = decode_message(raw).expect("decode ready");
    let ReaderEvent::Ready {
        total_locations,
        current_location,
        progress,
    } = event
    else {
        panic!("expected ready event");
    };
    assert_eq!(total_locations, 120);
    assert_eq!(current_location.start.cfi.as_str(), "epubcfi(/6/4!/4/2/1:0)");
    assert_eq!(current_location.start.href.as_deref(), Some("ch1.xhtml"));
    assert_eq!(current_location.start.displayed.map(|d| d.total), Some(9));
    assert!(current_location.at_start);
    assert!(!current_location.at_end);
    assert!((progress - 0.456).abs() < f64::EPSILON);
}

#[test]
fn accepts_bare_marker_strings_as_location_points() {
    let raw = r#"{"type":"onLocationChange","totalLocations":120,
        "currentLocation":{"start":"p1","end":"p2"},"progress":50}"#;

    let event = decode_message(raw).expect("decode location change");
    assert_eq!(
        event,
        ReaderEvent::LocationChange {
            total_locations: 120,
            current_location: Location {
                start: LocationPoint::at("p1"),
                end: LocationPoint::at("p2"),
                at_start: false,
                at_end: false,
            },
            progress: 50.0,
        }
    );
}

#[test]
fn parses_serialized_location_table() {
    let raw = r#"{"type":"onLocationsReady","epubKey":"book-1",
        "locations":"[\"epubcfi(/6/2!/4/1:0)\",\"epubcfi(/6/2!/4/1:950)\"]"}"#;

    let event = decode_message(raw).expect("decode locations");
    assert_eq!(
        event,
        ReaderEvent::LocationsReady {
            book_key: "book-1".into(),
            locations: vec![
                Cfi::from("epubcfi(/6/2!/4/1:0)"),
                Cfi::from("epubcfi(/6/2!/4/1:950)"),
            ],
        }
    );
}

#[test]
fn parses_plain_array_location_table() {
    let raw = r#"{"type":"onLocationsReady","epubKey":"k","locations":["a","b","c"]}"#;
    let ReaderEvent::LocationsReady { locations, .. } =
        decode_message(raw).expect("decode locations")
    else {
        panic!("expected locations event");
    };
    assert_eq!(locations.len(), 3);
}

#[test]
fn rejects_garbled_serialized_location_table() {
    let raw = r#"{"type":"onLocationsReady","epubKey":"k","locations":"[not json"}"#;
    let err = decode_message(raw).expect_err("garbled table should fail");
    assert!(err.to_string().contains("location table"), "{err}");
}

#[test]
fn unknown_tag_decodes_to_unknown() {
    let event = decode_message(r#"{"type":"onSomethingNew","payload":[1,2,3]}"#)
        .expect("unknown tags are tolerated");
    assert_eq!(event, ReaderEvent::Unknown);
    assert!(!event.is_passthrough());
}

#[test]
fn malformed_known_event_is_an_error() {
    let err = decode_message(r#"{"type":"onReady","totalLocations":"many"}"#)
        .expect_err("bad payload");
    assert!(matches!(err, ProtocolError::Malformed(_)));
}

#[test]
fn non_json_is_an_error() {
    assert!(decode_message("rendition.next()").is_err());
}

#[test]
fn search_results_carry_optional_request_id() {
    let with_id = decode_message(
        r#"{"type":"onSearch","requestId":7,"results":[{"cfi":"c1","excerpt":"a light"}]}"#,
    )
    .expect("decode search");
    assert_eq!(
        with_id,
        ReaderEvent::Search {
            results: vec![SearchResult {
                cfi: Cfi::from("c1"),
                excerpt: "a light".into(),
            }],
            request_id: Some(RequestId(7)),
            error: None,
        }
    );

    let without_id =
        decode_message(r#"{"type":"onHtml","html":"Call me Ishmael."}"#).expect("decode html");
    assert_eq!(
        without_id,
        ReaderEvent::Html {
            html: "Call me Ishmael.".into(),
            request_id: None,
        }
    );
}

#[test]
fn display_error_reason_is_stringified() {
    let event = decode_message(r#"{"type":"onDisplayError","reason":{"message":"404"}}"#)
        .expect("decode display error");
    assert_eq!(
        event,
        ReaderEvent::DisplayError {
            reason: r#"{"message":"404"}"#.into(),
        }
    );
}

#[test]
fn orientation_accepts_numbers() {
    let event = decode_message(r#"{"type":"onOrientationChange","orientation":90}"#)
        .expect("decode orientation");
    assert_eq!(
        event,
        ReaderEvent::OrientationChange {
            orientation: "90".into(),
        }
    );
    assert!(event.is_passthrough());
}

#[test]
fn navigation_tree_decodes_nested_items() {
    let raw = r#"{"type":"onNavigationLoaded","toc":[
        {"id":"n1","href":"ch1.xhtml","label":"One","subitems":[
            {"id":"n1a","href":"ch1.xhtml#a","label":"One A"}]},
        {"id":"n2","href":"ch2.xhtml","label":"Two"}]}"#;
    let ReaderEvent::NavigationLoaded { toc } = decode_message(raw).expect("decode toc") else {
        panic!("expected navigation event");
    };
    assert_eq!(toc.len(), 2);
    assert_eq!(toc[0].subitems[0].label, "One A");
}

#[test]
fn tags_match_wire_names() {
    let raw = r#"{"type":"onMarkPressed","cfiRange":"epubcfi(/6/4!/4/2,/1:0,/1:9)","text":"hello"}"#;
    let event = decode_message(raw).expect("decode mark pressed");
    assert_eq!(event.tag(), "onMarkPressed");
    let encoded = serde_json::to_value(&event).expect("encode");
    assert_eq!(encoded["type"], "onMarkPressed");
    assert_eq!(encoded["cfiRange"], "epubcfi(/6/4!/4/2,/1:0,/1:9)");
}

#[test]
fn failed_search_is_distinguishable_from_no_hits() {
    let failed = decode_message(
        r#"{"type":"onSearch","requestId":3,"results":[],"error":"TypeError: item.find is not a function"}"#,
    )
    .expect("decode failed search");
    let ReaderEvent::Search { results, error, .. } = failed else {
        panic!("expected search event");
    };
    assert!(results.is_empty());
    assert_eq!(error.as_deref(), Some("TypeError: item.find is not a function"));

    let empty = decode_message(r#"{"type":"onSearch","requestId":4,"results":[]}"#)
        .expect("decode empty search");
    assert!(matches!(empty, ReaderEvent::Search { error: None, .. }));
}
