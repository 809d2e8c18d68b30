mod common;

use common::{closed_port, FakeCollector, OK_RESPONSE};
use riemann_client::{Event, Msg};
use riemann_output::{OutputConfig, OutputError, OutputStats, RawEvent, RiemannOutput};
use serde_json::json;
use std::collections::BTreeMap;
use tracing_test::traced_test;

/// ok = false, error = "boom"
const REJECT_RESPONSE: &[u8] = b"\x00\x00\x00\x08\x10\x00\x1a\x04boom";

#[test]
fn tcp_event_is_acknowledged() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let output = RiemannOutput::configure(&create_test_config("tcp", collector.port)).unwrap();

    output.receive(&sample_event());

    let msg = collector.next_request();
    let event = single_event(&msg);
    assert_eq!(event.host.as_deref(), Some("vagrant-ubuntu-trusty-64"));
    assert_eq!(event.time, Some(1433374494));
    assert_eq!(event.description.as_deref(), Some("hello"));
    assert!(event.attributes.is_empty());
    assert!(event.tags.is_empty());
    assert_eq!(
        output.stats(),
        OutputStats {
            received: 1,
            delivered: 1,
            failed: 0
        }
    );
}

#[test]
fn tcp_connection_is_reused_between_events() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let output = RiemannOutput::configure(&create_test_config("tcp", collector.port)).unwrap();

    // 采集器只接受一个连接，第二个事件必须复用它
    output.receive(&sample_event());
    output.receive(&sample_event());

    collector.next_request();
    collector.next_request();
    assert_eq!(output.stats().delivered, 2);
    assert!(output.dispatcher().client().is_connected());
}

#[test]
#[traced_test]
fn rejected_event_is_logged_and_swallowed() {
    let collector = FakeCollector::tcp(REJECT_RESPONSE);
    let output = RiemannOutput::configure(&create_test_config("tcp", collector.port)).unwrap();

    output.receive(&sample_event());

    collector.next_request();
    assert!(logs_contain("Unhandled exception"));
    assert!(logs_contain("send_to_riemann"));
    assert!(logs_contain("boom"));
    assert_eq!(output.stats().failed, 1);
    assert!(!output.dispatcher().client().is_connected());
}

#[test]
#[traced_test]
fn unreachable_collector_is_logged_and_swallowed() {
    let output = RiemannOutput::configure(&create_test_config("tcp", closed_port())).unwrap();

    output.receive(&sample_event());
    output.receive(&sample_event());

    assert!(logs_contain("Unhandled exception"));
    assert_eq!(
        output.stats(),
        OutputStats {
            received: 2,
            delivered: 0,
            failed: 2
        }
    );
}

#[test]
fn udp_event_is_delivered_as_datagram() {
    let collector = FakeCollector::udp();
    let output = RiemannOutput::configure(&create_test_config("udp", collector.port)).unwrap();

    output.receive(&sample_event());

    let msg = collector.next_request();
    let event = single_event(&msg);
    assert_eq!(event.host.as_deref(), Some("vagrant-ubuntu-trusty-64"));
    assert_eq!(event.description.as_deref(), Some("hello"));
    assert_eq!(output.stats().delivered, 1);
}

#[test]
#[traced_test]
fn json_tags_with_null_are_compacted() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let output = RiemannOutput::configure(&create_test_config("tcp", collector.port)).unwrap();
    let event = RawEvent::from_json_str(
        r#"{"tags":["good_enough", "smart_enough", "doggone_it", "people_like_me", null], "message":"hello", "node_info":{"name":"node1", "status":"up"}, "@version":"1", "@timestamp":"2015-06-03T23:34:54.076Z", "host":"vagrant-ubuntu-trusty-64"}"#,
    )
    .unwrap();

    output.receive(&event);

    let msg = collector.next_request();
    assert_eq!(
        single_event(&msg).tags,
        vec!["good_enough", "smart_enough", "doggone_it", "people_like_me"]
    );
    assert!(!logs_contain("Unhandled exception"));
}

#[test]
fn map_fields_sends_flattened_attributes() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let config = OutputConfig {
        map_fields: true,
        ..create_test_config("tcp", collector.port)
    };
    let output = RiemannOutput::configure(&config).unwrap();
    let event = RawEvent::from_json(json!({
        "message": "hello",
        "@version": "1",
        "@timestamp": "2015-06-03T23:34:54.076Z",
        "host": "vagrant-ubuntu-trusty-64",
        "node_info": {"name": "node1", "status": "up", "load": {"one": 0.5}}
    }))
    .unwrap();

    output.receive(&event);

    let msg = collector.next_request();
    let event = single_event(&msg);
    assert_eq!(event.host.as_deref(), Some("vagrant-ubuntu-trusty-64"));
    assert_eq!(
        attributes(event),
        BTreeMap::from([
            ("message".to_string(), "hello".to_string()),
            ("node_info.load.one".to_string(), "0.5".to_string()),
            ("node_info.name".to_string(), "node1".to_string()),
            ("node_info.status".to_string(), "up".to_string()),
        ])
    );
}

#[test]
#[traced_test]
fn odd_mapped_values_are_still_delivered() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let config = OutputConfig {
        map_fields: true,
        ..create_test_config("tcp", collector.port)
    };
    let output = RiemannOutput::configure(&config).unwrap();
    let event = RawEvent::from_json(json!({
        "host": "h",
        "message": "m",
        "errors": [{"code": 1}],
        "metric": "n/a"
    }))
    .unwrap();

    output.receive(&event);

    let msg = collector.next_request();
    let event = single_event(&msg);
    assert_eq!(event.host.as_deref(), Some("h"));
    assert_eq!(event.description.as_deref(), Some("m"));
    assert_eq!(event.metric_d, None);
    let attributes = attributes(event);
    assert_eq!(attributes["errors"], r#"{"code":1}"#);
    assert_eq!(attributes["metric"], "n/a");
    assert!(!logs_contain("Unhandled exception"));
}

#[test]
fn riemann_event_overrides_reach_the_wire() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let config = OutputConfig {
        riemann_event: BTreeMap::from([
            ("service".to_string(), "%{[node_info][name]} load".to_string()),
            ("metric".to_string(), "%{[node_info][load]}".to_string()),
            ("state".to_string(), "ok".to_string()),
        ]),
        ..create_test_config("tcp", collector.port)
    };
    let output = RiemannOutput::configure(&config).unwrap();
    let event = RawEvent::from_json(json!({
        "message": "hello",
        "@timestamp": "2015-06-03T23:34:54.076Z",
        "host": "web-1",
        "node_info": {"name": "node1", "load": 1.5}
    }))
    .unwrap();

    output.receive(&event);

    let msg = collector.next_request();
    let event = single_event(&msg);
    assert_eq!(event.service.as_deref(), Some("node1 load"));
    assert_eq!(event.state.as_deref(), Some("ok"));
    assert_eq!(event.metric_d, Some(1.5));
    assert!(event.attributes.is_empty());
}

#[test]
fn sender_template_sets_host() {
    let collector = FakeCollector::tcp(OK_RESPONSE);
    let config = OutputConfig {
        sender: "%{[node_info][name]}".to_string(),
        ..create_test_config("tcp", collector.port)
    };
    let output = RiemannOutput::configure(&config).unwrap();
    let event = RawEvent::from_json(json!({
        "message": "hello",
        "host": "web-1",
        "node_info": {"name": "node1"}
    }))
    .unwrap();

    output.receive(&event);

    let msg = collector.next_request();
    assert_eq!(single_event(&msg).host.as_deref(), Some("node1"));
}

#[test]
fn unknown_protocol_fails_configuration() {
    let result = RiemannOutput::configure(&create_test_config("fake", 5555));
    assert!(matches!(result, Err(OutputError::Configuration(_))));
}

#[test]
fn built_event_without_map_fields_has_core_attributes_only() {
    let output = RiemannOutput::configure(&create_test_config("tcp", closed_port())).unwrap();

    let record = output.build_riemann_formatted_event(&sample_event()).unwrap();

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({
            "host": "vagrant-ubuntu-trusty-64",
            "time": 1433374494,
            "description": "hello"
        })
    );
}

fn create_test_config(protocol: &str, port: u16) -> OutputConfig {
    OutputConfig {
        protocol: protocol.to_string(),
        host: "127.0.0.1".to_string(),
        port,
        timeout_secs: 2,
        ..Default::default()
    }
}

fn sample_event() -> RawEvent {
    RawEvent::from_json(json!({
        "message": "hello",
        "@version": "1",
        "@timestamp": "2015-06-03T23:34:54.076Z",
        "host": "vagrant-ubuntu-trusty-64"
    }))
    .unwrap()
}

fn single_event(msg: &Msg) -> &Event {
    assert_eq!(msg.events.len(), 1, "expected exactly one event: {:?}", msg);
    &msg.events[0]
}

fn attributes(event: &Event) -> BTreeMap<String, String> {
    event
        .attributes
        .iter()
        .map(|a| (a.key.clone(), a.value.clone().unwrap_or_default()))
        .collect()
}
