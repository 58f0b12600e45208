//! “First conversation” integration scenario: two nodes on one bus exchange
//! a JSON request and a JSON response through their dispatch loops.

mod helpers;

use cannode::{CanId, CanNode, CanSpeed, NodeConfig};
use helpers::{init_tracing, MockCanBus};
use std::sync::mpsc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn fast_config() -> NodeConfig {
    NodeConfig::default().with_poll_interval(Duration::from_millis(10))
}

#[test]
fn test_first_conversation() {
    init_tracing();
    // Steps: both nodes start → controller asks → sensor answers → assertions.
    let (controller_bus, sensor_bus) = MockCanBus::create_pair();
    let controller_id = CanId::new(0x10).unwrap();
    let sensor_id = CanId::new(0x20).unwrap();

    let mut controller = CanNode::with_config(controller_bus, controller_id, fast_config());
    let mut sensor = CanNode::with_config(sensor_bus, sensor_id, fast_config());
    controller.begin(CanSpeed::Kbps500).unwrap();
    sensor.begin(CanSpeed::Kbps500).unwrap();

    // Sensor listens for requests
    let (request_tx, request_rx) = mpsc::channel();
    sensor
        .set_json_callback(move |text| request_tx.send(text.to_string()).unwrap())
        .unwrap();

    // Controller watches raw traffic and answers
    let (raw_tx, raw_rx) = mpsc::channel();
    let (answer_tx, answer_rx) = mpsc::channel();
    controller
        .set_receive_callback(move |frame| raw_tx.send(frame.id).unwrap())
        .unwrap();
    controller
        .set_json_callback(move |text| answer_tx.send(text.to_string()).unwrap())
        .unwrap();

    let request = r#"{"cmd":"read","channel":"temperature"}"#;
    controller.send_json(request).unwrap();
    assert_eq!(request_rx.recv_timeout(WAIT).unwrap(), request);

    let answer = r#"{"channel":"temperature","value":21.5,"unit":"C"}"#;
    let message_id = sensor.send_json(answer).unwrap();
    assert_eq!(message_id, 0);
    assert_eq!(answer_rx.recv_timeout(WAIT).unwrap(), answer);

    // Every chunk of the answer reached the raw observer, stamped with the sensor id
    let raw_ids: Vec<CanId> = raw_rx.try_iter().collect();
    assert_eq!(raw_ids.len(), answer.len().div_ceil(5));
    assert!(raw_ids.iter().all(|id| *id == sensor_id));
}

#[test]
/// Structured values serialize on one side and parse on the other.
fn test_json_value_exchange() {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Status {
        uptime_s: u64,
        errors: Vec<String>,
    }

    let (bus_a, bus_b) = MockCanBus::create_pair();
    let mut node_a = CanNode::with_config(bus_a, CanId::new(0x1).unwrap(), fast_config());
    let mut node_b = CanNode::with_config(bus_b, CanId::new(0x2).unwrap(), fast_config());
    node_a.begin(CanSpeed::default()).unwrap();
    node_b.begin(CanSpeed::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    node_b
        .set_json_callback(move |text| {
            tx.send(serde_json::from_str::<Status>(text).unwrap()).unwrap()
        })
        .unwrap();

    let status = Status {
        uptime_s: 86_400,
        errors: vec!["overcurrent".into(), "brownout".into()],
    };
    node_a.send_json_value(&status).unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), status);
}
