//! End-to-end parameter workflows against the mock device.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use param_sync::communication::transport::mock::{MockDevice, MockRequest};
use param_sync::{ManagerConfig, ParamManager, ParamValue};

fn ecu_device() -> Arc<MockDevice> {
    Arc::new(MockDevice::new(vec![
        ("RPM_LIMIT", ParamValue::Int(6000)),
        ("TEMP_MAX", ParamValue::Float(95.0)),
        ("FUEL_ENABLED", ParamValue::Bool(true)),
        ("NAME", ParamValue::from("ecu-1")),
        ("IDLE_RPM", ParamValue::Int(1500)),
    ]))
}

#[test]
fn operator_edit_cycle() {
    let device = ecu_device();
    let manager = ParamManager::new(device.clone(), ManagerConfig::with_timeout(Duration::from_secs(5)));

    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    manager.notifier().subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Read everything
    assert!(manager.retrieve_all());
    assert_eq!(manager.len(), 5);

    // Edit locally: stringly-typed input is coerced to the declared kind
    assert_eq!(manager.set_value("TEMP_MAX", "101.5"), Ok(true));
    assert_eq!(manager.set_value("FUEL_ENABLED", "off"), Ok(true));
    assert!(manager.set_value("RPM_LIMIT", "fast").is_err());

    let changed: Vec<String> = manager.changed().iter().map(|p| p.id().to_string()).collect();
    assert_eq!(changed, vec!["TEMP_MAX", "FUEL_ENABLED"]);

    // Push only the edits
    assert!(manager.sync());
    assert_eq!(
        device.set_one_calls(),
        vec![
            ("TEMP_MAX".to_string(), ParamValue::Float(101.5)),
            ("FUEL_ENABLED".to_string(), ParamValue::Bool(false)),
        ]
    );
    assert!(manager.changed().is_empty());
    assert_eq!(device.device_value("TEMP_MAX"), Some(ParamValue::Float(101.5)));

    // Nothing left to do
    assert!(manager.sync());
    assert_eq!(device.set_one_calls().len(), 2);

    assert_eq!(notifications.load(Ordering::SeqCst), 3);
}

#[test]
fn resync_picks_up_device_side_changes() {
    let device = ecu_device();
    let manager = ParamManager::new(device.clone(), ManagerConfig::with_timeout(Duration::from_secs(5)));
    assert!(manager.retrieve_all());

    manager.set_value("IDLE_RPM", 1400).unwrap();
    device.set_device_value(4, ParamValue::Int(1600));

    // Device value is authoritative and clears the local edit
    assert!(manager.retrieve_all());
    let param = manager.get("IDLE_RPM").unwrap();
    assert_eq!(param.value(), &ParamValue::Int(1600));
    assert!(!param.is_dirty());
}

#[test]
fn clear_then_reconnect() {
    let device = ecu_device();
    let manager = ParamManager::new(device.clone(), ManagerConfig::with_timeout(Duration::from_secs(5)));
    assert!(manager.retrieve_all());

    manager.clear();
    assert!(manager.is_empty());

    assert!(manager.retrieve_all());
    assert_eq!(manager.len(), 5);
    assert_eq!(device.request_all_count(), 2);
}

#[test]
fn large_parameter_set_with_losses() {
    let params: Vec<(String, ParamValue)> = (0..300)
        .map(|i| (format!("PARAM_{:03}", i), ParamValue::Int(i)))
        .collect();
    let device = Arc::new(MockDevice::new(params));
    for index in [7, 150, 299] {
        device.drop_broadcast_reply(index);
    }
    device.set_reply_delay(Duration::from_millis(5));

    let manager = ParamManager::new(device.clone(), ManagerConfig::with_timeout(Duration::from_millis(500)));

    assert!(manager.retrieve_all());
    assert_eq!(manager.len(), 300);
    assert!(manager.missing().is_empty());
    assert_eq!(device.request_one_calls(), vec![7, 150, 299]);
}

#[test]
fn sync_failure_leaves_edit_for_explicit_retry() {
    let device = ecu_device();
    let manager = ParamManager::new(device.clone(), ManagerConfig::with_timeout(Duration::from_millis(300)));
    assert!(manager.retrieve_all());

    device.drop_set_reply(0);
    manager.set_value("RPM_LIMIT", 6500).unwrap();
    manager.set_value("IDLE_RPM", 1450).unwrap();

    assert!(!manager.sync());
    assert_eq!(manager.missing(), BTreeSet::from([0]));
    assert_eq!(device.set_one_calls().len(), 2);

    // The caller decides to retry once the link is healthy
    device.clear_drops();
    assert!(manager.sync());
    assert!(manager.changed().is_empty());
    assert_eq!(
        device.requests().last(),
        Some(&MockRequest::Set("RPM_LIMIT".to_string(), ParamValue::Int(6500)))
    );
}
