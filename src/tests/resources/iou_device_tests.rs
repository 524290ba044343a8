use crate::{
    ConfigSource, DeviceEvent, Gns3Error, IouModuleSettings, NodeStatus, PortKind,
    SettingsUpdate, ValidationError,
    tests::support::*,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_create_builds_ports_from_confirmed_adapters() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());

    create_on_server(&mock_server, &mut device, 2, 1).await;

    assert_eq!(device.node_id(), Some(NODE_ID));
    assert_eq!(device.status(), NodeStatus::Stopped);
    assert_eq!(device.console(), Some(5000));
    assert_eq!(device.settings().serial_adapters, 1);

    let ports = device.ports();
    assert_eq!(ports.len(), 12);
    assert!(ports[..8].iter().all(|p| p.kind() == PortKind::Ethernet && p.adapter_number() < 2));
    assert!(ports[8..].iter().all(|p| p.kind() == PortKind::Serial && p.adapter_number() == 2));
    assert_eq!(ports[0].name(), "Ethernet0/0");
    assert_eq!(ports[11].short_name(), "s2/3");

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_create_sends_config_content_not_path() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());

    let dir = tempfile::tempdir().unwrap();
    let startup = dir.path().join("base.cfg");
    std::fs::write(&startup, "hostname IOU1\n").unwrap();

    Mock::given(method("POST"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_node("IOU1", 2, 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let additional = SettingsUpdate {
        startup_config: Some(ConfigSource::Path(startup)),
        private_config: Some(ConfigSource::Path(dir.path().join("missing.cfg"))),
        ethernet_adapters: Some(2),
        ..Default::default()
    };
    device
        .create("i86bi-linux-l3.bin", Some(NODE_ID.to_string()), additional)
        .await
        .unwrap();

    let bodies = received_bodies(&mock_server, "POST", &nodes_path()).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["name"], "IOU1");
    assert_eq!(body["node_type"], "iou");
    assert_eq!(body["compute_id"], "local");
    assert_eq!(body["node_id"], NODE_ID);

    let properties = body["properties"].as_object().unwrap();
    assert_eq!(properties["path"], "i86bi-linux-l3.bin");
    assert_eq!(properties["startup_config_content"], "hostname IOU1\n");
    assert_eq!(properties["ethernet_adapters"], 2);
    assert!(!properties.contains_key("startup_config"));
    assert!(!properties.contains_key("private_config"));
    // Unreadable private-config is skipped, not fatal
    assert!(!properties.contains_key("private_config_content"));
    assert!(!properties.contains_key("iourc_content"));
}

#[tokio::test]
async fn test_create_error_leaves_device_untouched() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());

    Mock::given(method("POST"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Project ID a1e920ca doesn't exist",
            "status": 404
        })))
        .mount(&mock_server)
        .await;

    let result = device.create("i86bi-linux-l3.bin", None, SettingsUpdate::default()).await;
    assert!(matches!(result, Err(Gns3Error::Api { status: 404, .. })));
    assert_eq!(device.node_id(), None);
    assert_eq!(device.status(), NodeStatus::Created);
    assert!(device.ports().is_empty());

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![DeviceEvent::Error {
            device_id: device.id(),
            message: "Project ID a1e920ca doesn't exist".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_iourc_content_is_pushed_on_create_and_start() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    let dir = tempfile::tempdir().unwrap();
    let iourc = dir.path().join("iourc.txt");
    std::fs::write(&iourc, "[license]\ngns3vm = 73635fd3b0a13ad0;\n").unwrap();
    let module = IouModuleSettings {
        iourc_path: Some(iourc),
        ..Default::default()
    };
    let (mut device, _rx) = create_test_device(&client, "IOU1", module);

    create_on_server(&mock_server, &mut device, 2, 2).await;

    Mock::given(method("POST"))
        .and(path(node_path("start")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "started"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    device.start().await.unwrap();
    assert_eq!(device.status(), NodeStatus::Started);

    let create_bodies = received_bodies(&mock_server, "POST", &nodes_path()).await;
    assert_eq!(
        create_bodies[0]["properties"]["iourc_content"],
        "[license]\ngns3vm = 73635fd3b0a13ad0;\n"
    );
    let start_bodies = received_bodies(&mock_server, "POST", &node_path("start")).await;
    assert_eq!(
        start_bodies[0]["iourc_content"],
        "[license]\ngns3vm = 73635fd3b0a13ad0;\n"
    );
}

#[tokio::test]
async fn test_unreadable_iourc_is_not_fatal() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let dir = tempfile::tempdir().unwrap();
    let module = IouModuleSettings {
        iourc_path: Some(dir.path().join("no-such-iourc")),
        ..Default::default()
    };
    let (device, mut rx) = create_test_device(&client, "IOU1", module);

    let params = device
        .build_create_params("i86bi-linux-l3.bin", &SettingsUpdate::default())
        .await;
    assert_eq!(params.len(), 1);
    assert_eq!(params["path"], "i86bi-linux-l3.bin");
    assert!(!params.contains_key("iourc_content"));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_update_adapter_count_regenerates_ports() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 1).await;
    assert_eq!(device.ports().len(), 12);

    Mock::given(method("PUT"))
        .and(path(node_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node_id": NODE_ID,
            "properties": {"ethernet_adapters": 4, "serial_adapters": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sent = device
        .update(SettingsUpdate {
            ethernet_adapters: Some(4),
            serial_adapters: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(sent);

    // Only the value that differs is sent
    let bodies = received_bodies(&mock_server, "PUT", &node_path("")).await;
    assert_eq!(bodies[0], json!({"properties": {"ethernet_adapters": 4}}));

    assert_eq!(device.settings().ethernet_adapters, 4);
    assert_eq!(device.ports().len(), 20);
    assert_eq!(
        device
            .ports()
            .iter()
            .filter(|p| p.kind() == PortKind::Serial)
            .count(),
        4
    );
}

#[tokio::test]
async fn test_update_without_changes_sends_nothing() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 2).await;

    Mock::given(method("PUT"))
        .and(path(node_path("")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let sent = device
        .update(SettingsUpdate {
            ram: Some(256),
            ethernet_adapters: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!sent);
}

#[tokio::test]
async fn test_update_error_keeps_settings() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 2).await;
    let before = device.settings().clone();

    Mock::given(method("PUT"))
        .and(path(node_path("")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Sorry, adding or removing adapters is not supported while IOU1 is running",
            "status": 409
        })))
        .mount(&mock_server)
        .await;

    let result = device
        .update(SettingsUpdate {
            serial_adapters: Some(0),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(Gns3Error::Api { status: 409, .. })));
    assert_eq!(device.settings(), &before);
    assert_eq!(device.ports().len(), 16);
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [DeviceEvent::Error { message, .. }] if message.contains("not supported")
    ));
}

#[tokio::test]
async fn test_wrong_typed_response_is_rejected() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 2).await;
    let before = device.settings().clone();

    Mock::given(method("PUT"))
        .and(path(node_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {"ethernet_adapters": "four", "ram": 512}
        })))
        .mount(&mock_server)
        .await;

    let result = device
        .update(SettingsUpdate {
            ethernet_adapters: Some(4),
            ..Default::default()
        })
        .await;

    assert!(matches!(
        result,
        Err(Gns3Error::Validation(ValidationError::Field { ref field, .. })) if field == "ethernet_adapters"
    ));
    assert_eq!(device.settings(), &before);
    assert_eq!(device.ports().len(), 16);
    assert!(matches!(drain(&mut rx).as_slice(), [DeviceEvent::Error { .. }]));
}

#[tokio::test]
async fn test_start_twice_sends_one_request() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 2).await;

    Mock::given(method("POST"))
        .and(path(node_path("start")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    device.start().await.unwrap();
    device.start().await.unwrap();
    assert_eq!(device.status(), NodeStatus::Started);
    assert_eq!(
        drain(&mut rx),
        vec![DeviceEvent::Info("IOU1 has started".to_string())]
    );
}

#[tokio::test]
async fn test_stop_reload_and_delete() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 1, 0).await;

    for action in ["start", "reload", "stop"] {
        Mock::given(method("POST"))
            .and(path(node_path(action)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path(node_path("")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    device.start().await.unwrap();
    device.reload().await.unwrap();
    assert_eq!(device.status(), NodeStatus::Started);
    device.stop().await.unwrap();
    assert_eq!(device.status(), NodeStatus::Stopped);
    // Already stopped: no second request
    device.stop().await.unwrap();

    device.delete().await.unwrap();
    assert_eq!(device.node_id(), None);
    assert!(device.ports().is_empty());
}

#[tokio::test]
async fn test_operations_require_created_node() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());

    assert!(matches!(device.start().await, Err(Gns3Error::Validation(_))));
    assert!(matches!(device.delete().await, Err(Gns3Error::Validation(_))));
    assert!(matches!(device.save_config().await, Err(Gns3Error::Validation(_))));
    assert!(matches!(
        device
            .update(SettingsUpdate {
                ram: Some(1024),
                ..Default::default()
            })
            .await,
        Err(Gns3Error::Validation(_))
    ));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_config() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, mut rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 2, 2).await;

    Mock::given(method("POST"))
        .and(path(node_path("configs/save")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    device.save_config().await.unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![DeviceEvent::Info("IOU1: configs have been saved".to_string())]
    );
}

#[tokio::test]
async fn test_info_summary() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);
    let (mut device, _rx) = create_test_device(&client, "IOU1", IouModuleSettings::default());
    create_on_server(&mock_server, &mut device, 1, 1).await;

    let info = device.info();
    assert!(info.starts_with("Device IOU1 is stopped\n"));
    assert!(info.contains(&format!("server's IOU device ID is {}", NODE_ID)));
    assert!(info.contains("default RAM and NVRAM IOU values"));
    assert!(info.contains("console is on port 5000"));
    assert!(info.contains("Image is i86bi-linux-l3-adventerprisek9-15.4.1T.bin"));
    assert!(info.contains("1 Ethernet adapters and 1 serial adapters installed"));
    assert!(info.contains("     Ethernet0/3\n"));
    assert!(info.contains("     Serial1/0\n"));
}
