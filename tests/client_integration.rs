//! Purpose: End-to-end tests for `FabricClient` against a canned loopback gateway.
//! Exports: None (integration test module).
//! Role: Validate request lines, query parameters, bodies, typed decoding, and error envelopes.
//! Invariants: The responder serves a fixed script of responses, one per connection.
//! Invariants: Bounded waits avoid test flakiness.

use serde_json::{Value, json};
use sfwire::ErrorKind;
use sfwire::api::{ClientConfig, FabricClient};
use sfwire::model::health::{ApplicationHealthPolicy, HealthState, HealthStateFilter};
use sfwire::model::image_store::ProvisionApplicationTypeDescription;
use sfwire::model::partition::{PartitionId, ServicePartitionInfo};
use sfwire::model::upgrade::{ApplicationUpgradeDescription, UpgradeState};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

const PARTITION: &str = "1c3c1dcd-4a38-4ff4-b1a4-7e9d8c3b5a10";

struct Recorded {
    request_line: String,
    body: String,
}

struct CannedGateway {
    endpoint: String,
    requests: mpsc::Receiver<Recorded>,
}

impl CannedGateway {
    fn start(script: Vec<(u16, String)>) -> TestResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let endpoint = format!("http://{}", listener.local_addr()?);
        let (tx, requests) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in script {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                let mut reader = BufReader::new(stream);
                let Some(recorded) = read_request(&mut reader) else {
                    return;
                };
                let _ = tx.send(recorded);
                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        Ok(Self { endpoint, requests })
    }

    fn client(&self) -> TestResult<FabricClient> {
        let config =
            ClientConfig::new(self.endpoint.clone()).with_request_timeout(Duration::from_secs(5));
        Ok(FabricClient::with_config(config)?)
    }

    fn next_request(&self) -> TestResult<Recorded> {
        Ok(self.requests.recv_timeout(Duration::from_secs(5))?)
    }
}

fn read_request<R: BufRead>(reader: &mut R) -> Option<Recorded> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok()?;
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(Recorded {
        request_line: request_line.trim_end().to_string(),
        body: String::from_utf8(body).ok()?,
    })
}

#[test]
fn upgrade_progress_is_fetched_and_typed() -> TestResult<()> {
    let body = json!({
        "Name": "fabric:/shop",
        "UpgradeState": "RollingForwardPending",
        "UpgradeDomains": [{"Name": "UD0", "State": "Pending"}],
        "UpgradeDurationInMilliseconds": "PT0H2M0S",
        "SomethingNew": {"nested": true}
    });
    let gateway = CannedGateway::start(vec![(200, body.to_string())])?;
    let progress = gateway.client()?.get_application_upgrade_progress("shop")?;
    assert_eq!(progress.upgrade_state, Some(UpgradeState::RollingForwardPending));
    assert_eq!(
        progress.upgrade_duration_in_milliseconds.as_deref(),
        Some("PT0H2M0S")
    );

    let request = gateway.next_request()?;
    assert_eq!(
        request.request_line,
        "GET /Applications/shop/$/GetUpgradeProgress?api-version=6.0 HTTP/1.1"
    );
    Ok(())
}

#[test]
fn partition_pages_are_followed() -> TestResult<()> {
    let first = json!({
        "ContinuationToken": "page-2",
        "Items": [{"ServiceKind": "Stateless", "InstanceCount": -1,
                   "PartitionInformation": {"ServicePartitionKind": "Singleton", "Id": PARTITION}}]
    });
    let second = json!({
        "ContinuationToken": "",
        "Items": [{"ServiceKind": "Stateful", "TargetReplicaSetSize": 3,
                   "PartitionInformation": {"ServicePartitionKind": "Int64Range", "LowKey": "0", "HighKey": "9"}}]
    });
    let gateway = CannedGateway::start(vec![(200, first.to_string()), (200, second.to_string())])?;
    let partitions = gateway.client()?.get_all_partition_info("shop~cart")?;
    assert_eq!(partitions.len(), 2);
    assert!(matches!(partitions[0], ServicePartitionInfo::Stateless(_)));
    assert!(matches!(partitions[1], ServicePartitionInfo::Stateful(_)));

    let first_request = gateway.next_request()?;
    assert_eq!(
        first_request.request_line,
        "GET /Services/shop~cart/$/GetPartitions?api-version=6.0 HTTP/1.1"
    );
    let second_request = gateway.next_request()?;
    assert!(
        second_request
            .request_line
            .contains("?api-version=6.0&ContinuationToken=page-2 "),
        "{}",
        second_request.request_line
    );
    Ok(())
}

#[test]
fn repeated_continuation_token_ends_paging() -> TestResult<()> {
    let page = |token: &str| {
        json!({
            "ContinuationToken": token,
            "Items": [{"ServiceKind": "Stateless",
                       "PartitionInformation": {"ServicePartitionKind": "Singleton", "Id": PARTITION}}]
        })
        .to_string()
    };
    let gateway = CannedGateway::start(vec![(200, page("A")), (200, page("B")), (200, page("A"))])?;
    let partitions = gateway.client()?.get_all_partition_info("shop~cart")?;
    assert_eq!(partitions.len(), 3);

    let tokens = (0..3)
        .map(|_| gateway.next_request().map(|request| request.request_line))
        .collect::<TestResult<Vec<_>>>()?;
    assert!(!tokens[0].contains("ContinuationToken"));
    assert!(tokens[1].contains("&ContinuationToken=A "), "{}", tokens[1]);
    assert!(tokens[2].contains("&ContinuationToken=B "), "{}", tokens[2]);
    assert!(gateway.requests.try_recv().is_err());
    Ok(())
}

#[test]
fn error_envelope_becomes_remote_error() -> TestResult<()> {
    let envelope = json!({
        "Error": {"Code": "FABRIC_E_PARTITION_NOT_FOUND", "Message": "Partition not found"}
    });
    let gateway = CannedGateway::start(vec![(404, envelope.to_string())])?;
    let partition = PartitionId::parse(PARTITION)?;
    let err = gateway
        .client()?
        .get_partition_info(&partition)
        .expect_err("not found");
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.code(), Some("FABRIC_E_PARTITION_NOT_FOUND"));
    assert_eq!(err.message(), Some("Partition not found"));
    Ok(())
}

#[test]
fn bare_status_falls_back_to_status_kind() -> TestResult<()> {
    let gateway = CannedGateway::start(vec![
        (404, "not json".to_string()),
        (503, String::new()),
    ])?;
    let client = gateway.client()?;
    let err = client.get_image_store_content("Shop").expect_err("404");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = client.get_image_store_content("Shop").expect_err("503");
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(err.status(), Some(503));
    Ok(())
}

#[test]
fn response_shape_errors_carry_paths() -> TestResult<()> {
    let body = json!({"UpgradeDomains": [{"Name": "UD0", "State": "Paused"}]});
    let gateway = CannedGateway::start(vec![(200, body.to_string())])?;
    let err = gateway
        .client()?
        .get_application_upgrade_progress("shop")
        .expect_err("paused");
    assert_eq!(err.kind(), ErrorKind::UnknownEnumerationValue);
    assert_eq!(err.path(), Some("$.UpgradeDomains[0].State"));
    Ok(())
}

#[test]
fn provision_posts_tagged_body() -> TestResult<()> {
    let gateway = CannedGateway::start(vec![(202, String::new())])?;
    let description = ProvisionApplicationTypeDescription::image_store_path("Shop", true);
    gateway.client()?.provision_application_type(&description)?;

    let request = gateway.next_request()?;
    assert_eq!(
        request.request_line,
        "POST /ApplicationTypes/$/Provision?api-version=6.2 HTTP/1.1"
    );
    let body: Value = serde_json::from_str(&request.body)?;
    assert_eq!(
        body,
        json!({"Kind": "ImageStorePath", "Async": true, "ApplicationTypeBuildPath": "Shop"})
    );
    assert!(request.body.starts_with("{\"Kind\""));
    Ok(())
}

#[test]
fn upgrade_posts_description() -> TestResult<()> {
    let gateway = CannedGateway::start(vec![(200, String::new())])?;
    let description = ApplicationUpgradeDescription::rolling("fabric:/shop", "2.0.0");
    gateway
        .client()?
        .start_application_upgrade("shop", &description)?;

    let request = gateway.next_request()?;
    assert_eq!(
        request.request_line,
        "POST /Applications/shop/$/Upgrade?api-version=6.0 HTTP/1.1"
    );
    let body: Value = serde_json::from_str(&request.body)?;
    assert_eq!(body["UpgradeKind"], "Rolling");
    assert!(body.get("Parameters").is_none());
    Ok(())
}

#[test]
fn upgrade_body_sends_second_counts_as_numbers() -> TestResult<()> {
    let gateway = CannedGateway::start(vec![(200, String::new())])?;
    let mut description = ApplicationUpgradeDescription::rolling("fabric:/shop", "2.0.0");
    description.upgrade_replica_set_check_timeout_in_seconds = Some(42);
    description.instance_close_delay_duration_in_seconds = Some(5);
    gateway
        .client()?
        .start_application_upgrade("shop", &description)?;

    let body: Value = serde_json::from_str(&gateway.next_request()?.body)?;
    assert_eq!(body["UpgradeReplicaSetCheckTimeoutInSeconds"], json!(42));
    assert_eq!(body["InstanceCloseDelayDurationInSeconds"], json!(5));
    Ok(())
}

#[test]
fn service_package_health_sends_filter_and_policy() -> TestResult<()> {
    let health = json!({
        "AggregatedHealthState": "Warning",
        "HealthEvents": [{"SourceId": "System.Hosting", "Property": "Activation", "HealthState": "Warning"}],
        "ServiceManifestName": "CartPkg"
    });
    let gateway = CannedGateway::start(vec![(200, health.to_string())])?;
    let policy = ApplicationHealthPolicy {
        consider_warning_as_error: Some(false),
        max_percent_unhealthy_deployed_applications: None,
        default_service_type_health_policy: None,
        service_type_health_policy_map: None,
    };
    let result = gateway.client()?.get_deployed_service_package_health_using_policy(
        "_Node_0",
        "shop",
        "CartPkg",
        HealthStateFilter::WARNING | HealthStateFilter::ERROR,
        &policy,
    )?;
    assert_eq!(result.aggregated_health_state, Some(HealthState::Warning));
    assert_eq!(result.health_events.as_ref().map(Vec::len), Some(1));

    let request = gateway.next_request()?;
    assert_eq!(
        request.request_line,
        "POST /Nodes/_Node_0/$/GetApplications/shop/$/GetServicePackages/CartPkg/$/GetHealth?api-version=6.0&EventsHealthStateFilter=12 HTTP/1.1"
    );
    assert_eq!(request.body, r#"{"ConsiderWarningAsError":false}"#);
    Ok(())
}

#[test]
fn server_timeout_is_forwarded() -> TestResult<()> {
    let gateway = CannedGateway::start(vec![(200, json!({"StoreFiles": []}).to_string())])?;
    let client = FabricClient::with_config(
        ClientConfig::new(gateway.endpoint.clone())
            .with_server_timeout(30)
            .with_request_timeout(Duration::from_secs(5)),
    )?;
    let content = client.get_image_store_content("Shop")?;
    assert_eq!(content.store_files.map(|files| files.len()), Some(0));
    assert!(content.store_folders.is_none());

    let request = gateway.next_request()?;
    assert_eq!(
        request.request_line,
        "GET /ImageStore/Shop?api-version=6.0&timeout=30 HTTP/1.1"
    );
    Ok(())
}

#[test]
fn unreachable_gateway_is_io_error() -> TestResult<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let endpoint = format!("http://{}", listener.local_addr()?);
    drop(listener);
    let client = FabricClient::with_config(
        ClientConfig::new(endpoint).with_request_timeout(Duration::from_secs(2)),
    )?;
    let err = client
        .get_application_upgrade_progress("shop")
        .expect_err("refused");
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.hint().is_some());
    Ok(())
}
