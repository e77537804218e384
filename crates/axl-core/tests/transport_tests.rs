//! Tests for the SOAP over HTTP transport
//! A local mock server stands in for the publisher's AXL endpoint.

use axl_core::{AxlClient, AxlConfig, AxlError, AxlTransport, AxlValue, SoapTransport, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"#,
        body
    )
}

fn xml_reply(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(body)
}

fn config_for(server: &MockServer) -> AxlConfig {
    AxlConfig::new(format!("{}/axl/", server.uri()), "axladmin", "secret").with_timeout_secs(5)
}

#[tokio::test]
async fn test_request_carries_auth_and_soap_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/axl/"))
        .and(basic_auth("axladmin", "secret"))
        .and(header("SOAPAction", "\"CUCM:DB ver=12.5 getPhone\""))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .and(body_string_contains("<ns:getPhone><name>SEP001122334455</name></ns:getPhone>"))
        .respond_with(xml_reply(
            200,
            envelope(
                r#"<ns:getPhoneResponse xmlns:ns="http://www.cisco.com/AXL/API/12.5"><return><phone uuid="{P-1}"><name>SEP001122334455</name><devicePoolName uuid="{DP-1}">DP_NYC</devicePoolName></phone></return></ns:getPhoneResponse>"#,
            ),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = AxlClient::connect(&config_for(&server)).unwrap();
    let phone = client.get_by_name("SEP001122334455", "Phone").await.unwrap();

    assert_eq!(phone["uuid"].as_str(), Some("{P-1}"));
    assert_eq!(phone["devicePoolName"].text(), Some("DP_NYC"));
    assert_eq!(client.call_log().procedures(), vec!["getPhone"]);
}

#[tokio::test]
async fn test_success_reply_decodes_to_return_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_reply(
            200,
            envelope(r#"<ns:addSrstResponse xmlns:ns="http://www.cisco.com/AXL/API/14.0"><return>{SRST-1}</return></ns:addSrstResponse>"#),
        ))
        .mount(&server)
        .await;

    let transport = SoapTransport::new(&config_for(&server).with_schema_version("14.0")).unwrap();
    let request = AxlValue::from(json!({"srst": {"name": "SRST_NYC", "ipAddress": "10.0.0.1"}}));
    let reply = transport.invoke("addSrst", &request).await.unwrap();

    assert_eq!(reply, AxlValue::from(json!({"return": "{SRST-1}"})));
    assert_eq!(transport.soap_action("addSrst"), "\"CUCM:DB ver=14.0 addSrst\"");
}

#[tokio::test]
async fn test_fault_in_server_error_becomes_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_reply(
            500,
            envelope(
                "<soapenv:Fault><faultcode>soapenv:Server</faultcode><faultstring>Item not valid: The specified Phone was not found</faultstring></soapenv:Fault>",
            ),
        ))
        .mount(&server)
        .await;

    let client = AxlClient::connect(&config_for(&server)).unwrap();
    match client.get_by_uuid("{MISSING}", "Phone").await {
        Err(AxlError::Transport(TransportError::Fault { code, message })) => {
            assert_eq!(code, "soapenv:Server");
            assert!(message.contains("was not found"));
        }
        other => panic!("expected Fault, got {:?}", other),
    }

    let records = client.call_log().records();
    assert_eq!(records.len(), 1);
    assert!(records[0].error.as_deref().unwrap().contains("was not found"));
}

#[tokio::test]
async fn test_non_soap_error_body_becomes_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>Internal Server Error</body></html>"),
        )
        .mount(&server)
        .await;

    let transport = SoapTransport::new(&config_for(&server)).unwrap();
    let request = AxlValue::from(json!({"name": "DP_NYC"}));
    match transport.invoke("getDevicePool", &request).await {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("Internal Server Error"));
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_credentials_become_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let transport = SoapTransport::new(&config_for(&server)).unwrap();
    let err = transport
        .invoke("listPhone", &AxlValue::from(json!({"searchCriteria": {"name": "%"}})))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 401, .. }));
}

#[test]
fn test_debug_output_hides_password() {
    let transport = SoapTransport::new(&AxlConfig::new("https://cucm:8443/axl/", "axladmin", "hunter2")).unwrap();
    let debug = format!("{:?}", transport);
    assert!(debug.contains("axladmin"));
    assert!(!debug.contains("hunter2"));
}
