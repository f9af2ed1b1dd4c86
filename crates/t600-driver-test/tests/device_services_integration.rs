//! Discovery, power, BER and configuration against a simulated T600

use odtn_types::{OdtnPortType, PortNumber};
use pretty_assertions::assert_eq;
use std::io::Write;
use t600_driver::templates;
use t600_driver::{DriverConfig, DriverError, FlowRuleProgrammable, PowerComponent};
use t600_driver_test::config_fixtures::CONFIG_TOML;
use t600_driver_test::port_fixtures::{CLIENT_3, LINE_1, LINE_2};
use t600_driver_test::rule_fixtures::line_ingress;
use t600_driver_test::{
    device, DriverHarness, Failure, RecordingSession, Request, RequestLogVerifier,
    COMPONENTS_REPLY,
};

const DETAILS_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <data>
    <components xmlns="http://openconfig.net/yang/platform">
      <component>
        <state>
          <mfg-name>FUJITSU</mfg-name>
          <serial-no>T6K00042</serial-no>
          <software-version>R3.1</software-version>
          <id>7</id>
        </state>
      </component>
    </components>
  </data>
</rpc-reply>"#;

const OTN_STATE_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <data>
    <terminal-device xmlns="http://openconfig.net/yang/terminal-device">
      <logical-channels>
        <channel>
          <index>40</index>
          <otn><state><pre-fec-ber><instant>2.5E-5</instant></pre-fec-ber></state></otn>
        </channel>
      </logical-channels>
    </terminal-device>
  </data>
</rpc-reply>"#;

#[tokio::test]
async fn test_discovered_ports_drive_provisioning() {
    let session = RecordingSession::new().with_components(COMPONENTS_REPLY);
    let harness = DriverHarness::with_session(session);

    let ports = harness.driver.discovery().discover_port_details().await.unwrap();
    let numbers: Vec<_> = ports.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![PortNumber::new(LINE_1), PortNumber::new(CLIENT_3)]);
    assert_eq!(ports[0].port_type(), Some(OdtnPortType::Line));
    assert_eq!(ports[0].optical_channel(), Some("otsi-1/1/0/E1"));
    assert_eq!(ports[1].transceiver(), Some("transceiver-1/1/0/C3"));

    harness.inventory.set_ports(device(), ports);

    let added = harness
        .driver
        .flow_rules()
        .apply_flow_rules(vec![line_ingress(1, CLIENT_3, LINE_1, 0)])
        .await
        .unwrap();
    assert_eq!(added.len(), 1);
}

#[tokio::test]
async fn test_device_details() {
    let session = RecordingSession::new();
    session.push_rpc_reply(DETAILS_REPLY);
    let harness = DriverHarness::with_session(session);

    let details = harness.driver.discovery().discover_device_details().await.unwrap();
    assert_eq!(details.vendor, "FUJITSU");
    assert_eq!(details.serial_number, "T6K00042");
    assert_eq!(details.sw_version, "R3.1");
    assert_eq!(details.hw_version, "0.2.1");
    assert_eq!(details.chassis_id, 7);
}

#[tokio::test]
async fn test_set_target_power_commits() {
    let harness = DriverHarness::new();
    let power = harness.driver.power();
    let component: PowerComponent = "egress".parse().unwrap();

    power
        .set_target_power(PortNumber::new(LINE_1), component, -2.5)
        .await
        .unwrap();

    assert_eq!(
        harness
            .session
            .state()
            .target_powers
            .get("otsi-1/1/0/E1")
            .map(String::as_str),
        Some("-2.5")
    );
    RequestLogVerifier::new(&harness.session)
        .assert_edit_commit_pairs()
        .unwrap();
}

#[tokio::test]
async fn test_target_power_out_of_range_sends_nothing() {
    let harness = DriverHarness::new();
    let power = harness.driver.power();
    let component: PowerComponent = "och:3".parse().unwrap();

    let result = power
        .set_target_power(PortNumber::new(LINE_1), component, 1.0)
        .await;

    assert!(matches!(result, Err(DriverError::Parameter { .. })));
    assert!(harness.session.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_target_power_is_protocol_error() {
    let harness = DriverHarness::new();
    harness.session.fail_once(Failure::RejectEdit);

    let result = harness
        .driver
        .power()
        .set_target_power(PortNumber::new(LINE_2), "ingress".parse().unwrap(), 0.0)
        .await;

    assert!(matches!(result, Err(DriverError::Protocol { .. })));
    assert_eq!(harness.session.commits(), 0);
}

#[tokio::test]
async fn test_power_ports_are_line_ports() {
    let harness = DriverHarness::new();
    let ports = harness.driver.power().ports("ingress".parse().unwrap());
    assert_eq!(ports, vec![PortNumber::new(LINE_1), PortNumber::new(LINE_2)]);
}

#[tokio::test]
async fn test_pre_fec_ber_reads_line_slot() {
    let session = RecordingSession::new();
    session.push_get_reply(OTN_STATE_REPLY);
    let harness = DriverHarness::with_session(session);
    let ber = harness.driver.bit_error_rate();

    assert_eq!(
        ber.pre_fec_ber(PortNumber::new(LINE_2)).await.unwrap(),
        Some(2.5e-5)
    );
    assert_eq!(
        harness.session.requests(),
        vec![Request::Get(templates::otn_state_filter(40))]
    );
    assert_eq!(ber.pre_fec_ber(PortNumber::new(CLIENT_3)).await.unwrap(), None);
    assert_eq!(ber.post_fec_ber(PortNumber::new(LINE_2)).await.unwrap(), None);
}

#[tokio::test]
async fn test_config_file_drives_provisioning() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG_TOML.as_bytes()).unwrap();

    let config = DriverConfig::load_or_default(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.provisioning.default_target_power, -1.5);
    assert_eq!(config.power.target_power_max, 2.0);

    let harness = DriverHarness::with_config(RecordingSession::new(), config);
    harness
        .driver
        .flow_rules()
        .apply_flow_rules(vec![line_ingress(1, CLIENT_3, LINE_2, 0)])
        .await
        .unwrap();

    let state = harness.session.state();
    assert_eq!(state.line_channels.get(&40).map(String::as_str), Some("otsi-1/2/0/E2"));
    assert_eq!(
        state.target_powers.get("otsi-1/2/0/E2").map(String::as_str),
        Some("-1.5")
    );
}

fn config_without_e2() -> DriverConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t600.toml");
    std::fs::write(&path, CONFIG_TOML.replace("\"otsi-1/2/0/E2\" = 40\n", "")).unwrap();
    DriverConfig::load_or_default(&path).unwrap()
}

#[tokio::test]
async fn test_line_port_outside_index_table_is_not_created() {
    let harness = DriverHarness::with_config(RecordingSession::new(), config_without_e2());

    let added = harness
        .driver
        .flow_rules()
        .apply_flow_rules(vec![line_ingress(1, CLIENT_3, LINE_2, 0)])
        .await
        .unwrap();

    assert!(added.is_empty());
    let verifier = RequestLogVerifier::new(&harness.session);
    verifier.assert_rpc_count(1).unwrap();
    verifier.assert_edit_count(0).unwrap();
}

#[tokio::test]
async fn test_existing_channel_outside_index_table_is_tuned() {
    let session = RecordingSession::new().with_line_channel(50, "otsi-1/2/0/E2");
    let harness = DriverHarness::with_config(session, config_without_e2());

    let added = harness
        .driver
        .flow_rules()
        .apply_flow_rules(vec![line_ingress(1, CLIENT_3, LINE_2, 0)])
        .await
        .unwrap();

    assert_eq!(added.len(), 1);
    let state = harness.session.state();
    assert_eq!(state.line_channels.len(), 1);
    assert_eq!(state.frequencies.get("otsi-1/2/0/E2"), Some(&193_100_000));
    RequestLogVerifier::new(&harness.session)
        .assert_edit_count(1)
        .unwrap();
}

#[test]
fn test_config_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = DriverConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(missing.provisioning.line_channel_index.len(), 4);

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[provisioning\nsettle_delay_ms = ").unwrap();
    assert!(matches!(
        DriverConfig::load_or_default(&path),
        Err(DriverError::Config { .. })
    ));
}
