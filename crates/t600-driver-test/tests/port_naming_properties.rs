//! Port identifier codec and rule classification over whole input spaces

use odtn_types::{FlowRule, OduSignalType, PortNumber};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use t600_driver::port_name::{self, ComponentKind, ComponentName};
use t600_driver::{classify, DriverError, FlowRuleClassification};
use t600_driver_test::port_fixtures::{standard_ports, CLIENT_11, LINE_1};
use t600_driver_test::rule_fixtures::signal;
use t600_driver_test::device;

#[test]
fn test_known_identifiers() {
    assert_eq!(
        port_name::encode("port-1/2/0/C11").unwrap(),
        PortNumber::new(CLIENT_11)
    );
    assert_eq!(
        port_name::decode(PortNumber::new(CLIENT_11)).unwrap(),
        "transceiver-1/2/0/C11"
    );
    assert_eq!(port_name::encode("otsi-1/1/0/E1").unwrap(), PortNumber::new(LINE_1));
    assert_eq!(port_name::decode(PortNumber::new(LINE_1)).unwrap(), "otsi-1/1/0/E1");
}

#[test]
fn test_full_grid_round_trips() {
    let mut seen = BTreeSet::new();
    for shelf in 1..=2 {
        for slot in 1..=2 {
            for index in 1..=9 {
                let name = ComponentName::new(shelf, slot, ComponentKind::Line, index)
                    .unwrap()
                    .component_name();
                let number = port_name::encode(&name).unwrap();
                assert_eq!(port_name::decode(number).unwrap(), name);
                assert!(seen.insert(number), "{} collides", name);
            }
            for index in 11..=12 {
                let name = ComponentName::new(shelf, slot, ComponentKind::Line, index)
                    .unwrap()
                    .component_name();
                let short = ComponentName::new(shelf, slot, ComponentKind::Line, index % 10)
                    .unwrap()
                    .component_name();
                let number = port_name::encode(&name).unwrap();
                assert_eq!(port_name::decode(number).unwrap(), short);
                assert!(seen.contains(&number), "{} shares a number with {}", name, short);
            }
            for index in 1..=99 {
                let name = ComponentName::new(shelf, slot, ComponentKind::Client, index)
                    .unwrap()
                    .component_name();
                let number = port_name::encode(&name).unwrap();
                assert_eq!(port_name::decode(number).unwrap(), name);
                assert!(seen.insert(number), "{} collides", name);
            }
        }
    }
    assert_eq!(seen.len(), 4 * (9 + 99));
}

#[test]
fn test_prefix_forms_share_a_number() {
    for name in ["port-1/1/0/C3", "transceiver-1/1/0/C3", "1/1/0/C3"] {
        assert_eq!(port_name::encode(name).unwrap(), PortNumber::new(1103));
    }
}

#[test]
fn test_out_of_grammar_identifiers() {
    for name in ["otsi-3/1/0/E1", "otsi-1/1/1/E1", "otsi-1/1/0/e1", "otsi-1/1/0/X1", "1/1/0"] {
        assert!(
            matches!(port_name::encode(name), Err(DriverError::Format { .. })),
            "{} should be rejected",
            name
        );
    }
    for number in [0, 7, 11101, 31001, 1301, 123456] {
        assert!(
            port_name::decode(PortNumber::new(number)).is_err(),
            "{} should be rejected",
            number
        );
    }
}

/// Every port pair either classifies with exactly one line port or fails.
#[test]
fn test_classification_is_total() {
    let ports = standard_ports();
    let line_ports: BTreeSet<PortNumber> = ports
        .iter()
        .filter(|p| p.is_line())
        .map(|p| p.number)
        .collect();

    for a in &ports {
        for b in &ports {
            if a.number == b.number {
                continue;
            }
            let exactly_one_line = a.is_line() != b.is_line();
            let line_rule =
                FlowRule::new(1, device(), a.number, b.number).with_treatment_signal(signal(1));
            let client_rule = FlowRule::new(2, device(), a.number, b.number)
                .with_odu_signal_type(OduSignalType::Odu4);

            for rule in [line_rule, client_rule] {
                match classify(&rule, &line_ports) {
                    Ok(classification) => {
                        assert!(exactly_one_line, "{:?} classified", rule);
                        let line = classification.line_port();
                        assert!(line_ports.contains(&line));
                        assert!(line == a.number || line == b.number);
                        if let Some(client) = classification.client_port() {
                            assert!(!line_ports.contains(&client));
                        }
                    }
                    Err(DriverError::Format { .. }) => {
                        assert!(!exactly_one_line, "{:?} rejected", rule);
                    }
                    Err(e) => panic!("unexpected error {}", e),
                }
            }
        }
    }
}

#[test]
fn test_odu_rules_are_client_side() {
    let rule = FlowRule::new(1, device(), PortNumber::new(1103), PortNumber::new(LINE_1))
        .with_odu_signal_type(OduSignalType::Odu4)
        .with_treatment_signal(signal(0));

    let classification = classify(&rule, &BTreeSet::from([PortNumber::new(LINE_1)])).unwrap();
    assert_eq!(
        classification,
        FlowRuleClassification::ClientIngress {
            client_port: PortNumber::new(1103),
            line_port: PortNumber::new(LINE_1),
        }
    );
}
