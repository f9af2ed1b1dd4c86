//! Flow rule classification.
//!
//! A rule is classified from its ports and signal fields alone:
//!
//! | Selector ODU type | Line port on   | Role             |
//! |-------------------|----------------|------------------|
//! | absent            | output         | `LineIngress`    |
//! | absent            | input          | `LineEgress`     |
//! | present           | output         | `ClientIngress`  |
//! | present           | input          | `ClientEgress`   |
//!
//! Exactly one side of the rule must be a line port. Line roles also need a
//! positive central frequency, taken from the treatment's OCh signal or, if
//! the treatment carries none, from the selector's.

use crate::error::{DriverError, DriverResult};
use odtn_types::{FlowRule, Frequency, PortNumber};
use std::collections::BTreeSet;
use std::fmt;

/// Directional role of a flow rule on a terminal device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRole {
    /// Client port in, line port out, with a signal to tune.
    LineIngress,
    /// Line port in, client port out, with a signal to tune.
    LineEgress,
    /// Client port in, line port out, mapping an ODU.
    ClientIngress,
    /// Line port in, client port out, mapping an ODU.
    ClientEgress,
}

impl ConnectionRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionRole::LineIngress => "line-ingress",
            ConnectionRole::LineEgress => "line-egress",
            ConnectionRole::ClientIngress => "client-ingress",
            ConnectionRole::ClientEgress => "client-egress",
        }
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified flow rule with the parameters its role needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRuleClassification {
    /// Tune the line port reached from a client port.
    LineIngress {
        /// Output port of the rule.
        line_port: PortNumber,
        /// Frequency of the treatment signal.
        central_frequency: Frequency,
    },
    /// Tune the line port feeding a client port.
    LineEgress {
        /// Input port of the rule.
        line_port: PortNumber,
        /// Frequency of the treatment signal.
        central_frequency: Frequency,
    },
    /// Map the input client port onto the output line port.
    ClientIngress {
        /// Input port of the rule.
        client_port: PortNumber,
        /// Output port of the rule.
        line_port: PortNumber,
    },
    /// Map the output client port onto the input line port.
    ClientEgress {
        /// Output port of the rule.
        client_port: PortNumber,
        /// Input port of the rule.
        line_port: PortNumber,
    },
}

impl FlowRuleClassification {
    pub fn role(&self) -> ConnectionRole {
        match self {
            FlowRuleClassification::LineIngress { .. } => ConnectionRole::LineIngress,
            FlowRuleClassification::LineEgress { .. } => ConnectionRole::LineEgress,
            FlowRuleClassification::ClientIngress { .. } => ConnectionRole::ClientIngress,
            FlowRuleClassification::ClientEgress { .. } => ConnectionRole::ClientEgress,
        }
    }

    /// The line port every role references.
    pub fn line_port(&self) -> PortNumber {
        match *self {
            FlowRuleClassification::LineIngress { line_port, .. }
            | FlowRuleClassification::LineEgress { line_port, .. }
            | FlowRuleClassification::ClientIngress { line_port, .. }
            | FlowRuleClassification::ClientEgress { line_port, .. } => line_port,
        }
    }

    pub fn client_port(&self) -> Option<PortNumber> {
        match *self {
            FlowRuleClassification::ClientIngress { client_port, .. }
            | FlowRuleClassification::ClientEgress { client_port, .. } => Some(client_port),
            _ => None,
        }
    }

    pub fn central_frequency(&self) -> Option<Frequency> {
        match *self {
            FlowRuleClassification::LineIngress {
                central_frequency, ..
            }
            | FlowRuleClassification::LineEgress {
                central_frequency, ..
            } => Some(central_frequency),
            _ => None,
        }
    }

    pub fn is_line_side(&self) -> bool {
        self.central_frequency().is_some()
    }
}

/// Classifies `rule` against the device's line ports.
pub fn classify(
    rule: &FlowRule,
    line_ports: &BTreeSet<PortNumber>,
) -> DriverResult<FlowRuleClassification> {
    let in_port = rule.in_port();
    let out_port = rule.out_port();
    let in_is_line = line_ports.contains(&in_port);
    let out_is_line = line_ports.contains(&out_port);

    let line_is_output = match (in_is_line, out_is_line) {
        (false, true) => true,
        (true, false) => false,
        (false, false) => {
            return Err(DriverError::format(
                format!("{}->{}", in_port, out_port),
                "rule references no known line port",
            ))
        }
        (true, true) => {
            return Err(DriverError::format(
                format!("{}->{}", in_port, out_port),
                "rule connects two line ports",
            ))
        }
    };

    if rule.selector.odu_signal_type.is_some() {
        return Ok(if line_is_output {
            FlowRuleClassification::ClientIngress {
                client_port: in_port,
                line_port: out_port,
            }
        } else {
            FlowRuleClassification::ClientEgress {
                client_port: out_port,
                line_port: in_port,
            }
        });
    }

    let central_frequency = central_frequency(rule)?;
    Ok(if line_is_output {
        FlowRuleClassification::LineIngress {
            line_port: out_port,
            central_frequency,
        }
    } else {
        FlowRuleClassification::LineEgress {
            line_port: in_port,
            central_frequency,
        }
    })
}

fn central_frequency(rule: &FlowRule) -> DriverResult<Frequency> {
    let signal = rule
        .treatment
        .och_signal
        .or(rule.selector.och_signal)
        .ok_or_else(|| DriverError::parameter("central-frequency", "rule carries no OCh signal"))?;

    signal
        .central_frequency()
        .filter(Frequency::is_positive)
        .ok_or_else(|| {
            DriverError::parameter(
                "central-frequency",
                format!("{:?} has no positive central frequency", signal),
            )
        })
}

/// Deterministic cache key of an applied rule.
///
/// Line roles include the frequency in MHz, so retuning a port yields a new
/// connection.
pub fn connection_name(rule: &FlowRule, classification: &FlowRuleClassification) -> String {
    let mut name = format!(
        "{}-{}-{}",
        classification.role(),
        rule.in_port(),
        rule.out_port()
    );
    if let Some(frequency) = classification.central_frequency() {
        name.push_str(&format!("-{}", frequency.as_mhz()));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use odtn_types::{ChannelSpacing, DeviceId, OchSignal, OduSignalType};
    use pretty_assertions::assert_eq;

    const LINE: u64 = 11001;
    const LINE2: u64 = 12001;
    const CLIENT: u64 = 1103;

    fn line_ports() -> BTreeSet<PortNumber> {
        [LINE, LINE2].into_iter().map(PortNumber::new).collect()
    }

    fn rule(in_port: u64, out_port: u64) -> FlowRule {
        FlowRule::new(
            1,
            DeviceId::new("t600").unwrap(),
            PortNumber::new(in_port),
            PortNumber::new(out_port),
        )
    }

    fn signal() -> OchSignal {
        OchSignal::dwdm(ChannelSpacing::Chl50Ghz, 1)
    }

    #[test]
    fn test_line_ingress() {
        let r = rule(CLIENT, LINE).with_treatment_signal(signal());
        let c = classify(&r, &line_ports()).unwrap();
        assert_eq!(
            c,
            FlowRuleClassification::LineIngress {
                line_port: PortNumber::new(LINE),
                central_frequency: Frequency::from_ghz(193_150.0),
            }
        );
        assert!(c.is_line_side());
        assert_eq!(c.client_port(), None);
    }

    #[test]
    fn test_line_egress_uses_selector_signal() {
        let r = rule(LINE, CLIENT).with_selector_signal(signal());
        let c = classify(&r, &line_ports()).unwrap();
        assert_eq!(c.role(), ConnectionRole::LineEgress);
        assert_eq!(c.line_port(), PortNumber::new(LINE));
        assert_eq!(c.central_frequency(), Some(Frequency::from_ghz(193_150.0)));
    }

    #[test]
    fn test_treatment_signal_wins() {
        let r = rule(CLIENT, LINE)
            .with_selector_signal(OchSignal::dwdm(ChannelSpacing::Chl50Ghz, -4))
            .with_treatment_signal(signal());
        let c = classify(&r, &line_ports()).unwrap();
        assert_eq!(c.central_frequency(), Some(Frequency::from_ghz(193_150.0)));
    }

    #[test]
    fn test_client_ingress_and_egress() {
        let ingress = rule(CLIENT, LINE).with_odu_signal_type(OduSignalType::Odu4);
        assert_eq!(
            classify(&ingress, &line_ports()).unwrap(),
            FlowRuleClassification::ClientIngress {
                client_port: PortNumber::new(CLIENT),
                line_port: PortNumber::new(LINE),
            }
        );

        let egress = rule(LINE, CLIENT).with_odu_signal_type(OduSignalType::Odu4);
        assert_eq!(
            classify(&egress, &line_ports()).unwrap(),
            FlowRuleClassification::ClientEgress {
                client_port: PortNumber::new(CLIENT),
                line_port: PortNumber::new(LINE),
            }
        );
    }

    #[test]
    fn test_missing_frequency_is_parameter_error() {
        let err = classify(&rule(CLIENT, LINE), &line_ports()).unwrap_err();
        assert!(matches!(err, DriverError::Parameter { .. }));
    }

    #[test]
    fn test_non_positive_frequency_is_parameter_error() {
        let r = rule(CLIENT, LINE)
            .with_treatment_signal(OchSignal::dwdm(ChannelSpacing::Chl100Ghz, -2000));
        let err = classify(&r, &line_ports()).unwrap_err();
        assert!(matches!(err, DriverError::Parameter { .. }));
    }

    #[test]
    fn test_unknown_ports_is_format_error() {
        let r = rule(1101, 1102).with_treatment_signal(signal());
        let err = classify(&r, &line_ports()).unwrap_err();
        assert!(matches!(err, DriverError::Format { .. }));
    }

    #[test]
    fn test_line_to_line_is_format_error() {
        let r = rule(LINE, LINE2).with_treatment_signal(signal());
        let err = classify(&r, &line_ports()).unwrap_err();
        assert!(matches!(err, DriverError::Format { .. }));
    }

    #[test]
    fn test_every_valid_rule_has_one_role() {
        let ports = line_ports();
        for (in_port, out_port) in [(CLIENT, LINE), (LINE, CLIENT), (CLIENT, LINE2), (LINE2, CLIENT)] {
            let line = rule(in_port, out_port).with_treatment_signal(signal());
            let client = rule(in_port, out_port).with_odu_signal_type(OduSignalType::Odu4);
            assert!(classify(&line, &ports).unwrap().is_line_side());
            assert!(!classify(&client, &ports).unwrap().is_line_side());
        }
    }

    #[test]
    fn test_connection_names() {
        let ports = line_ports();
        let ingress = rule(CLIENT, LINE).with_treatment_signal(signal());
        let c = classify(&ingress, &ports).unwrap();
        assert_eq!(connection_name(&ingress, &c), "line-ingress-1103-11001-193150000");

        let egress = rule(LINE, CLIENT).with_treatment_signal(signal());
        let c = classify(&egress, &ports).unwrap();
        assert_eq!(connection_name(&egress, &c), "line-egress-11001-1103-193150000");

        let client = rule(CLIENT, LINE).with_odu_signal_type(OduSignalType::Odu4);
        let c = classify(&client, &ports).unwrap();
        assert_eq!(connection_name(&client, &c), "client-ingress-1103-11001");
    }

    #[test]
    fn test_classification_is_deterministic() {
        let r = rule(CLIENT, LINE).with_treatment_signal(signal());
        assert_eq!(
            classify(&r, &line_ports()).unwrap(),
            classify(&r, &line_ports()).unwrap()
        );
    }
}
