//! Optical power configuration.
//!
//! Power is read and written on the optical-channel component of a port. The
//! component argument only selects which kind of power object the caller
//! means; both kinds address the same leaves on this device.

use crate::config::PowerConfig;
use crate::error::{DriverError, DriverResult};
use crate::inventory::{self, DeviceInventory, SessionProvider};
use crate::port_name;
use crate::templates::{self, PowerLeaf};
use odtn_netconf::xml::XmlNode;
use odtn_netconf::{DatastoreId, NetconfError, NetconfSession};
use odtn_types::{ChannelSpacing, DeviceId, OchSignal, PortNumber};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Traffic direction of a port-level power setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Light entering the device.
    Ingress,
    /// Light leaving the device.
    Egress,
}

/// What a power request applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerComponent {
    /// A port-level power setting.
    Direction(Direction),
    /// The optical channel occupying this slot.
    OchSignal(OchSignal),
}

impl fmt::Display for PowerComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerComponent::Direction(Direction::Ingress) => f.write_str("ingress"),
            PowerComponent::Direction(Direction::Egress) => f.write_str("egress"),
            PowerComponent::OchSignal(signal) => write!(
                f,
                "och:{}",
                signal.spacing_multiplier
            ),
        }
    }
}

impl FromStr for PowerComponent {
    type Err = DriverError;

    /// Accepts `ingress`, `egress`, `och` or `och:<multiplier>` (50 GHz grid).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ingress" => Ok(PowerComponent::Direction(Direction::Ingress)),
            "egress" => Ok(PowerComponent::Direction(Direction::Egress)),
            "och" => Ok(PowerComponent::OchSignal(OchSignal::dwdm(ChannelSpacing::Chl50Ghz, 1))),
            other => {
                let multiplier = other
                    .strip_prefix("och:")
                    .and_then(|m| m.parse::<i32>().ok())
                    .ok_or_else(|| DriverError::unsupported_component(s))?;
                Ok(PowerComponent::OchSignal(OchSignal::dwdm(
                    ChannelSpacing::Chl50Ghz,
                    multiplier,
                )))
            }
        }
    }
}

/// Open interval of valid power values in dBm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRange {
    /// Exclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl PowerRange {
    pub fn contains(&self, power: f64) -> bool {
        power > self.min && power < self.max
    }
}

impl fmt::Display for PowerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min, self.max)
    }
}

/// Reads and writes optical power of a device's ports.
pub struct T600PowerConfig {
    device: DeviceId,
    sessions: Arc<dyn SessionProvider>,
    inventory: Arc<dyn DeviceInventory>,
    config: PowerConfig,
}

impl T600PowerConfig {
    pub fn new(
        device: DeviceId,
        sessions: Arc<dyn SessionProvider>,
        inventory: Arc<dyn DeviceInventory>,
        config: PowerConfig,
    ) -> Self {
        Self {
            device,
            sessions,
            inventory,
            config,
        }
    }

    fn session(&self) -> DriverResult<Arc<dyn NetconfSession>> {
        self.sessions
            .session(&self.device)
            .ok_or_else(|| DriverError::session_unavailable(&self.device))
    }

    /// Optical-channel component of a port, from discovery or decoded from its number.
    fn component_name(&self, port: PortNumber) -> DriverResult<String> {
        match self
            .inventory
            .port(&self.device, port)
            .and_then(|p| p.optical_channel().map(str::to_string))
        {
            Some(name) => Ok(name),
            None => port_name::decode(port),
        }
    }

    async fn query_leaf(&self, operation: &str, request: &str, path: &str) -> DriverResult<Option<f64>> {
        let reply = self
            .session()?
            .rpc(request)
            .await
            .map_err(|e| DriverError::protocol(operation, e))?;
        debug!(device = %self.device, operation, "reply {}", reply);
        let doc = XmlNode::parse(&reply).map_err(|e| DriverError::protocol(operation, e))?;

        Ok(doc.first_text(path).and_then(|text| match text.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(device = %self.device, operation, value = %text, "power leaf is not a number");
                None
            }
        }))
    }

    /// Configured target output power, if set.
    #[instrument(skip(self, component), fields(device = %self.device, component = %component))]
    pub async fn target_power(&self, port: PortNumber, component: PowerComponent) -> DriverResult<Option<f64>> {
        let name = self.component_name(port)?;
        self.query_leaf(
            "get-target-power",
            &templates::target_power_query(&name),
            templates::TARGET_OUTPUT_POWER_PATH,
        )
        .await
    }

    /// Writes the target output power to the candidate datastore and commits.
    #[instrument(skip(self, component), fields(device = %self.device, component = %component))]
    pub async fn set_target_power(&self, port: PortNumber, component: PowerComponent, power: f64) -> DriverResult<()> {
        let range = self.target_power_range(port, component);
        if !range.contains(power) {
            return Err(DriverError::parameter(
                "target-output-power",
                format!("{} dBm outside {}", power, range),
            ));
        }

        let name = self.component_name(port)?;
        let session = self.session()?;
        let ok = session
            .edit_config(DatastoreId::Candidate, None, &templates::set_target_power(&name, power))
            .await
            .map_err(|e| DriverError::protocol("set-target-power", e))?;
        if !ok {
            return Err(DriverError::protocol(
                "set-target-power",
                NetconfError::edit_rejected(
                    DatastoreId::Candidate.as_str(),
                    format!("target-output-power of {}", name),
                ),
            ));
        }
        session
            .commit()
            .await
            .map_err(|e| DriverError::protocol("set-target-power", e))?;

        info!(port = %name, power, "target output power set");
        Ok(())
    }

    /// Instant output power.
    #[instrument(skip(self, component), fields(device = %self.device, component = %component))]
    pub async fn current_output_power(&self, port: PortNumber, component: PowerComponent) -> DriverResult<Option<f64>> {
        self.state_leaf(port, PowerLeaf::Output).await
    }

    /// Instant input power.
    #[instrument(skip(self, component), fields(device = %self.device, component = %component))]
    pub async fn current_input_power(&self, port: PortNumber, component: PowerComponent) -> DriverResult<Option<f64>> {
        self.state_leaf(port, PowerLeaf::Input).await
    }

    async fn state_leaf(&self, port: PortNumber, leaf: PowerLeaf) -> DriverResult<Option<f64>> {
        let name = self.component_name(port)?;
        self.query_leaf(
            "get-optical-channel-state",
            &templates::optical_channel_state_query(&name, leaf),
            leaf.reply_path(),
        )
        .await
    }

    pub fn target_power_range(&self, _port: PortNumber, _component: PowerComponent) -> PowerRange {
        PowerRange {
            min: self.config.target_power_min,
            max: self.config.target_power_max,
        }
    }

    pub fn input_power_range(&self, _port: PortNumber, _component: PowerComponent) -> PowerRange {
        PowerRange {
            min: self.config.input_power_min,
            max: self.config.input_power_max,
        }
    }

    /// Ports whose power can be configured: the line ports.
    pub fn ports(&self, _component: PowerComponent) -> Vec<PortNumber> {
        inventory::line_ports(self.inventory.as_ref(), &self.device)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{StaticInventory, StaticSessionProvider};
    use async_trait::async_trait;
    use odtn_netconf::{DefaultOperation, NetconfResult};
    use odtn_types::{annotations, Port};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Answers every RPC with one canned reply and records edits.
    struct CannedSession {
        reply: String,
        edits: Mutex<Vec<String>>,
        commits: Mutex<usize>,
    }

    impl CannedSession {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                edits: Mutex::new(Vec::new()),
                commits: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl NetconfSession for CannedSession {
        async fn rpc(&self, _request: &str) -> NetconfResult<String> {
            Ok(self.reply.clone())
        }

        async fn edit_config(
            &self,
            _datastore: DatastoreId,
            _default_operation: Option<DefaultOperation>,
            config: &str,
        ) -> NetconfResult<bool> {
            self.edits.lock().unwrap().push(config.to_string());
            Ok(true)
        }

        async fn commit(&self) -> NetconfResult<()> {
            *self.commits.lock().unwrap() += 1;
            Ok(())
        }

        async fn get(&self, _filter: &str) -> NetconfResult<String> {
            Ok(self.reply.clone())
        }
    }

    fn device() -> DeviceId {
        DeviceId::new("t600").unwrap()
    }

    fn power_config(session: Arc<CannedSession>) -> T600PowerConfig {
        let sessions = StaticSessionProvider::new();
        sessions.insert(device(), session);
        let inventory = StaticInventory::new();
        inventory.set_ports(
            device(),
            [
                Port::new(PortNumber::new(11001))
                    .with_annotation(annotations::PORT_TYPE, "LINE")
                    .with_annotation(annotations::OC_OPTICAL_CHANNEL, "otsi-1/1/0/E1"),
                Port::new(PortNumber::new(1101)).with_annotation(annotations::PORT_TYPE, "CLIENT"),
            ],
        );
        T600PowerConfig::new(
            device(),
            Arc::new(sessions),
            Arc::new(inventory),
            PowerConfig::default(),
        )
    }

    const INGRESS: PowerComponent = PowerComponent::Direction(Direction::Ingress);

    #[test]
    fn test_component_parsing() {
        assert_eq!("ingress".parse::<PowerComponent>().unwrap(), INGRESS);
        assert_eq!(
            "EGRESS".parse::<PowerComponent>().unwrap(),
            PowerComponent::Direction(Direction::Egress)
        );
        assert_eq!(
            "och:-3".parse::<PowerComponent>().unwrap(),
            PowerComponent::OchSignal(OchSignal::dwdm(ChannelSpacing::Chl50Ghz, -3))
        );
        assert!(matches!(
            "lambda".parse::<PowerComponent>(),
            Err(DriverError::UnsupportedComponent { .. })
        ));
    }

    #[tokio::test]
    async fn test_target_power() {
        let session = CannedSession::new(
            "<rpc-reply><data><components><component><name>otsi-1/1/0/E1</name>\
             <optical-channel><config><target-output-power>-1.5</target-output-power>\
             </config></optical-channel></component></components></data></rpc-reply>",
        );
        let power = power_config(session);

        let value = power.target_power(PortNumber::new(11001), INGRESS).await.unwrap();
        assert_eq!(value, Some(-1.5));
    }

    #[tokio::test]
    async fn test_current_power_missing_leaf() {
        let session = CannedSession::new("<rpc-reply><data/></rpc-reply>");
        let power = power_config(session);

        assert_eq!(
            power.current_output_power(PortNumber::new(11001), INGRESS).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_current_input_power() {
        let session = CannedSession::new(
            "<rpc-reply><data><components><component><optical-channel><state>\
             <input-power><instant>-12.25</instant></input-power>\
             </state></optical-channel></component></components></data></rpc-reply>",
        );
        let power = power_config(session);

        assert_eq!(
            power.current_input_power(PortNumber::new(11001), INGRESS).await.unwrap(),
            Some(-12.25)
        );
    }

    #[tokio::test]
    async fn test_set_target_power() {
        let session = CannedSession::new("<rpc-reply><ok/></rpc-reply>");
        let power = power_config(session.clone());

        power
            .set_target_power(PortNumber::new(11001), INGRESS, -2.0)
            .await
            .unwrap();

        let edits = session.edits.lock().unwrap().clone();
        assert_eq!(edits, vec![templates::set_target_power("otsi-1/1/0/E1", -2.0)]);
        assert_eq!(*session.commits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_target_power_out_of_range() {
        let session = CannedSession::new("<rpc-reply><ok/></rpc-reply>");
        let power = power_config(session.clone());

        let err = power
            .set_target_power(PortNumber::new(11001), INGRESS, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Parameter { .. }));
        assert!(session.edits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ranges_and_ports() {
        let power = power_config(CannedSession::new(""));
        let range = power.target_power_range(PortNumber::new(11001), INGRESS);
        assert!(range.contains(0.0));
        assert!(!range.contains(-5.0));

        let input = power.input_power_range(PortNumber::new(11001), INGRESS);
        assert_eq!(input, PowerRange { min: -30.0, max: 1.0 });

        assert_eq!(power.ports(INGRESS), vec![PortNumber::new(11001)]);
    }
}
