//! Bit error rate of line ports.

use crate::config::LineChannelIndex;
use crate::error::{DriverError, DriverResult};
use crate::inventory::SessionProvider;
use crate::port_name::ComponentName;
use crate::templates;
use odtn_netconf::xml::XmlNode;
use odtn_types::{DeviceId, PortNumber};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Reads FEC counters from the OTN state of a line port's logical channel.
pub struct T600BitErrorRate {
    device: DeviceId,
    sessions: Arc<dyn SessionProvider>,
    line_index: LineChannelIndex,
}

impl T600BitErrorRate {
    pub fn new(device: DeviceId, sessions: Arc<dyn SessionProvider>, line_index: LineChannelIndex) -> Self {
        Self {
            device,
            sessions,
            line_index,
        }
    }

    /// Logical-channel index carrying the OTN state of a port, or `None` for
    /// client ports.
    fn slot_index(&self, port: PortNumber) -> DriverResult<Option<u64>> {
        let name = ComponentName::from_port_number(port)?;
        if !name.is_line() {
            return Ok(None);
        }
        self.line_index.lookup(&name.component_name()).map(Some)
    }

    /// Instant pre-FEC bit error rate.
    #[instrument(skip(self), fields(device = %self.device, port = %port))]
    pub async fn pre_fec_ber(&self, port: PortNumber) -> DriverResult<Option<f64>> {
        let Some(index) = self.slot_index(port)? else {
            debug!("not a line port, no pre-FEC BER");
            return Ok(None);
        };

        let session = self
            .sessions
            .session(&self.device)
            .ok_or_else(|| DriverError::session_unavailable(&self.device))?;
        let reply = session
            .get(&templates::otn_state_filter(index))
            .await
            .map_err(|e| DriverError::protocol("get-pre-fec-ber", e))?;
        debug!(index, "reply {}", reply);

        let doc = XmlNode::parse(&reply).map_err(|e| DriverError::protocol("get-pre-fec-ber", e))?;
        let Some(text) = doc.first_text(templates::PRE_FEC_BER_PATH) else {
            return Ok(None);
        };
        match text.parse::<f64>() {
            Ok(ber) => Ok(Some(ber)),
            Err(_) => {
                warn!(value = %text, "pre-FEC BER is not a number");
                Ok(None)
            }
        }
    }

    /// The device does not report post-FEC BER.
    pub async fn post_fec_ber(&self, _port: PortNumber) -> DriverResult<Option<f64>> {
        Ok(None)
    }
}
