//! Logical-channel provisioning.
//!
//! Each line port moves through
//! `ABSENT -> CREATING -> CONFIGURED -> (ASSIGNING -> ASSIGNED)* -> DELETING -> ABSENT`.
//! No state is kept between calls: every operation first asks the device
//! for the logical channel bound to the line port's optical channel and
//! treats "not found" as `ABSENT`. That lookup makes creation idempotent.
//!
//! Apply, line side:
//! 1. look up the line channel, create it if absent (failure logged only)
//! 2. settle delay
//! 3. set central frequency and target output power
//!
//! Apply, client side:
//! 1. look up the line channel, create it if absent (failure logged only)
//! 2. settle delay
//! 3. look up the line channel again and write the OTN + Ethernet client channels
//!
//! Every edit goes to the candidate datastore and is committed on its own;
//! there is no rollback across steps.

use crate::config::{LineChannelIndex, ProvisioningConfig};
use crate::error::{DriverError, DriverResult};
use crate::port_name;
use crate::templates;
use odtn_netconf::xml::XmlNode;
use odtn_netconf::{DatastoreId, NetconfError, NetconfSession};
use odtn_types::{DeviceId, Frequency};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// What a classified rule asks of the device, by component name.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTarget {
    /// Tune a line optical channel.
    Line {
        optical_channel: String,
        frequency: Frequency,
    },
    /// Map a client transceiver onto a line optical channel.
    Client {
        transceiver: String,
        optical_channel: String,
    },
}

impl ChannelTarget {
    pub fn optical_channel(&self) -> &str {
        match self {
            ChannelTarget::Line {
                optical_channel, ..
            }
            | ChannelTarget::Client {
                optical_channel, ..
            } => optical_channel,
        }
    }
}

/// Indices of the two logical channels carrying one client.
///
/// Both are textual concatenations: OTN is line index and client suffix,
/// Ethernet puts a `0` between them (line 10, client C3: `103` and `1003`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientChannels {
    /// Index of the line logical channel the client is assigned to.
    pub line: u64,
    /// Index of the OTN client logical channel.
    pub otn: String,
    /// Index of the Ethernet client logical channel.
    pub ethernet: String,
}

impl ClientChannels {
    pub fn derive(line_index: u64, client_suffix: &str) -> Self {
        Self {
            line: line_index,
            otn: format!("{}{}", line_index, client_suffix),
            ethernet: format!("{}0{}", line_index, client_suffix),
        }
    }

    /// Derives the indices from a client component name.
    pub fn for_client(line_index: u64, transceiver: &str) -> DriverResult<Self> {
        let suffix = port_name::client_suffix(transceiver)?;
        Ok(Self::derive(line_index, &suffix))
    }
}

/// Runs provisioning sequences against one device session.
pub struct ChannelProvisioningEngine {
    device: DeviceId,
    session: Arc<dyn NetconfSession>,
    line_index: LineChannelIndex,
    settle_delay: Duration,
    target_power: f64,
    cancel: CancellationToken,
}

impl ChannelProvisioningEngine {
    pub fn new(
        device: DeviceId,
        session: Arc<dyn NetconfSession>,
        config: &ProvisioningConfig,
    ) -> Self {
        Self {
            device,
            session,
            line_index: config.line_channel_index.clone(),
            settle_delay: config.settle_delay(),
            target_power: config.default_target_power,
            cancel: CancellationToken::new(),
        }
    }

    /// Interrupts settle delays when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Index of the logical channel assigned to `optical_channel`, if any.
    pub async fn logical_channel_index(&self, optical_channel: &str) -> DriverResult<Option<u64>> {
        let request = templates::logical_channel_query(optical_channel);
        let reply = self
            .session
            .rpc(&request)
            .await
            .map_err(|e| DriverError::channel_discovery(optical_channel, e.to_string()))?;
        debug!(device = %self.device, "logical channel reply {}", reply);

        let doc = XmlNode::parse(&reply)
            .map_err(|e| DriverError::channel_discovery(optical_channel, e.to_string()))?;
        match doc.first_text(templates::LOGICAL_CHANNEL_INDEX_PATH) {
            None => Ok(None),
            Some(text) => text.parse::<u64>().map(Some).map_err(|_| {
                DriverError::channel_discovery(
                    optical_channel,
                    format!("index '{}' is not a number", text),
                )
            }),
        }
    }

    /// Lookup where a failed query counts as "absent".
    async fn discover_or_absent(&self, optical_channel: &str) -> Option<u64> {
        match self.logical_channel_index(optical_channel).await {
            Ok(index) => index,
            Err(e) => {
                warn!(device = %self.device, port = optical_channel, error = %e,
                    "logical channel lookup failed, assuming absent");
                None
            }
        }
    }

    /// Creates the line channel unless the device already has one.
    ///
    /// The index table is consulted only when creating, so a channel that
    /// exists on the device needs no table entry. Only an unknown line port is
    /// an error; device failures are logged so the next step still runs
    /// against a channel that may exist already.
    async fn ensure_line_channel(&self, optical_channel: &str) -> DriverResult<()> {
        if let Some(existing) = self.discover_or_absent(optical_channel).await {
            debug!(device = %self.device, port = optical_channel, index = existing,
                "logical channel already present, skipping creation");
            return Ok(());
        }

        let index = self.line_index.lookup(optical_channel)?;
        if let Err(e) = self.create_line_channel(optical_channel, index).await {
            error!(device = %self.device, port = optical_channel, error = %e,
                "creating line logical channel failed");
        }
        Ok(())
    }

    pub async fn create_line_channel(&self, optical_channel: &str, index: u64) -> DriverResult<()> {
        info!(device = %self.device, port = optical_channel, index, "creating line logical channel");
        self.edit_and_commit(
            "create-line-channel",
            &templates::create_line_channel(optical_channel, index),
        )
        .await
    }

    pub async fn set_frequency(&self, optical_channel: &str, frequency: Frequency) -> DriverResult<()> {
        if !frequency.is_positive() {
            return Err(DriverError::parameter(
                "central-frequency",
                "frequency must be positive",
            ));
        }
        self.edit_and_commit(
            "set-frequency",
            &templates::set_frequency(optical_channel, frequency.as_mhz(), self.target_power),
        )
        .await?;
        info!(device = %self.device, port = optical_channel, "frequency set to {}", frequency);
        Ok(())
    }

    pub async fn set_client_assignment(&self, transceiver: &str, channels: &ClientChannels) -> DriverResult<()> {
        info!(device = %self.device, client = transceiver, otn = %channels.otn,
            ethernet = %channels.ethernet, "assigning client to line channel {}", channels.line);
        self.edit_and_commit(
            "set-client-assignment",
            &templates::client_assignment(transceiver, channels.line, &channels.otn, &channels.ethernet),
        )
        .await
    }

    pub async fn delete_logical_channel(&self, index: u64) -> DriverResult<()> {
        info!(device = %self.device, index, "deleting logical channel");
        self.edit_and_commit("delete-logical-channel", &templates::delete_logical_channel(index))
            .await
    }

    pub async fn delete_client_assignment(&self, channels: &ClientChannels) -> DriverResult<()> {
        info!(device = %self.device, otn = %channels.otn, ethernet = %channels.ethernet,
            "deleting client logical channels");
        self.edit_and_commit(
            "delete-client-assignment",
            &templates::delete_client_assignment(&channels.otn, &channels.ethernet),
        )
        .await
    }

    /// Waits for the device to apply a created resource.
    async fn settle(&self, component: &str) -> DriverResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(device = %self.device, port = component, "settle delay cancelled");
                Err(DriverError::Cancelled { port: component.to_string() })
            }
            _ = tokio::time::sleep(self.settle_delay) => Ok(()),
        }
    }

    async fn edit_and_commit(&self, operation: &str, config: &str) -> DriverResult<()> {
        debug!(device = %self.device, operation, "edit-config {}", config);
        let ok = self
            .session
            .edit_config(DatastoreId::Candidate, None, config)
            .await
            .map_err(|e| DriverError::protocol(operation, e))?;
        if !ok {
            return Err(DriverError::protocol(
                operation,
                NetconfError::edit_rejected(DatastoreId::Candidate.as_str(), "device did not answer <ok/>"),
            ));
        }
        self.session
            .commit()
            .await
            .map_err(|e| DriverError::protocol(operation, e))
    }

    /// Provisions a target. Ingress and egress of the same pair send the same documents.
    #[instrument(skip(self), fields(device = %self.device))]
    pub async fn apply(&self, target: &ChannelTarget) -> DriverResult<()> {
        match target {
            ChannelTarget::Line {
                optical_channel,
                frequency,
            } => {
                info!(port = %optical_channel, "provisioning line channel at {}", frequency);
                self.ensure_line_channel(optical_channel).await?;
                self.settle(optical_channel).await?;
                self.set_frequency(optical_channel, *frequency).await
            }
            ChannelTarget::Client {
                transceiver,
                optical_channel,
            } => {
                info!(client = %transceiver, port = %optical_channel, "provisioning client channel");
                self.ensure_line_channel(optical_channel).await?;
                self.settle(optical_channel).await?;

                let line_index = match self.logical_channel_index(optical_channel).await? {
                    Some(index) => index,
                    None => {
                        let index = self.line_index.lookup(optical_channel)?;
                        warn!(port = %optical_channel, index,
                            "line channel not reported after creation, using configured index");
                        index
                    }
                };
                let channels = ClientChannels::for_client(line_index, transceiver)?;
                self.set_client_assignment(transceiver, &channels).await
            }
        }
    }

    /// De-provisions a target. A channel that is already gone counts as removed.
    #[instrument(skip(self), fields(device = %self.device))]
    pub async fn remove(&self, target: &ChannelTarget) -> DriverResult<()> {
        let optical_channel = target.optical_channel();
        let Some(line_index) = self.logical_channel_index(optical_channel).await? else {
            warn!(port = %optical_channel, "no logical channel found, nothing to remove");
            return Ok(());
        };

        match target {
            ChannelTarget::Line { .. } => self.delete_logical_channel(line_index).await,
            ChannelTarget::Client { transceiver, .. } => {
                let channels = ClientChannels::for_client(line_index, transceiver)?;
                self.delete_client_assignment(&channels).await
            }
        }
    }
}
