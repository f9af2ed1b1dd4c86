//! Batch flow-rule programming for one T600 device.
//!
//! Rules in a batch are classified, provisioned and recorded one at a time.
//! A failing rule is logged and left out of the returned collection; the
//! rest of the batch still runs. Only a missing session fails the batch.

use crate::channel::{ChannelProvisioningEngine, ChannelTarget};
use crate::classifier::{self, FlowRuleClassification};
use crate::config::ProvisioningConfig;
use crate::connection_cache::ConnectionCache;
use crate::error::{DriverError, DriverResult};
use crate::inventory::{self, DeviceInventory, SessionProvider};
use crate::port_name::ComponentKind;
use async_trait::async_trait;
use odtn_types::{DeviceId, FlowEntry, FlowRule, PortNumber};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Installs and removes flow rules on a device that cannot report them back.
#[async_trait]
pub trait FlowRuleProgrammable: Send + Sync {
    /// Applies `rules` and returns those that were provisioned.
    async fn apply_flow_rules(&self, rules: Vec<FlowRule>) -> DriverResult<Vec<FlowRule>>;

    /// Removes `rules` and returns those that were de-provisioned.
    async fn remove_flow_rules(&self, rules: Vec<FlowRule>) -> DriverResult<Vec<FlowRule>>;

    /// Rules believed to be installed, with zero counters.
    fn flow_entries(&self) -> Vec<FlowEntry>;
}

/// [`FlowRuleProgrammable`] for the Fujitsu T600.
pub struct T600FlowRuleProgrammable {
    device: DeviceId,
    sessions: Arc<dyn SessionProvider>,
    inventory: Arc<dyn DeviceInventory>,
    cache: Arc<ConnectionCache>,
    provisioning: ProvisioningConfig,
    cancel: CancellationToken,
}

impl T600FlowRuleProgrammable {
    pub fn new(
        device: DeviceId,
        sessions: Arc<dyn SessionProvider>,
        inventory: Arc<dyn DeviceInventory>,
        cache: Arc<ConnectionCache>,
        provisioning: ProvisioningConfig,
    ) -> Self {
        Self {
            device,
            sessions,
            inventory,
            cache,
            provisioning,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancels in-flight settle delays when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn cache(&self) -> &Arc<ConnectionCache> {
        &self.cache
    }

    fn engine(&self) -> DriverResult<ChannelProvisioningEngine> {
        let session = self.sessions.session(&self.device).ok_or_else(|| {
            error!(device = %self.device, "no NETCONF session");
            DriverError::session_unavailable(&self.device)
        })?;
        Ok(
            ChannelProvisioningEngine::new(self.device.clone(), session, &self.provisioning)
                .with_cancellation(self.cancel.clone()),
        )
    }

    fn component(&self, number: PortNumber, kind: ComponentKind) -> DriverResult<String> {
        inventory::component_name(self.inventory.as_ref(), &self.device, number, kind)
    }

    /// Resolves the component names a classified rule operates on.
    pub fn target(&self, classification: &FlowRuleClassification) -> DriverResult<ChannelTarget> {
        match *classification {
            FlowRuleClassification::LineIngress {
                line_port,
                central_frequency,
            }
            | FlowRuleClassification::LineEgress {
                line_port,
                central_frequency,
            } => Ok(ChannelTarget::Line {
                optical_channel: self.component(line_port, ComponentKind::Line)?,
                frequency: central_frequency,
            }),
            FlowRuleClassification::ClientIngress {
                client_port,
                line_port,
            }
            | FlowRuleClassification::ClientEgress {
                client_port,
                line_port,
            } => Ok(ChannelTarget::Client {
                transceiver: self.component(client_port, ComponentKind::Client)?,
                optical_channel: self.component(line_port, ComponentKind::Line)?,
            }),
        }
    }

    /// Classifies and resolves a rule, returning its connection name too.
    fn prepare(
        &self,
        rule: &FlowRule,
        line_ports: &BTreeSet<PortNumber>,
    ) -> DriverResult<(String, ChannelTarget)> {
        let classification = classifier::classify(rule, line_ports)?;
        let name = classifier::connection_name(rule, &classification);
        let target = self.target(&classification)?;
        debug!(device = %self.device, rule = %rule.id, connection = %name, "classified rule");
        Ok((name, target))
    }
}

#[async_trait]
impl FlowRuleProgrammable for T600FlowRuleProgrammable {
    #[instrument(skip(self, rules), fields(device = %self.device, rules = rules.len()))]
    async fn apply_flow_rules(&self, rules: Vec<FlowRule>) -> DriverResult<Vec<FlowRule>> {
        let engine = self.engine()?;
        let line_ports = inventory::line_ports(self.inventory.as_ref(), &self.device);

        let mut added = Vec::with_capacity(rules.len());
        for rule in rules {
            let outcome = match self.prepare(&rule, &line_ports) {
                Ok((name, target)) => engine.apply(&target).await.map(|_| name),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(name) => {
                    info!(device = %self.device, connection = %name, "added flow rule {}", rule.id);
                    self.cache.add(&self.device, name, rule.clone());
                    added.push(rule);
                }
                Err(e) => {
                    error!(device = %self.device, rule = %rule.id, error = %e, "failed to apply flow rule");
                }
            }
        }

        info!(device = %self.device, added = added.len(), "applyFlowRules");
        Ok(added)
    }

    #[instrument(skip(self, rules), fields(device = %self.device, rules = rules.len()))]
    async fn remove_flow_rules(&self, rules: Vec<FlowRule>) -> DriverResult<Vec<FlowRule>> {
        let engine = self.engine()?;
        let line_ports = inventory::line_ports(self.inventory.as_ref(), &self.device);

        let mut removed = Vec::with_capacity(rules.len());
        for rule in rules {
            let outcome = match self.prepare(&rule, &line_ports) {
                Ok((name, target)) => engine.remove(&target).await.map(|_| name),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(name) => {
                    self.cache.remove(&self.device, &name);
                    removed.push(rule);
                }
                Err(e) => {
                    error!(device = %self.device, rule = %rule.id, error = %e, "failed to remove flow rule");
                }
            }
        }

        info!(device = %self.device, removed = removed.len(), "removeFlowRules");
        Ok(removed)
    }

    fn flow_entries(&self) -> Vec<FlowEntry> {
        debug!(device = %self.device, size = self.cache.size(&self.device), "reading connection cache");
        let entries = self.cache.flow_entries(&self.device);
        info!(device = %self.device, fetched = entries.len(), "getFlowEntries");
        entries
    }
}
