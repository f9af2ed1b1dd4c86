//! Simulated T600 NETCONF session
//!
//! Edits go to a candidate buffer and reach the device state on commit, like
//! the real device. Lookups of the logical channel bound to an optical
//! channel are answered from the committed state.

use async_trait::async_trait;
use odtn_netconf::rpc::NETCONF_BASE_NS;
use odtn_netconf::xml::XmlNode;
use odtn_netconf::{DatastoreId, DefaultOperation, NetconfError, NetconfResult, NetconfSession};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;
use tracing::debug;

const LOOKUP_PATH: &str =
    "get/filter/terminal-device/logical-channels/channel/logical-channel-assignments/assignment/state/optical-channel";

/// A request received by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Rpc(String),
    EditConfig {
        datastore: DatastoreId,
        config: String,
    },
    Commit,
    Get(String),
}

/// Injectable failure points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Logical-channel lookups fail at the transport.
    Lookup,
    /// Edit-config is answered without `<ok/>`.
    RejectEdit,
    /// Edit-config fails at the transport.
    EditTransport,
    /// Commit fails; the candidate is discarded.
    Commit,
}

/// Committed device configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// Line logical channels: index to optical channel.
    pub line_channels: BTreeMap<u64, String>,
    /// Client logical channels (OTN and Ethernet) by index.
    pub client_channels: BTreeSet<String>,
    /// Central frequency in MHz per optical channel.
    pub frequencies: BTreeMap<String, u64>,
    /// Target output power per optical channel, as sent.
    pub target_powers: BTreeMap<String, String>,
}

#[derive(Default)]
struct Failures {
    always: Vec<Failure>,
    once: Vec<Failure>,
}

impl Failures {
    fn take(&mut self, failure: Failure) -> bool {
        if self.always.contains(&failure) {
            return true;
        }
        match self.once.iter().position(|f| *f == failure) {
            Some(pos) => {
                self.once.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// In-memory T600 speaking the driver's NETCONF dialect.
#[derive(Default)]
pub struct RecordingSession {
    requests: Mutex<Vec<Request>>,
    state: Mutex<DeviceState>,
    candidate: Mutex<Vec<String>>,
    failures: Mutex<Failures>,
    rpc_replies: Mutex<VecDeque<String>>,
    get_replies: Mutex<VecDeque<String>>,
    components_reply: Mutex<Option<String>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a committed line channel.
    pub fn with_line_channel(self, index: u64, optical_channel: &str) -> Self {
        self.lock_state()
            .line_channels
            .insert(index, optical_channel.to_string());
        self
    }

    /// Reply to the components query used by port discovery.
    pub fn with_components(self, reply: &str) -> Self {
        *self.components_reply.lock().unwrap() = Some(reply.to_string());
        self
    }

    /// Makes every matching request fail.
    pub fn fail_always(&self, failure: Failure) {
        self.failures.lock().unwrap().always.push(failure);
    }

    /// Makes the next matching request fail.
    pub fn fail_once(&self, failure: Failure) {
        self.failures.lock().unwrap().once.push(failure);
    }

    pub fn clear_failures(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }

    /// Queues a reply for the next RPC, ahead of the simulated answers.
    pub fn push_rpc_reply(&self, reply: &str) {
        self.rpc_replies.lock().unwrap().push_back(reply.to_string());
    }

    /// Queues a reply for the next `get`.
    pub fn push_get_reply(&self, reply: &str) {
        self.get_replies.lock().unwrap().push_back(reply.to_string());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Documents of every edit-config, in order.
    pub fn edits(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::EditConfig { config, .. } => Some(config),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, Request::Commit))
            .count()
    }

    /// Snapshot of the committed configuration.
    pub fn state(&self) -> DeviceState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }

    fn fails(&self, failure: Failure) -> bool {
        self.failures.lock().unwrap().take(failure)
    }

    fn lookup_reply(&self, optical_channel: &str) -> String {
        let state = self.lock_state();
        let index = state
            .line_channels
            .iter()
            .find(|(_, oc)| oc.as_str() == optical_channel)
            .map(|(index, _)| *index);

        match index {
            Some(index) => format!(
                "<rpc-reply xmlns=\"{ns}\"><data>\
                 <terminal-device xmlns=\"http://openconfig.net/yang/terminal-device\">\
                 <logical-channels><channel><index>{index}</index>\
                 <logical-channel-assignments><assignment><index>{index}</index><state>\
                 <index>{index}</index><optical-channel>{oc}</optical-channel>\
                 </state></assignment></logical-channel-assignments></channel>\
                 </logical-channels></terminal-device></data></rpc-reply>",
                ns = NETCONF_BASE_NS,
                index = index,
                oc = optical_channel
            ),
            None => empty_data_reply(),
        }
    }

    /// Applies one edit document to `state`.
    fn apply_edit(state: &mut DeviceState, config: &str) -> NetconfResult<()> {
        let doc = XmlNode::parse(&format!(
            "<config xmlns:nc=\"{}\">{}</config>",
            NETCONF_BASE_NS, config
        ))?;

        for channel in doc.find_all("terminal-device/logical-channels/channel") {
            let Some(index) = channel.first_text("index") else {
                continue;
            };
            if channel.attribute("operation") == Some("delete") {
                if let Ok(line) = index.parse::<u64>() {
                    state.line_channels.remove(&line);
                }
                state.client_channels.remove(&index);
                continue;
            }
            match channel.first_text("logical-channel-assignments/assignment/config/optical-channel") {
                Some(oc) => {
                    let line = index
                        .parse::<u64>()
                        .map_err(|_| NetconfError::rpc(format!("invalid index {}", index)))?;
                    state.line_channels.insert(line, oc);
                }
                None => {
                    state.client_channels.insert(index);
                }
            }
        }

        for component in doc.find_all("components/component") {
            let Some(name) = component.first_text("name") else {
                continue;
            };
            if let Some(mhz) = component
                .first_text("optical-channel/config/frequency")
                .and_then(|f| f.parse::<u64>().ok())
            {
                state.frequencies.insert(name.clone(), mhz);
            }
            if let Some(power) = component.first_text("optical-channel/config/target-output-power") {
                state.target_powers.insert(name, power);
            }
        }
        Ok(())
    }
}

fn empty_data_reply() -> String {
    format!("<rpc-reply xmlns=\"{}\"><data/></rpc-reply>", NETCONF_BASE_NS)
}

fn ok_reply() -> String {
    format!("<rpc-reply xmlns=\"{}\"><ok/></rpc-reply>", NETCONF_BASE_NS)
}

#[async_trait]
impl NetconfSession for RecordingSession {
    async fn rpc(&self, request: &str) -> NetconfResult<String> {
        self.record(Request::Rpc(request.to_string()));
        let doc = XmlNode::parse(request)?;
        let lookup = doc.first_text(LOOKUP_PATH);

        if lookup.is_some() && self.fails(Failure::Lookup) {
            return Err(NetconfError::transport("lookup failed"));
        }
        if let Some(reply) = self.rpc_replies.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        if let Some(optical_channel) = lookup {
            return Ok(self.lookup_reply(&optical_channel));
        }
        if doc.find("get/filter/components").is_some() {
            let components = self.components_reply.lock().unwrap().clone();
            return Ok(components.unwrap_or_else(empty_data_reply));
        }
        Ok(ok_reply())
    }

    async fn edit_config(
        &self,
        datastore: DatastoreId,
        _default_operation: Option<DefaultOperation>,
        config: &str,
    ) -> NetconfResult<bool> {
        self.record(Request::EditConfig {
            datastore,
            config: config.to_string(),
        });
        if self.fails(Failure::EditTransport) {
            return Err(NetconfError::transport("edit-config failed"));
        }
        if self.fails(Failure::RejectEdit) {
            return Ok(false);
        }
        self.candidate.lock().unwrap().push(config.to_string());
        Ok(true)
    }

    async fn commit(&self) -> NetconfResult<()> {
        self.record(Request::Commit);
        let pending: Vec<String> = self.candidate.lock().unwrap().drain(..).collect();
        if self.fails(Failure::Commit) {
            return Err(NetconfError::commit_failed("candidate rejected"));
        }

        let mut state = self.lock_state();
        for config in pending {
            Self::apply_edit(&mut state, &config)?;
        }
        debug!(state = ?*state, "committed");
        Ok(())
    }

    async fn get(&self, filter: &str) -> NetconfResult<String> {
        self.record(Request::Get(filter.to_string()));
        Ok(self
            .get_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(empty_data_reply))
    }
}
