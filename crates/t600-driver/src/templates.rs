//! Request documents sent to the T600.
//!
//! The device is sensitive to the exact shape of these documents, including
//! quoting of namespace declarations, so they are produced verbatim rather
//! than serialized from a tree.

use odtn_netconf::rpc::{self, RPC_CLOSE_TAG, RPC_TAG_NETCONF_BASE};

pub const OPERATION_ENABLE: &str = "ENABLED";

pub const OC_TYPE_PROT_OTN: &str = "oc-opt-types:PROT_OTN";
pub const OC_TYPE_PROT_ETH: &str = "oc-opt-types:PROT_ETHERNET";
pub const OC_TYPE_PROT_ODUCN: &str = "oc-opt-types:PROT_ODUCN";
pub const OC_TYPE_TRIB_RATE_100G: &str = "oc-opt-types:TRIB_RATE_100G";
pub const OC_TYPE_PROT_100GE: &str = "oc-opt-types:PROT_100GE";
pub const OC_TYPE_PROT_ODU4: &str = "oc-opt-types:PROT_ODU4";

/// Reply path of a logical channel's index, looked up by optical channel.
pub const LOGICAL_CHANNEL_INDEX_PATH: &str =
    "data/terminal-device/logical-channels/channel/logical-channel-assignments/assignment/state/index";

pub const PRE_FEC_BER_PATH: &str =
    "data/terminal-device/logical-channels/channel/otn/state/pre-fec-ber/instant";

pub const TARGET_OUTPUT_POWER_PATH: &str =
    "data/components/component/optical-channel/config/target-output-power";

pub const OUTPUT_POWER_PATH: &str =
    "data/components/component/optical-channel/state/output-power/instant";

pub const INPUT_POWER_PATH: &str =
    "data/components/component/optical-channel/state/input-power/instant";

pub const COMPONENT_STATE_PATH: &str = "data/components/component/state";

pub const COMPONENTS_PATH: &str = "data/components";

/// Filtered get for the logical channel assigned to `optical_channel`.
pub fn logical_channel_query(optical_channel: &str) -> String {
    rpc::filtered_get(&format!(
        concat!(
            "<terminal-device xmlns='http://openconfig.net/yang/terminal-device'>",
            "<logical-channels>",
            "<channel>",
            "<logical-channel-assignments>",
            "<assignment>",
            "<state>",
            "<optical-channel>{oc}</optical-channel>",
            "</state>",
            "</assignment>",
            "</logical-channel-assignments>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        oc = optical_channel
    ))
}

/// OTN logical channel over a line optical channel.
pub fn create_line_channel(optical_channel: &str, index: u64) -> String {
    format!(
        concat!(
            "<terminal-device xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<logical-channels>",
            "<channel>",
            "<index>{index}</index>",
            "<config>",
            "<index>{index}</index>",
            "<admin-state>{admin}</admin-state>",
            "<trib-protocol xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{trib}</trib-protocol>",
            "<logical-channel-type xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{otn}</logical-channel-type>",
            "<test-signal>false</test-signal>",
            "</config>",
            "<otn>",
            "<config>",
            "<tti-msg-transmit>hello</tti-msg-transmit>",
            "<tti-msg-expected>hello</tti-msg-expected>",
            "</config>",
            "</otn>",
            "<logical-channel-assignments>",
            "<assignment>",
            "<index>{index}</index>",
            "<config>",
            "<index>{index}</index>",
            "<assignment-type>OPTICAL_CHANNEL</assignment-type>",
            "<optical-channel>{oc}</optical-channel>",
            "</config>",
            "</assignment>",
            "</logical-channel-assignments>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        index = index,
        admin = OPERATION_ENABLE,
        trib = OC_TYPE_PROT_ODUCN,
        otn = OC_TYPE_PROT_OTN,
        oc = optical_channel
    )
}

pub fn delete_logical_channel(index: u64) -> String {
    format!(
        concat!(
            "<terminal-device xmlns='http://openconfig.net/yang/terminal-device'>",
            "<logical-channels>",
            "<channel nc:operation=\"delete\">",
            "<index>{index}</index>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        index = index
    )
}

/// Central frequency (whole MHz) and target output power of an optical channel.
pub fn set_frequency(optical_channel: &str, frequency_mhz: u64, target_power: f64) -> String {
    format!(
        concat!(
            "<components xmlns='http://openconfig.net/yang/platform'>",
            "<component>",
            "<name>{oc}</name>",
            "<config>",
            "<name>{oc}</name>",
            "</config>",
            "<optical-channel xmlns='http://openconfig.net/yang/terminal-device'>",
            "<config>",
            "<frequency>{mhz}</frequency>",
            "<target-output-power>{power}</target-output-power>",
            "</config>",
            "</optical-channel>",
            "</component>",
            "</components>"
        ),
        oc = optical_channel,
        mhz = frequency_mhz,
        power = format_power(target_power)
    )
}

/// OTN and Ethernet logical channels mapping a client transceiver onto a line channel.
pub fn client_assignment(
    transceiver: &str,
    line_index: u64,
    otn_index: &str,
    ethernet_index: &str,
) -> String {
    format!(
        concat!(
            "<terminal-device xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<logical-channels>",
            "<channel>",
            "<index>{otn}</index>",
            "<config>",
            "<index>{otn}</index>",
            "<admin-state>{admin}</admin-state>",
            "<rate-class xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{rate}</rate-class>",
            "<trib-protocol xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{odu4}</trib-protocol>",
            "<logical-channel-type xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{prot_otn}</logical-channel-type>",
            "</config>",
            "<logical-channel-assignments>",
            "<assignment>",
            "<index>{line}</index>",
            "<config>",
            "<index>{line}</index>",
            "<assignment-type>LOGICAL_CHANNEL</assignment-type>",
            "<logical-channel>{line}</logical-channel>",
            "</config>",
            "</assignment>",
            "</logical-channel-assignments>",
            "</channel>",
            "</logical-channels>",
            "<logical-channels>",
            "<channel>",
            "<index>{eth}</index>",
            "<config>",
            "<index>{eth}</index>",
            "<admin-state>{admin}</admin-state>",
            "<rate-class xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{rate}</rate-class>",
            "<trib-protocol xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{ge100}</trib-protocol>",
            "<logical-channel-type xmlns:oc-opt-types=\"http://openconfig.net/yang/transport-types\">{prot_eth}</logical-channel-type>",
            "<loopback-mode>NONE</loopback-mode>",
            "<test-signal>false</test-signal>",
            "</config>",
            "<ingress>",
            "<config>",
            "<transceiver>{transceiver}</transceiver>",
            "</config>",
            "</ingress>",
            "<logical-channel-assignments>",
            "<assignment>",
            "<index>{line}</index>",
            "<config>",
            "<index>{line}</index>",
            "<assignment-type>LOGICAL_CHANNEL</assignment-type>",
            "<logical-channel>{otn}</logical-channel>",
            "</config>",
            "</assignment>",
            "</logical-channel-assignments>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        otn = otn_index,
        eth = ethernet_index,
        line = line_index,
        admin = OPERATION_ENABLE,
        rate = OC_TYPE_TRIB_RATE_100G,
        odu4 = OC_TYPE_PROT_ODU4,
        ge100 = OC_TYPE_PROT_100GE,
        prot_otn = OC_TYPE_PROT_OTN,
        prot_eth = OC_TYPE_PROT_ETH,
        transceiver = transceiver.replacen(
            crate::port_name::PREFIX_PORT,
            crate::port_name::PREFIX_TRANSCEIVER,
            1
        )
    )
}

pub fn delete_client_assignment(otn_index: &str, ethernet_index: &str) -> String {
    format!(
        concat!(
            "<terminal-device xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<logical-channels>",
            "<channel nc:operation=\"delete\">",
            "<index>{otn}</index>",
            "</channel>",
            "<channel nc:operation=\"delete\">",
            "<index>{eth}</index>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        otn = otn_index,
        eth = ethernet_index
    )
}

/// Components with their operational state only.
pub fn device_details_query() -> String {
    rpc::filtered_get(concat!(
        "<components xmlns='http://openconfig.net/yang/platform'>",
        "<component>",
        "<state>",
        "</state>",
        "</component>",
        "</components>"
    ))
}

/// All components, config and state.
pub fn components_query() -> String {
    rpc::filtered_get("<components xmlns='http://openconfig.net/yang/platform'></components>")
}

/// Subtree filter for the OTN state of an enabled logical channel.
pub fn otn_state_filter(index: u64) -> String {
    format!(
        concat!(
            "<terminal-device xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<logical-channels>",
            "<channel>",
            "<index>{index}</index>",
            "<config>",
            "<admin-state>{admin}</admin-state>",
            "</config>",
            "<otn/>",
            "<state/>",
            "</channel>",
            "</logical-channels>",
            "</terminal-device>"
        ),
        index = index,
        admin = OPERATION_ENABLE
    )
}

fn optical_channel_config(component: &str, target_power: Option<f64>) -> String {
    let leaf = target_power
        .map(|p| format!("<target-output-power>{}</target-output-power>", format_power(p)))
        .unwrap_or_default();
    format!(
        concat!(
            "<components xmlns=\"http://openconfig.net/yang/platform\">",
            "<component>",
            "<name>{name}</name>",
            "<config>",
            "<name>{name}</name>",
            "</config>",
            "<optical-channel xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<config>",
            "{leaf}",
            "</config>",
            "</optical-channel>",
            "</component>",
            "</components>"
        ),
        name = component,
        leaf = leaf
    )
}

/// `<get-config>` of the running optical-channel config of a component.
pub fn target_power_query(component: &str) -> String {
    let mut rpc = String::from(RPC_TAG_NETCONF_BASE);
    rpc.push_str("<get-config>");
    rpc.push_str("<source><running/></source>");
    rpc.push_str("<filter type='subtree'>");
    rpc.push_str(&optical_channel_config(component, None));
    rpc.push_str("</filter>");
    rpc.push_str("</get-config>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

/// Edit-config body setting the target output power of a component.
pub fn set_target_power(component: &str, power: f64) -> String {
    optical_channel_config(component, Some(power))
}

/// Optical-channel state leaf to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerLeaf {
    Output,
    Input,
}

impl PowerLeaf {
    fn route(&self) -> &'static str {
        match self {
            PowerLeaf::Output => "<output-power><instant/></output-power>",
            PowerLeaf::Input => "<input-power><instant/></input-power>",
        }
    }

    pub fn reply_path(&self) -> &'static str {
        match self {
            PowerLeaf::Output => OUTPUT_POWER_PATH,
            PowerLeaf::Input => INPUT_POWER_PATH,
        }
    }
}

/// Filtered get of one optical-channel state leaf of a component.
pub fn optical_channel_state_query(component: &str, leaf: PowerLeaf) -> String {
    rpc::filtered_get(&format!(
        concat!(
            "<components xmlns=\"http://openconfig.net/yang/platform\">",
            "<component>",
            "<name>{name}</name>",
            "<optical-channel xmlns=\"http://openconfig.net/yang/terminal-device\">",
            "<state>{route}</state>",
            "</optical-channel>",
            "</component>",
            "</components>"
        ),
        name = component,
        route = leaf.route()
    ))
}

/// Decimal rendering with at least one fractional digit (`0.0`, `-2.5`).
fn format_power(power: f64) -> String {
    let s = power.to_string();
    if s.contains('.') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{}.0", s)
    }
}
