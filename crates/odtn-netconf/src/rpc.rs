//! NETCONF 1.0 request envelopes and reply checks.

use crate::error::{NetconfError, NetconfResult};
use crate::session::{DatastoreId, DefaultOperation};
use crate::xml::XmlNode;

/// NETCONF base namespace.
pub const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Opening tag of an `<rpc>` without a message-id.
pub const RPC_TAG_NETCONF_BASE: &str = "<rpc xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">";

pub const RPC_CLOSE_TAG: &str = "</rpc>";

/// End-of-message marker for NETCONF 1.0 framing.
pub const EOM_DELIMITER: &str = "]]>]]>";

/// Base capability advertised in the client hello.
pub const BASE_CAPABILITY: &str = "urn:ietf:params:netconf:base:1.0";

/// `<get>` with a subtree filter, in the exact form devices are sent.
pub fn filtered_get(filter: &str) -> String {
    let mut rpc = String::from(RPC_TAG_NETCONF_BASE);
    rpc.push_str("<get>");
    rpc.push_str("<filter type='subtree'>");
    rpc.push_str(filter);
    rpc.push_str("</filter>");
    rpc.push_str("</get>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

/// `<edit-config>` envelope.
///
/// The `<config>` element declares the `nc` prefix so bodies may carry
/// `nc:operation` attributes.
pub fn edit_config(
    message_id: u64,
    datastore: DatastoreId,
    default_operation: Option<DefaultOperation>,
    config: &str,
) -> String {
    let mut rpc = open_rpc(message_id);
    rpc.push_str("<edit-config>");
    rpc.push_str(&format!("<target><{}/></target>", datastore.as_str()));
    if let Some(op) = default_operation {
        rpc.push_str(&format!(
            "<default-operation>{}</default-operation>",
            op.as_str()
        ));
    }
    rpc.push_str(&format!("<config xmlns:nc=\"{}\">", NETCONF_BASE_NS));
    rpc.push_str(config);
    rpc.push_str("</config>");
    rpc.push_str("</edit-config>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

pub fn commit(message_id: u64) -> String {
    let mut rpc = open_rpc(message_id);
    rpc.push_str("<commit/>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

pub fn get(message_id: u64, filter: &str) -> String {
    let mut rpc = open_rpc(message_id);
    rpc.push_str("<get><filter type=\"subtree\">");
    rpc.push_str(filter);
    rpc.push_str("</filter></get>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

pub fn close_session(message_id: u64) -> String {
    let mut rpc = open_rpc(message_id);
    rpc.push_str("<close-session/>");
    rpc.push_str(RPC_CLOSE_TAG);
    rpc
}

/// Client `<hello>` advertising the base capability.
pub fn hello() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <hello xmlns=\"{}\"><capabilities><capability>{}</capability></capabilities></hello>",
        NETCONF_BASE_NS, BASE_CAPABILITY
    )
}

/// Inserts a `message-id` into an `<rpc>` that does not carry one.
pub fn with_message_id(request: &str, message_id: u64) -> String {
    let trimmed = request.trim_start();
    match trimmed.strip_prefix("<rpc") {
        Some(rest) if !trimmed.contains("message-id") => {
            format!("<rpc message-id=\"{}\"{}", message_id, rest)
        }
        _ => request.to_string(),
    }
}

fn open_rpc(message_id: u64) -> String {
    format!(
        "<rpc message-id=\"{}\" xmlns=\"{}\">",
        message_id, NETCONF_BASE_NS
    )
}

/// Returns true if the reply is an `<rpc-reply>` carrying `<ok/>`.
pub fn is_ok_reply(reply: &str) -> bool {
    XmlNode::parse(reply)
        .map(|root| root.child("ok").is_some())
        .unwrap_or(false)
}

/// Fails with [`NetconfError::Rpc`] if the reply carries an `<rpc-error>`.
pub fn check_reply(reply: &str) -> NetconfResult<()> {
    let root = XmlNode::parse(reply)?;
    match root.child("rpc-error") {
        Some(err) => Err(NetconfError::rpc(
            err.first_text("error-message")
                .or_else(|| err.first_text("error-tag"))
                .unwrap_or_else(|| "unspecified rpc-error".to_string()),
        )),
        None => Ok(()),
    }
}

/// Capabilities advertised in a server `<hello>`.
pub fn hello_capabilities(hello: &str) -> NetconfResult<Vec<String>> {
    let root = XmlNode::parse(hello)?;
    if root.name() != "hello" {
        return Err(NetconfError::malformed(format!(
            "expected <hello>, got <{}>",
            root.name()
        )));
    }
    Ok(root
        .find_all("capabilities/capability")
        .into_iter()
        .map(|c| c.text().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filtered_get() {
        assert_eq!(
            filtered_get("<components/>"),
            "<rpc xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\"><get>\
             <filter type='subtree'><components/></filter></get></rpc>"
        );
    }

    #[test]
    fn test_edit_config_candidate() {
        let rpc = edit_config(3, DatastoreId::Candidate, None, "<a/>");
        assert_eq!(
            rpc,
            "<rpc message-id=\"3\" xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">\
             <edit-config><target><candidate/></target>\
             <config xmlns:nc=\"urn:ietf:params:xml:ns:netconf:base:1.0\"><a/></config>\
             </edit-config></rpc>"
        );
    }

    #[test]
    fn test_edit_config_default_operation() {
        let rpc = edit_config(4, DatastoreId::Running, Some(DefaultOperation::Merge), "<a/>");
        assert!(rpc.contains("<target><running/></target><default-operation>merge</default-operation>"));
    }

    #[test]
    fn test_with_message_id() {
        let rpc = with_message_id(&filtered_get("<x/>"), 12);
        assert!(rpc.starts_with("<rpc message-id=\"12\" xmlns="));

        let already = commit(5);
        assert_eq!(with_message_id(&already, 6), already);
    }

    #[test]
    fn test_ok_reply() {
        assert!(is_ok_reply(
            "<rpc-reply xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\" message-id=\"1\"><ok/></rpc-reply>"
        ));
        assert!(!is_ok_reply("<rpc-reply><data/></rpc-reply>"));
        assert!(!is_ok_reply("not xml"));
    }

    #[test]
    fn test_check_reply_error() {
        let reply = "<rpc-reply><rpc-error><error-tag>in-use</error-tag>\
                     <error-message>locked by another session</error-message></rpc-error></rpc-reply>";
        let err = check_reply(reply).unwrap_err();
        assert_eq!(err.to_string(), "RPC error: locked by another session");

        assert!(check_reply("<rpc-reply><ok/></rpc-reply>").is_ok());
    }

    #[test]
    fn test_hello_capabilities() {
        let hello = "<hello xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\"><capabilities>\
                     <capability>urn:ietf:params:netconf:base:1.0</capability>\
                     <capability>urn:ietf:params:netconf:capability:candidate:1.0</capability>\
                     </capabilities><session-id>42</session-id></hello>";
        let caps = hello_capabilities(hello).unwrap();
        assert_eq!(caps.len(), 2);
        assert!(caps[1].contains("candidate"));

        assert!(hello_capabilities("<rpc-reply/>").is_err());
    }
}
