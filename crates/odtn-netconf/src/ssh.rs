//! NETCONF 1.0 over an SSH `netconf` subsystem.
//!
//! libssh2 is blocking, so every exchange runs on the blocking pool while
//! holding the connection lock. One request is in flight per session.

use async_trait::async_trait;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{NetconfError, NetconfResult};
use crate::rpc;
use crate::session::{DatastoreId, DefaultOperation, NetconfSession};

/// Connection parameters for [`SshNetconfSession::connect`].
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

struct Connection {
    session: ssh2::Session,
    channel: ssh2::Channel,
}

impl Connection {
    fn open(target: &SshTarget) -> NetconfResult<Self> {
        let tcp = TcpStream::connect((target.host.as_str(), target.port))?;
        let mut session = ssh2::Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(target.timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake()?;
        session.userauth_password(&target.username, &target.password)?;
        if !session.authenticated() {
            return Err(NetconfError::transport(format!(
                "authentication failed for {}@{}",
                target.username, target.host
            )));
        }

        let mut channel = session.channel_session()?;
        channel.subsystem("netconf")?;
        Ok(Self { session, channel })
    }

    fn send(&mut self, message: &str) -> NetconfResult<()> {
        self.channel.write_all(message.as_bytes())?;
        self.channel.write_all(rpc::EOM_DELIMITER.as_bytes())?;
        self.channel.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> NetconfResult<String> {
        let delimiter = rpc::EOM_DELIMITER.as_bytes();
        let mut message = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = self.channel.read(&mut buf)?;
            if n == 0 {
                return Err(NetconfError::Closed);
            }
            message.extend_from_slice(&buf[..n]);
            if let Some(pos) = message
                .windows(delimiter.len())
                .position(|w| w == delimiter)
            {
                message.truncate(pos);
                return String::from_utf8(message)
                    .map_err(|e| NetconfError::malformed(e.to_string()));
            }
        }
    }

    fn exchange(&mut self, request: &str) -> NetconfResult<String> {
        self.send(request)?;
        self.receive()
    }
}

/// A NETCONF session to one device.
pub struct SshNetconfSession {
    conn: Arc<Mutex<Connection>>,
    next_message_id: AtomicU64,
    capabilities: Vec<String>,
    endpoint: String,
}

impl SshNetconfSession {
    /// Connects, authenticates and exchanges hellos.
    #[instrument(skip(target), fields(host = %target.host, port = target.port))]
    pub async fn connect(target: SshTarget) -> NetconfResult<Self> {
        let endpoint = format!("{}:{}", target.host, target.port);
        let (conn, server_hello) = tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&target)?;
            conn.send(&rpc::hello())?;
            let server_hello = conn.receive()?;
            Ok::<_, NetconfError>((conn, server_hello))
        })
        .await
        .map_err(|e| NetconfError::transport(format!("connect task failed: {}", e)))??;

        let capabilities = rpc::hello_capabilities(&server_hello)?;
        info!(
            endpoint = %endpoint,
            capabilities = capabilities.len(),
            "NETCONF session established"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            next_message_id: AtomicU64::new(1),
            capabilities,
            endpoint,
        })
    }

    /// Capabilities advertised by the server.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn message_id(&self) -> u64 {
        self.next_message_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn exchange(&self, request: String) -> NetconfResult<String> {
        debug!(endpoint = %self.endpoint, "sending {}", request);
        let conn = Arc::clone(&self.conn);
        let reply = tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            conn.exchange(&request)
        })
        .await
        .map_err(|e| NetconfError::transport(format!("exchange task failed: {}", e)))??;
        debug!(endpoint = %self.endpoint, "received {}", reply);
        Ok(reply)
    }

    /// Sends `<close-session>` and disconnects.
    pub async fn close(self) -> NetconfResult<()> {
        let request = rpc::close_session(self.message_id());
        if let Err(e) = self.exchange(request).await {
            warn!(endpoint = %self.endpoint, error = %e, "close-session failed");
        }
        let conn = self.conn.lock().await;
        conn.session
            .disconnect(Some(ssh2::DisconnectCode::ByApplication), "bye", None)?;
        Ok(())
    }
}

#[async_trait]
impl NetconfSession for SshNetconfSession {
    async fn rpc(&self, request: &str) -> NetconfResult<String> {
        let request = rpc::with_message_id(request, self.message_id());
        let reply = self.exchange(request).await?;
        rpc::check_reply(&reply)?;
        Ok(reply)
    }

    async fn edit_config(
        &self,
        datastore: DatastoreId,
        default_operation: Option<DefaultOperation>,
        config: &str,
    ) -> NetconfResult<bool> {
        let request = rpc::edit_config(self.message_id(), datastore, default_operation, config);
        let reply = self.exchange(request).await?;
        if let Err(e) = rpc::check_reply(&reply) {
            warn!(endpoint = %self.endpoint, datastore = %datastore, error = %e, "edit-config rejected");
            return Ok(false);
        }
        Ok(rpc::is_ok_reply(&reply))
    }

    async fn commit(&self) -> NetconfResult<()> {
        let reply = self.exchange(rpc::commit(self.message_id())).await?;
        match rpc::check_reply(&reply) {
            Ok(()) if rpc::is_ok_reply(&reply) => Ok(()),
            Ok(()) => Err(NetconfError::commit_failed("reply carried no <ok/>")),
            Err(e) => Err(NetconfError::commit_failed(e.to_string())),
        }
    }

    async fn get(&self, filter: &str) -> NetconfResult<String> {
        let reply = self.exchange(rpc::get(self.message_id(), filter)).await?;
        rpc::check_reply(&reply)?;
        Ok(reply)
    }
}
