//! t600ctl - provision and inspect a Fujitsu T600 over NETCONF.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use odtn_netconf::ssh::{SshNetconfSession, SshTarget};
use odtn_types::{FlowRule, PortNumber};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use t600_driver::config::DEFAULT_CONFIG_PATH;
use t600_driver::{
    ConnectionCache, DriverConfig, FlowRuleProgrammable, PowerComponent, StaticInventory,
    StaticSessionProvider, T600Driver,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Fujitsu T600 terminal-device control
#[derive(Parser, Debug)]
#[command(name = "t600ctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Driver configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level, overridden by RUST_LOG
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print device details and discovered ports
    Discover,
    /// Provision the flow rules in a JSON file
    Apply {
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// De-provision the flow rules in a JSON file
    Remove {
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// Read or set optical power of a port
    Power {
        #[arg(short, long)]
        port: u64,
        /// ingress, egress, och or och:<multiplier>
        #[arg(long, default_value = "ingress")]
        component: String,
        /// Target output power to set, in dBm
        #[arg(long, allow_hyphen_values = true)]
        set: Option<f64>,
    },
    /// Read the pre-FEC bit error rate of a line port
    Ber {
        #[arg(short, long)]
        port: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = DriverConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.validate().context("validating configuration")?;
    let device = config.device_id()?;

    let target = SshTarget {
        host: config.device.host.clone(),
        port: config.device.port,
        username: config.device.username.clone(),
        password: config.device.password.clone(),
        timeout: config.rpc_timeout(),
    };
    let session = SshNetconfSession::connect(target)
        .await
        .with_context(|| format!("connecting to {}", device))?;

    let sessions = Arc::new(StaticSessionProvider::new());
    sessions.insert(device.clone(), Arc::new(session));
    let inventory = Arc::new(StaticInventory::new());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling pending settle delays");
            on_signal.cancel();
        }
    });

    let driver = T600Driver::new(
        device.clone(),
        config,
        sessions,
        inventory.clone(),
        Arc::new(ConnectionCache::new()),
    )
    .with_cancellation(cancel);

    let ports = driver.discovery().discover_port_details().await?;
    info!(device = %device, ports = ports.len(), "inventory loaded");
    inventory.set_ports(device.clone(), ports.clone());

    match args.command {
        Command::Discover => {
            let details = driver.discovery().discover_device_details().await?;
            print_json(&details)?;
            print_json(&ports)?;
        }
        Command::Apply { rules } => {
            let added = driver.flow_rules().apply_flow_rules(read_rules(&rules)?).await?;
            print_json(&added)?;
        }
        Command::Remove { rules } => {
            let removed = driver.flow_rules().remove_flow_rules(read_rules(&rules)?).await?;
            print_json(&removed)?;
        }
        Command::Power {
            port,
            component,
            set,
        } => {
            let component: PowerComponent = component.parse()?;
            let port = PortNumber::new(port);
            let power = driver.power();
            if let Some(dbm) = set {
                power.set_target_power(port, component, dbm).await?;
            }
            let report = serde_json::json!({
                "port": port,
                "target": power.target_power(port, component).await?,
                "output": power.current_output_power(port, component).await?,
                "input": power.current_input_power(port, component).await?,
            });
            print_json(&report)?;
        }
        Command::Ber { port } => {
            let port = PortNumber::new(port);
            let ber = driver.bit_error_rate();
            let report = serde_json::json!({
                "port": port,
                "pre_fec_ber": ber.pre_fec_ber(port).await?,
                "post_fec_ber": ber.post_fec_ber(port).await?,
            });
            print_json(&report)?;
        }
    }

    Ok(())
}

fn read_rules(path: &Path) -> Result<Vec<FlowRule>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
