//! Certificate lifecycle client for a fleet-manager control plane.
//!
//! Usage:
//!   fleet-certs -c /etc/fleet-certs/fleet-certs.conf list --domain-name sfo-m01
//!   fleet-certs --stderr validate --domain D1 --specs specs.json
//!   fleet-certs generate --domain D1 --resource-type VCENTER --fqdn vc01.example.com
//!   fleet-certs fingerprint field-a field-b

mod api;
mod certs;
mod config;
mod deadline;
mod domain;
mod error;
mod tls;

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use api::client::HttpControlPlane;
use api::models::{Certificate, ResourceCertificateSpec};
use certs::fingerprint::certificate_id;
use certs::operations::{compute_fingerprint, CertificateOperations};
use certs::waiter::PollingWaiter;
use config::ClientConfig;
use deadline::Deadline;
use error::{FleetError, Result};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "fleet-certs", about = "Validate, generate and inspect fleet resource certificates")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", default_value = "/etc/fleet-certs/fleet-certs.conf")]
    config: PathBuf,

    /// Log to stderr even when syslog is configured.
    #[arg(long)]
    stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct DomainArgs {
    /// Domain id.
    #[arg(long = "domain", conflicts_with = "domain_name", required_unless_present = "domain_name")]
    domain_id: Option<String>,

    /// Domain name, resolved through the domain list.
    #[arg(long)]
    domain_name: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the hex fingerprint of the given fields, in order.
    Fingerprint {
        #[arg(required = true)]
        fields: Vec<String>,
    },
    #[command(flatten)]
    Remote(RemoteCommand),
}

/// Commands that talk to the control plane.
#[derive(Debug, Subcommand)]
enum RemoteCommand {
    /// Validate certificates described in a JSON file against their resources.
    Validate {
        #[command(flatten)]
        domain: DomainArgs,
        /// JSON array of resource certificate specs.
        #[arg(long)]
        specs: PathBuf,
    },
    /// Generate a certificate for one resource and wait for the task.
    Generate {
        #[command(flatten)]
        domain: DomainArgs,
        #[arg(long)]
        resource_type: String,
        #[arg(long)]
        fqdn: String,
        #[arg(long, default_value = "OpenSSL")]
        ca_type: String,
    },
    /// Print every certificate of a domain as JSON.
    List {
        #[command(flatten)]
        domain: DomainArgs,
    },
    /// Print the certificate issued to one resource.
    Show {
        #[command(flatten)]
        domain: DomainArgs,
        #[arg(long)]
        fqdn: String,
    },
}

/// A certificate with its content-derived id, as printed by `list`/`show`.
#[derive(Serialize)]
struct IdentifiedCertificate<'a> {
    id: String,
    #[serde(flatten)]
    certificate: &'a Certificate,
}

impl<'a> IdentifiedCertificate<'a> {
    fn new(certificate: &'a Certificate) -> Result<Self> {
        Ok(IdentifiedCertificate { id: certificate_id(certificate)?, certificate })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let command = match cli.command {
        // Pure computation: no configuration or control plane needed.
        Command::Fingerprint { fields } => match compute_fingerprint(&fields) {
            Ok(hex) => {
                println!("{hex}");
                return;
            }
            Err(e) => {
                eprintln!("fleet-certs: {e}");
                process::exit(1);
            }
        },
        Command::Remote(command) => command,
    };

    let mut cfg = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("fleet-certs: config error: {e}");
            process::exit(1);
        }
    };
    config::apply_env(&mut cfg, |key| std::env::var(key).ok());
    if let Err(e) = config::validate_config(&cfg) {
        eprintln!("fleet-certs: config validation: {e}");
        process::exit(1);
    }

    let use_syslog = cfg.log_syslog && !cli.stderr;
    if let Err(e) = setup_logging(use_syslog) {
        eprintln!("fleet-certs: {e}");
        process::exit(1);
    }

    let code = match run(command, &cfg).await {
        Ok(()) => 0,
        Err(FleetError::ValidationFailed(report)) => {
            error!("{report}");
            for failure in &report.failures {
                println!("{failure}");
            }
            2
        }
        Err(e) => {
            error!("{e}");
            if use_syslog {
                eprintln!("fleet-certs: {e}");
            }
            1
        }
    };
    process::exit(code);
}

async fn run(command: RemoteCommand, cfg: &ClientConfig) -> Result<()> {
    let control_plane = HttpControlPlane::new(cfg)?;
    let waiter = PollingWaiter::new(cfg.poll_interval()).with_call_timeout(cfg.api_timeout());
    info!("polling every {}s", waiter.interval().as_secs());
    let ops = CertificateOperations::new(&control_plane, waiter);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    match command {
        RemoteCommand::Validate { domain, specs } => {
            let domain_id = domain_id(&control_plane, &domain).await?;
            let specs: Vec<ResourceCertificateSpec> = serde_json::from_str(&fs::read_to_string(&specs)?)?;
            if specs.is_empty() {
                return Err(FleetError::Config("specs file contains no resources".into()));
            }
            let deadline = start_deadline(&shutdown, cfg);
            ops.validate_resource_certificates(&domain_id, &specs, deadline.token()).await?;
            println!("validation of {} resource certificate(s) succeeded", specs.len());
        }
        RemoteCommand::Generate { domain, resource_type, fqdn, ca_type } => {
            let domain_id = domain_id(&control_plane, &domain).await?;
            let deadline = start_deadline(&shutdown, cfg);
            ops.generate_certificate_for_resource(
                &domain_id,
                &resource_type,
                &fqdn,
                &ca_type,
                deadline.token(),
            )
            .await?;
            println!("certificate generated for {fqdn}");
        }
        RemoteCommand::List { domain } => {
            let domain_id = domain_id(&control_plane, &domain).await?;
            let certs = ops.read_certificates(&domain_id).await?;
            let listed = certs
                .iter()
                .map(IdentifiedCertificate::new)
                .collect::<Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        RemoteCommand::Show { domain, fqdn } => {
            let domain_id = domain_id(&control_plane, &domain).await?;
            match ops.find_certificate_for_resource(&domain_id, &fqdn).await? {
                Some(cert) => {
                    println!("{}", serde_json::to_string_pretty(&IdentifiedCertificate::new(&cert)?)?)
                }
                None => println!("no certificate issued to {fqdn}"),
            }
        }
    }
    Ok(())
}

async fn domain_id(control_plane: &HttpControlPlane, args: &DomainArgs) -> Result<String> {
    domain::resolve_domain_id(control_plane, args.domain_id.as_deref(), args.domain_name.as_deref())
        .await
}

fn start_deadline(shutdown: &CancellationToken, cfg: &ClientConfig) -> Deadline {
    let deadline = Deadline::after(shutdown, cfg.operation_timeout());
    match deadline.expires_at() {
        Some(at) => info!("operation deadline {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => info!("operation deadline in {}s", cfg.operation_timeout),
    }
    deadline
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(use_syslog: bool) -> anyhow::Result<()> {
    if use_syslog {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            hostname: None,
            process:  "fleet-certs".into(),
            pid:      process::id(),
        };
        let logger = syslog::unix(formatter)
            .map_err(|e| anyhow::anyhow!("syslog connect failed: {e}"))?;
        log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
            .map(|()| log::set_max_level(log::LevelFilter::Info))
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .try_init()
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    }
    Ok(())
}
