//! tincherd — mesh VPN node agent.
//!
//! One run: load local settings, fetch the peer registry from the master,
//! synthesize the full tinc configuration tree, then supervise tincd until
//! told to stop.
//!
//! ```text
//! tincherd --config /etc/tinc/tincherd.yaml [--generate-only]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use tincherd_core::{registry, LocalSettings};
use tincherd_daemon::supervisor::{invoke_ifdown, run_blocking};
use tincherd_daemon::{preflight, probe};
use tincherd_gen::pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "tincherd",
    version,
    about = "Configure and supervise a tinc node in a confederated mesh VPN",
    long_about = None,
)]
struct Cli {
    /// Path to the local settings file (YAML).
    #[arg(short, long, default_value = "/etc/tinc/tincherd.yaml")]
    config: PathBuf,

    /// Write the configuration tree and exit without starting tincd.
    #[arg(long)]
    generate_only: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = LocalSettings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    if !cli.generate_only {
        preflight::ensure_root()?;
        preflight::ensure_tun_device()?;
    }

    let base = settings.network_base();

    let url = settings.registry_url();
    tracing::info!(%url, "fetching peer registry");
    let registry_text = fetch_registry(&url, Duration::from_secs(30))
        .with_context(|| format!("failed to fetch peer registry from {url}"))?;

    let peers = registry::parse(&registry_text).context("failed to parse peer registry")?;
    registry::require_local_peer(&peers, &settings.peerid)?;
    tracing::info!(peers = peers.len(), "registry parsed");

    let version = probe::effective_version(&settings);
    match &version {
        Some(v) => tracing::info!(version = %v, "tincd version resolved"),
        None => tracing::warn!("tincd version unknown, version-gated options disabled"),
    }

    let artifacts = pipeline::synthesize(&settings, &peers, version.as_deref())
        .context("failed to generate configuration")?;
    pipeline::write_artifacts(&base, &artifacts)
        .with_context(|| format!("failed to write configuration under {}", base.display()))?;
    println!(
        "{} configuration for {} peers written to {}",
        "✓".green(),
        peers.len(),
        base.display()
    );

    if cli.generate_only {
        return Ok(());
    }

    if let Some(pid) = probe::lookup_daemon_pid(&settings, version.as_deref()) {
        println!(
            "{} a tincd instance may already be running (pid {pid})",
            "warning:".yellow()
        );
    }

    println!("{}", "Starting tincd.".bold());
    let run_result = run_blocking(&settings);
    invoke_ifdown(&settings).context("tinc-down hook failed")?;
    run_result?;

    println!("{} shut down cleanly", "✓".green());
    Ok(())
}

/// One-shot registry fetch. No retries: a dead master means this run
/// fails and the previously generated configuration stays in place.
fn fetch_registry(url: &str, timeout: Duration) -> Result<String> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let body = agent.get(url).call()?.into_string()?;
    if body.trim().is_empty() {
        bail!("master answered with an empty registry");
    }
    Ok(body)
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
