//! Static IP configuration for Raspberry Pi `eth0` and `wlan0` in
//! `/etc/dhcpcd.conf`.
//!
//! Usage:
//!   ipconfig show
//!   ipconfig set eth0 --address 192.168.1.5 --prefix 24 --router 192.168.1.1 --dns 8.8.8.8
//!   ipconfig clear wlan0
//!   ipconfig recover --dry-run

mod block;
mod config;
mod error;
mod fields;
mod lines;
mod report;
mod runner;
mod script;
mod session;

use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::lines::LineStore;
use crate::report::{LogReporter, Reporter, Severity};
use crate::session::{Session, Staged};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "ipconfig", version, about = "Set static IP parameters in /etc/dhcpcd.conf")]
struct Cli {
    /// Path to the configuration file (default: /etc/ipconfig.conf if present).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Log to stderr even if the configuration asks for syslog.
    #[arg(long)]
    stderr: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print the current static settings.
    Show {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Change the settings of one interface and save.
    Set {
        iface: Iface,
        #[arg(long)]
        address: Option<Ipv4Addr>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=32))]
        prefix: Option<u8>,
        /// Router address; an empty string removes it.
        #[arg(long)]
        router: Option<String>,
        /// Comma separated DNS servers; an empty string removes them.
        #[arg(long)]
        dns: Option<String>,
        /// Print the staged file and script instead of running them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove the static settings of one interface and save.
    Clear {
        iface: Iface,
        #[arg(long)]
        dry_run: bool,
    },
    /// Restore a stock /etc/network/interfaces.
    Recover {
        #[arg(long)]
        dry_run: bool,
    },
    /// How to use ipconfig.
    Directions,
    /// Program information.
    About,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Iface {
    Eth0,
    Wlan0,
}

impl Iface {
    fn name(self) -> &'static str {
        match self {
            Iface::Eth0  => "eth0",
            Iface::Wlan0 => "wlan0",
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ipconfig: config error: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = config::validate_config(&cfg) {
        eprintln!("ipconfig: config validation: {e}");
        process::exit(1);
    }

    let use_syslog = cfg.log_syslog && !cli.stderr;
    if let Err(e) = setup_logging(use_syslog) {
        eprintln!("ipconfig: {e}");
        process::exit(1);
    }

    let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);
    if report::check(&*reporter, run(cli.command, cfg, Arc::clone(&reporter)).await).is_none() {
        process::exit(1);
    }
}

async fn run(cmd: Cmd, cfg: config::AppConfig, reporter: Arc<dyn Reporter>) -> anyhow::Result<()> {
    use anyhow::Context;

    match cmd {
        Cmd::Show { json } => {
            let session = Session::load(cfg)?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.settings())?);
            } else {
                print_settings(&session);
            }
        }
        Cmd::Set { iface, address, prefix, router, dns, dry_run } => {
            let mut session = Session::load(cfg)?;
            let fields = session
                .interface_mut(iface.name())
                .context("interface not tracked")?;
            if let Some(v) = address { fields.address = v.to_string(); }
            if let Some(v) = prefix  { fields.prefix  = v.to_string(); }
            if let Some(v) = router  { fields.router  = v; }
            if let Some(v) = dns     { fields.dns     = v; }
            save(&mut session, dry_run, reporter).await?;
        }
        Cmd::Clear { iface, dry_run } => {
            let mut session = Session::load(cfg)?;
            session.clear(iface.name())?;
            save(&mut session, dry_run, reporter).await?;
        }
        Cmd::Recover { dry_run } => {
            // Recover must work even when dhcpcd.conf cannot be read.
            let session = Session::from_store(cfg, LineStore::new());
            if dry_run {
                print_staged(&session.stage_recover())?;
                return Ok(());
            }
            let run = session
                .recover(std::io::stdout(), Arc::clone(&reporter))
                .await
                .context("error attempting to recover /etc/network/interfaces")?;
            run.wait().await?;
            reporter.report(Severity::Info, "recover complete");
        }
        Cmd::Directions => println!("{}", directions()),
        Cmd::About => println!("{}", about()),
    }
    Ok(())
}

async fn save(session: &mut Session, dry_run: bool, reporter: Arc<dyn Reporter>) -> anyhow::Result<()> {
    use anyhow::Context;

    if dry_run {
        print_staged(&session.stage_save())?;
        return Ok(());
    }
    let run = session
        .save(std::io::stdout(), Arc::clone(&reporter))
        .await
        .context("error saving dhcpcd.conf file")?;
    run.wait().await?;
    reporter.report(Severity::Info, "save complete");
    Ok(())
}

fn print_settings(session: &Session) {
    let settings = session.settings();
    for (iface, cfg) in [("eth0", &settings.eth0), ("wlan0", &settings.wlan0)] {
        println!("{iface}:");
        if cfg.is_cleared() {
            println!("  (no static address)");
            continue;
        }
        println!("  IPv4 Address: {}/{}", cfg.address, cfg.prefix);
        println!("  Router:       {}", cfg.router);
        println!("  DNS Servers:  {}", cfg.dns);
    }
}

fn print_staged(staged: &Staged) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "# ---- staged file ----")?;
    out.write_all(&staged.content)?;
    if !staged.content.ends_with(b"\n") {
        writeln!(out)?;
    }
    writeln!(out, "# ---- script ----")?;
    write!(out, "{}", staged.script)?;
    out.flush()
}

fn directions() -> &'static str {
    "ipconfig sets static IP addresses on a Raspberry Pi using dhcpcd.\n\
     \n\
     \x20 - If you have edited /etc/network/interfaces, remove all edits or run\n\
     \x20   `ipconfig recover`.\n\
     \x20 - Set the static IP parameters for eth0, wlan0 or both with\n\
     \x20   `ipconfig set <iface> --address .. --prefix .. --router .. --dns ..`.\n\
     \x20 - To remove the static IP from an interface run `ipconfig clear <iface>`."
}

fn about() -> String {
    format!(
        "ipconfig - Version {VERSION}\n\
         A program to set static IP parameters in /etc/dhcpcd.conf"
    )
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(use_syslog: bool) -> anyhow::Result<()> {
    if use_syslog {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            hostname: None,
            process:  "ipconfig".into(),
            pid:      process::id(),
        };
        let logger = syslog::unix(formatter)
            .map_err(|e| anyhow::anyhow!("syslog connect failed: {e}"))?;
        log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
            .map(|()| log::set_max_level(log::LevelFilter::Info))
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    } else {
        let logger = stderr_logger(std::env::var("RUST_LOG").ok().as_deref());
        let max = logger.filter();
        log::set_boxed_logger(Box::new(logger))
            .map(|()| log::set_max_level(max))
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    }
    Ok(())
}

/// Stderr logger at `Info`, unless `rust_log` (the `RUST_LOG` value) says
/// otherwise.
fn stderr_logger(rust_log: Option<&str>) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    if let Some(filters) = rust_log {
        builder.parse_filters(filters);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn stderr_logger_defaults_to_info() {
        assert_eq!(stderr_logger(None).filter(), LevelFilter::Info);
    }

    #[test]
    fn rust_log_overrides_default_level() {
        assert_eq!(stderr_logger(Some("debug")).filter(), LevelFilter::Debug);
        assert_eq!(stderr_logger(Some("ipconfig=debug")).filter(), LevelFilter::Debug);
        assert_eq!(stderr_logger(Some("warn")).filter(), LevelFilter::Warn);
    }

    #[test]
    fn every_command_parses() {
        for args in [
            &["ipconfig", "show", "--json"][..],
            &["ipconfig", "set", "eth0", "--address", "192.168.1.5", "--prefix", "24"],
            &["ipconfig", "clear", "wlan0", "--dry-run"],
            &["ipconfig", "recover"],
            &["ipconfig", "directions"],
            &["ipconfig", "about"],
        ] {
            assert!(Cli::try_parse_from(args).is_ok(), "{args:?}");
        }
        assert!(Cli::try_parse_from(["ipconfig", "set", "eth0", "--prefix", "33"]).is_err());
    }
}
