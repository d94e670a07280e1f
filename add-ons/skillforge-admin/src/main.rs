//! skillforge-admin: inspect and edit SkillForge stores from the terminal.

mod commands;

use clap::Parser;
use skillforge_core::{BackendKind, CoreConfig, Workspace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::Command;

#[derive(Parser)]
#[command(name = "skillforge-admin")]
#[command(about = "Admin console for SkillForge agents, goals, users and courses")]
struct Cli {
    /// Config file (TOML). Defaults to config/skillforge.
    #[arg(short, long, env = "SKILLFORGE_CONFIG")]
    config: Option<String>,

    /// Use throwaway in-memory slots instead of the configured backend
    #[arg(long)]
    memory: bool,

    /// Pre-flight check: open the backend and probe every slot, then exit
    #[arg(long)]
    verify: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Opens the backend and probes each configured slot.
fn run_verify(config: &CoreConfig) -> Result<(), String> {
    print!("Opening {:?} backend... ", config.backend);
    let ws = Workspace::open(config).map_err(|e| format!("backend LOCKED or inaccessible: {}", e))?;
    println!("OK");

    for status in ws.slot_status() {
        if let Some(err) = status.error {
            return Err(format!("slot {} failed: {}", status.slot, err));
        }
        let state = if status.present { "present" } else { "empty" };
        println!("  {:<28} {:>8} bytes  {}", status.slot, status.bytes, state);
    }
    println!("\nSUCCESS: all slots accessible.");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[skillforge-admin] .env not loaded: {} (using system environment)", e);
    }

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &cli.config {
        std::env::set_var("SKILLFORGE_CONFIG", path);
    }
    let mut config = CoreConfig::load()?;
    if cli.memory {
        config.backend = BackendKind::Memory;
    }

    if cli.verify {
        return match run_verify(&config) {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        };
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given; run with --help for usage");
    };

    let mut ws = Workspace::open(&config)?;
    tracing::debug!(backend = ws.backend_kind(), "dispatching command");
    let output = match commands::run(&mut ws, command) {
        Ok(output) => output,
        Err(e) => match commands::user_notice(&e) {
            Some(notice) => {
                eprintln!("notice: {}", notice);
                std::process::exit(2);
            }
            None => return Err(e),
        },
    };
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
