//! CLI definitions and command routing.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::{Settings, DEFAULT_KEEP};
use crate::fetch::HyperClient;
use crate::platform::default_platform;
use crate::privilege::{startup_gate, Gate};
use crate::shell::{Shell, TerminalKeys};

#[derive(Parser)]
#[command(name = "github520", version)]
#[command(about = "Keep the GitHub520 block in your hosts file up to date")]
pub struct Cli {
    /// Hosts source URL, tried in order (repeatable; replaces the default)
    #[arg(long = "source", value_name = "URL", global = true)]
    pub sources: Vec<String>,

    /// Number of hosts backups to keep
    #[arg(long, default_value_t = DEFAULT_KEEP, global = true)]
    pub keep: usize,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run a single action; without one, the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the latest GitHub520 hosts and rewrite the managed block
    Update,
    /// Flush the OS DNS cache
    FlushDns,
    /// Print the hosts file
    Show,
    /// Open the hosts file in your editor, then flush DNS
    Edit,
    /// Open the hosts directory in the file browser
    OpenDir,
    /// List hosts backups, newest first
    Backups,
}

impl Commands {
    /// Commands that write the hosts file and therefore need elevated rights.
    fn mutating(&self) -> bool {
        matches!(self, Commands::Update | Commands::Edit)
    }
}

/// Run CLI and dispatch to handlers. Returns the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    crate::logger::configure(std::env::var_os("GITHUB520_DEBUG"), cli.verbose);

    let platform = default_platform();
    let settings = Settings::default_settings(platform.as_ref())
        .with_sources(cli.sources)
        .with_keep(cli.keep);

    if cli.command.as_ref().map_or(true, Commands::mutating) {
        if let Gate::Exit { code, message } = startup_gate(platform.as_ref(), settings.assume_elevated)
        {
            if let Some(msg) = message {
                eprintln!("{msg}");
            }
            return Ok(code);
        }
    }

    let client = HyperClient::new()?;
    let app = App::new(settings, platform, Box::new(client));

    match cli.command {
        None => {
            let mut shell = Shell::new(&app, TerminalKeys::default(), std::io::stdout());
            shell.run()?;
            Ok(0)
        }
        Some(cmd) => {
            run_command(&app, cmd)?;
            Ok(0)
        }
    }
}

fn run_command(app: &App, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Update => {
            let outcome = app.update()?;
            println!("Backup saved: {}", outcome.backup.path.display());
            for path in &outcome.pruned.removed {
                println!("Removed old backup: {}", path.display());
            }
            println!("Updated {}", app.settings().hosts_file.display());
            if let Err(e) = outcome.dns_flush {
                eprintln!("Warning: DNS flush failed: {e}");
            }
            Ok(())
        }
        Commands::FlushDns => {
            app.flush_dns()?;
            println!("DNS cache flushed");
            Ok(())
        }
        Commands::Show => {
            print!("{}", app.read_hosts()?);
            Ok(())
        }
        Commands::Edit => {
            let outcome = app.edit()?;
            if let Err(e) = outcome.dns_flush {
                eprintln!("Warning: DNS flush failed: {e}");
            }
            Ok(())
        }
        Commands::OpenDir => {
            let dir = app.open_directory()?;
            println!("Opened {}", dir.display());
            Ok(())
        }
        Commands::Backups => {
            for snapshot in app.backups()? {
                println!(
                    "{}\t{}",
                    snapshot.modified.format("%Y-%m-%d %H:%M:%S"),
                    snapshot.path.display()
                );
            }
            Ok(())
        }
    }
}
