use anyhow::{Context, Result, bail};
use casetrack_core::{Case, evaluate_due_on, today_in};
use casetrack_ingest::{load_cases, parse_cases_csv, save_cases};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod calendar;
mod config;
mod dispatch;
mod state;

use config::{Config, config_path, init_config, load_config};

#[derive(Parser, Debug)]
#[command(
    name = "casetrack",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CASETRACK_BUILD_SHA"), ")"),
    about = "Appeal deadlines and reminder notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cases with effective deadline and days left
    Cases {
        #[arg(long, default_value = "cases.json")]
        cases: PathBuf,

        /// Evaluate as of this day (YYYY-MM-DD); defaults to today in the configured timezone
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Preview the notifications due today
    Due {
        #[arg(long, default_value = "cases.json")]
        cases: PathBuf,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Send due, not-yet-sent notifications through the configured transport
    Dispatch {
        #[arg(long, default_value = "cases.json")]
        cases: PathBuf,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Dry-run only; do not actually send
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Max sends in one run (default from config.delivery.max_dispatch_per_run)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the most recently delivered notifications
    Outbox {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Convert a case board CSV export into a JSON case file
    ImportCsv {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value = "cases.json")]
        out: PathBuf,

        /// Overwrite an existing case file
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Export effective deadlines as an ICS calendar
    ExportIcs {
        #[arg(long, default_value = "cases.json")]
        cases: PathBuf,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config (defaults and migrations applied)
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Cases { cases, date } => {
            let cfg = load_config()?;
            let today = resolve_today(date, &cfg)?;
            let cases = read_cases(&cases)?;
            print_cases(&cases, today);
        }

        Command::Due { cases, date, json } => {
            let cfg = load_config()?;
            let today = resolve_today(date, &cfg)?;
            let cases = read_cases(&cases)?;
            let due = evaluate_due_on(&cases, &cfg.notifications, today);

            if json {
                println!("{}", serde_json::to_string_pretty(&due)?);
            } else if due.is_empty() {
                println!("Nothing due on {today}.");
            } else {
                println!("# Due on {today}\n");
                for n in &due {
                    println!(
                        "- [{}] {} | days_left={} | to: {}",
                        n.channel,
                        n.message,
                        n.days_left,
                        n.recipients.join(", ")
                    );
                }
            }
        }

        Command::Dispatch {
            cases,
            date,
            dry_run,
            limit,
        } => {
            let cfg = load_config()?;
            let today = resolve_today(date, &cfg)?;
            let cases = read_cases(&cases)?;
            dispatch::dispatch(&cases, &cfg, today, dry_run, limit).await?;
        }

        Command::Outbox { limit } => dispatch::list_outbox(limit)?,

        Command::ImportCsv { csv, out, force } => {
            if out.exists() && !force {
                bail!("{} already exists (pass --force to overwrite)", out.display());
            }
            let cases = parse_cases_csv(&csv)
                .with_context(|| format!("parsing {}", csv.display()))?;
            save_cases(&out, &cases).with_context(|| format!("writing {}", out.display()))?;
            println!(
                "Imported {} cases from {} into {}",
                cases.len(),
                csv.display(),
                out.display()
            );
        }

        Command::ExportIcs { cases, date, out } => {
            let cfg = load_config()?;
            let today = resolve_today(date, &cfg)?;
            let cases = read_cases(&cases)?;
            let events = calendar::cases_to_events(&cases, today);
            calendar::write_ics(&calendar::events_to_ics(&events), out.as_deref())?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => init_config()?,
            ConfigCommand::Show => {
                let cfg = load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config_path()?.display()),
        },
    }

    Ok(())
}

/// An explicit `--date` wins; otherwise the current day in the configured zone.
fn resolve_today(date: Option<NaiveDate>, cfg: &Config) -> Result<NaiveDate> {
    match date {
        Some(d) => Ok(d),
        None => Ok(today_in(cfg.timezone()?, Utc::now())),
    }
}

fn read_cases(path: &Path) -> Result<Vec<Case>> {
    if !path.exists() {
        bail!(
            "case file not found: {} (pass --cases <file> or run `casetrack import-csv`)",
            path.display()
        );
    }
    load_cases(path).with_context(|| format!("loading {}", path.display()))
}

fn print_cases(cases: &[Case], today: NaiveDate) {
    println!("# Cases as of {today}\n");
    for c in cases {
        let deadline = c.effective_deadline(today);
        println!(
            "- {} [{}] {} ({}) | deadline {} | days_left={} | extensions={}",
            c.id,
            c.status,
            c.style,
            c.case_ref,
            deadline,
            c.days_left(today),
            c.extensions.len()
        );
    }
}
