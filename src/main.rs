//! Command line front end for event signup lists.
//!
//! Usage:
//!   eti-signups list --event <id> [--attendance] [--filter nameFirst=ana] [--sort orderNumber:desc]
//!   eti-signups watch --event <id>
//!   eti-signups mark-attendance --event <id> --signup <id> --user-file admin.json
//!   eti-signups contact
//!
//! `--fixture signups.json` reads from a local JSON file instead of SurrealDB.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use eti_signups::config::{Config, RuntimeConfig, load_env};
use eti_signups::contact::ContactPage;
use eti_signups::fields::{ColumnKind, SignupField, ViewMode};
use eti_signups::i18n::Translator;
use eti_signups::navigation::LogNavigator;
use eti_signups::roles::User;
use eti_signups::store::{MemorySignupStore, SignupStore, SurrealSignupStore};
use eti_signups::view::SignupListView;
use prettytable::{Cell, Row, Table, row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eti-signups")]
#[command(about = "Event signup lists and attendance", long_about = None)]
struct Cli {
    /// Read signups from a JSON file instead of the database
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signup table of an event
    List {
        #[arg(long)]
        event: String,
        /// Attendance view: confirmed signups only
        #[arg(long)]
        attendance: bool,
        /// JSON file with the viewer profile (roles, adminOf)
        #[arg(long)]
        user_file: Option<PathBuf>,
        /// field=value, case-insensitive contains
        #[arg(long)]
        filter: Option<String>,
        /// field or field:desc
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        small_screen: bool,
    },
    /// Reprint the table on every change until interrupted
    Watch {
        #[arg(long)]
        event: String,
        #[arg(long)]
        attendance: bool,
        #[arg(long)]
        user_file: Option<PathBuf>,
    },
    /// Mark a confirmed signup as attended, after confirmation
    MarkAttendance {
        #[arg(long)]
        event: String,
        #[arg(long)]
        signup: String,
        #[arg(long)]
        user_file: Option<PathBuf>,
        /// Skip the interactive prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print the gender commission contact page
    Contact,
    /// Open an action column (mails, bank, receipt) for a signup
    Open {
        #[arg(long)]
        event: String,
        #[arg(long)]
        signup: String,
        /// mails | bank | receipt
        #[arg(long)]
        action: String,
        #[arg(long)]
        user_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(RuntimeConfig::load_from_env().log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let translator: Arc<dyn Translator> = Arc::new(config.catalog()?);

    match cli.command {
        Commands::Contact => {
            print!("{}", ContactPage::build(translator.as_ref()));
            Ok(())
        }
        Commands::List {
            event,
            attendance,
            user_file,
            filter,
            sort,
            small_screen,
        } => {
            let store = open_store(cli.fixture.as_deref(), &config).await?;
            let user = read_user(user_file.as_deref())?;
            let mut view = new_view(attendance, translator, &config);
            view.set_small_screen(small_screen);
            view.attach(store.as_ref(), &event, user.as_ref()).await;
            view.wait_loaded().await;

            if let Some(raw) = filter {
                let (field, value) = raw
                    .split_once('=')
                    .with_context(|| format!("filter '{}' is not field=value", raw))?;
                view.set_filter(parse_field(field)?, value)?;
            }
            if let Some(raw) = sort {
                let (field, descending) = match raw.split_once(':') {
                    Some((field, dir)) => (field, dir.eq_ignore_ascii_case("desc")),
                    None => (raw.as_str(), false),
                };
                view.set_sort(parse_field(field)?, descending)?;
            }
            print_table(&view);
            Ok(())
        }
        Commands::Watch {
            event,
            attendance,
            user_file,
        } => {
            let store = open_store(cli.fixture.as_deref(), &config).await?;
            let user = read_user(user_file.as_deref())?;
            let mut view = new_view(attendance, translator, &config);
            view.attach(store.as_ref(), &event, user.as_ref()).await;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    alive = view.pump() => {
                        if !alive {
                            break;
                        }
                        if !view.is_loading() {
                            print_table(&view);
                        }
                    }
                }
            }
            view.release();
            Ok(())
        }
        Commands::MarkAttendance {
            event,
            signup,
            user_file,
            yes,
        } => {
            let store = open_store(cli.fixture.as_deref(), &config).await?;
            let user = read_user(user_file.as_deref())?;
            let mut view = new_view(true, translator, &config);
            view.attach(store.as_ref(), &event, user.as_ref()).await;
            view.wait_loaded().await;
            view.request_attendance(&signup)?;

            let Some(prompt) = view.attendance_prompt() else {
                bail!("no confirmation pending for {}", signup);
            };
            println!("{}\n{}", prompt.title, prompt.description);
            let confirmed = yes || {
                println!("[{}] / [{}] (y/N)", prompt.confirm_label, prompt.cancel_label);
                let mut line = String::new();
                tokio::io::BufReader::new(tokio::io::stdin())
                    .read_line(&mut line)
                    .await?;
                matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
            };

            if !confirmed {
                view.cancel_attendance();
                println!("{}", prompt.cancel_label);
                return Ok(());
            }
            if let Some(handle) = view.confirm_attendance(store.clone()) {
                handle.await?;
            }
            // give the subscription a moment to deliver the updated record
            let _ = tokio::time::timeout(std::time::Duration::from_secs(2), view.pump()).await;
            if let Some(checkbox) = view.attendance_checkbox(&signup) {
                info!("Signup {} attended: {}", signup, checkbox.checked);
            }
            Ok(())
        }
        Commands::Open {
            event,
            signup,
            action,
            user_file,
        } => {
            let column = match action.as_str() {
                "mails" => ColumnKind::SentMails,
                "bank" => ColumnKind::BankDetails,
                "receipt" => ColumnKind::Receipt,
                other => bail!("unknown action '{}'", other),
            };
            let store = open_store(cli.fixture.as_deref(), &config).await?;
            let user = read_user(user_file.as_deref())?;
            let mut view = new_view(false, translator, &config);
            view.attach(store.as_ref(), &event, user.as_ref()).await;
            view.wait_loaded().await;
            println!("{}", view.action_route(column, &signup)?);
            view.trigger_action(column, &signup, &LogNavigator)?;
            Ok(())
        }
    }
}

async fn open_store(fixture: Option<&Path>, config: &Config) -> Result<Arc<dyn SignupStore>> {
    Ok(match fixture {
        Some(path) => Arc::new(MemorySignupStore::from_json_file(path)?),
        None => Arc::new(SurrealSignupStore::connect(config).await?),
    })
}

fn read_user(path: Option<&Path>) -> Result<Option<User>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read user file {}", path.display()))?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn new_view(attendance: bool, translator: Arc<dyn Translator>, config: &Config) -> SignupListView {
    let mode = if attendance {
        ViewMode::Attendance
    } else {
        ViewMode::List
    };
    SignupListView::new(mode, translator, config.date_style())
}

fn parse_field(raw: &str) -> Result<SignupField> {
    raw.parse::<SignupField>().map_err(anyhow::Error::msg)
}

fn print_table(view: &SignupListView) {
    let translator = view.translator();
    let columns: Vec<_> = view.columns().into_iter().filter(|c| !c.hidden).collect();
    let rows = view.rows();

    println!("{} ({})", view.title(), rows.len());
    let mut table = Table::new();
    table.set_titles(Row::new(
        columns
            .iter()
            .map(|c| Cell::new(&translator.t(c.header_key)))
            .collect(),
    ));
    for record in &rows {
        let cells = columns
            .iter()
            .map(|c| {
                let text = match c.kind {
                    ColumnKind::Field(field) => record.value(field),
                    ColumnKind::SentMails => translator.t("mailsButton"),
                    ColumnKind::BankDetails => translator.t("bankButton"),
                    ColumnKind::Receipt if record.receipt.is_some() => translator.t("receiptButton"),
                    ColumnKind::Receipt => "-".to_string(),
                    ColumnKind::Attendance if record.did_attend => "[x]".to_string(),
                    ColumnKind::Attendance => "[ ]".to_string(),
                };
                Cell::new(&text)
            })
            .collect();
        table.add_row(Row::new(cells));
    }
    table.printstd();

    if view.context().mode == ViewMode::List {
        let mut summary = Table::new();
        summary.add_row(row![translator.t("status"), "#"]);
        for (status, count) in view.summary() {
            summary.add_row(row![translator.t(status.as_str()), count]);
        }
        summary.printstd();
    }
}
