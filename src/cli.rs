// Command-line surface. With no subcommand the interactive menu starts;
// `suggest` and `report` run once and print a table or JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::api::RestClient;
use crate::config::BackendConfig;
use crate::suggest::{SuggestionCriteria, SuggestionRecorder};
use crate::ui;

#[derive(Debug, Parser)]
#[command(name = "revpick", version, about = "Motorbike catalog suggestions")]
pub struct Cli {
    /// Read backend credentials from this file instead of searching for `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive menu (default)
    Menu,
    /// List matching bikes, optionally logging them for a customer
    Suggest(SuggestArgs),
    /// Row counts for products, customers and suggestions
    Report {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    #[arg(long)]
    pub min_price: Option<f64>,
    #[arg(long)]
    pub max_price: Option<f64>,
    #[arg(long)]
    pub min_cc: Option<i64>,
    #[arg(long)]
    pub max_cc: Option<i64>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Only electric bikes
    #[arg(long, conflicts_with = "combustion")]
    pub electric: bool,
    /// Only combustion bikes
    #[arg(long)]
    pub combustion: bool,
    /// Log the first matches as suggestions for this customer
    #[arg(long)]
    pub customer: Option<String>,
    #[arg(long)]
    pub json: bool,
}

impl SuggestArgs {
    pub fn criteria(&self) -> SuggestionCriteria {
        let is_electric = match (self.electric, self.combustion) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        SuggestionCriteria {
            min_price: self.min_price,
            max_price: self.max_price,
            min_engine_cc: self.min_cc,
            max_engine_cc: self.max_cc,
            brand: self.brand.clone(),
            category_id: self.category.clone(),
            is_electric,
            location: self.location.clone(),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = BackendConfig::from_env(cli.env_file.as_deref())
        .context("Failed to load backend configuration")?;
    info!(base_url = %config.base_url, "backend configured");
    let client = RestClient::new(&config).context("Failed to build HTTP client")?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => ui::main_menu(client),
        Command::Suggest(args) => {
            let recorder = SuggestionRecorder::new(&client);
            let bikes = recorder.suggest_bikes(&args.criteria(), args.customer.as_deref())?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&bikes)?);
            } else if bikes.is_empty() {
                println!("No bikes matched your preferences.");
            } else {
                print!("{}", ui::bikes_table(&bikes, args.electric));
            }
            Ok(())
        }
        Command::Report { json } => {
            let report = SuggestionRecorder::new(&client).generate_report()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", ui::report_table(&report));
            }
            Ok(())
        }
    }
}
