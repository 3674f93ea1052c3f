use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use inquire::{InquireError, Select, Text};
use std::process;
use tracing_subscriber::EnvFilter;

use innerspell_cli::config::Config;
use innerspell_core::{ConsultantCatalog, ConsultantFilter, ConsultantStatus, StaticCatalog};
use innerspell_recommender::{ChatMessage, RecommendationResult};

/// Select entry that switches to free typing
const TYPE_MY_OWN: &str = "직접 입력하기";

#[derive(Parser)]
#[command(name = "innerspell")]
#[command(about = "Innerspell - AI consultant recommendation service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, help = "API server port (overrides INNERSPELL_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Allowed CORS origin (overrides INNERSPELL_CORS_ORIGIN)")]
        cors_origin: Option<String>,
    },
    /// Talk to the recommender in the terminal
    Chat,
    /// List the consultant catalog
    Consultants {
        /// Only show consultants with this specialty (e.g. 타로, 사주)
        #[arg(long)]
        specialty: Option<String>,
        /// Only show consultants with this status (available, busy)
        #[arg(long)]
        status: Option<ConsultantStatus>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;

    match command {
        Commands::Serve { port, cors_origin } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(origin) = cors_origin {
                config.cors_origin = origin;
            }

            println!("{}", "🔮 Starting Innerspell server...".green().bold());
            println!(
                "{} http://localhost:{}",
                "📡 Server will run on".cyan(),
                config.port
            );
            println!("{} {}", "🔗 CORS origin:".cyan(), config.cors_origin);

            innerspell_cli::run_server(config).await
        }
        Commands::Chat => run_chat(&config).await,
        Commands::Consultants { specialty, status } => {
            list_consultants(&config, specialty, status)
        }
    }
}

fn load_catalog(config: &Config) -> Result<StaticCatalog, Box<dyn std::error::Error>> {
    Ok(match &config.catalog_path {
        Some(path) => StaticCatalog::from_path(path)?,
        None => StaticCatalog::builtin()?,
    })
}

fn list_consultants(
    config: &Config,
    specialty: Option<String>,
    status: Option<ConsultantStatus>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(config)?;
    let mut filter = ConsultantFilter::default();
    if let Some(specialty) = specialty {
        filter = filter.with_specialty(specialty);
    }
    if let Some(status) = status {
        filter = filter.with_status(status);
    }
    let consultants = catalog.filter(&filter);

    if consultants.is_empty() {
        println!(
            "{} {}",
            "No consultants match. Specialties:".yellow(),
            catalog.specialties().join(", ")
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Specialty", "Rating", "Price/30s", "Status", "Keywords"]);
    for c in &consultants {
        table.add_row(vec![
            c.id.clone(),
            c.name.clone(),
            c.specialty.clone(),
            format!("{:.1} ({})", c.rating, c.review_count),
            format!("{}원", c.price),
            format!("{:?}", c.status).to_lowercase(),
            c.keywords.join(", "),
        ]);
    }

    println!("{table}");
    println!("{} {} consultant(s)", "📋".cyan(), consultants.len());
    Ok(())
}

async fn run_chat(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = innerspell_cli::build_state(config)?;
    let mut history: Vec<ChatMessage> = Vec::new();

    println!("{}", "🔮 Innerspell 상담사 추천 (Ctrl+C to quit)".magenta().bold());

    loop {
        let result = state.recommender.advance_conversation(&history).await;
        println!("\n{} {}", "Innerspell:".magenta().bold(), result.response);

        if let Some(recommendations) = &result.recommendations {
            println!();
            for (rank, rec) in recommendations.iter().enumerate() {
                match state.catalog.find_by_id(&rec.id) {
                    Some(c) => println!(
                        "{} {} ({}, {}원/30초)\n   {}",
                        format!("{}.", rank + 1).yellow().bold(),
                        c.name.bold(),
                        c.specialty,
                        c.price,
                        rec.reason
                    ),
                    None => println!("{} {}\n   {}", format!("{}.", rank + 1).yellow(), rec.id, rec.reason),
                }
            }
            return Ok(());
        }

        let answer = match prompt_answer(&result) {
            Ok(answer) => answer,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                println!("{}", "👋 Bye".dimmed());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        history.push(ChatMessage::assistant(assistant_turn(&result)));
        history.push(ChatMessage::user(answer));
    }
}

fn prompt_answer(result: &RecommendationResult) -> Result<String, InquireError> {
    match &result.options {
        Some(options) if !options.is_empty() => {
            let mut choices = options.clone();
            choices.push(TYPE_MY_OWN.to_string());
            let choice = Select::new("선택해 주세요:", choices).prompt()?;
            if choice == TYPE_MY_OWN {
                Text::new("답변:").prompt()
            } else {
                Ok(choice)
            }
        }
        _ => Text::new("답변:").prompt(),
    }
}

/// Assistant turn as it goes back into history, with its options bracketed
fn assistant_turn(result: &RecommendationResult) -> String {
    match &result.options {
        Some(options) if !options.iter().all(|o| result.response.contains(&format!("[{}]", o))) => {
            let bracketed: Vec<String> = options.iter().map(|o| format!("[{}]", o)).collect();
            format!("{}\n{}", result.response, bracketed.join(" "))
        }
        _ => result.response.clone(),
    }
}
