use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::{debug, error, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use hdb_advisor::affordability::{self, AffordabilityInput};
use hdb_advisor::auth::{self, PasswordGate};
use hdb_advisor::config::{Config, QueryMode};
use hdb_advisor::content;
use hdb_advisor::data::{self, LoadReport, RecordFilter, ResaleTable};
use hdb_advisor::llm::{LlmClient, OpenAiClient, OpenAiConfig};
use hdb_advisor::query::{Answer, QueryRouter};
use hdb_advisor::tui::{self, Services};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hdb-advisor")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("hdb-advisor.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_table(config: &Config) -> Result<(Arc<ResaleTable>, LoadReport)> {
    let (table, report) = data::load_dir(&config.data.dir)
        .with_context(|| format!("Failed to load resale data from {}", config.data.dir.display()))?;
    Ok((Arc::new(table), report))
}

fn build_llm(config: &Config) -> Option<Arc<dyn LlmClient>> {
    if config.query.mode == QueryMode::Offline {
        info!("Offline mode; LLM disabled");
        return None;
    }
    match OpenAiClient::from_env(&config.llm.api_key_env, OpenAiConfig::from(&config.llm)) {
        Ok(client) => {
            info!("LLM client ready: {}", client.model());
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("LLM unavailable: {}", e);
            None
        }
    }
}

/// Log the tokens spent this session; shown on stdout when verbose.
fn report_usage(llm: Option<&Arc<dyn LlmClient>>, verbose: bool) {
    let Some(client) = llm else {
        return;
    };
    let usage = client.total_usage();
    if usage.total() == 0 {
        return;
    }
    info!(
        "LLM usage ({}): {} input + {} output = {} tokens",
        client.model(),
        usage.input_tokens,
        usage.output_tokens,
        usage.total()
    );
    if verbose {
        println!(
            "{}",
            format!("[{} tokens used: {} in, {} out]", usage.total(), usage.input_tokens, usage.output_tokens).dimmed()
        );
    }
}

fn check_login(cli: &Cli, gate: &PasswordGate) -> Result<()> {
    if !gate.is_enabled() {
        return Ok(());
    }
    let password = cli
        .password
        .as_deref()
        .ok_or_else(|| eyre!("A password is required: pass --password or set HDB_ADVISOR_PASSWORD"))?;
    if gate.verify(password) {
        info!("CLI login successful");
        Ok(())
    } else {
        warn!("CLI login failed");
        Err(eyre!(auth::INCORRECT_PASSWORD))
    }
}

fn print_answer(answer: &Answer) {
    match answer {
        Answer::Llm { text, tags } => {
            println!("{}", "Response:".cyan().bold());
            println!("{}", text);
            let failed = tags.iter().filter(|t| t.result.is_err()).count();
            if failed > 0 {
                println!("{}", format!("({} figure(s) could not be computed)", failed).yellow());
            }
        }
        Answer::NoData { .. } => println!("{}", answer.to_string().yellow()),
        Answer::Average { .. } => println!("{}", answer.to_string().green()),
        _ => println!("{}", answer),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let gate = PasswordGate::new(config.auth.password_hash.clone());

    let Some(command) = &cli.command else {
        // Default: launch TUI mode
        return run_tui(config, gate).await;
    };

    if command.needs_login() {
        check_login(cli, &gate)?;
    }
    let loaded = if command.needs_data() {
        debug!("Resale data directory: {}", config.data.dir.display());
        Some(load_table(config)?)
    } else {
        None
    };
    let table = loaded.as_ref().map(|(table, _)| table.clone());

    match command {
        Commands::HashPassword { password } => handle_hash_password_command(password),
        Commands::About => {
            println!("{}", content::ABOUT_US);
            Ok(())
        }
        Commands::Methodology => {
            println!("{}", content::METHODOLOGY);
            Ok(())
        }
        Commands::Guide => {
            println!("{}", content::buying_guide());
            Ok(())
        }
        Commands::Faq { question } => {
            println!("{}", content::faq_answer(&question.join(" ")));
            Ok(())
        }
        Commands::Summary => match &loaded {
            Some((table, report)) => handle_summary_command(table, report, config),
            None => Err(eyre!("Resale data was not loaded")),
        },
        Commands::Query { text } => {
            let table = table.ok_or_else(|| eyre!("Resale data was not loaded"))?;
            handle_query_command(&text.join(" "), table, cli.is_verbose(), config).await
        }
        Commands::Trend { town, flat_type } => {
            let table = table.ok_or_else(|| eyre!("Resale data was not loaded"))?;
            handle_trend_command(town.as_deref(), flat_type.as_deref(), &table)
        }
        Commands::Afford {
            income,
            savings,
            debts,
            tenure,
            town,
            flat_type,
            advice,
        } => {
            let input = AffordabilityInput {
                monthly_income: *income,
                savings: *savings,
                monthly_debts: *debts,
                loan_tenure_years: *tenure,
                desired_town: town.clone(),
                desired_flat_type: flat_type.clone(),
            };
            handle_afford_command(input, *advice, table, cli.is_verbose(), config).await
        }
    }
}

async fn run_tui(config: &Config, gate: PasswordGate) -> Result<()> {
    info!("Launching TUI mode");
    let (table, _) = load_table(config)?;
    let llm = build_llm(config);
    let services = Services {
        router: QueryRouter::new(table, llm.clone(), config),
        gate,
        llm: llm.clone(),
        config: config.clone(),
    };
    let result = tui::run(services).await;
    report_usage(llm.as_ref(), false);
    result
}

fn handle_hash_password_command(password: &str) -> Result<()> {
    let hash = auth::hash_password(password).context("Failed to hash password")?;
    println!("{}", "Add this to your config file:".green());
    println!("auth:\n  password_hash: \"{}\"", hash);
    Ok(())
}

fn handle_summary_command(table: &ResaleTable, report: &LoadReport, config: &Config) -> Result<()> {
    println!("{} {}", "Data directory:".green(), config.data.dir.display());
    for file in &report.files {
        println!("  {}", file.display());
    }
    if report.skipped_rows > 0 {
        println!("{}", format!("{} rows skipped (unparseable)", report.skipped_rows).yellow());
    }
    print!("{}", table.summary());
    Ok(())
}

async fn handle_query_command(query: &str, table: Arc<ResaleTable>, verbose: bool, config: &Config) -> Result<()> {
    info!("Answering query: {}", query);
    let llm = build_llm(config);
    let router = QueryRouter::new(table, llm.clone(), config);

    match router.answer(query).await {
        Ok(answer) => print_answer(&answer),
        Err(e) => {
            error!("Query '{}' failed: {}", query, e);
            println!("{}", e.user_message().red());
        }
    }
    report_usage(llm.as_ref(), verbose);
    Ok(())
}

fn handle_trend_command(town: Option<&str>, flat_type: Option<&str>, table: &ResaleTable) -> Result<()> {
    let mut filter = RecordFilter::new();
    if let Some(town) = town {
        filter = filter.town(town);
    }
    if let Some(flat_type) = flat_type {
        filter = filter.flat_type(flat_type);
    }

    let description = filter.describe();
    let trend = table.price_trend(&filter);
    let answer = if trend.is_empty() {
        Answer::NoData { description }
    } else {
        Answer::Trend { description, trend }
    };
    print_answer(&answer);
    Ok(())
}

async fn handle_afford_command(
    input: AffordabilityInput,
    want_advice: bool,
    table: Option<Arc<ResaleTable>>,
    verbose: bool,
    config: &Config,
) -> Result<()> {
    if let Err(e) = input.validate(config.affordability.max_tenure_years) {
        println!("{}", e.user_message().red());
        return Ok(());
    }

    let result = affordability::calculate(&input, config.affordability.interest_rate);
    println!("{}", result.headline().green().bold());
    println!("Maximum loan: {}", hdb_advisor::format::currency(result.max_loan));

    let market = table
        .as_deref()
        .and_then(|table| affordability::market_comparison(table, &input, &result));
    if let Some(market) = &market {
        println!("{}", market.summary_line());
    }

    if want_advice {
        let llm = build_llm(config);
        match &llm {
            Some(client) => {
                match affordability::advise(client.as_ref(), &input, &result, market.as_ref(), &config.llm).await {
                    Ok(advice) => {
                        println!();
                        println!("{}", "Advice:".cyan().bold());
                        println!("{}", advice);
                    }
                    Err(e) => {
                        error!("Affordability advice failed: {}", e);
                        println!("{}", e.user_message().red());
                    }
                }
            }
            None => println!(
                "{}",
                format!("Advice is unavailable: set {} to enable the LLM.", config.llm.api_key_env).yellow()
            ),
        }
        report_usage(llm.as_ref(), verbose);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }

    // Setup logging; RUST_LOG wins over the config level
    let level = if cli.is_verbose() {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
