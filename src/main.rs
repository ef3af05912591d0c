use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use parsesmith::config::{self, Config};
use parsesmith::domain::Target;
use parsesmith::generator::LlmCodeGenerator;
use parsesmith::llm::{AnthropicClient, AnthropicConfig, LlmClient};
use parsesmith::prompt::{PromptLoader, PromptRenderer};
use parsesmith::runner::{self, CorrectionLoop, LoopOutcome, LoopReport, MAX_ATTEMPTS};
use parsesmith::tester::SandboxedTester;

/// Exit status for faults that stop the run before or during the loop
const EXIT_ABORTED: i32 = 2;

fn setup_logging(config: &Config) -> Result<()> {
    let log_dir = config::log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("parsesmith.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, mut config: Config) -> Result<i32> {
    match &cli.command {
        Commands::Run {
            target,
            data_dir,
            parsers_dir,
        } => {
            if let Some(dir) = data_dir {
                config.paths.data_dir = dir.clone();
            }
            if let Some(dir) = parsers_dir {
                config.paths.parsers_dir = dir.clone();
            }
            handle_run_command(target, &config, cli.is_verbose()).await
        }
    }
}

async fn handle_run_command(target_id: &str, config: &Config, verbose: bool) -> Result<i32> {
    let target = Target::resolve(target_id, &config.paths)?;
    info!("Running target '{}': {:?}", target.id, target);

    let llm = Arc::new(
        AnthropicClient::new(AnthropicConfig::from(&config.llm))
            .context("LLM client unavailable")?,
    );

    let (context, reference) = runner::prepare(&target, &config.input, &config.harness).await?;

    let loader = PromptLoader::new(config.prompts.templates_dir.as_ref());
    let renderer = PromptRenderer::from_loader(&loader)?;
    let generator = Arc::new(
        LlmCodeGenerator::new(llm.clone(), renderer, config.llm.max_tokens)
            .with_prompt_dump(config.prompts_dir()),
    );
    let tester = Arc::new(SandboxedTester::new(config.harness.clone(), config.comparison.clone()));

    println!(
        "{} {} (up to {} attempts, model {})",
        "Target:".cyan(),
        target.id,
        MAX_ATTEMPTS,
        llm.model()
    );

    let correction_loop = CorrectionLoop::with_config(generator, tester, config.loop_.clone());
    let report = correction_loop.run(&target, &context, &reference).await;

    print_report(&report);
    if verbose {
        print_history(&report);
        let usage = llm.total_usage();
        println!(
            "{} {} tokens in, {} tokens out (~${:.4})",
            "Usage:".cyan(),
            usage.input_tokens,
            usage.output_tokens,
            usage.cost_usd(llm.model())
        );
    }

    Ok(report.exit_code())
}

fn print_report(report: &LoopReport) {
    match &report.outcome {
        LoopOutcome::Succeeded { artifact } => {
            println!(
                "{} Parser for '{}' passed on attempt {}",
                "SUCCESS".green().bold(),
                report.target_id,
                report.attempt_count
            );
            println!("{} {}", "Artifact:".green(), artifact.display());
        }
        LoopOutcome::Exhausted { diagnosis } => {
            println!(
                "{} No passing parser for '{}' after {} attempts",
                "FAILED".red().bold(),
                report.target_id,
                report.attempt_count
            );
            println!("{}", "Last diagnosis:".yellow());
            println!("{}", diagnosis);
        }
        LoopOutcome::Aborted { reason } => {
            println!("{} {}", "ABORTED".red().bold(), reason);
            if let Some(diagnosis) = report.last_diagnosis() {
                println!("{}", "Last diagnosis:".yellow());
                println!("{}", diagnosis);
            }
        }
    }
}

fn print_history(report: &LoopReport) {
    println!();
    println!("{}", "Attempt history:".cyan());
    println!("  {:<3} {:<12} {:<6} {:>8}  {}", "#", "digest", "result", "time", "detail");
    for attempt in &report.attempts {
        let (result, detail) = match &attempt.outcome.diagnosis {
            None => ("pass".green(), String::new()),
            Some(diagnosis) => ("fail".red(), diagnosis.headline()),
        };
        println!(
            "  {:<3} {:<12} {:<6} {:>6}ms  {}",
            attempt.index,
            attempt.short_digest(),
            result,
            attempt.duration_ms,
            detail
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional
    let env_file = dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load configuration: {}", "ABORTED".red().bold(), e);
            std::process::exit(EXIT_ABORTED);
        }
    };
    if let Err(e) = setup_logging(&config) {
        eprintln!("{} Failed to setup logging: {:#}", "ABORTED".red().bold(), e);
        std::process::exit(EXIT_ABORTED);
    }

    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }
    info!("Starting with config from: {:?}", cli.config);

    let code = match run_application(&cli, config).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:?}", e);
            eprintln!("{} {:#}", "ABORTED".red().bold(), e);
            EXIT_ABORTED
        }
    };

    std::process::exit(code)
}
