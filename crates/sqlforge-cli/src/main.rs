use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sqlforge_adapter::for_target;
use sqlforge_core::{Config, RunReport};
use sqlforge_dag::{build_from_dir, topological_sort, validate, Graph};
use sqlforge_jinja::{RenderContext, SqlRenderer};
use sqlforge_runner::{RunError, Runner};

/// SQLForge - SQL-first data transformation runner
#[derive(Parser)]
#[command(name = "sqlforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlforge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, validate, and execute models against a target
    Run {
        /// Target to execute against (default: config's default_target)
        #[arg(short, long)]
        target: Option<String>,

        /// Comma-separated model names to run (exact match)
        #[arg(short, long)]
        models: Option<String>,

        /// Stop at the first failing model
        #[arg(long)]
        fail_fast: bool,

        /// Write a JSON run report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render models to SQL without executing anything
    Compile {
        /// Target whose settings parameterize rendering
        #[arg(short, long)]
        target: Option<String>,

        /// Comma-separated model names to render (exact match)
        #[arg(short, long)]
        models: Option<String>,
    },

    /// Print the execution order and each model's dependencies
    Dag,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("sqlforge.toml").exists() {
        Config::from_file(Path::new("sqlforge.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Run {
            target,
            models,
            fail_fast,
            output,
        } => {
            run_command(
                &config,
                target.as_deref(),
                models.as_deref(),
                fail_fast,
                output.as_deref(),
                cli.verbose,
            )
            .await
        }
        Commands::Compile { target, models } => {
            compile_command(&config, target.as_deref(), models.as_deref(), cli.verbose)
        }
        Commands::Dag => dag_command(&config, cli.verbose),
    }
}

/// Split a comma-separated model filter into names
fn parse_model_filter(models: Option<&str>) -> Option<Vec<String>> {
    models.map(|list| {
        list.split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    })
}

/// Build, validate, and sort the project's models
fn load_graph(config: &Config, verbose: bool) -> Result<(Graph, Vec<String>)> {
    let models_dir = config.resolved_models_dir();

    if verbose {
        eprintln!(
            "{} {}",
            "Loading models from:".cyan(),
            models_dir.display()
        );
    }

    let graph = build_from_dir(&models_dir)?;

    if verbose {
        eprintln!("{} {} model(s)", "Found".cyan(), graph.len());
    }

    validate(&graph)?;
    let order = topological_sort(&graph)?;

    Ok((graph, order))
}

/// Build a render context for a target
fn render_context(config: &Config, target_name: &str) -> Result<RenderContext> {
    let target = config.target(target_name)?;

    let mut context = RenderContext::new(target_name).with_vars(config.vars.clone());
    if let Some(schema) = target.schema() {
        context = context.with_schema(schema);
    }
    Ok(context)
}

/// Run command - execute models against the target database
async fn run_command(
    config: &Config,
    target: Option<&str>,
    models: Option<&str>,
    fail_fast: bool,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let target_name = target.unwrap_or(&config.default_target);
    let target_config = config.target(target_name)?;
    let filter = parse_model_filter(models);

    let (graph, order) = load_graph(config, verbose)?;
    let context = render_context(config, target_name)?;
    let adapter = for_target(target_config)?;

    if verbose {
        eprintln!(
            "{} {} ({})",
            "Executing against target:".cyan(),
            target_name,
            adapter.name()
        );
    }

    let runner = Runner::new(fail_fast);
    let result = runner
        .run(&graph, &order, filter.as_deref(), adapter.as_ref(), &context)
        .await;

    match result {
        Ok(report) => {
            save_report(&report, output, verbose)?;
            print_run_summary(&report);
            Ok(())
        }
        Err(RunError::Aggregate { failed, report }) => {
            save_report(&report, output, verbose)?;
            print_run_summary(&report);
            eprintln!("{}", format!("✗ {failed} model(s) failed").red().bold());
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

fn save_report(report: &RunReport, output: Option<&Path>, verbose: bool) -> Result<()> {
    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }
    Ok(())
}

/// Compile command - render every selected model to stdout
fn compile_command(
    config: &Config,
    target: Option<&str>,
    models: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let target_name = target.unwrap_or(&config.default_target);
    let filter = parse_model_filter(models);

    let (graph, order) = load_graph(config, verbose)?;
    let context = render_context(config, target_name)?;
    let renderer = SqlRenderer::new();

    for id in &order {
        let Some(node) = graph.get_node(id) else {
            continue;
        };
        if let Some(names) = &filter {
            if !names.iter().any(|name| *name == node.name) {
                continue;
            }
        }

        let template = renderer.parse(&node.name, &node.raw_sql)?;
        let node_context = context.clone().for_model(node.name.clone());
        let rendered = renderer.render(&template, &node_context, &HashMap::new())?;

        println!("{}", format!("-- {}", id).bright_blue());
        println!("{}\n", rendered.trim_end());
    }

    Ok(())
}

/// Dag command - show the deterministic execution order
fn dag_command(config: &Config, verbose: bool) -> Result<()> {
    let (graph, order) = load_graph(config, verbose)?;

    println!("{}", "Execution order:".bold());
    for (i, id) in order.iter().enumerate() {
        let deps = graph.dependencies(id);
        if deps.is_empty() {
            println!("  {}. {}", i + 1, id.green());
        } else {
            println!(
                "  {}. {} {} {}",
                i + 1,
                id.green(),
                "<-".dimmed(),
                deps.join(", ").yellow()
            );
        }
    }

    Ok(())
}

/// Print run summary to stdout
fn print_run_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Run Summary".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Target:    {}", report.target);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("  Attempted: {}", report.summary.attempted);
    println!(
        "  Succeeded: {}",
        format!("{}", report.summary.succeeded).green()
    );

    if report.summary.failed > 0 {
        println!(
            "  Failed:    {}",
            format!("{}", report.summary.failed).red().bold()
        );
    } else {
        println!("  Failed:    {}", "0".green());
    }

    if !report.results.is_empty() {
        println!();
        for result in &report.results {
            match result.status {
                sqlforge_core::ModelStatus::Succeeded => {
                    println!("  {} {}", "✓".green(), result.id);
                }
                sqlforge_core::ModelStatus::Failed => {
                    println!("  {} {}", "✗".red(), result.id);
                    if let Some(error) = &result.error {
                        println!("      {}", error.red());
                    }
                }
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
