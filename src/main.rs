use analytics::{MetricsEngine, METRIC_KEYS};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use database::{connect, run_migrations, DbRepository};
use rust_decimal::Decimal;
use scenario::{ComparisonMatrix, Scenario, ScenarioSimulator};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// The main entry point for the Hindsight what-if analysis tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file when present.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Application settings (starting capital, Sharpe inputs), with defaults
    // when no config.toml is present.
    let settings = configuration::load_settings().context("failed to load configuration")?;

    // Initialize the database connection and run migrations
    let db_pool = connect().await.context("failed to connect to the database")?;
    run_migrations(&db_pool)
        .await
        .context("failed to run database migrations")?;
    let repo = DbRepository::new(db_pool);

    let metrics_engine = MetricsEngine::with_settings(
        settings.analytics.risk_free_rate,
        settings.analytics.periods_per_year,
    );
    let simulator = ScenarioSimulator::with_metrics_engine(metrics_engine);

    match cli.command {
        Commands::Baseline(args) => handle_baseline(args, &repo, &simulator, &settings).await,
        Commands::Run(args) => handle_run(args, &repo, &simulator, &settings).await,
        Commands::Compare(args) => handle_compare(args, &repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Re-simulate a futures trading history under altered rules and compare the
/// outcomes side by side.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and persist the baseline scenario from the recorded history.
    Baseline(BaselineArgs),
    /// Run a what-if scenario from a parameter file and persist the result.
    Run(RunArgs),
    /// Tabulate every persisted scenario against the baseline.
    Compare(CompareArgs),
}

#[derive(Parser)]
struct BaselineArgs {
    /// The portfolio whose trades to analyze.
    #[arg(long)]
    portfolio: Uuid,

    /// Overrides the configured starting capital.
    #[arg(long)]
    capital: Option<Decimal>,
}

#[derive(Parser)]
struct RunArgs {
    /// The portfolio whose trades to re-simulate.
    #[arg(long)]
    portfolio: Uuid,

    /// A display name for the scenario (e.g. "2% stop, no Mondays").
    #[arg(long)]
    name: String,

    /// Path to a TOML file of scenario parameters.
    #[arg(long)]
    params: PathBuf,

    /// Overrides the configured starting capital.
    #[arg(long)]
    capital: Option<Decimal>,
}

#[derive(Parser)]
struct CompareArgs {
    /// The portfolio whose persisted scenarios to compare.
    #[arg(long)]
    portfolio: Uuid,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_baseline(
    args: BaselineArgs,
    repo: &DbRepository,
    simulator: &ScenarioSimulator,
    settings: &configuration::Settings,
) -> anyhow::Result<()> {
    let starting_capital = args.capital.unwrap_or(settings.account.starting_capital);
    let trades = repo.get_trades_for_portfolio(args.portfolio).await?;
    println!("Loaded {} trades for portfolio {}", trades.len(), args.portfolio);

    let baseline = simulator.create_baseline(&trades, starting_capital)?;
    repo.save_scenario(args.portfolio, &baseline).await?;

    print_scenario(&baseline);
    Ok(())
}

async fn handle_run(
    args: RunArgs,
    repo: &DbRepository,
    simulator: &ScenarioSimulator,
    settings: &configuration::Settings,
) -> anyhow::Result<()> {
    let params = configuration::load_scenario_params(&args.params)
        .with_context(|| format!("invalid scenario parameters in {}", args.params.display()))?;

    let starting_capital = args.capital.unwrap_or(settings.account.starting_capital);
    let trades = repo.get_trades_for_portfolio(args.portfolio).await?;
    println!("Loaded {} trades for portfolio {}", trades.len(), args.portfolio);

    // Pull the candle series for every instrument the history touches.
    let instruments: BTreeSet<String> =
        trades.iter().map(|t| t.instrument.clone()).collect();
    let mut candles = Vec::new();
    for instrument in &instruments {
        let mut series = repo.get_candles(instrument).await?;
        println!("Loaded {} candles for {}", series.len(), instrument);
        candles.append(&mut series);
    }

    let scenario =
        simulator.create_scenario(&args.name, &params, &trades, &candles, starting_capital)?;
    repo.save_scenario(args.portfolio, &scenario).await?;
    tracing::info!(scenario = %scenario.name, trades = scenario.trades.len(), "scenario persisted");

    print_scenario(&scenario);
    Ok(())
}

async fn handle_compare(args: CompareArgs, repo: &DbRepository) -> anyhow::Result<()> {
    let stored = repo.list_scenarios(args.portfolio).await?;
    if stored.is_empty() {
        println!("No scenarios persisted for portfolio {}", args.portfolio);
        return Ok(());
    }

    // Baseline first, then what-ifs in creation order.
    let mut scenarios: Vec<Scenario> = stored.into_iter().map(|s| s.scenario).collect();
    scenarios.sort_by_key(|s| !s.is_baseline);

    let matrix = ComparisonMatrix::build(&scenarios, None);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec![Cell::new("Metric")];
    for row in &matrix.rows {
        let title = if row.is_baseline {
            format!("{} *", row.scenario_name)
        } else {
            row.scenario_name.clone()
        };
        header.push(Cell::new(title));
    }
    table.set_header(header);

    for (i, key) in matrix.metric_keys.iter().enumerate() {
        let mut cells = vec![Cell::new(key)];
        for row in &matrix.rows {
            let cell = &row.cells[i];
            let text = match (cell.delta, row.is_baseline) {
                (Some(delta), false) => format!("{:.2} ({:+.2})", cell.value, delta),
                _ => format!("{:.2}", cell.value),
            };
            cells.push(Cell::new(text));
        }
        table.add_row(cells);
    }

    println!("{table}");
    println!("* baseline");
    Ok(())
}

/// Prints one scenario's parameter digest and metric battery.
fn print_scenario(scenario: &Scenario) {
    println!("\n{} [{}]", scenario.name, scenario.parameter_summary());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![Cell::new("Metric"), Cell::new("Value")]);

    for key in METRIC_KEYS
        .iter()
        .chain(["total_trades", "num_wins", "num_losses", "drawdown_duration_days"].iter())
    {
        if let Some(value) = scenario.metrics.value(key) {
            table.add_row(vec![Cell::new(key), Cell::new(format!("{value:.2}"))]);
        }
    }

    println!("{table}");
}
