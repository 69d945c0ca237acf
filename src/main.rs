// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use inventory_ledger::{
    indexed_view, Config, Flow, Inventory, ProductFilter, Registration,
    SessionContext, Submission,
};

#[derive(Parser)]
#[command(
    name = "inventory-ledger",
    about = "Inventory ledger: register products, log stock movements, see net stock",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to $INVENTORY_LEDGER_CONFIG or ./inventory.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Log stock coming in
    Entry(MovementArgs),
    /// Log stock going out
    Exit(MovementArgs),
    /// Register a new product
    Register {
        /// Product name (stored upper-cased)
        name: String,
    },
    /// Delete a ledger row by its index (see `ledger`)
    Delete { index: usize },
    /// Show movements, most recent first
    Ledger(FilterArgs),
    /// Show inflow, outflow and net stock
    Stock(FilterArgs),
    /// List registered products
    Products,
    /// Replace the configured ledger with the rows of a CSV export
    Import { csv: PathBuf },
    /// Interactive terminal dashboard
    Tui,
}

#[derive(Args)]
struct MovementArgs {
    product: String,
    #[arg(allow_negative_numbers = true)]
    quantity: f64,
    /// Reason / note
    #[arg(short, long, default_value = "")]
    note: String,
}

#[derive(Args)]
struct FilterArgs {
    /// Product name, or ALL
    #[arg(short, long, default_value = "ALL")]
    product: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The dashboard owns the terminal; log lines would corrupt it
    if !matches!(cli.command, Command::Tui) {
        init_tracing(cli.verbose);
    }

    let config = Config::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    let inventory = Inventory::from_config(&config).context("Failed to open inventory")?;
    let session = SessionContext::authenticated(config.operator.clone());

    run_command(cli.command, cli.format, &inventory, &session)
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_command(
    command: Command,
    format: OutputFormat,
    inventory: &Inventory,
    session: &SessionContext,
) -> Result<()> {
    match command {
        Command::Entry(args) => submit(inventory, session, Flow::Entry, args, format),
        Command::Exit(args) => submit(inventory, session, Flow::Exit, args, format),
        Command::Register { name } => register(inventory, session, &name, format),
        Command::Delete { index } => {
            let removed = inventory
                .delete_movement(session, index)
                .with_context(|| format!("Failed to delete row {index}"))?;
            match format {
                OutputFormat::Json => print_json(&removed)?,
                OutputFormat::Text => println!(
                    "✓ Deleted row {}: {} {} {}",
                    index, removed.kind, removed.product, removed.quantity
                ),
            }
            Ok(())
        }
        Command::Ledger(args) => show_ledger(inventory, session, &args.product, format),
        Command::Stock(args) => show_stock(inventory, session, &args.product, format),
        Command::Products => {
            let view = inventory.refresh(session)?;
            match format {
                OutputFormat::Json => print_json(&view.products)?,
                OutputFormat::Text => {
                    for product in &view.products {
                        println!("{product}");
                    }
                    println!("\n{} products", view.product_count());
                }
            }
            Ok(())
        }
        Command::Import { csv } => {
            let ledger = inventory
                .import_csv(session, &csv)
                .with_context(|| format!("Failed to import {}", csv.display()))?;
            let target = inventory.store().describe();
            match format {
                OutputFormat::Json => print_json(&import_summary(&csv, &target, ledger.len()))?,
                OutputFormat::Text => {
                    println!("✓ Imported {} rows into {}", ledger.len(), target)
                }
            }
            Ok(())
        }
        Command::Tui => run_ui_mode(inventory, session),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(inventory: &Inventory, session: &SessionContext) -> Result<()> {
    let mut app = ui::App::new(inventory, session.clone())?;
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_inventory: &Inventory, _session: &SessionContext) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin inventory-server --features server");
    std::process::exit(1);
}

fn submit(
    inventory: &Inventory,
    session: &SessionContext,
    flow: Flow,
    args: MovementArgs,
    format: OutputFormat,
) -> Result<()> {
    let now = inventory.now();
    let outcome = inventory
        .submit_movement(session, &args.product, flow, args.quantity, &args.note, now)
        .context("Failed to record movement")?;

    match (outcome, format) {
        (Submission::Recorded(record), OutputFormat::Json) => print_json(&record)?,
        (Submission::Recorded(record), OutputFormat::Text) => {
            let view = inventory.refresh(session)?;
            let net = view
                .totals_for(&ProductFilter::parse(&record.product))
                .net;
            println!(
                "✓ {} of {} {} recorded (net stock: {})",
                record.kind, record.quantity, record.product, net
            );
        }
        (Submission::Rejected, OutputFormat::Json) => print_json(&serde_json::Value::Null)?,
        (Submission::Rejected, OutputFormat::Text) => {
            println!("Nothing recorded: choose a product and a quantity greater than zero.");
        }
    }
    Ok(())
}

fn register(
    inventory: &Inventory,
    session: &SessionContext,
    name: &str,
    format: OutputFormat,
) -> Result<()> {
    let now = inventory.now();
    let outcome = inventory
        .register_product(session, name, now)
        .context("Failed to register product")?;

    match (outcome, format) {
        (Registration::Created(record), OutputFormat::Json) => print_json(&record)?,
        (Registration::Created(record), OutputFormat::Text) => {
            println!("✓ Product {} registered", record.product)
        }
        (Registration::AlreadyExists(name), OutputFormat::Json) => {
            print_json(&serde_json::json!({ "already_exists": name }))?
        }
        (Registration::AlreadyExists(name), OutputFormat::Text) => {
            println!("Product {name} already exists")
        }
    }
    Ok(())
}

fn show_ledger(
    inventory: &Inventory,
    session: &SessionContext,
    product: &str,
    format: OutputFormat,
) -> Result<()> {
    let view = inventory.refresh(session)?;
    let filter = ProductFilter::parse(product);
    let rows = indexed_view(&view.ledger, &filter);

    if let OutputFormat::Json = format {
        #[derive(Serialize)]
        struct Row<'a> {
            index: usize,
            #[serde(flatten)]
            record: &'a inventory_ledger::MovementRecord,
        }
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|(index, record)| Row { index, record })
            .collect();
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No movements yet.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<16}  {:<24}  {:<9}  {:>10}  {}",
        "#", "Data", "Produto", "Tipo", "Quantidade", "Motivo"
    );
    for (index, record) in rows {
        let row = record.to_row();
        println!(
            "{:>5}  {:<16}  {:<24}  {:<9}  {:>10}  {}",
            index,
            row.data,
            truncate(&row.produto, 24),
            row.tipo,
            row.quantidade,
            row.motivo
        );
    }
    Ok(())
}

fn show_stock(
    inventory: &Inventory,
    session: &SessionContext,
    product: &str,
    format: OutputFormat,
) -> Result<()> {
    let view = inventory.refresh(session)?;
    let filter = ProductFilter::parse(product);

    match (&filter, format) {
        (ProductFilter::All, OutputFormat::Json) => print_json(&serde_json::json!({
            "products": view.product_count(),
            "totals": view.totals,
            "stock": view.stock,
        })),
        (ProductFilter::Product(_), OutputFormat::Json) => print_json(&view.totals_for(&filter)),
        (ProductFilter::All, OutputFormat::Text) => {
            println!("{:<24}  {:>10}  {:>10}  {:>10}", "Produto", "Entradas", "Saídas", "Saldo");
            for stock in &view.stock {
                let flag = if stock.is_negative() { "  ⚠" } else { "" };
                println!(
                    "{:<24}  {:>10}  {:>10}  {:>10}{}",
                    truncate(stock.product.as_str(), 24),
                    stock.totals.inflow,
                    stock.totals.outflow,
                    stock.totals.net,
                    flag
                );
            }
            println!(
                "\n{} products | in {} | out {} | net {}",
                view.product_count(),
                view.totals.inflow,
                view.totals.outflow,
                view.totals.net
            );
            Ok(())
        }
        (ProductFilter::Product(name), OutputFormat::Text) => {
            let totals = view.totals_for(&filter);
            println!(
                "{name}: in {} | out {} | net {}",
                totals.inflow, totals.outflow, totals.net
            );
            Ok(())
        }
    }
}

fn import_summary(source: &Path, target: &str, rows: usize) -> serde_json::Value {
    serde_json::json!({
        "source": source.display().to_string(),
        "target": target,
        "rows": rows,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_summary_json() {
        let summary = import_summary(Path::new("export.csv"), "sqlite:estoque.db", 3);
        assert_eq!(
            summary,
            serde_json::json!({
                "source": "export.csv",
                "target": "sqlite:estoque.db",
                "rows": 3,
            })
        );
    }

    #[test]
    fn test_import_accepts_format_flag() {
        let cli = Cli::try_parse_from(["inventory-ledger", "import", "x.csv", "--format", "json"])
            .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Import { .. }));
    }
}
