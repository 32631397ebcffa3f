use anyhow::Context;
use clap::{Parser, Subcommand};
use inventory_etl::cli::{self, NormalizeOptions};
use inventory_etl::core::{EtlConfig, HeaderScan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inventory-etl")]
#[command(about = "Normalize inventory workbooks and generate SQL insert scripts")]
#[command(long_about = "Inventory ETL - Excel inventory normalization

Finds the real header row of each sheet, maps column labels to canonical
field names, cleans cell values and drops incomplete rows and empty columns.
Sheets named Stock, Entradas and Salidas (any case or accents) are
normalized; every other sheet is copied unchanged.

COMMANDS:
  normalize   - Normalize a workbook or every workbook in a folder
  sql         - Generate PostgreSQL INSERT statements from a processed workbook
  rules       - Print the active column mapping rules as JSON

EXAMPLES:
  inventory-etl normalize inventario.xlsx            # → inventario_procesado.xlsx
  inventory-etl normalize carpeta/ -o salida/ --sql
  inventory-etl sql inventario_procesado.xlsx        # → inventario_procesado.sql
  inventory-etl rules > reglas.json")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Normalize inventory workbooks.

TARGET may be a single .xlsx/.xls file or a folder; folders are searched
recursively and Office lock files (~$name.xlsx) are ignored.

OUTPUT:
  Without -o, each workbook is written next to its source as
  <name>_procesado.xlsx. For a single file, -o is the output file.
  For a folder, -o is a directory receiving the processed workbooks.

HEADER DETECTION:
  The first --scan-rows rows (default 10) are searched for the row matching
  at least --min-matches (default 2) known column labels.")]
    /// Normalize a workbook or a folder of workbooks
    Normalize {
        /// Excel file or folder with Excel files
        target: PathBuf,

        /// Output file (or directory, for a folder target)
        #[arg(short, long, env = "INVENTORY_ETL_OUTPUT")]
        output: Option<PathBuf>,

        /// JSON rule file replacing the built-in column mappings
        #[arg(long, env = "INVENTORY_ETL_RULES")]
        rules: Option<PathBuf>,

        /// Number of leading rows searched for the header
        #[arg(long, default_value_t = HeaderScan::default().max_rows)]
        scan_rows: usize,

        /// Known labels a row needs to be taken as the header
        #[arg(long, default_value_t = HeaderScan::default().min_matches)]
        min_matches: usize,

        /// Also write a SQL insert script next to each output
        #[arg(long)]
        sql: bool,

        /// Also write the normalized records as JSON next to each output
        #[arg(long)]
        json: bool,

        /// Show detailed output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate SQL INSERT statements from a processed workbook
    Sql {
        /// Processed .xlsx file
        input: PathBuf,

        /// Output .sql file (default: input with .sql extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show detailed output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the active column mapping rules as JSON
    Rules {
        /// JSON rule file to validate and print instead of the built-in rules
        #[arg(long, env = "INVENTORY_ETL_RULES")]
        rules: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "inventory_etl=debug"
    } else {
        "inventory_etl=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            target,
            output,
            rules,
            scan_rows,
            min_matches,
            sql,
            json,
            verbose,
        } => {
            init_tracing(verbose);
            let options = NormalizeOptions {
                output,
                rules,
                config: EtlConfig {
                    header_scan: HeaderScan {
                        max_rows: scan_rows,
                        min_matches,
                    },
                },
                sql,
                json,
                verbose,
            };
            cli::normalize(target.clone(), options)
                .with_context(|| format!("Failed to normalize {}", target.display()))
        }

        Commands::Sql {
            input,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            cli::sql(input.clone(), output, verbose)
                .with_context(|| format!("Failed to generate SQL from {}", input.display()))
        }

        Commands::Rules { rules } => {
            init_tracing(false);
            cli::rules(rules).context("Failed to load rules")
        }
    }
}
