use crate::collect::{collect_spreadsheets, plan_destinations};
use crate::core::{process_workbook, EtlConfig, ProcessedWorkbook, SchemaRegistry};
use crate::error::EtlResult;
use crate::sql::{default_sql_path, SqlScript};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options of the normalize command
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Output file, or output directory when the target is a directory
    pub output: Option<PathBuf>,
    /// JSON rule file replacing the built-in schemas
    pub rules: Option<PathBuf>,
    pub config: EtlConfig,
    /// Also write `<output>.sql`
    pub sql: bool,
    /// Also write `<output>.json`
    pub json: bool,
    pub verbose: bool,
}

/// Built-in schemas, or the ones in `rules` when given
pub fn load_registry(rules: Option<&Path>) -> EtlResult<SchemaRegistry> {
    match rules {
        Some(path) => SchemaRegistry::from_json_file(path),
        None => Ok(SchemaRegistry::builtin()),
    }
}

fn file_size_kb(path: &Path) -> EtlResult<f64> {
    Ok(fs::metadata(path)?.len() as f64 / 1024.0)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Execute the normalize command
pub fn normalize(target: PathBuf, options: NormalizeOptions) -> EtlResult<()> {
    println!("{}", "📦 Inventory ETL - Normalize".bold().green());
    println!("   Target: {}", target.display());
    if let Some(ref rules) = options.rules {
        println!("   Rules:  {}", rules.display().to_string().bright_yellow());
    }
    println!();

    let registry = load_registry(options.rules.as_deref())?;
    let files = collect_spreadsheets(&target)?;

    let batch_root = (target.is_dir() && options.output.is_some()).then_some(target.as_path());
    let plan = plan_destinations(&files, options.output.as_deref(), batch_root)?;

    if options.verbose {
        println!("   Found {} workbook(s)\n", files.len());
    }

    for (file, destination) in &plan {
        if batch_root.is_some() {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        println!("{} {}", "📖 Processing:".cyan(), display_name(file).bright_blue());
        let processed = process_workbook(file, destination, &registry, options.config)?;
        print_report(&processed, options.verbose);

        println!(
            "{} {}",
            "✅ Processed workbook created:".bold().green(),
            destination.display()
        );
        println!("   Size: {:.2} KB", file_size_kb(destination)?);

        if options.sql {
            let sql_path = default_sql_path(destination);
            SqlScript::from_processed(&processed).write(&sql_path)?;
            println!("   SQL:  {}", sql_path.display());
        }

        if options.json {
            let json_path = destination.with_extension("json");
            fs::write(&json_path, processed.to_json()?)?;
            println!("   JSON: {}", json_path.display());
        }
        println!();
    }

    Ok(())
}

fn print_report(processed: &ProcessedWorkbook, verbose: bool) {
    for sheet in &processed.sheets {
        let report = &sheet.report;
        match report.kind {
            Some(kind) => {
                println!(
                    "   📊 {} ({}) header row {}, {} → {} rows",
                    sheet.name.bright_blue(),
                    kind,
                    report.header_row,
                    report.original_rows,
                    sheet.table.row_count()
                );
                if report.removed_rows > 0 {
                    println!(
                        "      {} row(s) removed with missing data",
                        report.removed_rows.to_string().yellow()
                    );
                }
                if !report.removed_columns.is_empty() {
                    println!(
                        "      Columns removed: {}",
                        report.removed_columns.join(", ").yellow()
                    );
                }
                if verbose {
                    println!("      Columns: {}", sheet.table.labels().join(", "));
                }
            }
            None => {
                println!(
                    "   📄 {} copied unchanged ({} rows)",
                    sheet.name.bright_black(),
                    sheet.table.row_count()
                );
            }
        }
    }
}

/// Execute the sql command
pub fn sql(input: PathBuf, output: Option<PathBuf>, verbose: bool) -> EtlResult<()> {
    let output = output.unwrap_or_else(|| default_sql_path(&input));

    println!("{}", "📦 Inventory ETL - SQL Script".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", output.display());

    if verbose {
        println!("{}", "📖 Reading processed workbook...".cyan());
    }

    let script = SqlScript::from_workbook(&input, &SchemaRegistry::builtin())?;

    for (table, count) in script.counts() {
        println!("   {}: {} record(s)", table.bright_blue(), count);
    }

    script.write(&output)?;

    println!("\n{} {}", "✅ SQL script generated:".bold().green(), output.display());
    println!("   Size: {:.2} KB", file_size_kb(&output)?);
    println!("\n   Run it with:");
    println!("     psql -U <user> -d <database> -f \"{}\"\n", output.display());

    Ok(())
}

/// Execute the rules command
pub fn rules(rules: Option<PathBuf>) -> EtlResult<()> {
    let registry = load_registry(rules.as_deref())?;
    println!("{}", registry.to_json()?);
    Ok(())
}
