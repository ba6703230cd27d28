use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use company_mentions::{
    build_index, init_tracing, process_uploaded_file, Config, Report, Workbook,
};

/// Resolve company mentions in annotated posts against a roster
#[derive(Parser, Debug)]
#[command(name = "company-mentions", version, about)]
struct Args {
    /// TOML configuration file (sheet/column names, vocabularies, report titles)
    #[arg(short, long, global = true, env = "MENTIONS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the mention report from a workbook (xlsx/ods file or CSV directory)
    Process {
        workbook: PathBuf,

        /// Output file (stdout when omitted; required for xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Show roster alias index statistics and alias collisions
    Aliases { workbook: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Xlsx,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Process {
            workbook,
            output,
            format,
        } => run_process(&workbook, output.as_deref(), format, &config),
        Command::Aliases { workbook } => run_aliases(&workbook, &config),
    }
}

fn run_process(
    workbook: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    if format == OutputFormat::Xlsx && output.is_none() {
        bail!("--format xlsx needs an --output file");
    }

    let report = process_uploaded_file(workbook, config)
        .with_context(|| format!("Failed to process file {}", workbook.display()))?;

    match (format, output) {
        (OutputFormat::Xlsx, Some(path)) => report
            .write_xlsx(path, &config.report)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        (OutputFormat::Xlsx, None) => bail!("--format xlsx needs an --output file"),
        (text_format, output) => write_text(&report, text_format, output, config)?,
    }

    if let Some(path) = output {
        info!("✓ Report with {} rows written to {}", report.len(), path.display());
    }

    Ok(())
}

/// CSV or JSON to a file, or to stdout
fn write_text(report: &Report, format: OutputFormat, output: Option<&Path>, config: &Config) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if format == OutputFormat::Json {
        writeln!(writer, "{}", report.to_json()?)?;
    } else {
        report.write_csv(&mut writer, &config.report)?;
    }
    writer.flush()?;

    Ok(())
}

fn run_aliases(workbook: &Path, config: &Config) -> Result<()> {
    let workbook = Workbook::open(workbook)
        .with_context(|| format!("Failed to read workbook {}", workbook.display()))?;
    let index = build_index(&workbook, config)?;

    println!("Companies: {}", index.company_count());
    println!("Aliases:   {}", index.alias_count());

    let collisions = index.collisions();
    if collisions.is_empty() {
        println!("No alias collisions");
    } else {
        println!("\nAlias collisions (later roster row wins):");
        for collision in collisions {
            println!(
                "  {:<30} {} → {}",
                collision.alias, collision.previous, collision.replacement
            );
        }
    }

    Ok(())
}
