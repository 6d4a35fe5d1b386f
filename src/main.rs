use clap::Parser;
use xlsx_overwrite::common::errors::AppError;
use xlsx_overwrite::common::json::JsonUtil;
use xlsx_overwrite::tools::overwrite_cells;
use xlsx_overwrite::xlsx::change_set::ChangePayload;

#[derive(Debug, Parser)]
#[command(
    name = "xlsx-overwrite",
    about = "Overwrite xlsx cells with a style-preserving strategy."
)]
struct Cli {
    /// Workbook path (.xlsx)
    #[arg(long)]
    workbook: String,
    /// JSON payload path
    #[arg(long)]
    changes: String,
}

fn main() {
    // Logging goes to stderr so stdout stays reserved for the JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let payload: ChangePayload = JsonUtil::read_file(&cli.changes)?;
    let report = overwrite_cells::run(&cli.workbook, payload)?;
    println!("{}", JsonUtil::render(&report)?);
    Ok(())
}
