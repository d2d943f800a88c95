mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use customs_print_core::ocr::{DEFAULT_ENDPOINT, DEFAULT_LANGUAGE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "customs-print",
    version,
    about = "Extract, highlight and merge matching pages from customs invoice PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find matching pages in a batch of invoices and merge them into one PDF
    Extract {
        /// PDF files or directories of PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,

        /// Directory the merged PDF is written to
        #[arg(long, default_value = "customs_out", value_name = "DIR")]
        out_dir: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Show the text source and located terms of every page of one PDF
    Inspect {
        /// Path to PDF file
        input_file: PathBuf,

        /// Term to locate on each page (repeatable)
        #[arg(short, long = "term", value_name = "TERM")]
        terms: Vec<String>,

        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Check and show criteria files
    Criteria {
        #[command(subcommand)]
        action: CriteriaAction,
    },
}

#[derive(Subcommand)]
enum CriteriaAction {
    /// Validate a criteria file
    Validate {
        /// Path to JSON criteria file
        file: PathBuf,
    },
    /// Print an example criteria file for every search mode
    Example,
}

/// Search criteria, from flags or a criteria file.
#[derive(Args)]
pub struct SearchArgs {
    /// GIR number; only files whose name contains it are scanned
    #[arg(long)]
    pub gir: Option<String>,

    /// Item number to look for (repeat for several, any of them matches)
    #[arg(long = "item", value_name = "TERM")]
    pub items: Vec<String>,

    /// Require every --item on the same page
    #[arg(long, requires = "items")]
    pub all: bool,

    /// HS code (tariff search)
    #[arg(long = "hs", value_name = "CODE", conflicts_with = "items")]
    pub hs_code: Option<String>,

    /// Country of origin (tariff search)
    #[arg(long, requires = "hs_code")]
    pub country: Option<String>,

    /// Item number (tariff search)
    #[arg(long, requires = "hs_code")]
    pub item_number: Option<String>,

    /// Maximum distance between HS code and item number, in centimetres
    #[arg(long, value_name = "CM", requires = "hs_code")]
    pub max_distance_cm: Option<f32>,

    /// JSON criteria file instead of the flags above
    #[arg(long, value_name = "FILE", conflicts_with_all = ["gir", "items", "hs_code"])]
    pub criteria: Option<PathBuf>,
}

/// OCR fallback for pages without a usable text layer.
#[derive(Args)]
pub struct OcrArgs {
    /// OCR.space API key; without one, scanned pages are not read
    #[arg(long = "ocr-api-key", env = "OCR_SPACE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OCR service endpoint
    #[arg(long = "ocr-endpoint", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// OCR language code
    #[arg(long = "ocr-language", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Timeout for one OCR request, in seconds
    #[arg(long = "ocr-timeout-secs", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Never call the OCR service
    #[arg(long)]
    pub no_ocr: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            inputs,
            search,
            out_dir,
            output,
            ocr,
        } => commands::extract::run(inputs, &search, &out_dir, &output, &ocr),
        Commands::Inspect {
            input_file,
            terms,
            ocr,
        } => commands::inspect::run(input_file, &terms, &ocr),
        Commands::Criteria { action } => match action {
            CriteriaAction::Validate { file } => commands::criteria::validate(&file),
            CriteriaAction::Example => commands::criteria::example(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
