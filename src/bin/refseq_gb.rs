use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use refseq_gb::app::App;
use refseq_gb::config::{ClientIdentity, RunConfig};
use refseq_gb::domain::{FetchRange, InputMode, RecordTypes};
use refseq_gb::error::FetchError;
use refseq_gb::eutils::{polite_delay, EutilsHttpClient};
use refseq_gb::output::{print_summary, JsonOutput};

const EXAMPLES: &str = "\
Examples:
  # Gene symbols file, download both NM_ and NG_ (default) for human
  refseq-gb --in genes.txt --input genes --taxid 9606 --types NM,NG

  # Gene symbols file, RefSeqGene (NG_) only
  refseq-gb --in genes.txt --input genes --types NG

  # Accessions file (NM_*/NG_* or NCBI nuccore URLs), NG_ with a range
  refseq-gb --in acc.txt --input acc --types NG --ng-from 13732 --ng-to 58896

Input file format:
  - one gene symbol or accession per line
  - comments starting with #
  - separators: whitespace, comma, semicolon

Environment variables:
  NCBI_TOOL, NCBI_EMAIL, NCBI_API_KEY";

#[derive(Parser)]
#[command(name = "refseq-gb")]
#[command(about = "Fetch NCBI RefSeq GenBank flat files for gene symbols or accessions")]
#[command(version, after_help = EXAMPLES)]
struct Cli {
    /// Input file with gene symbols or accessions
    #[arg(short = 'i', long = "in")]
    input: Option<Utf8PathBuf>,

    /// Input interpretation: auto, genes, or acc
    #[arg(short = 'm', long = "input", value_enum, default_value_t = InputMode::Auto)]
    mode: InputMode,

    /// Record families to download, e.g. NM,NG
    #[arg(short = 't', long)]
    types: Option<RecordTypes>,

    /// Taxonomy id scoping the gene-symbol search
    #[arg(long, default_value = "9606")]
    taxid: String,

    /// 1-based inclusive start of an NG_ sub-sequence window
    #[arg(long)]
    ng_from: Option<u32>,

    /// 1-based inclusive end of an NG_ sub-sequence window
    #[arg(long)]
    ng_to: Option<u32>,

    /// Output directory root
    #[arg(short = 'o', long, default_value = "out")]
    out: Utf8PathBuf,

    /// E-utilities tool identifier
    #[arg(long, env = "NCBI_TOOL", default_value = "refseq-gb")]
    tool: String,

    /// Contact email sent with every request
    #[arg(long, env = "NCBI_EMAIL", default_value = "youremail@example.org")]
    email: String,

    /// NCBI API key for the higher request-rate allowance
    #[arg(long, env = "NCBI_API_KEY")]
    api_key: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Legacy positional form: <file> [taxid] [ng-from] [ng-to]
    #[arg(hide = true, value_name = "LEGACY")]
    legacy: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::InputRead(_)
        | FetchError::EmptyInput(_)
        | FetchError::InvalidRecordType(_)
        | FetchError::EmptyRecordTypes => 2,
        FetchError::Http(_)
        | FetchError::Status { .. }
        | FetchError::ContentType { .. }
        | FetchError::Xml(_) => 3,
        FetchError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Cli::parse();
    apply_positional(&mut cli);

    let Some(input_file) = cli.input else {
        return Err(miette::Report::msg(
            "input file is required (use --in <file>, see --help)",
        ));
    };

    let identity = ClientIdentity {
        tool: cli.tool,
        email: cli.email,
        api_key: cli.api_key,
    };
    let config = RunConfig {
        input_file,
        mode: cli.mode,
        types: cli.types.unwrap_or_default(),
        tax_id: cli.taxid,
        ng_range: FetchRange::from_bounds(cli.ng_from, cli.ng_to),
        out_dir: cli.out,
        identity: identity.clone(),
    };

    let client = EutilsHttpClient::new(identity.clone())?;
    let app = App::new(client, polite_delay(identity.has_api_key()));
    let report = app.run(&config)?;

    if cli.json {
        JsonOutput::print_run(&report).into_diagnostic()?;
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Backward compatibility with the old positional invocation:
/// args[0]=file, then taxid, ng-from, ng-to (numeric tokens only).
/// Confined here; the pipeline never sees this shape.
fn apply_positional(cli: &mut Cli) {
    let legacy = std::mem::take(&mut cli.legacy);
    let mut taxid_set = cli.taxid != "9606";
    for arg in legacy {
        if cli.input.is_none() {
            cli.input = Some(Utf8PathBuf::from(arg));
        } else if !taxid_set && !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
            cli.taxid = arg;
            taxid_set = true;
        } else if cli.ng_from.is_none() {
            if let Ok(value) = arg.parse() {
                cli.ng_from = Some(value);
            }
        } else if cli.ng_to.is_none() {
            if let Ok(value) = arg.parse() {
                cli.ng_to = Some(value);
            }
        }
    }
}
