use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use sharkstats::analysis::tshark::TsharkCommand;
use sharkstats::analysis::Analyzer;
use sharkstats::utils::logging;

/// Analyze a local capture file without going through the HTTP server
#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Capture file to analyze
    capture: PathBuf,

    /// Path to the tshark binary
    #[clap(long, default_value = "tshark")]
    tshark: PathBuf,

    /// Kill tshark after this many seconds
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logger(logging::get_log_level(&args.log_level, false));

    let tshark = TsharkCommand::new(args.tshark, args.timeout_secs.map(Duration::from_secs));
    let analyzer = Analyzer::new(tshark);

    let result = match analyzer.analyze(&args.capture) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}: {}", args.capture.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{}", json);
            if result.skipped_lines > 0 {
                eprintln!("{} malformed decoder lines skipped", result.skipped_lines);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to encode result: {}", e);
            ExitCode::FAILURE
        }
    }
}
