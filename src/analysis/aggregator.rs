use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use crate::analysis::parser::{FieldParser, ParsedLine};
use crate::analysis::tshark::TsharkCommand;
use crate::models::stats::{AnalysisResult, ProtocolStats};
use crate::utils::error::AppResult;

/// Produces per-protocol statistics for a capture file
#[derive(Debug, Clone)]
pub struct Analyzer {
    tshark: TsharkCommand,
}

impl Analyzer {
    pub fn new(tshark: TsharkCommand) -> Self {
        Self { tshark }
    }

    pub fn tshark(&self) -> &TsharkCommand {
        &self.tshark
    }

    /// Preflight the decoder, decode `capture`, and reduce the output
    pub fn analyze(&self, capture: &Path) -> AppResult<AnalysisResult> {
        self.tshark.version()?;

        let stdout = self.tshark.decode_fields(capture)?;
        debug!("Decoder produced {} bytes of output", stdout.len());

        reduce(&String::from_utf8_lossy(&stdout))
    }
}

/// Fold decoder output into an [`AnalysisResult`]
pub fn reduce(output: &str) -> AppResult<AnalysisResult> {
    let mut protocol_stats: HashMap<String, ProtocolStats> = HashMap::new();
    let mut total_packets: u64 = 0;
    let mut skipped_lines: u64 = 0;

    for (idx, line) in output.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        match FieldParser::parse_line(line, idx + 1)? {
            ParsedLine::Record(packet) => {
                protocol_stats
                    .entry(packet.protocol.clone())
                    .or_default()
                    .record(&packet);
                total_packets += 1;
            }
            ParsedLine::Skip => skipped_lines += 1,
        }
    }

    if skipped_lines > 0 {
        info!("Skipped {} malformed decoder lines", skipped_lines);
    }

    let protocols = protocol_stats
        .iter()
        .map(|(protocol, stats)| (protocol.clone(), stats.summarize(total_packets)))
        .collect();

    Ok(AnalysisResult {
        total_packets,
        protocols,
        skipped_lines,
    })
}
