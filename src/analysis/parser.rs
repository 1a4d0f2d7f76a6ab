use log::trace;

use crate::analysis::tshark::FIELDS;
use crate::models::packet::PacketRecord;
use crate::utils::error::{AppError, AppResult};

/// Outcome of reading one line of decoder output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Record(PacketRecord),
    /// Wrong number of columns; tolerated and counted, never fatal
    Skip,
}

/// Turns tab-separated decoder lines into packet records
pub struct FieldParser;

impl FieldParser {
    /// Parse one non-empty line. `line_no` is 1-based and only used in errors.
    pub fn parse_line(line: &str, line_no: usize) -> AppResult<ParsedLine> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != FIELDS.len() {
            trace!("Skipping line {} with {} fields", line_no, fields.len());
            return Ok(ParsedLine::Skip);
        }

        let length = fields[1]
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid("frame length", fields[1], line_no))?;

        let (source_port, destination_port) = if !fields[4].is_empty() && !fields[5].is_empty() {
            (
                Some(Self::parse_port(fields[4], line_no)?),
                Some(Self::parse_port(fields[5], line_no)?),
            )
        } else {
            (None, None)
        };

        Ok(ParsedLine::Record(PacketRecord {
            protocol: fields[0].to_string(),
            length,
            source_ip: non_empty(fields[2]),
            destination_ip: non_empty(fields[3]),
            source_port,
            destination_port,
        }))
    }

    fn parse_port(value: &str, line_no: usize) -> AppResult<u16> {
        value
            .trim()
            .parse::<u16>()
            .map_err(|_| invalid("port", value, line_no))
    }
}

fn invalid(field: &'static str, value: &str, line: usize) -> AppError {
    AppError::InvalidField {
        field,
        value: value.to_string(),
        line,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
