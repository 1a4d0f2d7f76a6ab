use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::packet::{Direction, PacketRecord};

/// Bytes per binary megabyte
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Running counters for one protocol label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    /// Packets attributed to this protocol
    pub packet_count: u64,

    /// Sum of frame lengths
    pub data_transferred: u64,

    /// Bytes from packets whose source port was higher
    pub client_to_server_bytes: u64,

    /// Bytes from packets whose source port was lower or equal
    pub server_to_client_bytes: u64,
}

impl ProtocolStats {
    /// Fold one packet into the counters
    pub fn record(&mut self, packet: &PacketRecord) {
        self.packet_count += 1;
        self.data_transferred += packet.length;

        match packet.direction() {
            Some(Direction::ClientToServer) => self.client_to_server_bytes += packet.length,
            Some(Direction::ServerToClient) => self.server_to_client_bytes += packet.length,
            None => {}
        }
    }

    /// Derive the reported view against the request-wide packet total
    pub fn summarize(&self, total_packets: u64) -> ProtocolSummary {
        let packet_percentage = if total_packets == 0 {
            0.0
        } else {
            self.packet_count as f64 / total_packets as f64 * 100.0
        };

        ProtocolSummary {
            packet_count: self.packet_count,
            packet_percentage,
            total_mb: to_mb(self.data_transferred),
            client_to_server_mb: to_mb(self.client_to_server_bytes),
            server_to_client_mb: to_mb(self.server_to_client_bytes),
        }
    }
}

fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Per-protocol figures as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSummary {
    pub packet_count: u64,
    pub packet_percentage: f64,
    pub total_mb: f64,
    pub client_to_server_mb: f64,
    pub server_to_client_mb: f64,
}

/// Result of analysing one capture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Packets accepted from decoder output
    pub total_packets: u64,

    /// Figures keyed by protocol label
    pub protocols: HashMap<String, ProtocolSummary>,

    /// Non-empty output lines dropped for a wrong field count
    #[serde(skip)]
    pub skipped_lines: u64,
}
