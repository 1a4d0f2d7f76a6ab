use serde::{Deserialize, Serialize};

/// One packet as reported by a line of decoder output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Display protocol label (e.g., TCP, DNS, TLS)
    pub protocol: String,

    /// Frame length in bytes
    pub length: u64,

    /// Source IP address, as text
    pub source_ip: Option<String>,

    /// Destination IP address, as text
    pub destination_ip: Option<String>,

    /// Source TCP port
    pub source_port: Option<u16>,

    /// Destination TCP port
    pub destination_port: Option<u16>,
}

/// Which way a packet is guessed to be travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl PacketRecord {
    /// Guess direction from the port pair alone.
    ///
    /// Clients usually pick ephemeral (high) ports, so a higher source port
    /// reads as client-to-server. Ties count as server-to-client. Packets
    /// without both ports get no direction.
    pub fn direction(&self) -> Option<Direction> {
        match (self.source_port, self.destination_port) {
            (Some(src), Some(dst)) if src > dst => Some(Direction::ClientToServer),
            (Some(_), Some(_)) => Some(Direction::ServerToClient),
            _ => None,
        }
    }
}
