//! Pool-initialization log decoding.
//!
//! Each exchange is described by an [`InstructionLayout`]: which substrings mark the
//! relevant log line, where the base64 payload sits in that line, and where the new
//! token's mint lives inside the decoded bytes. One generic routine applies any layout,
//! so adding an exchange is a new table entry.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::types::DexLabel;

/// Size of a raw public key
pub const PUBKEY_BYTES: usize = 32;

/// Where the base64 payload is located inside a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLocation {
    /// Last whitespace-separated token of the line
    LastToken,
    /// First whitespace-separated token following the prefix
    AfterPrefix(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionLayout {
    /// All of these must appear in the line
    pub markers: &'static [&'static str],
    pub payload: PayloadLocation,
    /// Byte offset of the mint within the decoded payload
    pub mint_offset: usize,
}

/// Raydium AMM v4 `initialize2`: 8-byte header, then the mint at 297
pub const RAYDIUM_V4_LAYOUT: InstructionLayout = InstructionLayout {
    markers: &["initialize2"],
    payload: PayloadLocation::LastToken,
    mint_offset: 8 + 297,
};

/// Meteora DLMM `InitializePool` event data, mint at 72
pub const METEORA_DLMM_LAYOUT: InstructionLayout = InstructionLayout {
    markers: &["Instruction: InitializePool", "Program data: "],
    payload: PayloadLocation::AfterPrefix("Program data: "),
    mint_offset: 72,
};

impl DexLabel {
    pub fn layout(&self) -> &'static InstructionLayout {
        match self {
            DexLabel::RaydiumV4 => &RAYDIUM_V4_LAYOUT,
            DexLabel::MeteoraDlmm => &METEORA_DLMM_LAYOUT,
        }
    }
}

impl InstructionLayout {
    pub fn matches(&self, line: &str) -> bool {
        self.markers.iter().all(|marker| line.contains(marker))
    }

    fn payload<'a>(&self, line: &'a str) -> Option<&'a str> {
        match self.payload {
            PayloadLocation::LastToken => line.split_whitespace().last(),
            PayloadLocation::AfterPrefix(prefix) => line
                .split_once(prefix)
                .and_then(|(_, rest)| rest.split_whitespace().next()),
        }
    }

    /// Recover the token address from one log line. Lines without the markers, or whose
    /// payload does not decode or is too short, yield `None`.
    pub fn decode(&self, line: &str) -> Option<String> {
        if !self.matches(line) {
            return None;
        }

        let encoded = self.payload(line)?;
        let data = match BASE64.decode(encoded) {
            Ok(data) => data,
            Err(e) => {
                debug!("Failed to decode base64 payload: {}", e);
                return None;
            }
        };

        let end = self.mint_offset + PUBKEY_BYTES;
        if data.len() < end {
            debug!("Payload too short: {} bytes, need {}", data.len(), end);
            return None;
        }

        Pubkey::try_from(&data[self.mint_offset..end])
            .ok()
            .map(|mint| mint.to_string())
    }
}

/// Decode every line of a log batch into launch candidates, in order
pub fn decode_lines<'a>(dex: DexLabel, lines: &'a [String]) -> impl Iterator<Item = (String, &'a str)> + 'a {
    let layout = dex.layout();
    lines
        .iter()
        .filter_map(move |line| layout.decode(line).map(|address| (address, line.as_str())))
}
