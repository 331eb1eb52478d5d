use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Monitored exchange programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DexLabel {
    #[serde(rename = "Raydium")]
    RaydiumV4,
    #[serde(rename = "Meteora")]
    MeteoraDlmm,
}

impl DexLabel {
    pub const ALL: [DexLabel; 2] = [DexLabel::RaydiumV4, DexLabel::MeteoraDlmm];

    pub fn as_str(&self) -> &'static str {
        match self {
            DexLabel::RaydiumV4 => "Raydium",
            DexLabel::MeteoraDlmm => "Meteora",
        }
    }

    /// Well-known mainnet program id
    pub fn program_id(&self) -> &'static str {
        match self {
            DexLabel::RaydiumV4 => "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8",
            DexLabel::MeteoraDlmm => "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo",
        }
    }
}

impl std::fmt::Display for DexLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DexLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raydium_v4" | "raydium" => Ok(DexLabel::RaydiumV4),
            "meteora_dlmm" | "meteora" | "dlmm" => Ok(DexLabel::MeteoraDlmm),
            _ => Err(anyhow::anyhow!("Unknown DEX label: {}", s)),
        }
    }
}
