//! Monitored exchange programs and their pool-initialization log layouts

pub mod layout;
pub mod types;

pub use layout::{decode_lines, InstructionLayout, PayloadLocation};
pub use types::DexLabel;
