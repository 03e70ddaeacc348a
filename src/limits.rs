use crate::model::Ms;

/// Display lanes available per member.
pub const MAX_LANES: u8 = 4;

/// Undo snapshots retained per document.
pub const MAX_HISTORY: usize = 50;

pub const MIN_PARTY_SIZE: usize = 2;
pub const MAX_PARTY_SIZE: usize = 8;

/// 600 seconds.
pub const DEFAULT_CONTENT_DURATION_MS: Ms = 600_000;
pub const DEFAULT_CAST_DURATION_MS: Ms = 3_000;
pub const DEFAULT_BURST_LENGTH_MS: Ms = 15_000;

/// Colours handed out to phases in creation order.
pub const PHASE_PALETTE: [&str; 6] = [
    "#60A5FA", "#34D399", "#FBBF24", "#F87171", "#A78BFA", "#F472B6",
];

pub fn phase_color(index: usize) -> &'static str {
    PHASE_PALETTE[index % PHASE_PALETTE.len()]
}
