use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// Highest neighbor count a revealed cell can show.
pub const MAX_ADJACENT_COUNT: u8 = 8;

/// What a single cell looks like, as supplied by the game-state collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellVisualState {
    Hidden,
    Revealed(u8),
    Mine,
    Flagged,
    /// Player-placed "unsure" marker.
    Marked,
}

impl CellVisualState {
    pub fn revealed(count: u8) -> Result<Self> {
        if count > MAX_ADJACENT_COUNT {
            return Err(GridError::InvalidConfiguration(
                "revealed count must be at most 8",
            ));
        }
        Ok(Self::Revealed(count))
    }

    /// Whether the cell is drawn with the not-yet-revealed background.
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged | Self::Marked)
    }

    pub const fn overlay_slot(self) -> OverlaySlot {
        use OverlaySlot::*;
        match self {
            Self::Hidden => Unchecked,
            Self::Revealed(0) => Empty,
            Self::Revealed(1) => One,
            Self::Revealed(2) => Two,
            Self::Revealed(3) => Three,
            Self::Revealed(4) => Four,
            Self::Revealed(5) => Five,
            Self::Revealed(6) => Six,
            Self::Revealed(7) => Seven,
            Self::Revealed(_) => Eight,
            Self::Mine => Mine,
            Self::Flagged => Flagged,
            Self::Marked => Marked,
        }
    }
}

impl Default for CellVisualState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Integer codes used by engines that hand over plain numbers per cell.
impl TryFrom<i8> for CellVisualState {
    type Error = GridError;

    fn try_from(code: i8) -> Result<Self> {
        match code {
            -1 => Ok(Self::Hidden),
            0..=8 => Ok(Self::Revealed(code as u8)),
            9 => Ok(Self::Mine),
            10 => Ok(Self::Marked),
            11 => Ok(Self::Flagged),
            _ => Err(GridError::InvalidCellCode(code)),
        }
    }
}

/// Overlay slots a host can fill with symbols, one per distinguishable visual state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlaySlot {
    Unchecked,
    Empty,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Mine,
    Flagged,
    Marked,
}

impl OverlaySlot {
    pub const COUNT: usize = 13;

    pub const ALL: [OverlaySlot; Self::COUNT] = [
        Self::Unchecked,
        Self::Empty,
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Mine,
        Self::Flagged,
        Self::Marked,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}
