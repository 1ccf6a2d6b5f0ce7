/// Whole-query rejection. Surfaced as a banner, never as per-slot reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    TooFarInAdvance { max_days: u32 },
    ClosedThisDay,
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::TooFarInAdvance { max_days } => {
                write!(f, "too far in advance (bookings open {max_days} days ahead)")
            }
            PolicyError::ClosedThisDay => write!(f, "closed this day"),
        }
    }
}

impl std::error::Error for PolicyError {}
