/// Difficulty tiers for solved.ac levels.
///
/// Levels 1..=30 split into six bands of five; within a band the level number
/// counts down (Bronze 5 is the easiest, Bronze 1 the hardest Bronze). Level 0
/// is unrated.
use std::fmt;

const BANDS: [&str; 6] = ["Bronze", "Silver", "Gold", "Platinum", "Diamond", "Ruby"];
const LEVELS_PER_BAND: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Unrated,
    Rated { band: usize, level: u32 },
}

impl Tier {
    pub fn from_level(rank: u32) -> Self {
        if rank == 0 {
            return Tier::Unrated;
        }
        let offset = rank - 1;
        let band = ((offset / LEVELS_PER_BAND) as usize).min(BANDS.len() - 1);
        let level = LEVELS_PER_BAND - offset % LEVELS_PER_BAND;
        Tier::Rated { band, level }
    }

    pub fn band_name(&self) -> &'static str {
        match self {
            Tier::Unrated => "Unrated",
            Tier::Rated { band, .. } => BANDS[*band],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Unrated => f.write_str("Unrated"),
            Tier::Rated { level, .. } => write!(f, "{} {}", self.band_name(), level),
        }
    }
}

pub fn format_tier(rank: u32) -> String {
    Tier::from_level(rank).to_string()
}
