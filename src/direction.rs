//! Travel direction guessed from trip headsigns.
//!
//! Purely textual: "Line 1 towards Finch" tells us nothing, "North Loop"
//! reads as northbound. A destination named e.g. "Eastgate" is matched as
//! eastbound whatever the vehicle actually does.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Northbound,
    Southbound,
    Eastbound,
    Westbound,
    Unknown,
}

/// Checked in this order; the first word found wins.
const CARDINALS: [(&str, Direction); 4] = [
    ("NORTH", Direction::Northbound),
    ("SOUTH", Direction::Southbound),
    ("EAST", Direction::Eastbound),
    ("WEST", Direction::Westbound),
];

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Northbound => "Northbound",
            Direction::Southbound => "Southbound",
            Direction::Eastbound => "Eastbound",
            Direction::Westbound => "Westbound",
            Direction::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Infers a direction from the headsigns of every trip calling at a stop.
pub fn infer_direction<I, S>(headsigns: I) -> Direction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let text = headsigns
        .into_iter()
        .map(|h| h.as_ref().to_uppercase())
        .collect::<Vec<_>>()
        .join(" ");

    CARDINALS
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|&(_, direction)| direction)
        .unwrap_or(Direction::Unknown)
}
