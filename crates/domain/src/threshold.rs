//! Threshold crossing detection for sensor levels.

use serde::{Deserialize, Serialize};

use crate::device::Level;
use crate::error::ValidationError;
use crate::history::HistoryEntry;
use crate::time::Timestamp;

pub const EVENT_REACHED: &str = "Level reached";
pub const EVENT_DROPPED: &str = "Level dropped to";

/// Direction a level moved through a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// One threshold crossed by a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub threshold: u8,
    pub direction: Direction,
}

impl Crossing {
    #[must_use]
    pub fn event(self) -> &'static str {
        match self.direction {
            Direction::Rising => EVENT_REACHED,
            Direction::Falling => EVENT_DROPPED,
        }
    }

    #[must_use]
    pub fn value(self) -> String {
        format!("{}% of capacity", self.threshold)
    }

    #[must_use]
    pub fn to_entry(self, device_name: &str, at: Timestamp) -> HistoryEntry {
        HistoryEntry::new(device_name, self.event(), self.value(), at)
    }
}

/// Ascending set of percentages worth logging when crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Thresholds(Vec<u8>);

impl Default for Thresholds {
    fn default() -> Self {
        Self(vec![25, 50, 75, 100])
    }
}

impl TryFrom<Vec<u8>> for Thresholds {
    type Error = ValidationError;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Thresholds> for Vec<u8> {
    fn from(value: Thresholds) -> Self {
        value.0
    }
}

impl Thresholds {
    /// Build a threshold set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidThresholds`] unless the values are
    /// strictly ascending and within `1..=100`.
    pub fn new(values: Vec<u8>) -> Result<Self, ValidationError> {
        let in_range = values.iter().all(|t| (1..=100).contains(t));
        let ascending = values.windows(2).all(|w| w[0] < w[1]);
        if in_range && ascending {
            Ok(Self(values))
        } else {
            Err(ValidationError::InvalidThresholds(values))
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Every threshold crossed going from `before` to `after`, ordered in
    /// the direction of travel.
    #[must_use]
    pub fn crossings(&self, before: Level, after: Level) -> Vec<Crossing> {
        let (before, after) = (before.percent(), after.percent());
        if after > before {
            self.0
                .iter()
                .filter(|&&t| before < t && t <= after)
                .map(|&threshold| Crossing {
                    threshold,
                    direction: Direction::Rising,
                })
                .collect()
        } else {
            self.0
                .iter()
                .rev()
                .filter(|&&t| before > t && t >= after)
                .map(|&threshold| Crossing {
                    threshold,
                    direction: Direction::Falling,
                })
                .collect()
        }
    }

    /// History entries for a level change, one per crossed threshold.
    #[must_use]
    pub fn log_entries(
        &self,
        device_name: &str,
        before: Level,
        after: Level,
        at: Timestamp,
    ) -> Vec<HistoryEntry> {
        self.crossings(before, after)
            .into_iter()
            .map(|c| c.to_entry(device_name, at))
            .collect()
    }

    /// The first threshold crossed, if any.
    #[must_use]
    pub fn first_crossing(&self, before: Level, after: Level) -> Option<Crossing> {
        self.crossings(before, after).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::from_unix;

    fn thresholds(values: &[u8]) -> Thresholds {
        Thresholds::new(values.to_vec()).unwrap()
    }

    fn levels(crossings: &[Crossing]) -> Vec<u8> {
        crossings.iter().map(|c| c.threshold).collect()
    }

    #[test]
    fn should_log_each_threshold_crossed_while_rising() {
        let set = thresholds(&[10, 20, 30]);
        let crossings = set.crossings(Level::new(8), Level::new(32));
        assert_eq!(levels(&crossings), vec![10, 20, 30]);
        assert!(crossings.iter().all(|c| c.direction == Direction::Rising));
    }

    #[test]
    fn should_log_each_threshold_crossed_while_falling() {
        let set = thresholds(&[10, 20, 30]);
        let crossings = set.crossings(Level::new(32), Level::new(8));
        assert_eq!(levels(&crossings), vec![30, 20, 10]);
        assert!(crossings.iter().all(|c| c.direction == Direction::Falling));
    }

    #[test]
    fn should_include_threshold_landed_on_exactly() {
        let set = Thresholds::default();
        assert_eq!(
            levels(&set.crossings(Level::new(20), Level::new(25))),
            vec![25]
        );
        assert_eq!(
            levels(&set.crossings(Level::new(30), Level::new(25))),
            vec![25]
        );
    }

    #[test]
    fn should_not_log_when_leaving_a_threshold() {
        let set = Thresholds::default();
        assert!(set.crossings(Level::new(25), Level::new(30)).is_empty());
        assert!(set.crossings(Level::new(25), Level::new(20)).is_empty());
        assert!(set.crossings(Level::new(40), Level::new(40)).is_empty());
    }

    #[test]
    fn should_build_history_entries_with_capacity_value() {
        let at = from_unix(1_700_000_000);
        let entries =
            Thresholds::default().log_entries("Main tank", Level::new(70), Level::new(80), at);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device_name, "Main tank");
        assert_eq!(entries[0].event, EVENT_REACHED);
        assert_eq!(entries[0].value, "75% of capacity");
        assert_eq!(entries[0].recorded_at, at);
    }

    #[test]
    fn should_return_first_crossing_in_direction_of_travel() {
        let set = Thresholds::default();
        let first = set.first_crossing(Level::new(80), Level::new(20)).unwrap();
        assert_eq!(first.threshold, 75);
        assert_eq!(first.event(), EVENT_DROPPED);
    }

    #[test]
    fn should_reject_unordered_or_out_of_range_thresholds() {
        assert!(Thresholds::new(vec![50, 25]).is_err());
        assert!(Thresholds::new(vec![0, 50]).is_err());
        assert!(Thresholds::new(vec![50, 101]).is_err());
        assert!(Thresholds::new(vec![25, 25]).is_err());
    }

    #[test]
    fn should_deserialize_from_plain_list() {
        let set: Thresholds = serde_json::from_str("[10, 90]").unwrap();
        assert_eq!(set.as_slice(), &[10, 90]);
        assert!(serde_json::from_str::<Thresholds>("[90, 10]").is_err());
    }
}
