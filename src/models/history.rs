use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of points retained in a series. Providers can return years
/// of daily candles; anything older than the most recent 180 is dropped to
/// cap payload size.
pub const MAX_POINTS: usize = 180;

/// One historical observation: a timestamp and its closing price, optionally
/// enriched with OHLC/volume when the provider reports them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,

    /// Closing price (required)
    pub close: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl HistoryPoint {
    /// Create a point with only the required fields populated.
    pub fn new(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self {
            timestamp,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Ordered series of historical points.
///
/// Invariants held by construction, whatever order the adapter produced:
/// - ascending by timestamp
/// - no duplicate timestamps (first occurrence in timestamp order wins)
/// - at most [`MAX_POINTS`] entries, keeping the most recent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySeries {
    points: Vec<HistoryPoint>,
}

impl HistorySeries {
    /// Normalize raw adapter output into a well-formed series.
    pub fn from_points(mut points: Vec<HistoryPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);
        if points.len() > MAX_POINTS {
            points.drain(..points.len() - MAX_POINTS);
        }
        Self { points }
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn point(day: u32, close: Decimal) -> HistoryPoint {
        HistoryPoint::new(
            Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
            close,
        )
    }

    #[test]
    fn test_sorts_ascending() {
        let series =
            HistorySeries::from_points(vec![point(3, dec!(3)), point(1, dec!(1)), point(2, dec!(2))]);
        let stamps: Vec<_> = series.points().iter().map(|p| p.timestamp).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_dedupes_by_timestamp_keeping_first() {
        let series = HistorySeries::from_points(vec![
            point(1, dec!(10)),
            point(1, dec!(99)),
            point(2, dec!(11)),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].close, dec!(10));
    }

    #[test]
    fn test_truncates_to_most_recent_max_points() {
        let points: Vec<_> = (0..400)
            .map(|i| {
                HistoryPoint::new(
                    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::days(i),
                    Decimal::from(i),
                )
            })
            .collect();
        let last = points.last().unwrap().timestamp;

        let series = HistorySeries::from_points(points);
        assert_eq!(series.len(), MAX_POINTS);
        assert_eq!(series.points().last().unwrap().timestamp, last);
        assert_eq!(series.points().first().unwrap().close, Decimal::from(400 - MAX_POINTS as i64));
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let series = HistorySeries::from_points(Vec::new());
        assert!(series.is_empty());
    }
}
