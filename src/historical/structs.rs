use serde::{Deserialize, Serialize};

pub type TimestampMS = i64;

/// One OHLCV observation as supplied by the data-fetch layer.
///
/// Only `high`, `low`, `close` and `volume` take part in profile calculation;
/// `open_time` and `open` are carried through when the source provides them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<TimestampMS>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time: None,
            open: None,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn with_open_time(mut self, open_time: TimestampMS) -> Self {
        self.open_time = Some(open_time);
        self
    }

    pub fn with_open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    /// High-low span traversed by this candle
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Flat candles traded at a single price point
    pub fn is_flat(&self) -> bool {
        self.range() == 0.0
    }

    /// Describe why this candle cannot be profiled, if it cannot
    pub fn invalid_reason(&self) -> Option<String> {
        if !(self.high.is_finite() && self.low.is_finite() && self.close.is_finite()) {
            return Some(format!(
                "non-finite price (high={}, low={}, close={})",
                self.high, self.low, self.close
            ));
        }
        if !self.volume.is_finite() {
            return Some(format!("non-finite volume {}", self.volume));
        }
        if self.volume < 0.0 {
            return Some(format!("negative volume {}", self.volume));
        }
        if self.high < self.low {
            return Some(format!("high {} below low {}", self.high, self.low));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimestampMS,
    pub end: TimestampMS,
}

impl TimeRange {
    /// Span covered by the timestamped candles, if any carry an open time
    pub fn of_candles(candles: &[Candle]) -> Option<Self> {
        let mut times = candles.iter().filter_map(|c| c.open_time);
        let first = times.next()?;
        let (start, end) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(Self { start, end })
    }
}
