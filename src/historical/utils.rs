use std::path::Path;

use tracing::{debug, info};

use super::errors::CandleDataError;
use super::structs::{Candle, TimeRange, TimestampMS};

/// On-disk candle formats accepted by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleFileFormat {
    Csv,
    Json,
}

impl CandleFileFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, CandleDataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(CandleDataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Load a chronologically ordered candle series from a CSV or JSON file
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, CandleDataError> {
    let format = CandleFileFormat::from_path(path)?;
    let data = std::fs::read(path)?;

    let candles = match format {
        CandleFileFormat::Csv => parse_csv_to_candles(&data)?,
        CandleFileFormat::Json => parse_json_to_candles(&data)?,
    };

    match TimeRange::of_candles(&candles) {
        Some(range) => info!(
            path = %path.display(),
            count = candles.len(),
            start = %format_timestamp(range.start),
            end = %format_timestamp(range.end),
            "Loaded candles"
        ),
        None => info!(path = %path.display(), count = candles.len(), "Loaded candles"),
    }

    Ok(candles)
}

/// Parse a JSON array of candles
pub fn parse_json_to_candles(json_data: &[u8]) -> Result<Vec<Candle>, CandleDataError> {
    let candles: Vec<Candle> = serde_json::from_slice(json_data)?;
    debug!("Parsed {} candles from JSON", candles.len());
    Ok(candles)
}

/// Parse candles from CSV.
///
/// A header row selects columns by name (`high`, `low`, `close`, `volume` are
/// required, `open_time`/`open` optional). Without a header the Binance kline
/// export layout is assumed: open_time, open, high, low, close, volume, ...
pub fn parse_csv_to_candles(csv_data: &[u8]) -> Result<Vec<Candle>, CandleDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data);

    let mut records = reader.records();
    let first = match records.next() {
        Some(record) => record?,
        None => return Ok(Vec::new()),
    };

    let has_header = first
        .get(0)
        .map(|field| field.parse::<f64>().is_err())
        .unwrap_or(false);

    let mut candles = Vec::with_capacity(csv_data.iter().filter(|&&b| b == b'\n').count());
    let layout = if has_header {
        ColumnLayout::from_header(&first)?
    } else {
        let layout = ColumnLayout::BINANCE_KLINE;
        candles.push(layout.parse_record(&first, 1)?);
        layout
    };

    for (offset, record) in records.enumerate() {
        let record = record?;
        candles.push(layout.parse_record(&record, offset + 2)?);
    }

    debug!(has_header, "Parsed {} candles from CSV", candles.len());
    Ok(candles)
}

/// Column indexes of the candle fields within a CSV record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    open_time: Option<usize>,
    open: Option<usize>,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnLayout {
    const BINANCE_KLINE: Self = Self {
        open_time: Some(0),
        open: Some(1),
        high: 2,
        low: 3,
        close: 4,
        volume: 5,
    };

    fn from_header(header: &csv::StringRecord) -> Result<Self, CandleDataError> {
        let names: Vec<String> = header.iter().map(|h| h.to_ascii_lowercase()).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| {
                CandleDataError::Validation(format!("CSV header is missing a '{}' column", aliases[0]))
            })
        };

        Ok(Self {
            open_time: find(&["open_time", "time", "timestamp"]),
            open: find(&["open", "o"]),
            high: require(&["high", "h"])?,
            low: require(&["low", "l"])?,
            close: require(&["close", "c"])?,
            volume: require(&["volume", "v", "vol"])?,
        })
    }

    fn parse_record(&self, record: &csv::StringRecord, line: usize) -> Result<Candle, CandleDataError> {
        let mut candle = Candle::new(
            parse_f64(record, self.high, "high", line)?,
            parse_f64(record, self.low, "low", line)?,
            parse_f64(record, self.close, "close", line)?,
            parse_f64(record, self.volume, "volume", line)?,
        );

        if let Some(index) = self.open {
            candle.open = Some(parse_f64(record, index, "open", line)?);
        }
        if let Some(index) = self.open_time {
            candle.open_time = Some(parse_timestamp(record, index, line)?);
        }

        Ok(candle)
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str, line: usize) -> Result<&'r str, CandleDataError> {
    record
        .get(index)
        .ok_or_else(|| CandleDataError::Validation(format!("line {}: missing '{}' field", line, name)))
}

fn parse_f64(record: &csv::StringRecord, index: usize, name: &str, line: usize) -> Result<f64, CandleDataError> {
    let raw = field(record, index, name, line)?;
    raw.parse::<f64>()
        .map_err(|e| CandleDataError::Validation(format!("line {}: invalid {} '{}': {}", line, name, raw, e)))
}

fn parse_timestamp(record: &csv::StringRecord, index: usize, line: usize) -> Result<TimestampMS, CandleDataError> {
    let raw = field(record, index, "open_time", line)?;
    raw.parse::<TimestampMS>()
        .or_else(|_| raw.parse::<f64>().map(|t| t as TimestampMS))
        .map_err(|e| CandleDataError::Validation(format!("line {}: invalid open_time '{}': {}", line, raw, e)))
}

fn format_timestamp(timestamp: TimestampMS) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
