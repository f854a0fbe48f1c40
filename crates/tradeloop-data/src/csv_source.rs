//! CSV bar loading.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use tradeloop_core::{Bar, DataError};

/// CSV record format.
///
/// Accepts a single date/time column or the split `Date`,`Time` columns of
/// terminal history exports.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Time", default)]
    time: Option<String>,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Historical bars stored in a CSV file.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::ParseError(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every bar, sorted by open time.
    pub fn load_all(&self) -> Result<Vec<Bar>, DataError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| DataError::ParseError(format!("{}: {}", self.path.display(), e)))?;
        let bars = read_bars(file)?;
        debug!(path = %self.path.display(), bars = bars.len(), "Loaded CSV bars");
        Ok(bars)
    }
}

/// Parse bars from CSV text with a header row, sorted by open time.
pub fn read_bars(reader: impl Read) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

        let stamp = match &record.time {
            Some(time) if !time.is_empty() => format!("{} {}", record.date, time),
            _ => record.date.clone(),
        };
        let timestamp = parse_timestamp(&stamp)?;

        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Parse a timestamp into Unix milliseconds.
fn parse_timestamp(value: &str) -> Result<i64, DataError> {
    const DATE_TIME_FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix timestamp; assume milliseconds if > 10 digits
    if let Ok(ts) = value.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(parse_timestamp("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024.01.15 10:30").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600000").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600").unwrap(), expected);
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_split_date_time_columns() {
        let csv = "Date,Time,Open,High,Low,Close,Volume\n\
                   2024.03.05,01:00,1.1,1.2,1.0,1.15,10\n\
                   2024.03.05,00:00,1.0,1.1,0.9,1.05,12\n";

        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].open_time(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(bars[1].close, 1.15);
        assert_eq!(bars[1].volume, 10.0);
    }

    #[test]
    fn test_read_single_timestamp_column() {
        let csv = "timestamp,open,high,low,close\n\
                   2024-03-05 02:00:00,1.1,1.2,1.0,1.15\n";

        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn test_bad_row_is_an_error() {
        let csv = "date,open,high,low,close\n2024-03-05,abc,1,1,1\n";
        assert!(matches!(
            read_bars(csv.as_bytes()),
            Err(DataError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvBarSource::new("/nonexistent/bars.csv").is_err());
    }
}
