//! CSV file record store: one append-only file per symbol.

use crate::domain::error::CefnavError;
use crate::domain::quote::{DATE_FORMAT, QuoteRecord};
use crate::ports::record_store_port::{CleanedSink, RecordStore};
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

pub const HEADER: [&str; 10] = [
    "symbol",
    "quote_date",
    "nav_date",
    "price",
    "nav",
    "premium_discount",
    "premium_discount_pct",
    "reserved1",
    "reserved2",
    "time",
];

const COMPUTED_SUFFIX: &str = "_computed";

pub struct CsvRecordStore {
    data_dir: PathBuf,
    computed_dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new(data_dir: PathBuf, computed_dir: PathBuf) -> Self {
        Self {
            data_dir,
            computed_dir,
        }
    }

    pub fn store_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol))
    }

    pub fn computed_path(&self, symbol: &str) -> PathBuf {
        self.computed_dir.join(format!("{}{}.csv", symbol, COMPUTED_SUFFIX))
    }
}

fn store_err(symbol: &str, reason: String) -> CefnavError {
    CefnavError::Store {
        symbol: symbol.to_string(),
        reason,
    }
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn to_row(record: &QuoteRecord) -> [String; 10] {
    [
        record.symbol.clone(),
        record.quote_date_string(),
        record.nav_date.clone().unwrap_or_default(),
        format_opt(record.price),
        format_opt(record.nav),
        format_opt(record.premium_discount),
        format_opt(record.premium_discount_pct),
        format_opt(record.reserved1),
        format_opt(record.reserved2),
        record.time.to_string(),
    ]
}

fn is_null(raw: &str) -> bool {
    matches!(raw, "" | "nan" | "NaN" | "NAN" | "None" | "null")
}

fn parse_opt(symbol: &str, column: &str, raw: Option<&str>) -> Result<Option<f64>, CefnavError> {
    let raw = raw.unwrap_or("").trim();
    if is_null(raw) {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .map_err(|e| store_err(symbol, format!("invalid {} value {:?}: {}", column, raw, e)))?;
    Ok(Some(value).filter(|v| !v.is_nan()))
}

fn parse_row(symbol: &str, row: &csv::StringRecord) -> Result<QuoteRecord, CefnavError> {
    let row_symbol = row
        .get(0)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| store_err(symbol, "missing symbol column".into()))?;

    let date_str = row
        .get(1)
        .ok_or_else(|| store_err(symbol, "missing quote_date column".into()))?
        .trim();
    let quote_date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|e| store_err(symbol, format!("invalid quote_date {:?}: {}", date_str, e)))?;

    let nav_date = row
        .get(2)
        .map(str::trim)
        .filter(|s| !is_null(s))
        .map(str::to_string);

    let time_str = row
        .get(9)
        .ok_or_else(|| store_err(symbol, "missing time column".into()))?
        .trim();
    let time = match time_str.parse::<i64>() {
        Ok(t) => t,
        Err(_) => time_str
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .map(|t| t as i64)
            .ok_or_else(|| store_err(symbol, format!("invalid time value {:?}", time_str)))?,
    };

    Ok(QuoteRecord {
        symbol: row_symbol.to_string(),
        quote_date,
        nav_date,
        price: parse_opt(symbol, "price", row.get(3))?,
        nav: parse_opt(symbol, "nav", row.get(4))?,
        premium_discount: parse_opt(symbol, "premium_discount", row.get(5))?,
        premium_discount_pct: parse_opt(symbol, "premium_discount_pct", row.get(6))?,
        reserved1: parse_opt(symbol, "reserved1", row.get(7))?,
        reserved2: parse_opt(symbol, "reserved2", row.get(8))?,
        time,
    })
}

impl RecordStore for CsvRecordStore {
    fn append(&self, record: &QuoteRecord) -> Result<(), CefnavError> {
        let symbol = &record.symbol;
        let path = self.store_path(symbol);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| store_err(symbol, format!("failed to open {}: {}", path.display(), e)))?;
        let is_new = file
            .metadata()
            .map_err(|e| store_err(symbol, format!("failed to stat {}: {}", path.display(), e)))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(HEADER)
                .map_err(|e| store_err(symbol, format!("CSV write error: {}", e)))?;
        }
        writer
            .write_record(to_row(record))
            .map_err(|e| store_err(symbol, format!("CSV write error: {}", e)))?;
        writer
            .flush()
            .map_err(|e| store_err(symbol, format!("failed to flush {}: {}", path.display(), e)))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<QuoteRecord>, CefnavError> {
        let path = self.store_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| store_err(symbol, format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut records = Vec::new();

        for result in rdr.records() {
            let row = result.map_err(|e| store_err(symbol, format!("CSV parse error: {}", e)))?;
            records.push(parse_row(symbol, &row)?);
        }

        Ok(records)
    }

    fn list_symbols(&self) -> Result<Vec<String>, CefnavError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| {
            store_err(
                "*",
                format!("failed to read directory {}: {}", self.data_dir.display(), e),
            )
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| store_err("*", format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                if !symbol.is_empty() && !symbol.ends_with(COMPUTED_SUFFIX) {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

impl CleanedSink for CsvRecordStore {
    fn write_cleaned(&self, symbol: &str, records: &[QuoteRecord]) -> Result<(), CefnavError> {
        fs::create_dir_all(&self.computed_dir).map_err(|e| {
            store_err(
                symbol,
                format!("failed to create {}: {}", self.computed_dir.display(), e),
            )
        })?;
        let path = self.computed_path(symbol);
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| store_err(symbol, format!("failed to create {}: {}", path.display(), e)))?;
        writer
            .write_record(HEADER)
            .map_err(|e| store_err(symbol, format!("CSV write error: {}", e)))?;
        for record in records {
            writer
                .write_record(to_row(record))
                .map_err(|e| store_err(symbol, format!("CSV write error: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| store_err(symbol, format!("failed to flush {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, CsvRecordStore) {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("fund_data");
        fs::create_dir_all(&data).unwrap();
        let store = CsvRecordStore::new(data, dir.path().join("computed"));
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn append_writes_header_once() {
        let (_dir, store) = setup_store();
        let a = QuoteRecord::new("BME", date(2015, 3, 25), Some("03/24/2015".into()), Some(21.5), Some(20.0), 1430);
        let b = QuoteRecord::new("BME", date(2015, 3, 26), None, None, Some(20.5), 905);
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        let content = fs::read_to_string(store.store_path("BME")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "BME,03/25/2015,03/24/2015,21.5,20,1.5,0.075,,,1430");
        assert_eq!(lines[2], "BME,03/26/2015,,,20.5,,,,,905");
    }

    #[test]
    fn read_all_returns_appended_records() {
        let (_dir, store) = setup_store();
        let a = QuoteRecord::new("BME", date(2015, 3, 25), Some("03/24/2015".into()), Some(21.5), Some(20.0), 1430);
        let b = QuoteRecord::new("BME", date(2015, 3, 26), None, None, Some(20.5), 905);
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        let records = store.read_all("BME").unwrap();
        assert_eq!(records, vec![a, b]);
    }

    #[test]
    fn read_all_treats_nan_as_null() {
        let (_dir, store) = setup_store();
        fs::write(
            store.store_path("GAB"),
            format!("{}\nGAB,01/02/2015,01/01/2015,5.5,nan,,NaN,nan,nan,1600\n", HEADER.join(",")),
        )
        .unwrap();

        let records = store.read_all("GAB").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(5.5));
        assert_eq!(records[0].nav, None);
        assert_eq!(records[0].premium_discount_pct, None);
        assert_eq!(records[0].reserved1, None);
        assert_eq!(records[0].time, 1600);
    }

    #[test]
    fn read_all_rejects_bad_date() {
        let (_dir, store) = setup_store();
        fs::write(
            store.store_path("GAB"),
            format!("{}\nGAB,2015-01-02,,5.5,5,,,,,1600\n", HEADER.join(",")),
        )
        .unwrap();
        let err = store.read_all("GAB").unwrap_err();
        assert!(matches!(err, CefnavError::Store { symbol, .. } if symbol == "GAB"));
    }

    #[test]
    fn read_all_missing_file_is_error() {
        let (_dir, store) = setup_store();
        assert!(store.read_all("XYZ").is_err());
    }

    #[test]
    fn append_to_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let store = CsvRecordStore::new(dir.path().join("absent"), dir.path().join("computed"));
        let rec = QuoteRecord::new("BME", date(2015, 3, 25), None, Some(1.0), Some(1.0), 900);
        assert!(matches!(store.append(&rec), Err(CefnavError::Store { .. })));
    }

    #[test]
    fn list_symbols_returns_sorted_csv_stems() {
        let (_dir, store) = setup_store();
        for symbol in ["GAB", "BME"] {
            let rec = QuoteRecord::new(symbol, date(2015, 3, 25), None, Some(1.0), Some(1.0), 900);
            store.append(&rec).unwrap();
        }
        fs::write(store.data_dir.join("notes.txt"), "ignore me").unwrap();
        assert_eq!(store.list_symbols().unwrap(), vec!["BME", "GAB"]);
    }

    #[test]
    fn list_symbols_skips_cleaned_views_in_a_shared_directory() {
        let dir = TempDir::new().unwrap();
        let store = CsvRecordStore::new(dir.path().to_path_buf(), dir.path().to_path_buf());
        let rec = QuoteRecord::new("BME", date(2015, 1, 2), None, Some(1.0), Some(1.0), 900);
        store.append(&rec).unwrap();
        store.write_cleaned("BME", &[rec]).unwrap();

        assert!(store.computed_path("BME").exists());
        assert_eq!(store.list_symbols().unwrap(), vec!["BME"]);
    }

    #[test]
    fn write_cleaned_replaces_previous_view() {
        let (_dir, store) = setup_store();
        let a = QuoteRecord::new("BME", date(2015, 1, 2), None, Some(1.0), Some(1.0), 3830);
        let b = QuoteRecord::new("BME", date(2015, 1, 5), None, Some(2.0), Some(2.0), 900);
        store.write_cleaned("BME", &[a.clone(), b]).unwrap();
        store.write_cleaned("BME", &[a]).unwrap();

        let content = fs::read_to_string(store.computed_path("BME")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "BME,01/02/2015,,1,1,0,0,,,3830");
    }
}
