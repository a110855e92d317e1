//! INI settings file adapter.

use crate::domain::error::CefnavError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use log::warn;
use std::path::Path;
use std::str::FromStr;

const INLINE: &str = "<inline>";

/// `configparser` lowercases section and key names, so lookups are case-insensitive.
pub struct FileConfigAdapter {
    ini: Ini,
    origin: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CefnavError> {
        let origin = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        ini.load(path.as_ref())
            .map_err(|reason| CefnavError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { ini, origin })
    }

    pub fn from_string(content: &str) -> Result<Self, CefnavError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| CefnavError::ConfigParse {
                file: INLINE.into(),
                reason,
            })?;
        Ok(Self {
            ini,
            origin: INLINE.into(),
        })
    }

    /// Where the settings came from: a file path, or `<inline>`.
    pub fn source(&self) -> &str {
        &self.origin
    }

    /// Parse a present value, falling back to `default` with a warning if it is malformed.
    fn parsed<T: FromStr>(&self, section: &str, key: &str, default: T) -> T {
        match self.get_value(section, key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("{}: ignoring invalid [{section}] {key} = {raw}", self.origin);
                default
            }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.get_value(section, key) {
            None => default,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warn!("{}: ignoring invalid [{section}] {key} = {raw}", self.origin);
                default
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
; collector settings
[paths]
fund_data_dir = /data/fund_data
trading_days = /data/trading_days.txt

[Fetch]
max_attempts = 7
backoff_rate = 2.5
timeout_secs = soon
throttle = OFF
user_agent =

[universe]
securities = XNYS:BME, XNYS:GAB
"#;

    fn sample() -> FileConfigAdapter {
        FileConfigAdapter::from_string(SAMPLE).unwrap()
    }

    #[test]
    fn strings_are_looked_up_by_section() {
        let cfg = sample();
        assert_eq!(
            cfg.get_string("paths", "fund_data_dir").as_deref(),
            Some("/data/fund_data")
        );
        assert_eq!(
            cfg.get_string("universe", "securities").as_deref(),
            Some("XNYS:BME, XNYS:GAB")
        );
        assert_eq!(cfg.get_string("paths", "computed_dir"), None);
        assert_eq!(cfg.get_string("clean", "workers"), None);
    }

    #[test]
    fn section_names_are_case_insensitive() {
        assert_eq!(sample().get_int("fetch", "max_attempts", 5), 7);
    }

    #[test]
    fn blank_value_reads_as_unset() {
        let cfg = sample();
        assert_eq!(cfg.get_value("fetch", "user_agent"), None);
    }

    #[test]
    fn numbers_parse_or_fall_back() {
        let cfg = sample();
        assert_eq!(cfg.get_double("fetch", "backoff_rate", 1.0), 2.5);
        assert_eq!(cfg.get_int("fetch", "timeout_secs", 30), 30);
        assert_eq!(cfg.get_int("clean", "workers", 0), 0);
    }

    #[test]
    fn bool_spellings() {
        let cfg = FileConfigAdapter::from_string(
            "[b]\nt1 = true\nt2 = Yes\nt3 = on\nt4 = 1\nf1 = false\nf2 = NO\nf3 = off\nf4 = 0\nbad = maybe\n",
        )
        .unwrap();
        for key in ["t1", "t2", "t3", "t4"] {
            assert!(cfg.get_bool("b", key, false), "{key}");
        }
        for key in ["f1", "f2", "f3", "f4"] {
            assert!(!cfg.get_bool("b", key, true), "{key}");
        }
        assert!(cfg.get_bool("b", "bad", true));
        assert!(!sample().get_bool("fetch", "throttle", true));
    }

    #[test]
    fn file_round_trip_keeps_origin() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[paths]\ncomputed_dir = /data/computed\n").unwrap();

        let cfg = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            cfg.get_value("paths", "computed_dir").as_deref(),
            Some("/data/computed")
        );
        assert_eq!(cfg.source(), file.path().display().to_string());
        assert_eq!(sample().source(), "<inline>");
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/cefnav.ini");
        assert!(matches!(
            result,
            Err(CefnavError::ConfigParse { file, .. }) if file == "/nonexistent/path/cefnav.ini"
        ));
    }
}
