//! Read access to the `[section] key = value` settings file.

/// Typed lookups with caller-supplied defaults. Unparseable values fall back
/// to the default; required keys are checked by the caller via `get_string`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Trimmed value, with blank treated as unset.
    fn get_value(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
