use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

// Signed or unsigned float, optional exponent. Separators are stripped before matching.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern is valid")
});

const MISSING_TOKENS: [&str; 4] = ["-", "n/a", "nan", "none"];

/// Parses a provider value (JSON number or text) into a finite `f64`.
///
/// Never fails: anything unparseable, sentinel tokens and NaN/inf all come back as `None`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => number_text(s),
        _ => None,
    }
}

/// Text flavour of [`number`]: `"1,234.5배"`, `"12.3%"`, `"-4,950원"`, `"1.2e3"`.
pub fn number_text(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || MISSING_TOKENS.iter().any(|m| t.eq_ignore_ascii_case(m)) {
        return None;
    }

    let cleaned: String = t.chars().filter(|c| *c != ',' && *c != '%').collect();
    let m = NUMBER.find(&cleaned)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rounds to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
