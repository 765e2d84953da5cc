//! Ticker suffix conventions for the local (KRX) exchange.

/// `.KS` is KOSPI, `.KQ` is KOSDAQ (KONEX listings also quote under `.KQ`).
pub const LOCAL_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Suffix used when a bare 6-digit code has to be turned into a symbol.
pub const DEFAULT_LOCAL_SUFFIX: &str = ".KS";

/// Splits `005930.KS` into `("005930", ".KS")`. Symbols without a dot have an empty suffix.
pub fn split_suffix(symbol: &str) -> (&str, &str) {
    match symbol.rfind('.') {
        Some(idx) if idx > 0 => (&symbol[..idx], &symbol[idx..]),
        _ => (symbol, ""),
    }
}

pub fn is_local_symbol(symbol: &str) -> bool {
    local_code(symbol).is_some()
}

/// Local code with the exchange suffix stripped, if `symbol` carries a local suffix.
pub fn local_code(symbol: &str) -> Option<&str> {
    let (stem, suffix) = split_suffix(symbol.trim());
    LOCAL_SUFFIXES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(suffix))
        .then_some(stem)
}
