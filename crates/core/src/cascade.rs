//! "First successful strategy wins".
//!
//! Field alias chains, the ID/heuristic/header ladders of the HTML scraper and the
//! summary payload shapes are all expressed as an ordered strategy list run through
//! [`first_some`].

use serde_json::{Map, Value};

/// A named extraction attempt. The name only shows up in debug logs.
pub struct Strategy<'a, T> {
    pub name: &'static str,
    pub run: Box<dyn Fn() -> Option<T> + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    pub fn new(name: &'static str, run: impl Fn() -> Option<T> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

/// Runs strategies in order, short-circuiting on the first `Some`.
pub fn first_some<T>(field: &str, strategies: &[Strategy<'_, T>]) -> Option<T> {
    for strategy in strategies {
        if let Some(v) = (strategy.run)() {
            tracing::debug!(field, strategy = strategy.name, "cascade hit");
            return Some(v);
        }
    }
    tracing::debug!(field, tried = strategies.len(), "cascade exhausted");
    None
}

/// Alias chain over a flat JSON object: first key whose value normalizes to a number.
pub fn first_number(field: &str, object: &Map<String, Value>, aliases: &[&'static str]) -> Option<f64> {
    let strategies: Vec<Strategy<'_, f64>> = aliases
        .iter()
        .map(|&key| Strategy::new(key, move || object.get(key).and_then(crate::normalize::number)))
        .collect();
    first_some(field, &strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn stops_at_first_hit() {
        let calls = Cell::new(0);
        let strategies = [
            Strategy::new("a", || {
                calls.set(calls.get() + 1);
                None
            }),
            Strategy::new("b", || {
                calls.set(calls.get() + 1);
                Some(2)
            }),
            Strategy::new("c", || {
                calls.set(calls.get() + 1);
                Some(3)
            }),
        ];
        assert_eq!(first_some("x", &strategies), Some(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn empty_chain_is_none() {
        let strategies: [Strategy<'_, i32>; 0] = [];
        assert_eq!(first_some("x", &strategies), None);
    }

    #[test]
    fn alias_chain_skips_unparseable_values() {
        let v = json!({"peTTM": "N/A", "peAnnual": null, "peBasic": "14.2"});
        let obj = v.as_object().unwrap();
        assert_eq!(
            first_number("per", obj, &["peTTM", "peAnnual", "peBasic"]),
            Some(14.2)
        );
        assert_eq!(first_number("per", obj, &["missing"]), None);
    }
}
