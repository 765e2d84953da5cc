use crate::domain::candidate::{Candidate, RankedCandidate};
use crate::domain::exchange::{split_suffix, LOCAL_SUFFIXES};
use crate::domain::query;

const BASE_SCORE: f64 = 1.0;
const CONTAINS_BONUS: f64 = 2.0;
const EXACT_BONUS: f64 = 2.0;

/// Exchange preference bonuses, keyed by ticker suffix (`""` is a bare, US-style symbol).
///
/// Suffixes are whatever follows the last `.`, so share-class tickers such as `BRK.B`
/// carry the suffix `.B` and do not count as bare. List those classes in
/// `preferred_suffixes` to give them the bonus.
#[derive(Debug, Clone)]
pub struct RankingPolicy {
    pub local_suffixes: Vec<String>,
    pub local_bonus: f64,
    pub preferred_suffixes: Vec<String>,
    pub preferred_bonus: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            local_suffixes: LOCAL_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            local_bonus: 0.3,
            preferred_suffixes: vec![String::new()],
            preferred_bonus: 0.2,
        }
    }
}

impl RankingPolicy {
    fn exchange_bonus(&self, symbol: &str) -> f64 {
        let (_, suffix) = split_suffix(symbol);
        let matches = |list: &[String]| list.iter().any(|s| s.eq_ignore_ascii_case(suffix));
        if matches(&self.local_suffixes) {
            self.local_bonus
        } else if matches(&self.preferred_suffixes) {
            self.preferred_bonus
        } else {
            0.0
        }
    }
}

/// Scores candidates against `normalized_query` and orders them best first.
///
/// Records without a usable symbol are dropped. The sort is stable, so equal scores keep
/// the provider's order.
pub fn rank(
    normalized_query: &str,
    candidates: &[Candidate],
    policy: &RankingPolicy,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .filter(|c| usable_symbol(&c.symbol))
        .map(|c| RankedCandidate {
            score: score(normalized_query, c, policy),
            candidate: c.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

fn usable_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && !symbol.chars().any(char::is_whitespace)
}

fn score(normalized_query: &str, candidate: &Candidate, policy: &RankingPolicy) -> f64 {
    let mut score = BASE_SCORE;

    if !normalized_query.is_empty() {
        let (stem, _) = split_suffix(&candidate.symbol);
        let mut names = vec![query::normalize(stem)];
        if let Some(desc) = candidate.description.as_deref() {
            names.push(query::normalize(desc));
        }

        if names.iter().any(|n| n.contains(normalized_query)) {
            score += CONTAINS_BONUS;
        }
        if names.iter().any(|n| n == normalized_query) {
            score += EXACT_BONUS;
        }
    }

    score + policy.exchange_bonus(&candidate.symbol)
}
