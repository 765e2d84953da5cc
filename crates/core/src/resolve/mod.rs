//! Free text to a single (symbol, display name) pair.
//!
//! Pipeline: trim, transliterate non-Latin input, search through the candidate cache,
//! rank, take the top candidate.

pub mod cache;
pub mod rank;
pub mod transliterate;

use crate::domain::candidate::{Candidate, ResolvedTicker};
use crate::domain::exchange::DEFAULT_LOCAL_SUFFIX;
use crate::domain::query::{Query, Script};
use crate::error::ResolveError;
use cache::CandidateCache;
use rank::RankingPolicy;
use std::sync::Arc;
use transliterate::Transliterator;

/// Fuzzy search against the primary provider, in the provider's own relevance order.
#[async_trait::async_trait]
pub trait SymbolSearch: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<Candidate>>;
}

pub struct TickerResolver {
    transliterator: Arc<dyn Transliterator>,
    cache: Arc<CandidateCache>,
    policy: RankingPolicy,
}

impl TickerResolver {
    pub fn new(transliterator: Arc<dyn Transliterator>, cache: Arc<CandidateCache>) -> Self {
        Self {
            transliterator,
            cache,
            policy: RankingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn resolve(&self, input: &str) -> Result<ResolvedTicker, ResolveError> {
        let mut query = Query::new(input);
        if query.is_empty() {
            return Err(ResolveError::NotFound {
                query: query.original,
            });
        }

        if query.script == Script::NonLatin {
            let latin = self.transliterator.to_latin(&query.original).await?;
            tracing::debug!(input = %query.original, latin = %latin, "using transliterated query");
            query = Query::new(&latin);
            if query.is_empty() {
                return Err(ResolveError::NotFound { query: latin });
            }
        }

        let mut candidates = self
            .cache
            .get_or_fetch(&query.normalized)
            .await
            .map_err(ResolveError::Internal)?;

        if let Some(code) = query.local_code() {
            candidates.push(Candidate::new(format!("{code}{DEFAULT_LOCAL_SUFFIX}"), None));
        }

        let ranked = rank::rank(&query.normalized, &candidates, &self.policy);
        let Some(top) = ranked.into_iter().next() else {
            tracing::info!(input, query = %query.normalized, "no candidates after ranking");
            return Err(ResolveError::NotFound {
                query: query.original,
            });
        };

        tracing::debug!(input, symbol = %top.candidate.symbol, score = top.score, "resolved ticker");
        Ok(top.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransliterationError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSearch {
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl SymbolSearch for FakeSearch {
        async fn search(&self, query: &str) -> anyhow::Result<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            Ok(match query {
                "samsung electronics" => vec![
                    Candidate::new("SSNLF", Some("SAMSUNG ELECTRONICS CO LTD")),
                    Candidate::new("005930.KS", Some("SAMSUNG ELECTRONICS CO LTD")),
                ],
                "apple inc" => vec![
                    Candidate::new("APLE", Some("Apple Hospitality REIT Inc")),
                    Candidate::new("AAPL", Some("Apple Inc")),
                    Candidate::new("AAPL.MX", Some("APPLE INC")),
                ],
                "tesla" => vec![Candidate::new("", Some("broken record"))],
                _ => Vec::new(),
            })
        }
    }

    struct FailingSearch;

    #[async_trait::async_trait]
    impl SymbolSearch for FailingSearch {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<Candidate>> {
            anyhow::bail!("backend exploded")
        }
    }

    struct FakeTransliterator {
        calls: AtomicUsize,
        output: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl Transliterator for FakeTransliterator {
        async fn to_latin(&self, _name: &str) -> Result<String, TransliterationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .map(str::to_string)
                .ok_or_else(|| TransliterationError::Unavailable(anyhow::anyhow!("down")))
        }
    }

    fn resolver(
        search: Arc<dyn SymbolSearch>,
        output: Option<&'static str>,
    ) -> (TickerResolver, Arc<FakeTransliterator>) {
        let translit = Arc::new(FakeTransliterator {
            calls: AtomicUsize::new(0),
            output,
        });
        let cache = Arc::new(CandidateCache::new(search));
        (TickerResolver::new(translit.clone(), cache), translit)
    }

    #[tokio::test]
    async fn latin_query_resolves_to_best_candidate() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, translit) = resolver(search.clone(), None);

        let out = resolver.resolve("  Apple Inc. ").await.unwrap();
        assert_eq!(out.symbol, "AAPL");
        assert_eq!(out.display_name, "Apple Inc");
        assert_eq!(translit.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_latin_query_is_transliterated_before_search() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, translit) = resolver(search.clone(), Some("Samsung Electronics"));

        let out = resolver.resolve("삼성전자").await.unwrap();
        assert_eq!(out.symbol, "005930.KS");
        assert_eq!(translit.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*search.queries.lock().unwrap(), vec!["samsung electronics"]);
    }

    #[tokio::test]
    async fn transliteration_failure_never_reaches_search() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, _) = resolver(search.clone(), None);

        let err = resolver.resolve("삼성전자").await.unwrap_err();
        assert!(matches!(err, ResolveError::Transliteration(_)));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn punctuation_only_transliteration_is_not_found_without_search() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, translit) = resolver(search.clone(), Some("---"));

        let err = resolver.resolve("삼성전자").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(translit.calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bare_local_code_resolves_without_transliteration() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, translit) = resolver(search.clone(), None);

        let out = resolver.resolve("005930").await.unwrap();
        assert_eq!(out.symbol, "005930.KS");
        assert_eq!(out.display_name, "005930.KS");
        assert_eq!(translit.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_usable_candidates_is_not_found() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, _) = resolver(search.clone(), None);

        assert!(resolver.resolve("tesla").await.unwrap_err().is_not_found());
        assert!(resolver.resolve("unknown corp").await.unwrap_err().is_not_found());
        assert!(resolver.resolve("  ...  ").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn repeated_resolution_hits_cache() {
        let search = Arc::new(FakeSearch::default());
        let (resolver, _) = resolver(search.clone(), None);

        let first = resolver.resolve("Apple Inc").await.unwrap();
        let second = resolver.resolve("apple, inc!").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_error_is_internal_with_generic_message() {
        let (resolver, _) = resolver(Arc::new(FailingSearch), None);
        let err = resolver.resolve("Apple").await.unwrap_err();
        assert!(matches!(err, ResolveError::Internal(_)));
        assert_eq!(err.to_string(), "ticker resolution failed");
    }
}
