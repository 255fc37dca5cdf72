//! Cached, retrying, two-provider route cost lookup.
//!
//! A lookup tries, in order: the cache, the primary provider (with
//! retries), the fallback provider (with retries). Successful answers are
//! written through to the cache; if both providers give up the pair is
//! reported as unreachable and nothing is cached.

use tracing::{debug, warn};

use crate::cache::CostCache;
use crate::error::CacheError;
use crate::model::{Coordinate, CostEntry, RouteCost};
use crate::retry::RetryPolicy;
use crate::traits::{RouteCostSource, RoutingProvider};

/// Where lookups were answered from during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub cache_hits: usize,
    pub primary: usize,
    pub fallback: usize,
    pub unreachable: usize,
}

#[derive(Debug)]
pub struct RouteCostProvider<P, F> {
    cache: CostCache,
    primary: P,
    fallback: F,
    retry: RetryPolicy,
    stats: RouteStats,
}

impl<P, F> RouteCostProvider<P, F>
where
    P: RoutingProvider,
    F: RoutingProvider,
{
    pub fn new(cache: CostCache, primary: P, fallback: F) -> Self {
        Self {
            cache,
            primary,
            fallback,
            retry: RetryPolicy::routing(),
            stats: RouteStats::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &CostCache {
        &self.cache
    }

    pub fn stats(&self) -> RouteStats {
        self.stats
    }

    pub fn flush_cache(&mut self) -> Result<(), CacheError> {
        self.cache.flush()
    }

    pub fn into_cache(self) -> CostCache {
        self.cache
    }
}

/// Asks one provider, retrying per `retry`; `None` once it gives up.
fn fetch<R: RoutingProvider>(
    provider: &R,
    retry: &RetryPolicy,
    from: Coordinate,
    to: Coordinate,
) -> Option<RouteCost> {
    retry
        .run(provider.name(), |_| provider.query(from, to))
        .ok()
}

impl<P, F> RouteCostSource for RouteCostProvider<P, F>
where
    P: RoutingProvider,
    F: RoutingProvider,
{
    fn route_cost(&mut self, from: Option<Coordinate>, to: Option<Coordinate>) -> RouteCost {
        let (Some(from), Some(to)) = (from, to) else {
            return RouteCost::unreachable();
        };

        if let Some(entry) = self.cache.lookup(from, to) {
            self.stats.cache_hits += 1;
            debug!(from = %from.key(), to = %to.key(), provider = entry.provider.as_str(), "route cost cache hit");
            return entry.to_route_cost();
        }

        if let Some(cost) = fetch(&self.primary, &self.retry, from, to) {
            self.stats.primary += 1;
            let entry = CostEntry::from_route(cost.clone(), self.primary.kind());
            self.cache.put(from, to, entry);
            return cost;
        }

        warn!(
            from = %from.key(),
            to = %to.key(),
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            "primary routing failed, falling back"
        );

        if let Some(cost) = fetch(&self.fallback, &self.retry, from, to) {
            self.stats.fallback += 1;
            let entry = CostEntry::from_route(cost.clone(), self.fallback.kind());
            self.cache.put(from, to, entry);
            return cost;
        }

        self.stats.unreachable += 1;
        warn!(from = %from.key(), to = %to.key(), "no route found by any provider");
        RouteCost::unreachable()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::ProviderError;
    use crate::model::ProviderKind;
    use crate::polyline::Polyline;

    struct Scripted {
        kind: ProviderKind,
        fail_first: usize,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(kind: ProviderKind, fail_first: usize) -> Self {
            Self {
                kind,
                fail_first,
                calls: Cell::new(0),
            }
        }
    }

    impl RoutingProvider for Scripted {
        fn name(&self) -> &'static str {
            self.kind.as_str()
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn query(&self, from: Coordinate, to: Coordinate) -> Result<RouteCost, ProviderError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call < self.fail_first {
                return Err(ProviderError::Status {
                    provider: self.name(),
                    status: 503,
                });
            }
            Ok(RouteCost::new(
                100.0,
                1_000.0,
                Some(Polyline::new(vec![from.as_tuple(), to.as_tuple()])),
            ))
        }
    }

    fn provider(primary_failures: usize, fallback_failures: usize) -> RouteCostProvider<Scripted, Scripted> {
        RouteCostProvider::new(
            CostCache::in_memory(),
            Scripted::new(ProviderKind::Primary, primary_failures),
            Scripted::new(ProviderKind::Fallback, fallback_failures),
        )
        .with_retry(RetryPolicy::immediate(3))
    }

    fn a() -> Option<Coordinate> {
        Some(Coordinate::new(14.5547, 121.0244))
    }

    fn b() -> Option<Coordinate> {
        Some(Coordinate::new(14.6091, 121.0223))
    }

    #[test]
    fn retries_primary_before_falling_back() {
        let mut costs = provider(2, 0);
        let cost = costs.route_cost(a(), b());
        assert!(cost.is_reachable());
        assert_eq!(costs.primary.calls.get(), 3);
        assert_eq!(costs.fallback.calls.get(), 0);
        assert_eq!(costs.stats().primary, 1);
    }

    #[test]
    fn fallback_result_is_cached_under_its_own_slot() {
        let mut costs = provider(usize::MAX, 0);
        costs.route_cost(a(), b());
        let (from, to) = (a().unwrap(), b().unwrap());
        assert!(costs.cache().get(from, to, ProviderKind::Fallback).is_some());
        assert!(costs.cache().get(from, to, ProviderKind::Primary).is_none());
        assert_eq!(costs.stats().fallback, 1);
    }

    #[test]
    fn missing_coordinate_short_circuits() {
        let mut costs = provider(0, 0);
        assert_eq!(costs.route_cost(None, b()), RouteCost::unreachable());
        assert_eq!(costs.route_cost(a(), None), RouteCost::unreachable());
        assert_eq!(costs.primary.calls.get(), 0);
    }

    #[test]
    fn failure_is_not_cached() {
        let mut costs = provider(usize::MAX, usize::MAX);
        assert!(!costs.route_cost(a(), b()).is_reachable());
        assert!(costs.cache().is_empty());

        costs.route_cost(a(), b());
        assert_eq!(costs.primary.calls.get(), 6);
        assert_eq!(costs.fallback.calls.get(), 6);
        assert_eq!(costs.stats().unreachable, 2);
    }
}
