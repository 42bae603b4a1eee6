//! One day's flavor list, kept in memory.
//!
//! The list is keyed by shop-local date: a request for a date other than the
//! cached one scrapes again. Refreshes are serialised so a burst of requests
//! at the start of a day triggers exactly one scrape.

use std::sync::Arc;

use chrono::NaiveDate;
use custard_core::FlavorRecord;
use custard_scraper::FlavorSource;
use tokio::sync::{Mutex, RwLock};

struct CachedDay {
    date: NaiveDate,
    records: Vec<FlavorRecord>,
}

pub struct FlavorCache {
    source: Arc<dyn FlavorSource>,
    entry: RwLock<Option<CachedDay>>,
    refresh: Mutex<()>,
}

impl FlavorCache {
    pub fn new(source: Arc<dyn FlavorSource>) -> Self {
        Self {
            source,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// The cached list for `today`, scraping first if the cache holds
    /// another day or nothing at all.
    pub async fn get_or_refresh(&self, today: NaiveDate) -> Vec<FlavorRecord> {
        if let Some(records) = self.cached_for(today).await {
            return records;
        }

        let _guard = self.refresh.lock().await;
        // Someone else may have refreshed while we waited for the lock.
        if let Some(records) = self.cached_for(today).await {
            return records;
        }
        self.scrape_and_store(today).await
    }

    /// Scrape for `today` unconditionally, replacing the cached list when
    /// the scrape found anything.
    pub async fn refresh(&self, today: NaiveDate) -> Vec<FlavorRecord> {
        let _guard = self.refresh.lock().await;
        self.scrape_and_store(today).await
    }

    pub async fn cached_date(&self) -> Option<NaiveDate> {
        self.entry.read().await.as_ref().map(|day| day.date)
    }

    async fn cached_for(&self, today: NaiveDate) -> Option<Vec<FlavorRecord>> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|day| day.date == today)
            .map(|day| day.records.clone())
    }

    // Caller must hold `self.refresh`.
    async fn scrape_and_store(&self, today: NaiveDate) -> Vec<FlavorRecord> {
        tracing::info!(%today, "refreshing flavor cache");
        let records = self.source.scrape(today).await;

        if records.is_empty() {
            tracing::warn!(%today, "scrape returned no flavors; not caching");
            return records;
        }

        *self.entry.write().await = Some(CachedDay {
            date: today,
            records: records.clone(),
        });
        tracing::info!(%today, count = records.len(), "flavor cache updated");
        records
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct CountingSource {
        calls: AtomicUsize,
        flavors: Vec<&'static str>,
        delay: Duration,
    }

    impl CountingSource {
        fn new(flavors: Vec<&'static str>) -> Arc<Self> {
            Self::slow(flavors, Duration::ZERO)
        }

        fn slow(flavors: Vec<&'static str>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                flavors,
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FlavorSource for CountingSource {
        async fn scrape(&self, today: NaiveDate) -> Vec<FlavorRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.flavors
                .iter()
                .map(|f| {
                    FlavorRecord::new(
                        "Kopps".to_string(),
                        (*f).to_string(),
                        String::new(),
                        Some(today),
                        None,
                    )
                })
                .collect()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[tokio::test]
    async fn same_day_is_served_from_cache() {
        let source = CountingSource::new(vec!["Butter Pecan"]);
        let cache = FlavorCache::new(source.clone());

        assert_eq!(cache.get_or_refresh(day(15)).await.len(), 1);
        assert_eq!(cache.get_or_refresh(day(15)).await.len(), 1);
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.cached_date().await, Some(day(15)));
    }

    #[tokio::test]
    async fn new_day_scrapes_again() {
        let source = CountingSource::new(vec!["Butter Pecan"]);
        let cache = FlavorCache::new(source.clone());

        cache.get_or_refresh(day(15)).await;
        let records = cache.get_or_refresh(day(16)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(records[0].date(), Some(day(16)));
        assert_eq!(cache.cached_date().await, Some(day(16)));
    }

    #[tokio::test]
    async fn empty_result_is_not_cached() {
        let source = CountingSource::new(vec![]);
        let cache = FlavorCache::new(source.clone());

        assert!(cache.get_or_refresh(day(15)).await.is_empty());
        assert!(cache.get_or_refresh(day(15)).await.is_empty());
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.cached_date().await, None);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_scrape() {
        let source = CountingSource::slow(vec!["Mint"], Duration::from_millis(50));
        let cache = Arc::new(FlavorCache::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_refresh(day(15)).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 1);
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn explicit_refresh_always_scrapes() {
        let source = CountingSource::new(vec!["Mint"]);
        let cache = FlavorCache::new(source.clone());

        cache.get_or_refresh(day(15)).await;
        cache.refresh(day(15)).await;
        assert_eq!(source.calls(), 2);
    }
}
