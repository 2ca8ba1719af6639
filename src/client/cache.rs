//! Typed response cache with sliding expiration.
//!
//! Keys pair a resource kind with its numeric id, so lookups for different
//! kinds can never collide. A backend 404 is stored as [`CachedValue::Missing`]
//! so repeated lookups for a nonexistent resource stay off the network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::{AniDbAnime, AniDbCredit, AniDbEpisode, EpisodeFileXref};

/// Sliding window for metadata lookups.
pub const DATA_TTL: Duration = Duration::from_secs(60);

/// Sliding window for binary images.
pub const IMAGE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    AnimePoster,
    EpisodeThumbnail,
    CreatorImage,
}

impl ImageKind {
    /// Path segment under `api/Images/` on the backend.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::AnimePoster => "AnimePosters",
            Self::EpisodeThumbnail => "EpisodeThumbnails",
            Self::CreatorImage => "CreatorImages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Anime(i32),
    EpisodesByAnime(i32),
    EpisodesByFile(i32),
    Credits(i32),
    EpFileXrefs(i32),
    Image(ImageKind, i32),
}

/// Cached payloads are `Arc`'d so a hit hands out a cheap clone.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Anime(Arc<AniDbAnime>),
    Episodes(Arc<Vec<AniDbEpisode>>),
    Credits(Arc<Vec<AniDbCredit>>),
    Xrefs(Arc<Vec<EpisodeFileXref>>),
    Image(Arc<Vec<u8>>),
    /// The backend answered 404; cached so the miss is not re-fetched.
    Missing,
}

struct Entry {
    value: CachedValue,
    ttl: Duration,
    expires_at: Instant,
}

#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResponseCache {
    /// Look up a key. A hit renews the entry's window (sliding expiration);
    /// an expired entry is dropped and reported as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.expires_at = now + entry.ttl;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(
            key,
            Entry {
                value,
                ttl,
                expires_at: now + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn image(bytes: &[u8]) -> CachedValue {
        CachedValue::Image(Arc::new(bytes.to_vec()))
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_ttl() {
        let cache = ResponseCache::default();
        cache
            .insert(CacheKey::Anime(1), image(b"x"), DATA_TTL)
            .await;

        advance(DATA_TTL + Duration::from_secs(1)).await;
        assert!(cache.get(&CacheKey::Anime(1)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn read_renews_the_window() {
        let cache = ResponseCache::default();
        cache
            .insert(CacheKey::Anime(1), image(b"x"), DATA_TTL)
            .await;

        // Touch just before expiry, then wait most of another window.
        advance(DATA_TTL - Duration::from_secs(1)).await;
        assert!(cache.get(&CacheKey::Anime(1)).await.is_some());

        advance(DATA_TTL - Duration::from_secs(1)).await;
        assert!(
            cache.get(&CacheKey::Anime(1)).await.is_some(),
            "window slides on read instead of staying fixed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_marker_round_trips() {
        let cache = ResponseCache::default();
        cache
            .insert(CacheKey::Credits(7), CachedValue::Missing, DATA_TTL)
            .await;

        assert!(matches!(
            cache.get(&CacheKey::Credits(7)).await,
            Some(CachedValue::Missing)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_scoped_by_resource_kind() {
        let cache = ResponseCache::default();
        cache
            .insert(CacheKey::Anime(5), image(b"a"), DATA_TTL)
            .await;

        assert!(cache.get(&CacheKey::Credits(5)).await.is_none());
        assert!(
            cache
                .get(&CacheKey::Image(ImageKind::AnimePoster, 5))
                .await
                .is_none()
        );
    }
}
