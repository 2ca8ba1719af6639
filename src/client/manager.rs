//! Session-managed client over the Shizou API.
//!
//! Owns the one long-lived login session: concurrent login attempts are
//! coalesced into a single network call, an unauthorized response triggers
//! exactly one re-login-and-retry, and lookups go through a typed cache
//! with sliding expiration.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::client::api::{RawResponse, ShizouApi};
use crate::client::cache::{
    CacheKey, CachedValue, DATA_TTL, IMAGE_TTL, ImageKind, ResponseCache,
};
use crate::config::SharedConfig;
use crate::error::ApiError;
use crate::models::{AniDbAnime, AniDbCredit, AniDbEpisode, EpisodeFileXref, FileWatchedState};

/// A login that succeeded this recently satisfies any follow-up attempt,
/// so bursts of concurrent 401s cause one network login at most.
const LOGIN_COOLDOWN: Duration = Duration::from_secs(10);

pub struct ClientManager {
    api: Arc<dyn ShizouApi>,
    config: SharedConfig,
    cache: ResponseCache,
    login_lock: Mutex<()>,
    last_login: Mutex<Option<Instant>>,
    episode_locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl ClientManager {
    #[must_use]
    pub fn new(api: Arc<dyn ShizouApi>, config: SharedConfig) -> Self {
        Self {
            api,
            config,
            cache: ResponseCache::default(),
            login_lock: Mutex::new(()),
            last_login: Mutex::new(None),
            episode_locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Authenticate against the backend.
    ///
    /// Single-flight: if another login is already running, this waits for
    /// it and returns without its own network call. A login within the
    /// cooldown window of the last success is likewise skipped. The lock
    /// guard is released on every exit path, including drop mid-call.
    pub async fn login(&self) -> Result<(), ApiError> {
        let _guard = match self.login_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let _waited = self.login_lock.lock().await;
                trace!("Obtained login lock after waiting, skipping login");
                return Ok(());
            }
        };

        if let Some(last) = *self.last_login.lock().await {
            if last.elapsed() < LOGIN_COOLDOWN {
                warn!(
                    "Logged in less than {}s ago, not retrying",
                    LOGIN_COOLDOWN.as_secs()
                );
                return Ok(());
            }
        }

        let password = self.config.password().await;
        info!("Logging in...");
        self.api.login(&password).await?;
        *self.last_login.lock().await = Some(Instant::now());
        info!("Successfully logged in");
        Ok(())
    }

    /// Run `op`; on an unauthorized failure, log in (or wait for the
    /// in-flight login) and retry exactly once. Any other failure, or a
    /// second unauthorized one, propagates unchanged.
    pub async fn with_login_retry<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        match op().await {
            Err(err) if err.is_unauthorized() => {
                debug!("Request was unauthorized, logging in and retrying once");
                self.login().await?;
                op().await
            }
            other => other,
        }
    }

    /// Cache-aware fetch. A cached `Missing` marker surfaces as `None`;
    /// a fresh not-found is cached as `Missing` so the miss is not re-hit.
    /// The cache write happens only after the fetch completes, so a
    /// dropped call never leaves a half-written entry.
    async fn get_or_fetch<T, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
        encode: impl FnOnce(T) -> CachedValue + Send,
        decode: impl Fn(CachedValue) -> Option<T> + Send,
    ) -> Result<Option<T>, ApiError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(match hit {
                CachedValue::Missing => None,
                value => decode(value),
            });
        }

        match self.with_login_retry(&fetch).await {
            Ok(value) => {
                let stored = encode(value);
                let result = decode(stored.clone());
                self.cache.insert(key, stored, ttl).await;
                Ok(result)
            }
            Err(err) if err.is_not_found() => {
                debug!(?key, "Resource not found, caching the miss");
                self.cache.insert(key, CachedValue::Missing, ttl).await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn anime(&self, anime_id: i32) -> Result<Option<Arc<AniDbAnime>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.get_or_fetch(
            CacheKey::Anime(anime_id),
            DATA_TTL,
            move || {
                let api = Arc::clone(&api);
                async move { api.anime(anime_id).await.map(Arc::new) }
            },
            CachedValue::Anime,
            |value| match value {
                CachedValue::Anime(anime) => Some(anime),
                _ => None,
            },
        )
        .await
    }

    pub async fn episodes_by_anime(
        &self,
        anime_id: i32,
    ) -> Result<Option<Arc<Vec<AniDbEpisode>>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.get_or_fetch(
            CacheKey::EpisodesByAnime(anime_id),
            DATA_TTL,
            move || {
                let api = Arc::clone(&api);
                async move { api.episodes_by_anime(anime_id).await.map(Arc::new) }
            },
            CachedValue::Episodes,
            |value| match value {
                CachedValue::Episodes(episodes) => Some(episodes),
                _ => None,
            },
        )
        .await
    }

    pub async fn episodes_by_file(
        &self,
        file_id: i32,
    ) -> Result<Option<Arc<Vec<AniDbEpisode>>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.get_or_fetch(
            CacheKey::EpisodesByFile(file_id),
            DATA_TTL,
            move || {
                let api = Arc::clone(&api);
                async move { api.episodes_by_file(file_id).await.map(Arc::new) }
            },
            CachedValue::Episodes,
            |value| match value {
                CachedValue::Episodes(episodes) => Some(episodes),
                _ => None,
            },
        )
        .await
    }

    pub async fn credits(&self, anime_id: i32) -> Result<Option<Arc<Vec<AniDbCredit>>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.get_or_fetch(
            CacheKey::Credits(anime_id),
            DATA_TTL,
            move || {
                let api = Arc::clone(&api);
                async move { api.credits_by_anime(anime_id).await.map(Arc::new) }
            },
            CachedValue::Credits,
            |value| match value {
                CachedValue::Credits(credits) => Some(credits),
                _ => None,
            },
        )
        .await
    }

    pub async fn ep_file_xrefs(
        &self,
        anime_id: i32,
    ) -> Result<Option<Arc<Vec<EpisodeFileXref>>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.get_or_fetch(
            CacheKey::EpFileXrefs(anime_id),
            DATA_TTL,
            move || {
                let api = Arc::clone(&api);
                async move { api.ep_file_xrefs(anime_id).await.map(Arc::new) }
            },
            CachedValue::Xrefs,
            |value| match value {
                CachedValue::Xrefs(xrefs) => Some(xrefs),
                _ => None,
            },
        )
        .await
    }

    /// Image bytes by kind and id, cached for an hour.
    pub async fn image(
        &self,
        kind: ImageKind,
        id: i32,
    ) -> Result<Option<Arc<Vec<u8>>>, ApiError> {
        let api = Arc::clone(&self.api);
        let path = format!("api/Images/{}/{id}", kind.path_segment());
        self.get_or_fetch(
            CacheKey::Image(kind, id),
            IMAGE_TTL,
            move || {
                let api = Arc::clone(&api);
                let path = path.clone();
                async move { api.get_raw(&path).await.map(|raw| Arc::new(raw.bytes)) }
            },
            CachedValue::Image,
            |value| match value {
                CachedValue::Image(bytes) => Some(bytes),
                _ => None,
            },
        )
        .await
    }

    /// Uncached pass-through GET with the same retry-once contract.
    pub async fn get_raw_url(&self, url: &str) -> Result<RawResponse, ApiError> {
        let api = Arc::clone(&self.api);
        let url = url.to_string();
        self.with_login_retry(move || {
            let api = Arc::clone(&api);
            let url = url.clone();
            async move { api.get_raw(&url).await }
        })
        .await
    }

    pub async fn watched_states(&self) -> Result<Vec<FileWatchedState>, ApiError> {
        let api = Arc::clone(&self.api);
        self.with_login_retry(move || {
            let api = Arc::clone(&api);
            async move { api.watched_states().await }
        })
        .await
    }

    pub async fn set_watched(&self, file_id: i32, watched: bool) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.with_login_retry(move || {
            let api = Arc::clone(&api);
            async move { api.set_watched(file_id, watched).await }
        })
        .await
    }

    async fn episode_group_lock(&self, anime_id: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.episode_locks.lock().await;
            Arc::clone(locks.entry(anime_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Episodes of `anime_id` that belong to `file_id`, resolved through
    /// the parent's full episode and cross-reference sets.
    ///
    /// Serialized per parent: concurrent resolutions for files of the same
    /// anime populate the two cache entries exactly once, the rest read
    /// the fresh entries.
    pub async fn episodes_for_file(
        &self,
        anime_id: i32,
        file_id: i32,
    ) -> Result<Vec<AniDbEpisode>, ApiError> {
        let _guard = self.episode_group_lock(anime_id).await;

        let Some(xrefs) = self.ep_file_xrefs(anime_id).await? else {
            return Ok(Vec::new());
        };
        let episode_ids: HashSet<i32> = xrefs
            .iter()
            .filter(|xref| xref.anidb_file_id == file_id)
            .map(|xref| xref.anidb_episode_id)
            .collect();
        if episode_ids.is_empty() {
            return Ok(Vec::new());
        }

        let Some(episodes) = self.episodes_by_anime(anime_id).await? else {
            return Ok(Vec::new());
        };
        Ok(episodes
            .iter()
            .filter(|ep| episode_ids.contains(&ep.id))
            .cloned()
            .collect())
    }
}
