//! Behavior of the session-managed client: single-flight login, the
//! re-login cooldown, retry-once on unauthorized, miss caching, sliding
//! expiration, and the per-parent grouped episode lookup.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{advance, sleep, timeout};

use shizou_bridge::models::{
    AniDbAnime, AniDbCredit, AniDbEpisode, EpisodeFileXref, EpisodeType, FileWatchedState,
};
use shizou_bridge::{ApiError, ClientManager, RawResponse, SharedConfig, ShizouApi};

#[derive(Default)]
struct MockApi {
    login_calls: AtomicUsize,
    anime_calls: AtomicUsize,
    episodes_calls: AtomicUsize,
    xref_calls: AtomicUsize,
    login_delay: Duration,
    fetch_delay: Duration,
    anime_missing: bool,
}

fn sample_anime(id: i32) -> AniDbAnime {
    AniDbAnime {
        id,
        title_transcription: Some("Sample".to_string()),
        title_original: None,
        air_date: None,
        end_date: None,
        description: None,
        rating: None,
        tags: Vec::new(),
    }
}

fn sample_episode(id: i32, number: i32) -> AniDbEpisode {
    AniDbEpisode {
        id,
        number,
        episode_type: EpisodeType::Episode,
        title_english: Some(format!("Episode {number}")),
        title_original: None,
        air_date: None,
        duration_minutes: Some(24),
        summary: None,
    }
}

#[async_trait]
impl ShizouApi for MockApi {
    async fn login(&self, _password: &str) -> Result<(), ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if !self.login_delay.is_zero() {
            sleep(self.login_delay).await;
        }
        Ok(())
    }

    async fn anime(&self, anime_id: i32) -> Result<AniDbAnime, ApiError> {
        self.anime_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            sleep(self.fetch_delay).await;
        }
        if self.anime_missing {
            Err(ApiError::NotFound)
        } else {
            Ok(sample_anime(anime_id))
        }
    }

    async fn episodes_by_anime(&self, _anime_id: i32) -> Result<Vec<AniDbEpisode>, ApiError> {
        self.episodes_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            sleep(self.fetch_delay).await;
        }
        Ok(vec![sample_episode(11, 1), sample_episode(12, 2)])
    }

    async fn episodes_by_file(&self, _file_id: i32) -> Result<Vec<AniDbEpisode>, ApiError> {
        Ok(Vec::new())
    }

    async fn credits_by_anime(&self, _anime_id: i32) -> Result<Vec<AniDbCredit>, ApiError> {
        Ok(Vec::new())
    }

    async fn ep_file_xrefs(&self, _anime_id: i32) -> Result<Vec<EpisodeFileXref>, ApiError> {
        self.xref_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            sleep(self.fetch_delay).await;
        }
        Ok(vec![
            EpisodeFileXref {
                anidb_file_id: 1,
                anidb_episode_id: 11,
            },
            EpisodeFileXref {
                anidb_file_id: 2,
                anidb_episode_id: 12,
            },
        ])
    }

    async fn watched_states(&self) -> Result<Vec<FileWatchedState>, ApiError> {
        Ok(Vec::new())
    }

    async fn set_watched(&self, _file_id: i32, _watched: bool) -> Result<(), ApiError> {
        Ok(())
    }

    async fn get_raw(&self, _path_or_url: &str) -> Result<RawResponse, ApiError> {
        Ok(RawResponse {
            bytes: b"img".to_vec(),
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

fn manager_with(api: &Arc<MockApi>) -> Arc<ClientManager> {
    Arc::new(ClientManager::new(
        Arc::clone(api) as Arc<dyn ShizouApi>,
        SharedConfig::default(),
    ))
}

#[tokio::test(start_paused = true)]
async fn concurrent_logins_share_one_network_call() {
    let api = Arc::new(MockApi {
        login_delay: Duration::from_millis(100),
        ..MockApi::default()
    });
    let manager = manager_with(&api);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { manager.login().await }));
    }
    for handle in handles {
        handle.await.expect("task").expect("login succeeds");
    }

    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn login_within_cooldown_skips_network_call() {
    let api = Arc::new(MockApi::default());
    let manager = manager_with(&api);

    manager.login().await.expect("first login");
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(5)).await;
    manager.login().await.expect("cooldown skip");
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(6)).await;
    manager.login().await.expect("fresh login");
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_once_triggers_one_login_and_retry() {
    let api = Arc::new(MockApi::default());
    let manager = manager_with(&api);

    let attempts = AtomicUsize::new(0);
    let value = manager
        .with_login_retry(|| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ApiError::Unauthorized)
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .expect("retried call succeeds");

    assert_eq!(value, 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn second_unauthorized_surfaces_to_the_caller() {
    let api = Arc::new(MockApi::default());
    let manager = manager_with(&api);

    let result: Result<i32, ApiError> = manager
        .with_login_retry(|| async { Err(ApiError::Unauthorized) })
        .await;

    assert!(result.is_err_and(|err| err.is_unauthorized()));
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn other_errors_propagate_without_login() {
    let api = Arc::new(MockApi::default());
    let manager = manager_with(&api);

    let result: Result<i32, ApiError> = manager
        .with_login_retry(|| async { Err(ApiError::NotFound) })
        .await;

    assert!(result.is_err_and(|err| err.is_not_found()));
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_cached_as_absent() {
    let api = Arc::new(MockApi {
        anime_missing: true,
        ..MockApi::default()
    });
    let manager = manager_with(&api);

    assert!(manager.anime(7).await.expect("first lookup").is_none());
    assert!(manager.anime(7).await.expect("second lookup").is_none());
    assert_eq!(
        api.anime_calls.load(Ordering::SeqCst),
        1,
        "the 404 must be served from cache"
    );
}

#[tokio::test(start_paused = true)]
async fn cache_window_slides_on_each_read() {
    let api = Arc::new(MockApi::default());
    let manager = manager_with(&api);

    manager.anime(7).await.expect("fetch").expect("present");
    assert_eq!(api.anime_calls.load(Ordering::SeqCst), 1);

    // Two reads, each just inside the one-minute window; the second is
    // past the original expiry and only survives because the first read
    // renewed it.
    advance(Duration::from_secs(59)).await;
    manager.anime(7).await.expect("hit").expect("present");
    advance(Duration::from_secs(59)).await;
    manager.anime(7).await.expect("renewed hit").expect("present");
    assert_eq!(api.anime_calls.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(61)).await;
    manager.anime(7).await.expect("refetch").expect("present");
    assert_eq!(api.anime_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn grouped_lookup_fetches_parent_sets_once() {
    let api = Arc::new(MockApi {
        fetch_delay: Duration::from_millis(50),
        ..MockApi::default()
    });
    let manager = manager_with(&api);

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.episodes_for_file(1, 1).await }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.episodes_for_file(1, 2).await }
    });

    let first = first.await.expect("task").expect("lookup");
    let second = second.await.expect("task").expect("lookup");

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, 11);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, 12);

    assert_eq!(api.xref_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.episodes_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_login_releases_the_gate() {
    let api = Arc::new(MockApi {
        login_delay: Duration::from_secs(10),
        ..MockApi::default()
    });
    let manager = manager_with(&api);

    let in_flight = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.login().await }
    });
    // Let the task take the gate and enter the network call.
    sleep(Duration::from_millis(10)).await;
    in_flight.abort();
    let _ = in_flight.await;
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);

    // A held gate would leave this waiting past the timeout.
    timeout(Duration::from_secs(60), manager.login())
        .await
        .expect("login gate was released")
        .expect("login succeeds");
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 2);
}
