//! Backend transport: the endpoint surface as a trait plus the reqwest
//! implementation. The manager only ever sees the trait, so tests can
//! drive it with a scripted stand-in.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::SharedConfig;
use crate::error::ApiError;
use crate::models::{AniDbAnime, AniDbCredit, AniDbEpisode, EpisodeFileXref, FileWatchedState};

/// Raw bytes plus the content type the server reported, for image
/// pass-through.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The Shizou endpoint set. Success returns typed data; unauthorized and
/// missing resources come back as the matching [`ApiError`] variants.
#[async_trait]
pub trait ShizouApi: Send + Sync {
    async fn login(&self, password: &str) -> Result<(), ApiError>;

    async fn anime(&self, anime_id: i32) -> Result<AniDbAnime, ApiError>;

    async fn episodes_by_anime(&self, anime_id: i32) -> Result<Vec<AniDbEpisode>, ApiError>;

    async fn episodes_by_file(&self, file_id: i32) -> Result<Vec<AniDbEpisode>, ApiError>;

    async fn credits_by_anime(&self, anime_id: i32) -> Result<Vec<AniDbCredit>, ApiError>;

    async fn ep_file_xrefs(&self, anime_id: i32) -> Result<Vec<EpisodeFileXref>, ApiError>;

    async fn watched_states(&self) -> Result<Vec<FileWatchedState>, ApiError>;

    async fn set_watched(&self, file_id: i32, watched: bool) -> Result<(), ApiError>;

    /// GET an arbitrary backend path (or absolute URL) and hand back the
    /// body unparsed.
    async fn get_raw(&self, path_or_url: &str) -> Result<RawResponse, ApiError>;
}

/// reqwest-backed implementation. The session rides on a cookie store;
/// every request snapshots the base address from the shared config so a
/// runtime address change redirects the next request.
pub struct HttpApi {
    client: Client,
    config: SharedConfig,
}

impl HttpApi {
    #[must_use]
    pub fn new(config: SharedConfig) -> Self {
        Self {
            client: Client::builder()
                .cookie_store(true)
                .user_agent("ShizouBridge/0.1")
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    async fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = Url::parse(&self.config.base_address().await)?;
        Ok(base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path).await?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ShizouApi for HttpApi {
    async fn login(&self, password: &str) -> Result<(), ApiError> {
        let url = self.url("api/Account/Login").await?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        Ok(())
    }

    async fn anime(&self, anime_id: i32) -> Result<AniDbAnime, ApiError> {
        self.get_json(&format!("api/AniDbAnimes/{anime_id}")).await
    }

    async fn episodes_by_anime(&self, anime_id: i32) -> Result<Vec<AniDbEpisode>, ApiError> {
        self.get_json(&format!("api/AniDbEpisodes/ByAniDbAnimeId/{anime_id}"))
            .await
    }

    async fn episodes_by_file(&self, file_id: i32) -> Result<Vec<AniDbEpisode>, ApiError> {
        self.get_json(&format!("api/AniDbEpisodes/ByAniDbFileId/{file_id}"))
            .await
    }

    async fn credits_by_anime(&self, anime_id: i32) -> Result<Vec<AniDbCredit>, ApiError> {
        self.get_json(&format!("api/AniDbCredits/ByAniDbAnimeId/{anime_id}"))
            .await
    }

    async fn ep_file_xrefs(&self, anime_id: i32) -> Result<Vec<EpisodeFileXref>, ApiError> {
        self.get_json(&format!(
            "api/AniDbEpisodeFileXrefs/ByAniDbAnimeId/{anime_id}"
        ))
        .await
    }

    async fn watched_states(&self) -> Result<Vec<FileWatchedState>, ApiError> {
        self.get_json("api/FileWatchedStates").await
    }

    async fn set_watched(&self, file_id: i32, watched: bool) -> Result<(), ApiError> {
        let mut url = self.url(&format!("api/FileWatchedStates/{file_id}")).await?;
        url.query_pairs_mut()
            .append_pair("watched", if watched { "true" } else { "false" });

        let response = self.client.put(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        Ok(())
    }

    async fn get_raw(&self, path_or_url: &str) -> Result<RawResponse, ApiError> {
        let url = match Url::parse(path_or_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.url(path_or_url).await?,
            Err(err) => return Err(err.into()),
        };

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(RawResponse {
            bytes,
            content_type,
        })
    }
}
