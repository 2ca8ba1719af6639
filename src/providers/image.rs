use std::sync::Arc;

use tracing::warn;

use crate::client::api::RawResponse;
use crate::client::cache::ImageKind;
use crate::client::ClientManager;
use crate::error::ApiError;
use crate::host::{ImageLookup, RemoteImageInfo};
use crate::ids;
use crate::providers::{numeric_provider_id, PROVIDER_NAME};

pub struct ImageProvider {
    manager: Arc<ClientManager>,
}

impl ImageProvider {
    #[must_use]
    pub const fn new(manager: Arc<ClientManager>) -> Self {
        Self { manager }
    }

    /// Remote image references for an item, most specific id first:
    /// episode file, then anime, then creator.
    pub async fn get_images(&self, lookup: &ImageLookup) -> Vec<RemoteImageInfo> {
        if let Some(file_id) = numeric_provider_id(&lookup.provider_ids, ids::FILE_PROVIDER_ID) {
            match self.manager.episodes_by_file(file_id).await {
                Ok(Some(episodes)) => {
                    if let Some(episode) = episodes.first() {
                        return vec![Self::image_info(ImageKind::EpisodeThumbnail, episode.id)];
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(file_id, error = %err, "Failed to look up episodes for thumbnail");
                    return Vec::new();
                }
            }
        }

        if let Some(anime_id) = numeric_provider_id(&lookup.provider_ids, ids::ANIME_PROVIDER_ID) {
            return vec![Self::image_info(ImageKind::AnimePoster, anime_id)];
        }

        if let Some(creator_id) =
            numeric_provider_id(&lookup.provider_ids, ids::CREATOR_PROVIDER_ID)
        {
            return vec![Self::image_info(ImageKind::CreatorImage, creator_id)];
        }

        Vec::new()
    }

    /// Download an image by the URL previously handed out in
    /// [`Self::get_images`]. Uncached; the host persists what it fetches.
    pub async fn get_image_response(&self, url: &str) -> Result<RawResponse, ApiError> {
        self.manager.get_raw_url(url).await
    }

    /// Cached image bytes, for callers that hit the same image repeatedly.
    pub async fn get_image(
        &self,
        kind: ImageKind,
        id: i32,
    ) -> Result<Option<Arc<Vec<u8>>>, ApiError> {
        self.manager.image(kind, id).await
    }

    fn image_info(kind: ImageKind, id: i32) -> RemoteImageInfo {
        RemoteImageInfo {
            provider_name: PROVIDER_NAME,
            url: format!("api/Images/{}/{id}", kind.path_segment()),
        }
    }
}
