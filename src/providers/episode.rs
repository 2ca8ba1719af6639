use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tracing::warn;

use crate::client::ClientManager;
use crate::host::{Episode, EpisodeLookup, MetadataResult};
use crate::ids;
use crate::models::{AniDbEpisode, EpisodeType};
use crate::providers::{anidb_links_to_markdown, jst_to_utc, numeric_provider_id};

pub struct EpisodeProvider {
    manager: Arc<ClientManager>,
}

impl EpisodeProvider {
    #[must_use]
    pub const fn new(manager: Arc<ClientManager>) -> Self {
        Self { manager }
    }

    pub async fn get_metadata(&self, lookup: &EpisodeLookup) -> MetadataResult<Episode> {
        let file_id = numeric_provider_id(&lookup.provider_ids, ids::FILE_PROVIDER_ID)
            .or_else(|| {
                lookup
                    .path
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .and_then(|name| ids::anidb_id_from_name(&name.to_string_lossy()))
            });
        let anime_id =
            numeric_provider_id(&lookup.series_provider_ids, ids::ANIME_PROVIDER_ID);
        let (Some(file_id), Some(anime_id)) = (file_id, anime_id) else {
            return MetadataResult::empty();
        };

        let mut episodes = match self.manager.episodes_for_file(anime_id, file_id).await {
            Ok(episodes) => episodes,
            Err(err) => {
                warn!(anime_id, file_id, error = %err, "Failed to resolve episodes for file");
                return MetadataResult::empty();
            }
        };
        if episodes.is_empty() {
            return MetadataResult::empty();
        }
        episodes.sort_by_key(episode_ordinal);

        let episode = &episodes[0];
        let span_end = span_end(&episodes);

        let name = {
            let titles: Vec<&str> = episodes
                .iter()
                .filter_map(|ep| ep.title_english.as_deref())
                .collect();
            if titles.is_empty() {
                None
            } else {
                Some(titles.join(" / "))
            }
        };

        let premiere = episode.air_date.map(jst_to_utc);

        let item = Episode {
            name,
            original_title: episode.title_original.clone(),
            overview: episode.summary.as_deref().map(anidb_links_to_markdown),
            run_time: episode
                .duration_minutes
                .and_then(|minutes| u64::try_from(minutes).ok())
                .map(|minutes| Duration::from_secs(minutes * 60)),
            premiere_date: premiere,
            production_year: premiere.map(|date| date.year()),
            index_number: Some(episode_ordinal(episode)),
            index_number_end: (span_end.id != episode.id).then(|| episode_ordinal(span_end)),
            // Regular episodes live in season 1, everything else in Specials.
            parent_index_number: Some(i32::from(episode.episode_type == EpisodeType::Episode)),
            provider_ids: HashMap::from([(
                ids::FILE_PROVIDER_ID.to_string(),
                file_id.to_string(),
            )]),
        };

        MetadataResult::found(item)
    }
}

/// Type-major, number-minor ordinal. The exact constant is cosmetic; what
/// matters is that episode kinds never interleave.
pub(crate) fn episode_ordinal(ep: &AniDbEpisode) -> i32 {
    ep.episode_type.sort_group() * 10_000 + ep.number
}

/// End of the contiguous run of same-type, consecutively numbered episodes
/// starting at the first entry. `episodes` must already be ordinal-sorted.
fn span_end(episodes: &[AniDbEpisode]) -> &AniDbEpisode {
    let first = &episodes[0];
    let mut seen = HashSet::new();
    let mut expected = first.number;
    let mut last = first;

    for ep in episodes {
        if ep.episode_type != first.episode_type || !seen.insert(ep.number) {
            continue;
        }
        if ep.number == expected {
            last = ep;
            expected += 1;
        } else {
            break;
        }
    }
    last
}
