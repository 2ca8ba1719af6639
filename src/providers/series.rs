use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::warn;

use crate::client::ClientManager;
use crate::host::{MetadataResult, PersonInfo, PersonKind, Series, SeriesLookup, SeriesStatus};
use crate::ids;
use crate::models::AniDbCredit;
use crate::providers::{anidb_links_to_markdown, jst_to_utc, numeric_provider_id};

pub struct SeriesProvider {
    manager: Arc<ClientManager>,
}

impl SeriesProvider {
    #[must_use]
    pub const fn new(manager: Arc<ClientManager>) -> Self {
        Self { manager }
    }

    pub async fn get_metadata(&self, lookup: &SeriesLookup) -> MetadataResult<Series> {
        let anime_id = numeric_provider_id(&lookup.provider_ids, ids::ANIME_PROVIDER_ID)
            .or_else(|| {
                lookup
                    .path
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .and_then(|name| ids::anidb_id_from_name(&name.to_string_lossy()))
            });
        let Some(anime_id) = anime_id else {
            return MetadataResult::empty();
        };

        let anime = match self.manager.anime(anime_id).await {
            Ok(Some(anime)) => anime,
            Ok(None) => return MetadataResult::empty(),
            Err(err) => {
                warn!(anime_id, error = %err, "Failed to fetch anime, returning no metadata");
                return MetadataResult::empty();
            }
        };

        let premiere = anime.air_date.map(jst_to_utc);
        let end = anime.end_date.map(jst_to_utc);

        let series = Series {
            name: anime.title_transcription.clone(),
            original_title: anime.title_original.clone(),
            premiere_date: premiere,
            end_date: end,
            overview: anime.description.as_deref().map(anidb_links_to_markdown),
            home_page_url: Some(format!("https://anidb.net/anime/{anime_id}")),
            production_year: premiere.map(|date| date.year()),
            status: series_status(premiere, end, Utc::now()),
            community_rating: anime.rating,
            tags: anime.tags.clone(),
            provider_ids: HashMap::from([(
                ids::ANIME_PROVIDER_ID.to_string(),
                anime_id.to_string(),
            )]),
        };

        let mut result = MetadataResult::found(series);
        match self.manager.credits(anime_id).await {
            Ok(Some(credits)) => {
                result.people = credits.iter().map(person_from_credit).collect();
            }
            Ok(None) => {}
            Err(err) => {
                // Series metadata is still worth returning without people.
                warn!(anime_id, error = %err, "Failed to fetch credits");
            }
        }

        result
    }
}

fn series_status(
    premiere: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<SeriesStatus> {
    match (premiere, end) {
        (Some(air), _) if air > now => Some(SeriesStatus::Unreleased),
        (_, Some(ended)) if ended <= now => Some(SeriesStatus::Ended),
        (Some(air), _) if air <= now => Some(SeriesStatus::Continuing),
        _ => None,
    }
}

/// Map a credit to a host person. Voice roles (those with a character
/// attached) sort ahead of staff roles, ordered by prominence.
fn person_from_credit(credit: &AniDbCredit) -> PersonInfo {
    let role = credit.role.to_lowercase();
    let (kind, sort_order) = if credit.anidb_character_id.is_some() {
        let order = if role.contains("main") {
            0
        } else if role.contains("secondary") {
            1
        } else if role.contains("appears") {
            2
        } else {
            3
        };
        (PersonKind::Actor, order)
    } else {
        let order = if role.contains("original work") {
            4
        } else if role.contains("direction") {
            5
        } else if role.contains("storyboard") || role.contains("series composition") {
            6
        } else if role.contains("character design") {
            8
        } else {
            i32::MAX
        };
        (PersonKind::Unknown, order)
    };

    PersonInfo {
        name: credit.anidb_creator.name.clone(),
        role: credit
            .anidb_character
            .as_ref()
            .map_or_else(|| Some(credit.role.clone()), |ch| Some(ch.name.clone())),
        kind,
        sort_order,
        provider_ids: HashMap::from([(
            ids::CREATOR_PROVIDER_ID.to_string(),
            credit.anidb_creator.id.to_string(),
        )]),
    }
}
