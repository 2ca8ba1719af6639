//! Payload shapes returned by the Shizou backend.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// AniDB episode kind. Ordering between kinds goes through
/// [`EpisodeType::sort_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeType {
    Episode,
    Credits,
    Special,
    Trailer,
    Parody,
    Other,
}

impl EpisodeType {
    /// Type-major ordering group: regular episodes first, then the rest.
    #[must_use]
    pub const fn sort_group(self) -> i32 {
        match self {
            Self::Episode => 0,
            Self::Other => 1,
            Self::Special => 2,
            Self::Credits => 3,
            Self::Trailer => 4,
            Self::Parody => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniDbAnime {
    pub id: i32,

    pub title_transcription: Option<String>,

    pub title_original: Option<String>,

    /// Local broadcast time, JST.
    pub air_date: Option<NaiveDateTime>,

    pub end_date: Option<NaiveDateTime>,

    pub description: Option<String>,

    pub rating: Option<f32>,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniDbEpisode {
    pub id: i32,

    pub number: i32,

    pub episode_type: EpisodeType,

    pub title_english: Option<String>,

    pub title_original: Option<String>,

    /// Local broadcast time, JST.
    pub air_date: Option<NaiveDateTime>,

    pub duration_minutes: Option<i32>,

    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniDbCreator {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniDbCharacter {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniDbCredit {
    pub role: String,

    #[serde(rename = "aniDbCreator")]
    pub anidb_creator: AniDbCreator,

    #[serde(rename = "aniDbCharacter")]
    pub anidb_character: Option<AniDbCharacter>,

    #[serde(rename = "aniDbCharacterId")]
    pub anidb_character_id: Option<i32>,
}

/// Cross-reference between an AniDB file and the episodes it spans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeFileXref {
    #[serde(rename = "aniDbFileId")]
    pub anidb_file_id: i32,

    #[serde(rename = "aniDbEpisodeId")]
    pub anidb_episode_id: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWatchedState {
    #[serde(rename = "aniDbFileId")]
    pub anidb_file_id: i32,

    pub watched: bool,
}
