//! Host-facing types: the entity shapes providers populate, the lookup
//! inputs the host hands over, and the library seam consumed by sync and
//! housekeeping tasks. The host itself is out of scope; these are the
//! minimum types the bridge needs at that boundary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct SeriesLookup {
    pub path: Option<PathBuf>,
    pub provider_ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeLookup {
    pub path: Option<PathBuf>,
    pub provider_ids: HashMap<String, String>,
    pub series_provider_ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonLookup {
    pub index_number: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageLookup {
    pub provider_ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStatus {
    Continuing,
    Ended,
    Unreleased,
}

#[derive(Debug, Clone, Default)]
pub struct Series {
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub overview: Option<String>,
    pub home_page_url: Option<String>,
    pub production_year: Option<i32>,
    pub status: Option<SeriesStatus>,
    pub community_rating: Option<f32>,
    pub tags: Vec<String>,
    pub provider_ids: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Episode {
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub run_time: Option<Duration>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub production_year: Option<i32>,
    pub index_number: Option<i32>,
    pub index_number_end: Option<i32>,
    pub parent_index_number: Option<i32>,
    pub provider_ids: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Season {
    pub name: String,
    pub index_number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    Actor,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct PersonInfo {
    pub name: String,
    pub role: Option<String>,
    pub kind: PersonKind,
    pub sort_order: i32,
    pub provider_ids: HashMap<String, String>,
}

/// Provider output. An empty result means "no metadata available for this
/// request"; providers never surface failures past this point.
#[derive(Debug, Clone)]
pub struct MetadataResult<T> {
    pub item: Option<T>,
    pub people: Vec<PersonInfo>,
}

impl<T> MetadataResult<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            item: None,
            people: Vec::new(),
        }
    }

    #[must_use]
    pub const fn found(item: T) -> Self {
        Self {
            item: Some(item),
            people: Vec::new(),
        }
    }

    #[must_use]
    pub const fn has_metadata(&self) -> bool {
        self.item.is_some()
    }
}

impl<T> Default for MetadataResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone)]
pub struct RemoteImageInfo {
    pub provider_name: &'static str,
    pub url: String,
}

/// Why the host saved a user-data record. Only played-state changes are
/// pushed to the backend; programmatic updates are ignored to avoid
/// echoing the backend's own state back at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    TogglePlayed,
    PlaybackFinished,
    UpdateUserData,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct LibraryVideo {
    pub anidb_file_id: i32,
    pub played: bool,
}

#[derive(Debug, Clone)]
pub struct PersonRef {
    pub name: String,
}

/// The slice of the host library API the bridge consumes.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// Videos in the library that carry a Shizou file id.
    async fn videos_with_file_ids(&self) -> Result<Vec<LibraryVideo>>;

    /// Set the host-side played flag for a file.
    async fn set_played(&self, anidb_file_id: i32, played: bool) -> Result<()>;

    /// People entries with no image attached.
    async fn people_missing_images(&self) -> Result<Vec<PersonRef>>;

    /// Ask the host to fully refresh a person's metadata and images.
    async fn refresh_person(&self, person: &PersonRef) -> Result<()>;
}
