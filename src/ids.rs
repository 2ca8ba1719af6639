//! Provider-id keys and AniDB id extraction from file names.

use std::sync::OnceLock;

use regex::Regex;

/// Keys under which this provider stores external ids on host items.
pub const ANIME_PROVIDER_ID: &str = "Shizou";
pub const FILE_PROVIDER_ID: &str = "ShizouEp";
pub const CREATOR_PROVIDER_ID: &str = "ShizouCreator";

fn anidb_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[anidb-([0-9]+)\]").expect("static regex"))
}

/// Extract an AniDB id from a `[anidb-12345]` tag embedded in a file or
/// directory name. Returns `None` when no tag is present or the number
/// does not fit an `i32`.
#[must_use]
pub fn anidb_id_from_name(name: &str) -> Option<i32> {
    anidb_tag_regex()
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}
