//! Provider adapters mapping backend payloads onto host entities.
//!
//! Every provider honors the same contract: any unresolved failure is
//! logged and degraded to an empty result, never propagated into the
//! host's refresh pipeline.

pub mod episode;
pub mod image;
pub mod season;
pub mod series;

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

pub const PROVIDER_NAME: &str = "Shizou";

/// AniDB timestamps are local broadcast times, JST.
pub(crate) fn jst_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    let jst = FixedOffset::east_opt(9 * 3600).expect("valid constant offset");
    match jst.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            dt.with_timezone(&Utc)
        }
        // Fixed offsets have no gaps; keep the naive value as UTC if it
        // somehow fails.
        chrono::LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

fn anidb_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<url>https?://anidb\.net/[^\s\[\]]+)\s+\[(?P<label>[^\]]+)\]")
            .expect("static regex")
    })
}

/// AniDB summaries embed links as `https://anidb.net/ch123 [Name]`;
/// rewrite them to markdown so the host renders them as links.
pub(crate) fn anidb_links_to_markdown(text: &str) -> String {
    anidb_link_regex()
        .replace_all(text, "[$label]($url)")
        .into_owned()
}

/// Numeric provider id stored on a host item, if present and parseable.
pub(crate) fn numeric_provider_id(ids: &HashMap<String, String>, key: &str) -> Option<i32> {
    ids.get(key).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn rewrites_anidb_links() {
        let summary = "Based on the manga by https://anidb.net/cr1234 [Some Author].";
        assert_eq!(
            anidb_links_to_markdown(summary),
            "Based on the manga by [Some Author](https://anidb.net/cr1234)."
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        let summary = "No links here, just [brackets] and text.";
        assert_eq!(anidb_links_to_markdown(summary), summary);
    }

    #[test]
    fn rewrites_multiple_links() {
        let summary = "http://anidb.net/ch1 [A] meets http://anidb.net/ch2 [B].";
        assert_eq!(
            anidb_links_to_markdown(summary),
            "[A](http://anidb.net/ch1) meets [B](http://anidb.net/ch2)."
        );
    }

    #[test]
    fn converts_jst_to_utc() {
        let local = NaiveDateTime::parse_from_str("2024-04-18 00:30:00", "%Y-%m-%d %H:%M:%S")
            .expect("valid datetime");
        let utc = jst_to_utc(local);
        // Midnight-thirty JST is a quarter past three the previous UTC day.
        assert_eq!(utc.hour(), 15);
        assert_eq!(utc.minute(), 30);
    }
}
