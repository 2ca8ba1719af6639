use crate::host::{MetadataResult, Season, SeasonLookup};

/// AniDB has no season structure; the bridge maps everything onto two
/// fixed seasons: 1 for regular episodes, 0 for specials.
pub struct SeasonProvider;

impl SeasonProvider {
    #[must_use]
    pub fn get_metadata(lookup: &SeasonLookup) -> MetadataResult<Season> {
        let index_number = i32::from(lookup.index_number != Some(0));
        let name = if index_number == 0 {
            "Specials"
        } else {
            "Episodes"
        };

        MetadataResult::found(Season {
            name: name.to_string(),
            index_number,
        })
    }
}
