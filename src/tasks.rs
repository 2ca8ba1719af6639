//! Housekeeping run on the host's schedule.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::host::LibraryClient;

/// Forces a metadata refresh for people that ended up without an image,
/// typically because their image was not available when the series was
/// first scanned.
pub struct MissingPeopleImagesTask {
    library: Arc<dyn LibraryClient>,
}

impl MissingPeopleImagesTask {
    pub const NAME: &'static str = "Get Missing People Images";

    #[must_use]
    pub fn new(library: Arc<dyn LibraryClient>) -> Self {
        Self { library }
    }

    pub async fn run(&self, mut progress: impl FnMut(f64) + Send) -> Result<()> {
        let people = self.library.people_missing_images().await?;
        let total = people.len();
        info!(count = total, "Refreshing people with missing images");

        for (idx, person) in people.iter().enumerate() {
            if let Err(err) = self.library.refresh_person(person).await {
                warn!(person = %person.name, error = %err, "Failed to refresh person");
            }
            #[allow(clippy::cast_precision_loss)]
            progress((idx + 1) as f64 / total as f64);
        }
        Ok(())
    }
}
