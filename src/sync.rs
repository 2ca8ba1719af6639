//! Watched-state synchronization between the backend and the host library.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::client::ClientManager;
use crate::host::{LibraryClient, SaveReason};

/// Cap on simultaneous outbound watched-state pushes.
const MAX_CONCURRENT_UPDATES: usize = 10;

pub struct PlayedStateSync {
    manager: Arc<ClientManager>,
    library: Arc<dyn LibraryClient>,
    throttle: Arc<Semaphore>,
}

impl PlayedStateSync {
    #[must_use]
    pub fn new(manager: Arc<ClientManager>, library: Arc<dyn LibraryClient>) -> Self {
        Self {
            manager,
            library,
            throttle: Arc::new(Semaphore::new(MAX_CONCURRENT_UPDATES)),
        }
    }

    /// Full reconciliation sweep: host played flags follow the backend.
    pub async fn sync_all(&self, mut progress: impl FnMut(f64) + Send) -> Result<()> {
        info!("Starting watched state sync");
        let states: HashMap<i32, bool> = self
            .manager
            .watched_states()
            .await?
            .into_iter()
            .map(|state| (state.anidb_file_id, state.watched))
            .collect();

        let videos = self.library.videos_with_file_ids().await?;
        let total = videos.len();
        for (idx, video) in videos.into_iter().enumerate() {
            if let Some(&watched) = states.get(&video.anidb_file_id) {
                if video.played != watched {
                    info!(
                        file_id = video.anidb_file_id,
                        host = video.played,
                        backend = watched,
                        "Found out of sync played state"
                    );
                    self.library.set_played(video.anidb_file_id, watched).await?;
                }
            }
            #[allow(clippy::cast_precision_loss)]
            progress((idx + 1) as f64 / total as f64);
        }
        Ok(())
    }

    /// Entry point for host save events. Relevant played-state changes are
    /// pushed to the backend on a spawned task, at most
    /// [`MAX_CONCURRENT_UPDATES`] at a time; failures are logged and
    /// swallowed, since an escaped error would kill the host's save path.
    pub fn dispatch_played_change(
        self: &Arc<Self>,
        reason: SaveReason,
        anidb_file_id: i32,
        played: bool,
    ) {
        if !matches!(
            reason,
            SaveReason::TogglePlayed | SaveReason::PlaybackFinished
        ) {
            return;
        }

        let sync = Arc::clone(self);
        tokio::spawn(async move {
            let Ok(_permit) = sync.throttle.acquire().await else {
                return;
            };
            info!(file_id = anidb_file_id, played, "Updating backend watched state");
            if let Err(err) = sync.manager.set_watched(anidb_file_id, played).await {
                error!(
                    file_id = anidb_file_id,
                    played,
                    error = %err,
                    "Failed to update backend watched state"
                );
            }
        });
    }
}
