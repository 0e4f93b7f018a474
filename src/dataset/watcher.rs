use crate::state::{AppState, ReloadOutcome};
use std::sync::Arc;

/// Polls the dataset file and swaps in new content when its fingerprint
/// changes. A failed load keeps the current dataset in service.
pub async fn run_dataset_watcher(state: Arc<AppState>) {
    let period = state.config.reload_interval_secs;
    if period == 0 {
        tracing::info!("dataset watcher disabled");
        return;
    }

    tracing::info!(
        path = %state.config.data_path.display(),
        interval_secs = period,
        "dataset watcher started"
    );

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(period));
    // The first tick fires immediately; the startup load already covered it.
    interval.tick().await;
    let mut consecutive_errors: u32 = 0;

    loop {
        interval.tick().await;

        match state.reload(false).await {
            Ok(ReloadOutcome::Unchanged(_)) => {
                consecutive_errors = 0;
            }
            Ok(ReloadOutcome::Replaced(dataset)) => {
                consecutive_errors = 0;
                tracing::info!(
                    generation = dataset.version.generation,
                    "dataset file changed, reloaded"
                );
            }
            Err(e) => {
                consecutive_errors += 1;
                tracing::warn!(
                    error = %e,
                    consecutive = consecutive_errors,
                    "dataset reload failed, keeping current version"
                );

                // Back off on repeated failures (cap at 30s)
                if consecutive_errors > 3 {
                    let backoff = std::cmp::min(consecutive_errors * 2, 30);
                    tokio::time::sleep(tokio::time::Duration::from_secs(backoff as u64)).await;
                }
            }
        }
    }
}
