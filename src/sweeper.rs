use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Periodically drop expired rate-limiter entries until shutdown is signaled.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    state.create_limiter.cleanup();
                    state.login_limiter.cleanup();
                    tracing::debug!("Rate limiter entries swept");
                }
                _ = shutdown.changed() => break,
            }
        }

        tracing::debug!("Rate limiter sweeper stopped");
    })
}
