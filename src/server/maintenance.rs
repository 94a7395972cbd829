use std::sync::Arc;

use super::GameServer;

impl GameServer {
    /// Periodic reaper: rooms are memory-only and die of old age. Runs for
    /// the life of the process; spawned once at startup.
    pub async fn cleanup_task(self: Arc<Self>) {
        let interval = std::time::Duration::from_secs(self.tuning().room_cleanup_interval_secs);
        let max_age = chrono::Duration::seconds(
            i64::try_from(self.tuning().max_room_age_secs).unwrap_or(i64::MAX),
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let expired = self.registry().cleanup_older_than(max_age).await;
            if expired.is_empty() {
                continue;
            }

            tracing::info!(count = expired.len(), "Reaped expired rooms");
            for (code, room) in expired {
                room.lock().await.cancel_timer();
                self.messenger().drop_room(&code);
            }
        }
    }
}
