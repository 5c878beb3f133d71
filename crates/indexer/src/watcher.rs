use crate::{IndexPublisher, IndexStats, IndexerError, RebuildOutcome, Result, SourceDocument};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time;

const DEFAULT_REASON: &str = "submit";

#[derive(Debug, Clone)]
pub struct IndexUpdate {
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub stats: Option<IndexStats>,
    pub success: bool,
    /// Set when the rebuild finished but a newer index was already published.
    pub superseded: bool,
    pub generation: Option<u64>,
    pub reason: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexerHealth {
    pub last_success: Option<SystemTime>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_duration_ms: Option<u64>,
    pub pending_submissions: usize,
    pub indexing: bool,
    pub p95_duration_ms: Option<u64>,
    pub last_path_count: Option<usize>,
}

impl IndexerHealth {
    const fn initial() -> Self {
        Self {
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
            last_duration_ms: None,
            pending_submissions: 0,
            indexing: false,
            p95_duration_ms: None,
            last_path_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamingIndexerConfig {
    pub debounce: Duration,
    pub max_batch_wait: Duration,
}

impl Default for StreamingIndexerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            max_batch_wait: Duration::from_secs(2),
        }
    }
}

/// Debounced rebuild loop in front of an [`IndexPublisher`].
///
/// Rapid submissions collapse into one rebuild of the most recent document set.
#[derive(Clone)]
pub struct StreamingIndexer {
    inner: Arc<StreamingIndexerInner>,
}

struct StreamingIndexerInner {
    command_tx: mpsc::Sender<WatcherCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<IndexerHealth>,
}

enum WatcherCommand {
    Submit {
        documents: Vec<SourceDocument>,
        reason: String,
    },
    Flush {
        reason: String,
    },
    Shutdown,
}

impl StreamingIndexer {
    /// Spawn the rebuild loop on the current tokio runtime.
    #[must_use]
    pub fn start(publisher: IndexPublisher, config: StreamingIndexerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (health_tx, _) = watch::channel(IndexerHealth::initial());
        let (update_tx, _) = broadcast::channel(32);

        spawn_index_loop(
            publisher,
            config,
            command_rx,
            update_tx.clone(),
            health_tx.clone(),
        );

        Self {
            inner: Arc::new(StreamingIndexerInner {
                command_tx,
                update_tx,
                health_tx,
            }),
        }
    }

    /// Queue a rebuild of `documents`, replacing any not yet started submission.
    pub async fn submit(
        &self,
        documents: Vec<SourceDocument>,
        reason: impl Into<String>,
    ) -> Result<()> {
        self.send(WatcherCommand::Submit {
            documents,
            reason: reason.into(),
        })
        .await
    }

    /// Run the pending submission now instead of waiting for the debounce deadline.
    pub async fn flush(&self, reason: impl Into<String>) -> Result<()> {
        self.send(WatcherCommand::Flush {
            reason: reason.into(),
        })
        .await
    }

    async fn send(&self, command: WatcherCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|e| IndexerError::Other(format!("failed to send command: {e}")))
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<IndexUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn health_snapshot(&self) -> IndexerHealth {
        self.inner.health_tx.borrow().clone()
    }

    #[must_use]
    pub fn health_stream(&self) -> watch::Receiver<IndexerHealth> {
        self.inner.health_tx.subscribe()
    }
}

impl Drop for StreamingIndexer {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(WatcherCommand::Shutdown);
        }
    }
}

fn spawn_index_loop(
    publisher: IndexPublisher,
    config: StreamingIndexerConfig,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<IndexerHealth>,
) {
    tokio::spawn(async move {
        let mut state = DebounceState::new(config.debounce, config.max_batch_wait);
        let mut health = IndexerHealth::initial();
        let mut durations = RebuildDurations::default();

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(WatcherCommand::Submit { documents, reason }) => {
                            state.record_submission(documents, reason);
                            health.pending_submissions = state.pending();
                            health_tx.send_replace(health.clone());
                        }
                        Some(WatcherCommand::Flush { reason }) => {
                            state.force_run(reason);
                        }
                        Some(WatcherCommand::Shutdown) | None => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if state.should_run() && next_deadline.is_some() => {
                    let Some((documents, reason)) = state.take() else {
                        continue;
                    };
                    health.indexing = true;
                    health_tx.send_replace(health.clone());

                    let started = Instant::now();
                    let result = publisher.rebuild(documents).await;
                    #[allow(clippy::cast_possible_truncation)]
                    let duration = started.elapsed().as_millis() as u64;

                    health.indexing = false;
                    health.pending_submissions = state.pending();
                    health.last_duration_ms = Some(duration);

                    let update = match result {
                        Ok(outcome) => {
                            health.last_success = Some(SystemTime::now());
                            health.last_error = None;
                            health.consecutive_failures = 0;
                            durations.push(duration);
                            health.p95_duration_ms = durations.p95();
                            success_update(outcome, duration, reason, &mut health)
                        }
                        Err(err) => {
                            error!("Streaming rebuild failure ({reason}): {err}");
                            health.last_error = Some(err.to_string());
                            health.consecutive_failures += 1;
                            IndexUpdate {
                                completed_at: SystemTime::now(),
                                duration_ms: duration,
                                stats: None,
                                success: false,
                                superseded: false,
                                generation: None,
                                reason,
                                error: Some(err.to_string()),
                            }
                        }
                    };

                    health_tx.send_replace(health.clone());
                    let _ = update_tx.send(update);
                }
            }
        }

        info!("Streaming indexer stopped");
    });
}

fn success_update(
    outcome: RebuildOutcome,
    duration: u64,
    reason: String,
    health: &mut IndexerHealth,
) -> IndexUpdate {
    match outcome {
        RebuildOutcome::Published { generation, stats } => {
            info!("Streaming rebuild #{generation} finished in {duration}ms ({reason})");
            health.last_path_count = Some(stats.paths);
            IndexUpdate {
                completed_at: SystemTime::now(),
                duration_ms: duration,
                stats: Some(stats),
                success: true,
                superseded: false,
                generation: Some(generation),
                reason,
                error: None,
            }
        }
        RebuildOutcome::Superseded { generation, current } => {
            warn!("Streaming rebuild #{generation} superseded by #{current}");
            IndexUpdate {
                completed_at: SystemTime::now(),
                duration_ms: duration,
                stats: None,
                success: true,
                superseded: true,
                generation: Some(generation),
                reason,
                error: None,
            }
        }
    }
}

struct DebounceState {
    debounce: Duration,
    max_batch: Duration,
    documents: Option<Vec<SourceDocument>>,
    pending: usize,
    last_event: Option<time::Instant>,
    first_event: Option<time::Instant>,
    reason: Option<String>,
    force_immediate: bool,
}

impl DebounceState {
    const fn new(debounce: Duration, max_batch: Duration) -> Self {
        Self {
            debounce,
            max_batch,
            documents: None,
            pending: 0,
            last_event: None,
            first_event: None,
            reason: None,
            force_immediate: false,
        }
    }

    fn record_submission(&mut self, documents: Vec<SourceDocument>, reason: String) {
        self.documents = Some(documents);
        self.pending += 1;
        self.reason = Some(reason);
        let now = time::Instant::now();
        self.last_event = Some(now);
        self.first_event.get_or_insert(now);
    }

    fn force_run(&mut self, reason: String) {
        if self.documents.is_some() {
            self.reason = Some(reason);
            self.force_immediate = true;
        }
    }

    const fn pending(&self) -> usize {
        self.pending
    }

    const fn should_run(&self) -> bool {
        self.documents.is_some()
    }

    /// Quiet period after the latest submission, capped at `max_batch` after the first one.
    fn next_deadline(&self) -> Option<time::Instant> {
        self.documents.as_ref()?;
        if self.force_immediate {
            return Some(time::Instant::now());
        }
        let quiet = self.last_event? + self.debounce;
        let due = self
            .first_event
            .map_or(quiet, |first| quiet.min(first + self.max_batch));
        Some(due)
    }

    /// Hand out the latest submission and reset the batch.
    fn take(&mut self) -> Option<(Vec<SourceDocument>, String)> {
        let documents = self.documents.take()?;
        let reason = self
            .reason
            .take()
            .unwrap_or_else(|| DEFAULT_REASON.to_string());
        self.pending = 0;
        self.last_event = None;
        self.first_event = None;
        self.force_immediate = false;
        Some((documents, reason))
    }
}

/// Durations of the most recent successful rebuilds.
#[derive(Default)]
struct RebuildDurations {
    samples: VecDeque<u64>,
}

impl RebuildDurations {
    const WINDOW: usize = 20;

    fn push(&mut self, duration_ms: u64) {
        if self.samples.len() == Self::WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(duration_ms);
    }

    /// Nearest-rank 95th percentile.
    fn p95(&self) -> Option<u64> {
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let rank = (sorted.len() * 95).div_ceil(100);
        sorted.get(rank.checked_sub(1)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(text: &str) -> Vec<SourceDocument> {
        vec![SourceDocument::new("data.json", text)]
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_submissions_cannot_postpone_past_batch_cap() {
        let mut state = DebounceState::new(Duration::from_millis(300), Duration::from_secs(1));
        assert!(state.next_deadline().is_none());

        let first = time::Instant::now();
        state.record_submission(docs(r#"{"draft": 0}"#), "keystroke".to_string());
        assert_eq!(state.next_deadline(), Some(first + Duration::from_millis(300)));

        for i in 1..=5 {
            time::advance(Duration::from_millis(200)).await;
            state.record_submission(docs(&format!(r#"{{"draft": {i}}}"#)), "keystroke".to_string());
        }
        // quiet period would end at 1300ms; the batch cap wins
        assert_eq!(state.next_deadline(), Some(first + Duration::from_secs(1)));
        assert_eq!(state.pending(), 6);
    }

    #[test]
    fn later_submission_replaces_pending_documents() {
        let mut state = DebounceState::new(Duration::from_millis(100), Duration::from_secs(1));
        state.record_submission(docs(r#"{"old": 1}"#), "first".to_string());
        state.record_submission(docs(r#"{"new": 1}"#), "second".to_string());
        assert_eq!(state.pending(), 2);

        let (documents, reason) = state.take().unwrap();
        assert_eq!(documents[0].text, r#"{"new": 1}"#);
        assert_eq!(reason, "second");
        assert!(!state.should_run());
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn save_before_any_edit_schedules_nothing() {
        let mut state = DebounceState::new(Duration::from_secs(5), Duration::from_secs(10));
        state.force_run("save".to_string());
        assert!(state.take().is_none());

        state.record_submission(docs("{}"), "edit".to_string());
        state.force_run("save".to_string());
        assert_eq!(state.take().map(|(_, reason)| reason).as_deref(), Some("save"));
    }

    #[test]
    fn p95_uses_recent_window() {
        let mut durations = RebuildDurations::default();
        assert_eq!(durations.p95(), None);
        durations.push(7);
        assert_eq!(durations.p95(), Some(7));

        for ms in 1..=40 {
            durations.push(ms);
        }
        // only 21..=40 remain
        assert_eq!(durations.p95(), Some(39));
    }
}
