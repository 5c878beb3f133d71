use crate::error::Result;
use crate::indexer::{build_path_index, build_path_index_parallel, BuiltIndex};
use crate::options::IndexOptions;
use crate::path_index::{PathIndex, SourceDocument};
use crate::stats::IndexStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Request number handed out when a rebuild starts. Later requests get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RebuildTicket(u64);

impl RebuildTicket {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// The snapshot readers currently see.
#[derive(Debug, Clone, Default)]
pub struct PublishedIndex {
    /// Ticket generation of the rebuild that produced this index (0 = initial empty index).
    pub generation: u64,
    pub index: Arc<PathIndex>,
    pub stats: IndexStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    Published { generation: u64, stats: IndexStats },
    /// A newer rebuild had already been published; this result was dropped.
    Superseded { generation: u64, current: u64 },
}

impl RebuildOutcome {
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Owns the published [`PathIndex`] and replaces it wholesale on each successful rebuild.
///
/// Readers take an `Arc` snapshot and are never blocked by, nor exposed to, a rebuild in
/// progress. Results of older requests never replace results of newer ones.
#[derive(Clone)]
pub struct IndexPublisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    options: IndexOptions,
    next_ticket: AtomicU64,
    published_tx: watch::Sender<PublishedIndex>,
}

impl IndexPublisher {
    #[must_use]
    pub fn new(options: IndexOptions) -> Self {
        let (published_tx, _) = watch::channel(PublishedIndex::default());
        Self {
            inner: Arc::new(PublisherInner {
                options,
                next_ticket: AtomicU64::new(1),
                published_tx,
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<PathIndex> {
        Arc::clone(&self.inner.published_tx.borrow().index)
    }

    #[must_use]
    pub fn published(&self) -> PublishedIndex {
        self.inner.published_tx.borrow().clone()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.published_tx.borrow().generation
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PublishedIndex> {
        self.inner.published_tx.subscribe()
    }

    /// Reserve a ticket for a rebuild that is about to start.
    pub fn begin(&self) -> RebuildTicket {
        RebuildTicket(self.inner.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Publish `built` unless a rebuild with a newer ticket is already visible.
    pub fn publish(&self, ticket: RebuildTicket, built: BuiltIndex) -> RebuildOutcome {
        let BuiltIndex { index, stats } = built;
        let mut current = 0;
        let published = self.inner.published_tx.send_if_modified(|slot| {
            if ticket.0 <= slot.generation {
                current = slot.generation;
                return false;
            }
            *slot = PublishedIndex {
                generation: ticket.0,
                index: Arc::new(index),
                stats: stats.clone(),
            };
            true
        });

        if published {
            log::info!(
                "Published index #{}: {} paths from {} documents in {}ms",
                ticket.0,
                stats.paths,
                stats.documents,
                stats.time_ms
            );
            RebuildOutcome::Published {
                generation: ticket.0,
                stats,
            }
        } else {
            log::warn!(
                "Discarding rebuild #{} result: #{current} is already published",
                ticket.0
            );
            RebuildOutcome::Superseded {
                generation: ticket.0,
                current,
            }
        }
    }

    /// Rebuild from `documents` on worker tasks and publish the result.
    ///
    /// On a parse failure nothing is published and the previous snapshot stays visible.
    pub async fn rebuild(&self, documents: Vec<SourceDocument>) -> Result<RebuildOutcome> {
        let ticket = self.begin();
        match build_path_index_parallel(documents, &self.inner.options).await {
            Ok(built) => Ok(self.publish(ticket, built)),
            Err(err) => {
                log::warn!("Rebuild #{} failed, keeping previous index: {err}", ticket.0);
                Err(err)
            }
        }
    }

    /// Synchronous variant of [`IndexPublisher::rebuild`] for callers without a runtime.
    pub fn rebuild_blocking(&self, documents: &[SourceDocument]) -> Result<RebuildOutcome> {
        let ticket = self.begin();
        match build_path_index(documents, &self.inner.options) {
            Ok(built) => Ok(self.publish(ticket, built)),
            Err(err) => {
                log::warn!("Rebuild #{} failed, keeping previous index: {err}", ticket.0);
                Err(err)
            }
        }
    }
}

impl Default for IndexPublisher {
    fn default() -> Self {
        Self::new(IndexOptions::default())
    }
}
