//! Sync sessions: fetch every feed of a listing, derive its events and
//! reconcile them, one transaction per listing.

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use futures::future::join_all;
use tracing_futures::Instrument;
use turnover_core::config::SyncConfig;
use turnover_db::db::DbProvider;
use turnover_db::db::enums::{SyncScope, SyncStatus};
use turnover_db::db::query::{event, feed, listing, sync};
use turnover_db::db::transaction::with_transaction;
use turnover_db::model::feed::IcalFeed;
use turnover_db::model::sync::{NewSyncSession, SyncCounters, SyncSession};
use turnover_rfc::ical::{Booking, FeedWindow};
use uuid::Uuid;

use crate::derive::{FeedBatch, derive_events};
use crate::error::{ServiceError, ServiceResult};
use crate::feed::{FeedResult, FeedSource, fetch_bookings, fetch_window, normalize_url};
use crate::reconcile::execute::{ExecuteContext, apply_plan};
use crate::reconcile::{PlanContext, plan_listing};

pub mod lock;
pub mod log;
pub mod schedule;

use lock::ListingLocks;
use log::{LogScope, SyncLogDetails};

/// What happened to one listing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOutcome {
    Synced(SyncCounters),
    /// Another sync of the listing was in flight.
    Skipped,
}

/// Runs sync sessions against a feed source.
pub struct SyncEngine {
    source: Arc<dyn FeedSource>,
    locks: ListingLocks,
    config: SyncConfig,
    default_checkout_time: NaiveTime,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("locks", &self.locks)
            .field("batch_size", &self.config.batch_size)
            .field("default_checkout_time", &self.default_checkout_time)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// ## Summary
    /// Creates an engine reading feeds from `source`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for a zero batch size or an unparsable
    /// default checkout time.
    pub fn new(source: Arc<dyn FeedSource>, config: &SyncConfig) -> ServiceResult<Self> {
        if config.batch_size == 0 {
            return Err(ServiceError::InvalidConfiguration(
                "sync.batch_size must be at least 1".to_string(),
            ));
        }
        let default_checkout_time = config
            .default_checkout_time()
            .map_err(|e| ServiceError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            source,
            locks: ListingLocks::new(),
            config: config.clone(),
            default_checkout_time,
        })
    }

    #[must_use]
    pub const fn locks(&self) -> &ListingLocks {
        &self.locks
    }

    /// ## Summary
    /// Syncs every active listing, `batch_size` listings at a time.
    ///
    /// A failing listing is logged as `listing_failed`, counted in the
    /// session's `errors` and does not stop the others. The session is
    /// `failed` only when the run itself could not proceed.
    ///
    /// ## Errors
    /// Returns an error if the session row cannot be created or closed.
    #[tracing::instrument(skip_all)]
    pub async fn sync_all(&self, db: &dyn DbProvider) -> ServiceResult<SyncSession> {
        let session = Self::open_session(db, SyncScope::All, None).await?;
        tracing::info!(session_id = %session.id, "Sync of all listings started");

        let result = self.run_all(db, session.id).await;
        Self::close_session(db, session.id, result).await
    }

    /// ## Summary
    /// Syncs a single listing in its own session.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown listing, `Conflict` for an inactive
    /// one, or an error if the session row cannot be created or closed. A
    /// failure while syncing the listing is recorded on the session instead.
    #[tracing::instrument(skip(self, db))]
    pub async fn sync_listing(
        &self,
        db: &dyn DbProvider,
        listing_id: Uuid,
    ) -> ServiceResult<SyncSession> {
        {
            let mut conn = db.get_connection().await?;
            let found = listing::get(&mut conn, listing_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("listing {listing_id}")))?;
            if !found.is_active {
                return Err(ServiceError::Conflict(format!(
                    "listing {listing_id} is inactive"
                )));
            }
        }

        let session = Self::open_session(db, SyncScope::Single, Some(listing_id)).await?;
        let result = match self.sync_one(db, session.id, listing_id).await {
            Ok(ListingOutcome::Synced(counters)) => {
                tracing::debug!(?counters, "Listing reconciled");
                Ok(())
            }
            Ok(ListingOutcome::Skipped) => Ok(()),
            Err(e) => {
                Self::record_listing_failure(db, session.id, listing_id, &e).await?;
                Err(e)
            }
        };
        Self::close_session(db, session.id, result).await
    }

    async fn open_session(
        db: &dyn DbProvider,
        scope: SyncScope,
        listing_id: Option<Uuid>,
    ) -> ServiceResult<SyncSession> {
        let mut conn = db.get_connection().await?;
        let session = sync::create_session(
            &mut conn,
            &NewSyncSession {
                id: Uuid::now_v7(),
                scope,
                listing_id,
                status: SyncStatus::Running,
            },
        )
        .await?;
        Ok(session)
    }

    async fn close_session(
        db: &dyn DbProvider,
        session_id: Uuid,
        result: ServiceResult<()>,
    ) -> ServiceResult<SyncSession> {
        let mut conn = db.get_connection().await?;
        let now = Utc::now();
        let session = match result {
            Ok(()) => {
                sync::finish_session(&mut conn, session_id, SyncStatus::Completed, None, now)
                    .await?
            }
            Err(e) => {
                tracing::error!(%session_id, error = %e, "Sync session failed");
                let message = e.to_string();
                sync::finish_session(
                    &mut conn,
                    session_id,
                    SyncStatus::Failed,
                    Some(&message),
                    now,
                )
                .await?
            }
        };

        tracing::info!(
            %session_id,
            status = %session.status,
            added = session.added,
            updated = session.updated,
            deactivated = session.deactivated,
            replaced = session.replaced,
            unchanged = session.unchanged,
            errors = session.errors,
            "Sync session finished"
        );
        Ok(session)
    }

    async fn run_all(&self, db: &dyn DbProvider, session_id: Uuid) -> ServiceResult<()> {
        let listing_ids = {
            let mut conn = db.get_connection().await?;
            listing::active_ids(&mut conn).await?
        };
        tracing::debug!(listings = listing_ids.len(), "Listings to sync");

        let mut skipped = 0_usize;

        for batch in listing_ids.chunks(self.config.batch_size) {
            let results = join_all(batch.iter().map(|&listing_id| {
                self.sync_one(db, session_id, listing_id)
                    .instrument(tracing::info_span!("sync_listing", %listing_id))
            }))
            .await;

            for (&listing_id, result) in batch.iter().zip(results) {
                match result {
                    Ok(ListingOutcome::Synced(counters)) => {
                        tracing::debug!(%listing_id, ?counters, "Listing reconciled");
                    }
                    Ok(ListingOutcome::Skipped) => skipped += 1,
                    Err(e) => {
                        Self::record_listing_failure(db, session_id, listing_id, &e).await?;
                    }
                }
            }
        }
        if skipped > 0 {
            tracing::info!(skipped, "Listings skipped while already syncing");
        }
        Ok(())
    }

    async fn record_listing_failure(
        db: &dyn DbProvider,
        session_id: Uuid,
        listing_id: Uuid,
        error: &ServiceError,
    ) -> ServiceResult<()> {
        tracing::error!(%listing_id, %error, "Listing sync failed");

        let mut conn = db.get_connection().await?;
        let entry = SyncLogDetails::ListingFailed {
            error: error.to_string(),
        }
        .into_entry(session_id, LogScope::listing(listing_id));
        sync::insert_entries(&mut conn, &[entry]).await?;
        sync::add_counters(
            &mut conn,
            session_id,
            &SyncCounters {
                errors: 1,
                ..SyncCounters::default()
            },
        )
        .await?;
        Ok(())
    }

    async fn fetch_feed(&self, url: &str, window: &FeedWindow) -> FeedResult<Vec<Booking>> {
        let url = normalize_url(url)?;
        fetch_bookings(self.source.as_ref(), &url, window).await
    }

    /// ## Summary
    /// Fetches, derives and reconciles one listing.
    ///
    /// Feed failures are logged and counted; they never fail the listing.
    ///
    /// ## Errors
    /// Returns an error if a database operation fails. Nothing of the
    /// listing's reconciliation is kept in that case.
    async fn sync_one(
        &self,
        db: &dyn DbProvider,
        session_id: Uuid,
        listing_id: Uuid,
    ) -> ServiceResult<ListingOutcome> {
        let Some(_guard) = self.locks.try_acquire(listing_id) else {
            tracing::warn!(%listing_id, "Listing sync already in progress, skipping");
            let mut conn = db.get_connection().await?;
            let entry = SyncLogDetails::ListingSkipped {
                reason: "sync already in progress".to_string(),
            }
            .into_entry(session_id, LogScope::listing(listing_id));
            sync::insert_entries(&mut conn, &[entry]).await?;
            return Ok(ListingOutcome::Skipped);
        };

        let now = Utc::now();
        let window = fetch_window(now.date_naive(), &self.config);

        let feeds: Vec<IcalFeed> = {
            let mut conn = db.get_connection().await?;
            feed::active_for_listing(&mut conn, listing_id).await?
        };

        let window_ref = &window;
        let fetched = join_all(feeds.iter().map(|feed| async move {
            (feed, self.fetch_feed(&feed.url, window_ref).await)
        }))
        .await;

        let mut ctx = PlanContext {
            window_start: window.start,
            ..PlanContext::default()
        };
        let mut entries = Vec::with_capacity(fetched.len());
        let mut batches = Vec::with_capacity(fetched.len());
        let mut feed_errors = 0;

        for (feed, result) in fetched {
            let scope = LogScope::feed(listing_id, feed.id);
            match result {
                Ok(bookings) => {
                    ctx.succeeded_feeds.insert(feed.id);
                    entries.push(
                        SyncLogDetails::FeedFetched {
                            url: feed.url.clone(),
                            bookings: bookings.len(),
                        }
                        .into_entry(session_id, scope),
                    );
                    batches.push(FeedBatch {
                        feed_id: feed.id,
                        bookings,
                    });
                }
                Err(e) => {
                    tracing::warn!(feed_id = %feed.id, url = %feed.url, error = %e, "Feed fetch failed");
                    ctx.failed_feeds.insert(feed.id);
                    feed_errors += 1;
                    entries.push(
                        SyncLogDetails::FeedFailed {
                            url: feed.url.clone(),
                            error: e.to_string(),
                        }
                        .into_entry(session_id, scope),
                    );
                }
            }
        }

        let derived = derive_events(&batches);
        let synced_feeds: Vec<Uuid> = batches.iter().map(|batch| batch.feed_id).collect();
        let exec = ExecuteContext {
            session_id,
            listing_id,
            default_checkout_time: self.default_checkout_time,
            now,
        };

        let mut conn = db.get_connection().await?;
        let counters = with_transaction(&mut conn, move |tx| {
            async move {
                for feed_id in synced_feeds {
                    feed::mark_synced(tx, feed_id, now).await?;
                }

                let stored = event::load_for_reconcile(tx, listing_id).await?;
                let plan = plan_listing(&stored, derived, &ctx);
                let outcome = apply_plan(tx, &stored, plan, &exec).await?;

                entries.extend(outcome.entries);
                sync::insert_entries(tx, &entries).await?;

                let mut counters = outcome.counters;
                counters.errors += feed_errors;
                sync::add_counters(tx, session_id, &counters).await?;
                Ok::<_, ServiceError>(counters)
            }
            .scope_boxed()
        })
        .await?;

        Ok(ListingOutcome::Synced(counters))
    }
}
