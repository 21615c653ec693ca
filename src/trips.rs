// Joins a user's reservations to their listings with concurrent,
// partial-failure-tolerant fetches, plus the host-side reservations view.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::warn;

use crate::model::{Listing, ListingId, Reservation, Session};
use crate::store::{ListingStore, ReservationStore, StoreError};

/// Per-fetch deadline; expiry is recorded on the affected entry like any
/// other fetch failure.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One reservation joined to its listing, or to the error that kept the
/// listing from resolving.
#[derive(Debug, Clone)]
pub struct TripEntry {
    pub reservation: Reservation,
    pub listing: Result<Listing, StoreError>,
}

/// The gathered result of an aggregation, in input reservation order.
#[derive(Debug, Clone, Default)]
pub struct TripsView {
    pub entries: Vec<TripEntry>,
}

impl TripsView {
    /// True when at least one listing fetch failed.
    pub fn partial_failure(&self) -> bool {
        self.entries.iter().any(|e| e.listing.is_err())
    }
}

/// Join `reservations` to their listings, one fetch per distinct listing id.
///
/// Fetches fan out on spawned tasks and are gathered once all have settled;
/// a failing or timed-out fetch marks only the entries that reference it.
/// Dropping the returned future abandons the gather without aborting fetches
/// that were already dispatched.
pub async fn aggregate_trips<S: ListingStore>(
    session: &Session,
    reservations: Vec<Reservation>,
    store: Arc<S>,
    fetch_timeout: Duration,
) -> TripsView {
    let mut distinct: Vec<ListingId> = Vec::new();
    for reservation in &reservations {
        if !distinct.contains(&reservation.listing_id) {
            distinct.push(reservation.listing_id.clone());
        }
    }

    let handles: Vec<_> = distinct
        .into_iter()
        .map(|id| {
            let store = store.clone();
            let session = session.clone();
            tokio::spawn(async move {
                let fetched = match timeout(fetch_timeout, store.fetch_listing_by_id(&session, &id))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout(fetch_timeout.as_millis() as u64)),
                };
                (id, fetched)
            })
        })
        .collect();

    let mut by_id: HashMap<ListingId, Result<Listing, StoreError>> = HashMap::new();
    for joined in join_all(handles).await {
        match joined {
            Ok((id, fetched)) => {
                if let Err(err) = &fetched {
                    warn!(listing_id = %id, %err, "listing fetch failed");
                }
                by_id.insert(id, fetched);
            }
            Err(err) => {
                warn!(%err, "listing fetch task failed to complete");
            }
        }
    }

    let entries = reservations
        .into_iter()
        .map(|reservation| {
            let listing = by_id
                .get(&reservation.listing_id)
                .cloned()
                .unwrap_or_else(|| {
                    Err(StoreError::Network("listing fetch did not complete".to_string()))
                });
            TripEntry { reservation, listing }
        })
        .collect();

    TripsView { entries }
}

/// Load the session user's trips page: their reservations, each joined to its
/// listing. A failure to load the base reservation collection surfaces as the
/// page-level error; per-listing failures stay inside the view.
pub async fn load_trips<R, L>(
    session: &Session,
    reservations: Arc<R>,
    listings: Arc<L>,
    fetch_timeout: Duration,
) -> Result<TripsView, StoreError>
where
    R: ReservationStore,
    L: ListingStore,
{
    let mine = reservations
        .fetch_reservations_for_user(session, &session.user_id)
        .await?;
    Ok(aggregate_trips(session, mine, listings, fetch_timeout).await)
}

/// Flatten the reservations held against a host's listings, pairing each with
/// its listing. Listing order, then reservation order, is preserved.
pub fn reservations_for_host(listings: &[Listing]) -> Vec<(Reservation, Listing)> {
    let mut all = Vec::new();
    for listing in listings {
        for reservation in &listing.reservations {
            all.push((reservation.clone(), listing.clone()));
        }
    }
    all
}
