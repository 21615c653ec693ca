// Booking admission control. The search UI already hides conflicting
// listings, but only a serialized server-side check-then-insert keeps two
// racing guests from double-booking the same dates.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dates::{DateRange, InvalidRange};
use crate::model::{ListingId, Reservation, Session};
use crate::store::{ReservationStore, StoreError};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),

    #[error("listing {listing_id} already has a reservation overlapping the requested dates")]
    Conflict { listing_id: ListingId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admission control for new reservations.
///
/// Check-then-insert for a listing runs under that listing's lock, so two
/// concurrent attempts on the same listing cannot both observe "no conflict".
/// Attempts on different listings never contend.
pub struct BookingGuard<S> {
    store: Arc<S>,
    locks: DashMap<ListingId, Arc<Mutex<()>>>,
}

impl<S: ReservationStore> BookingGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, listing_id: &ListingId) -> Arc<Mutex<()>> {
        self.locks
            .entry(listing_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Book `listing_id` for the session's user over `[start, end]`.
    ///
    /// Fails with [`BookingError::InvalidRange`] when `start > end` and with
    /// [`BookingError::Conflict`] when an existing reservation overlaps the
    /// requested closed interval. A conflict is terminal for the attempt;
    /// retrying unchanged input cannot succeed, so no retry happens here.
    pub async fn attempt_booking(
        &self,
        session: &Session,
        listing_id: &ListingId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Reservation, BookingError> {
        let range = DateRange::new(start, end)?;

        let lock = self.lock_for(listing_id);
        let result = {
            let _serialized = lock.lock().await;
            self.check_and_insert(session, listing_id, range).await
        };
        drop(lock);

        // Keep the table bounded by in-flight listings, not every listing
        // ever booked: drop the entry once only the table holds it.
        self.locks
            .remove_if(listing_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn check_and_insert(
        &self,
        session: &Session,
        listing_id: &ListingId,
        range: DateRange,
    ) -> Result<Reservation, BookingError> {
        let existing = self
            .store
            .fetch_reservations_for_listing(session, listing_id)
            .await?;
        if range.conflicts_with_any(&existing) {
            debug!(%listing_id, "booking rejected: overlapping reservation");
            return Err(BookingError::Conflict {
                listing_id: listing_id.clone(),
            });
        }

        let reservation = self
            .store
            .create_reservation(session, listing_id, &session.user_id, range)
            .await?;
        debug!(%listing_id, reservation_id = %reservation.id, "booking admitted");
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Listing;
    use crate::store::mock_store::MockStore;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            category: "Beach".to_string(),
            location_value: "TR".to_string(),
            guest_count: 4,
            room_count: 2,
            bathroom_count: 1,
            price: 100.0,
            owner_id: "host".to_string(),
            reservations: Vec::new(),
        }
    }

    fn guarded_store(ids: &[&str]) -> (Arc<MockStore>, BookingGuard<MockStore>) {
        let store = Arc::new(MockStore::new());
        for id in ids {
            store.add_listing(listing(id));
        }
        let guard = BookingGuard::new(store.clone());
        (store, guard)
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_any_store_call() {
        let (store, guard) = guarded_store(&["l1"]);
        let session = Session::new("u1", "token");

        let err = guard
            .attempt_booking(&session, &"l1".to_string(), d("2024-02-05"), d("2024-02-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidRange(_)));
        assert_eq!(
            store
                .stats()
                .reservations_created
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn overlapping_booking_is_a_conflict() {
        let (_store, guard) = guarded_store(&["l1"]);
        let session = Session::new("u1", "token");
        let id = "l1".to_string();

        guard
            .attempt_booking(&session, &id, d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap();

        let err = guard
            .attempt_booking(&session, &id, d("2024-02-03"), d("2024-02-07"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict { .. }));
    }

    #[tokio::test]
    async fn touching_endpoint_is_a_conflict() {
        let (_store, guard) = guarded_store(&["l1"]);
        let session = Session::new("u1", "token");
        let id = "l1".to_string();

        guard
            .attempt_booking(&session, &id, d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap();

        let err = guard
            .attempt_booking(&session, &id, d("2024-02-05"), d("2024-02-08"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict { .. }));
    }

    #[tokio::test]
    async fn disjoint_bookings_on_one_listing_both_succeed() {
        let (_store, guard) = guarded_store(&["l1"]);
        let session = Session::new("u1", "token");
        let id = "l1".to_string();

        guard
            .attempt_booking(&session, &id, d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap();
        guard
            .attempt_booking(&session, &id, d("2024-02-06"), d("2024-02-10"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_listing_surfaces_store_not_found() {
        let (_store, guard) = guarded_store(&[]);
        let session = Session::new("u1", "token");

        let err = guard
            .attempt_booking(&session, &"ghost".to_string(), d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Store(StoreError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_attempts_yield_exactly_one_success() {
        for _ in 0..50 {
            let (store, guard) = guarded_store(&["l1"]);
            let guard = Arc::new(guard);
            let id = "l1".to_string();

            let g1 = guard.clone();
            let id1 = id.clone();
            let first = tokio::spawn(async move {
                let session = Session::new("alice", "token-a");
                g1.attempt_booking(&session, &id1, d("2024-02-01"), d("2024-02-05"))
                    .await
            });

            let g2 = guard.clone();
            let id2 = id.clone();
            let second = tokio::spawn(async move {
                let session = Session::new("bob", "token-b");
                g2.attempt_booking(&session, &id2, d("2024-02-03"), d("2024-02-07"))
                    .await
            });

            let results = [first.await.unwrap(), second.await.unwrap()];
            let successes = results.iter().filter(|r| r.is_ok()).count();
            let conflicts = results
                .iter()
                .filter(|r| matches!(r, Err(BookingError::Conflict { .. })))
                .count();

            assert_eq!(successes, 1, "expected exactly one admission");
            assert_eq!(conflicts, 1, "expected exactly one conflict");
            assert_eq!(
                store
                    .stats()
                    .reservations_created
                    .load(std::sync::atomic::Ordering::SeqCst),
                1
            );
        }
    }

    #[tokio::test]
    async fn lock_table_is_emptied_once_attempts_settle() {
        let (_store, guard) = guarded_store(&["l1", "l2"]);
        let session = Session::new("u1", "token");

        guard
            .attempt_booking(&session, &"l1".to_string(), d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap();
        guard
            .attempt_booking(&session, &"l2".to_string(), d("2024-02-01"), d("2024-02-05"))
            .await
            .unwrap();

        // The conflict path releases its entry too.
        let _ = guard
            .attempt_booking(&session, &"l1".to_string(), d("2024-02-03"), d("2024-02-07"))
            .await;

        assert!(guard.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn attempts_on_different_listings_proceed_independently() {
        let (_store, guard) = guarded_store(&["l1", "l2"]);
        let guard = Arc::new(guard);

        let g1 = guard.clone();
        let first = tokio::spawn(async move {
            let session = Session::new("alice", "token-a");
            g1.attempt_booking(&session, &"l1".to_string(), d("2024-02-01"), d("2024-02-05"))
                .await
        });

        let g2 = guard.clone();
        let second = tokio::spawn(async move {
            let session = Session::new("bob", "token-b");
            g2.attempt_booking(&session, &"l2".to_string(), d("2024-02-01"), d("2024-02-05"))
                .await
        });

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
    }
}
