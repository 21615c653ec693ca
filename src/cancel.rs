// Cancellation with confirm-then-remove ordering: a reservation leaves the
// caller's held collection only after the store has confirmed the delete.

use std::sync::Arc;

use tracing::debug;

use crate::model::{Reservation, ReservationId, Session};
use crate::store::{ReservationStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The store confirmed the delete and the entry was removed.
    Cancelled,
    /// The reservation was already gone; nothing user-visible happened.
    AlreadyGone,
}

pub struct CancelCoordinator<S> {
    store: Arc<S>,
}

impl<S: ReservationStore> CancelCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Cancel `id`, removing it from `held` once the store confirms.
    ///
    /// Idempotent from the caller's perspective: an id no longer in `held` is
    /// a no-op without a store call, and a store `NotFound` (the delete
    /// already landed elsewhere) translates to a no-op rather than an error.
    /// Network failures propagate with `held` untouched.
    pub async fn cancel(
        &self,
        session: &Session,
        held: &mut Vec<Reservation>,
        id: &ReservationId,
    ) -> Result<CancelOutcome, StoreError> {
        if !held.iter().any(|r| &r.id == id) {
            debug!(reservation_id = %id, "cancel requested for reservation no longer held");
            return Ok(CancelOutcome::AlreadyGone);
        }

        match self.store.delete_reservation(session, id).await {
            Ok(()) => {
                held.retain(|r| &r.id != id);
                debug!(reservation_id = %id, "reservation cancelled");
                Ok(CancelOutcome::Cancelled)
            }
            Err(StoreError::NotFound) => {
                held.retain(|r| &r.id != id);
                debug!(reservation_id = %id, "reservation was already deleted");
                Ok(CancelOutcome::AlreadyGone)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::model::Listing;
    use crate::store::mock_store::MockStore;
    use chrono::NaiveDate;

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

    async fn booked_store() -> (Arc<MockStore>, Session, Vec<Reservation>) {
        let store = Arc::new(MockStore::new());
        let session = Session::new("u1", "token");
        store.add_listing(listing("l1"));

        let reservation = store
            .create_reservation(
                &session,
                &"l1".to_string(),
                &"u1".to_string(),
                DateRange::new(d("2024-01-10"), d("2024-01-15")).unwrap(),
            )
            .await
            .unwrap();

        (store, session, vec![reservation])
    }

    #[tokio::test]
    async fn second_cancel_is_a_silent_no_op() {
        let (store, session, mut held) = booked_store().await;
        let coordinator = CancelCoordinator::new(store);
        let id = held[0].id.clone();

        let first = coordinator.cancel(&session, &mut held, &id).await.unwrap();
        assert_eq!(first, CancelOutcome::Cancelled);
        assert!(held.is_empty());

        let second = coordinator.cancel(&session, &mut held, &id).await.unwrap();
        assert_eq!(second, CancelOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn store_not_found_translates_to_no_op_and_drops_stale_entry() {
        let (store, session, mut held) = booked_store().await;
        let id = held[0].id.clone();

        // The delete already landed through another path; our held copy is stale.
        store.delete_reservation(&session, &id).await.unwrap();

        let coordinator = CancelCoordinator::new(store);
        let outcome = coordinator.cancel(&session, &mut held, &id).await.unwrap();
        assert_eq!(outcome, CancelOutcome::AlreadyGone);
        assert!(held.is_empty());
    }

    #[tokio::test]
    async fn network_failure_keeps_the_entry_held() {
        let (store, session, mut held) = booked_store().await;
        store.fail_next_deletes(1);

        let coordinator = CancelCoordinator::new(store.clone());
        let id = held[0].id.clone();

        let err = coordinator.cancel(&session, &mut held, &id).await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
        assert_eq!(held.len(), 1, "removal must wait for store confirmation");

        // Manual retry succeeds and only then removes the entry.
        let outcome = coordinator.cancel(&session, &mut held, &id).await.unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert!(held.is_empty());
    }

    #[tokio::test]
    async fn cancelled_dates_become_bookable_again() {
        let (store, session, mut held) = booked_store().await;
        let coordinator = CancelCoordinator::new(store.clone());
        let guard = crate::booking::BookingGuard::new(store);
        let id = held[0].id.clone();

        coordinator.cancel(&session, &mut held, &id).await.unwrap();

        guard
            .attempt_booking(&session, &"l1".to_string(), d("2024-01-10"), d("2024-01-15"))
            .await
            .unwrap();
    }
}
