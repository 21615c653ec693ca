// Collaborator seams for the listing and reservation stores, plus an
// in-memory mock implementation with fault injection for tests and benches.

use async_trait::async_trait;
use thiserror::Error;

use crate::dates::DateRange;
use crate::model::{Listing, ListingId, Reservation, ReservationId, Session, UserId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),
}

#[async_trait]
pub trait ListingStore: Send + Sync + 'static {
    /// All listings, each including its live reservations.
    async fn fetch_all_listings(&self, session: &Session) -> Result<Vec<Listing>, StoreError>;

    /// Listings owned by the given user.
    async fn fetch_listings_for_user(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the listing is absent.
    async fn fetch_listing_by_id(
        &self,
        session: &Session,
        id: &ListingId,
    ) -> Result<Listing, StoreError>;

    /// Ownership enforcement happens in the store, not here.
    async fn delete_listing(&self, session: &Session, id: &ListingId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    async fn fetch_reservations_for_user(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn fetch_reservations_for_listing(
        &self,
        session: &Session,
        listing_id: &ListingId,
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn create_reservation(
        &self,
        session: &Session,
        listing_id: &ListingId,
        user_id: &UserId,
        range: DateRange,
    ) -> Result<Reservation, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the reservation is absent.
    async fn delete_reservation(
        &self,
        session: &Session,
        id: &ReservationId,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync + 'static {
    /// Fails with [`StoreError::NotFound`] when the listing is absent.
    async fn add_favorite(
        &self,
        session: &Session,
        user_id: &UserId,
        listing_id: &ListingId,
    ) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when the listing is not favorited.
    async fn remove_favorite(
        &self,
        session: &Session,
        user_id: &UserId,
        listing_id: &ListingId,
    ) -> Result<(), StoreError>;

    /// The user's favorited listings, oldest favorite first.
    async fn fetch_favorites(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<Vec<Listing>, StoreError>;
}

// In-memory store for testing (fault injection knobs included)
pub mod mock_store {
    use super::*;
    use chrono::Utc;
    use dashmap::DashMap;
    use parking_lot::RwLock;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    pub struct StoreStats {
        pub listing_fetches: AtomicUsize,
        pub reservations_created: AtomicUsize,
        pub reservations_deleted: AtomicUsize,
    }

    #[derive(Default)]
    pub struct MockStore {
        listings: DashMap<ListingId, Listing>,
        reservations: DashMap<ReservationId, Reservation>,
        favorites: DashMap<UserId, Vec<ListingId>>,
        next_id: AtomicU64,
        // Fault injection
        failing_listings: DashMap<ListingId, String>,
        fail_next_deletes: AtomicUsize,
        fail_next_reservation_fetches: AtomicUsize,
        fail_next_favorite_writes: AtomicUsize,
        fetch_delay: RwLock<Option<Duration>>,
        stats: StoreStats,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_listing(&self, listing: Listing) {
            self.listings.insert(listing.id.clone(), listing);
        }

        /// Make `fetch_listing_by_id` for this id fail with a network error.
        pub fn fail_listing_fetch(&self, id: &ListingId, message: &str) {
            self.failing_listings.insert(id.clone(), message.to_string());
        }

        /// Delay applied to every listing fetch, for timeout testing.
        pub fn set_fetch_delay(&self, delay: Duration) {
            *self.fetch_delay.write() = Some(delay);
        }

        pub fn fail_next_deletes(&self, count: usize) {
            self.fail_next_deletes.store(count, Ordering::SeqCst);
        }

        pub fn fail_next_reservation_fetches(&self, count: usize) {
            self.fail_next_reservation_fetches
                .store(count, Ordering::SeqCst);
        }

        pub fn fail_next_favorite_writes(&self, count: usize) {
            self.fail_next_favorite_writes.store(count, Ordering::SeqCst);
        }

        pub fn stats(&self) -> &StoreStats {
            &self.stats
        }

        async fn maybe_delay(&self) {
            let delay = *self.fetch_delay.read();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn take_injected_failure(&self, counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }

        fn with_reservations(&self, mut listing: Listing) -> Listing {
            let mut held: Vec<Reservation> = self
                .reservations
                .iter()
                .filter(|r| r.listing_id == listing.id)
                .map(|r| r.clone())
                .collect();
            held.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            listing.reservations = held;
            listing
        }
    }

    #[async_trait]
    impl ListingStore for MockStore {
        async fn fetch_all_listings(
            &self,
            _session: &Session,
        ) -> Result<Vec<Listing>, StoreError> {
            self.maybe_delay().await;
            let mut all: Vec<Listing> = self
                .listings
                .iter()
                .map(|l| self.with_reservations(l.clone()))
                .collect();
            all.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(all)
        }

        async fn fetch_listings_for_user(
            &self,
            _session: &Session,
            user_id: &UserId,
        ) -> Result<Vec<Listing>, StoreError> {
            self.maybe_delay().await;
            let mut owned: Vec<Listing> = self
                .listings
                .iter()
                .filter(|l| &l.owner_id == user_id)
                .map(|l| self.with_reservations(l.clone()))
                .collect();
            owned.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(owned)
        }

        async fn fetch_listing_by_id(
            &self,
            _session: &Session,
            id: &ListingId,
        ) -> Result<Listing, StoreError> {
            self.stats.listing_fetches.fetch_add(1, Ordering::SeqCst);
            self.maybe_delay().await;

            if let Some(message) = self.failing_listings.get(id) {
                return Err(StoreError::Network(message.clone()));
            }
            let listing = self
                .listings
                .get(id)
                .map(|l| l.clone())
                .ok_or(StoreError::NotFound)?;
            Ok(self.with_reservations(listing))
        }

        async fn delete_listing(
            &self,
            _session: &Session,
            id: &ListingId,
        ) -> Result<(), StoreError> {
            self.listings.remove(id).ok_or(StoreError::NotFound)?;
            self.reservations.retain(|_, r| &r.listing_id != id);
            for mut entry in self.favorites.iter_mut() {
                entry.value_mut().retain(|l| l != id);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ReservationStore for MockStore {
        async fn fetch_reservations_for_user(
            &self,
            _session: &Session,
            user_id: &UserId,
        ) -> Result<Vec<Reservation>, StoreError> {
            if self.take_injected_failure(&self.fail_next_reservation_fetches) {
                return Err(StoreError::Network("injected fetch failure".to_string()));
            }
            let mut mine: Vec<Reservation> = self
                .reservations
                .iter()
                .filter(|r| &r.user_id == user_id)
                .map(|r| r.clone())
                .collect();
            mine.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(mine)
        }

        async fn fetch_reservations_for_listing(
            &self,
            _session: &Session,
            listing_id: &ListingId,
        ) -> Result<Vec<Reservation>, StoreError> {
            if self.take_injected_failure(&self.fail_next_reservation_fetches) {
                return Err(StoreError::Network("injected fetch failure".to_string()));
            }
            let mut held: Vec<Reservation> = self
                .reservations
                .iter()
                .filter(|r| &r.listing_id == listing_id)
                .map(|r| r.clone())
                .collect();
            held.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(held)
        }

        async fn create_reservation(
            &self,
            _session: &Session,
            listing_id: &ListingId,
            user_id: &UserId,
            range: DateRange,
        ) -> Result<Reservation, StoreError> {
            if !self.listings.contains_key(listing_id) {
                return Err(StoreError::NotFound);
            }

            let id = format!("res-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let reservation = Reservation {
                id: id.clone(),
                listing_id: listing_id.clone(),
                user_id: user_id.clone(),
                range,
                created_at: Utc::now(),
            };
            self.reservations.insert(id, reservation.clone());
            self.stats.reservations_created.fetch_add(1, Ordering::SeqCst);
            Ok(reservation)
        }

        async fn delete_reservation(
            &self,
            _session: &Session,
            id: &ReservationId,
        ) -> Result<(), StoreError> {
            if self.take_injected_failure(&self.fail_next_deletes) {
                return Err(StoreError::Network("injected delete failure".to_string()));
            }
            self.reservations.remove(id).ok_or(StoreError::NotFound)?;
            self.stats.reservations_deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl FavoriteStore for MockStore {
        async fn add_favorite(
            &self,
            _session: &Session,
            user_id: &UserId,
            listing_id: &ListingId,
        ) -> Result<(), StoreError> {
            if self.take_injected_failure(&self.fail_next_favorite_writes) {
                return Err(StoreError::Network("injected favorite failure".to_string()));
            }
            if !self.listings.contains_key(listing_id) {
                return Err(StoreError::NotFound);
            }

            let mut held = self.favorites.entry(user_id.clone()).or_default();
            if !held.contains(listing_id) {
                held.push(listing_id.clone());
            }
            Ok(())
        }

        async fn remove_favorite(
            &self,
            _session: &Session,
            user_id: &UserId,
            listing_id: &ListingId,
        ) -> Result<(), StoreError> {
            if self.take_injected_failure(&self.fail_next_favorite_writes) {
                return Err(StoreError::Network("injected favorite failure".to_string()));
            }

            let mut held = self
                .favorites
                .get_mut(user_id)
                .ok_or(StoreError::NotFound)?;
            let before = held.len();
            held.retain(|l| l != listing_id);
            if held.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }

        async fn fetch_favorites(
            &self,
            _session: &Session,
            user_id: &UserId,
        ) -> Result<Vec<Listing>, StoreError> {
            let ids = self
                .favorites
                .get(user_id)
                .map(|held| held.value().clone())
                .unwrap_or_default();
            Ok(ids
                .iter()
                .filter_map(|id| self.listings.get(id).map(|l| l.clone()))
                .map(|l| self.with_reservations(l))
                .collect())
        }
    }
}
