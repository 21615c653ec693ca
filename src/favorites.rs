// Favorite toggling with confirm-then-update ordering: a listing id enters or
// leaves the caller's held list only after the store has confirmed the write.

use std::sync::Arc;

use tracing::debug;

use crate::model::{Listing, ListingId, Session};
use crate::store::{FavoriteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    /// The listing was not a favorite and now is.
    Added,
    /// The listing was a favorite and no longer is.
    Removed,
}

pub struct FavoriteCoordinator<S> {
    store: Arc<S>,
}

impl<S: FavoriteStore> FavoriteCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Toggle `listing_id` in the caller's `held` favorites.
    ///
    /// Whether this adds or removes is decided by membership in `held`. A
    /// store `NotFound` on removal (the favorite already vanished elsewhere)
    /// still settles as `Removed`; other failures propagate with `held`
    /// untouched so the caller can retry.
    pub async fn toggle(
        &self,
        session: &Session,
        held: &mut Vec<ListingId>,
        listing_id: &ListingId,
    ) -> Result<FavoriteOutcome, StoreError> {
        if held.contains(listing_id) {
            match self
                .store
                .remove_favorite(session, &session.user_id, listing_id)
                .await
            {
                Ok(()) | Err(StoreError::NotFound) => {
                    held.retain(|id| id != listing_id);
                    debug!(listing_id = %listing_id, "favorite removed");
                    Ok(FavoriteOutcome::Removed)
                }
                Err(err) => Err(err),
            }
        } else {
            self.store
                .add_favorite(session, &session.user_id, listing_id)
                .await?;
            held.push(listing_id.clone());
            debug!(listing_id = %listing_id, "favorite added");
            Ok(FavoriteOutcome::Added)
        }
    }

    /// Fetch the session user's favorite listings, oldest first.
    pub async fn favorites(&self, session: &Session) -> Result<Vec<Listing>, StoreError> {
        self.store.fetch_favorites(session, &session.user_id).await
    }
}
