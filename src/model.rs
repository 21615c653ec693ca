// Domain records shared by the search, booking and trips components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;

pub type ListingId = String;
pub type ReservationId = String;
pub type UserId = String;

/// Credentials for collaborator calls.
///
/// Every operation that reaches a store takes a `Session` parameter; nothing
/// in this crate reads ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<UserId>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

/// A rentable property record subject to search and booking.
///
/// Immutable from this core's viewpoint; only the owner may delete it through
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub category: String,
    pub location_value: String,
    pub guest_count: u32,
    pub room_count: u32,
    pub bathroom_count: u32,
    pub price: f64,
    pub owner_id: UserId,
    /// Live reservations held against this listing. Back-reference, not
    /// ownership: reservations are created and destroyed through their own
    /// store operations.
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// A confirmed date-range booking of a listing by a user.
///
/// Created only through [`crate::booking::BookingGuard`], destroyed only
/// through [`crate::cancel::CancelCoordinator`], never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub listing_id: ListingId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub range: DateRange,
    pub created_at: DateTime<Utc>,
}
