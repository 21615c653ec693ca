// Listing filter pipeline: pure, synchronous, order-preserving.

use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::model::Listing;

/// An optional constraint set used to narrow a listing collection.
///
/// Every field is independently optional; `None` means "no constraint
/// imposed", not zero. The count fields are minimums, not exact matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub category: Option<String>,
    pub location_value: Option<String>,
    pub date_range: Option<DateRange>,
    pub guest_count: Option<u32>,
    pub room_count: Option<u32>,
    pub bathroom_count: Option<u32>,
}

/// Apply `criteria` to `listings`, returning the survivors in input order.
///
/// Predicates combine with logical AND; each is skipped when its criterion is
/// unset. A listing passes the date predicate iff none of its reservations
/// overlaps the requested range, so a listing without reservations always
/// passes it.
pub fn filter_listings(listings: &[Listing], criteria: &FilterCriteria) -> Vec<Listing> {
    let mut filtered = Vec::new();

    for listing in listings {
        let category_ok = criteria
            .category
            .as_ref()
            .map_or(true, |c| listing.category.eq_ignore_ascii_case(c));

        let location_ok = criteria
            .location_value
            .as_ref()
            .map_or(true, |l| listing.location_value.eq_ignore_ascii_case(l));

        let dates_ok = criteria
            .date_range
            .map_or(true, |range| !range.conflicts_with_any(&listing.reservations));

        let guests_ok = criteria
            .guest_count
            .map_or(true, |min| listing.guest_count >= min);

        let rooms_ok = criteria
            .room_count
            .map_or(true, |min| listing.room_count >= min);

        let bathrooms_ok = criteria
            .bathroom_count
            .map_or(true, |min| listing.bathroom_count >= min);

        if category_ok && location_ok && dates_ok && guests_ok && rooms_ok && bathrooms_ok {
            filtered.push(listing.clone());
        }
    }

    filtered
}
