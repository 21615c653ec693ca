// Availability-aware search and booking core for a listings marketplace.

pub mod booking;
pub mod cancel;
pub mod dates;
pub mod favorites;
pub mod filter;
pub mod model;
pub mod query;
pub mod store;
pub mod trips;
pub mod wizard;

// Re-export key types for convenience
pub use booking::{BookingError, BookingGuard};
pub use cancel::{CancelCoordinator, CancelOutcome};
pub use dates::{DateRange, InvalidRange};
pub use favorites::{FavoriteCoordinator, FavoriteOutcome};
pub use filter::{filter_listings, FilterCriteria};
pub use model::{Listing, Reservation, Session};
pub use store::{FavoriteStore, ListingStore, ReservationStore, StoreError};
pub use trips::{aggregate_trips, load_trips, TripEntry, TripsView};
pub use wizard::{ListingDraft, RentWizard, SearchWizard, WizardError};
