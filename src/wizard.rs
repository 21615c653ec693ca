// Multi-step flows for search refinement and listing creation, modeled as
// explicit step sequences: forward advancement is gated on the current
// step's required fields, and there is a single back transition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates::DateRange;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("already at the final step")]
    AtFinalStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchStep {
    Location,
    Dates,
    Info,
}

impl SearchStep {
    fn forward(self) -> Option<Self> {
        match self {
            Self::Location => Some(Self::Dates),
            Self::Dates => Some(Self::Info),
            Self::Info => None,
        }
    }

    fn backward(self) -> Option<Self> {
        match self {
            Self::Location => None,
            Self::Dates => Some(Self::Location),
            Self::Info => Some(Self::Dates),
        }
    }
}

/// Search refinement flow: location, then dates, then guest counts.
///
/// `finish()` emits the query-parameter map consumed by
/// [`crate::filter::FilterCriteria::from_params`].
#[derive(Debug, Clone)]
pub struct SearchWizard {
    step: SearchStep,
    pub location_value: Option<String>,
    pub date_range: Option<DateRange>,
    pub guest_count: u32,
    pub room_count: u32,
    pub bathroom_count: u32,
}

impl Default for SearchWizard {
    fn default() -> Self {
        Self {
            step: SearchStep::Location,
            location_value: None,
            date_range: None,
            guest_count: 1,
            room_count: 1,
            bathroom_count: 1,
        }
    }
}

impl SearchWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> SearchStep {
        self.step
    }

    fn validate(&self, step: SearchStep) -> Result<(), WizardError> {
        match step {
            SearchStep::Location => {
                if self.location_value.as_deref().map_or(true, str::is_empty) {
                    return Err(WizardError::MissingField("locationValue"));
                }
            }
            SearchStep::Dates => {
                if self.date_range.is_none() {
                    return Err(WizardError::MissingField("dateRange"));
                }
            }
            SearchStep::Info => {
                if self.guest_count == 0 {
                    return Err(WizardError::MissingField("guestCount"));
                }
            }
        }
        Ok(())
    }

    /// Advance one step if the current step's required fields are set.
    pub fn next(&mut self) -> Result<SearchStep, WizardError> {
        self.validate(self.step)?;
        match self.step.forward() {
            Some(step) => {
                self.step = step;
                Ok(step)
            }
            None => Err(WizardError::AtFinalStep),
        }
    }

    /// Step back one; a no-op at the first step.
    pub fn back(&mut self) -> SearchStep {
        if let Some(step) = self.step.backward() {
            self.step = step;
        }
        self.step
    }

    /// Produce the query parameters for the collected criteria.
    pub fn finish(&self) -> Result<HashMap<String, String>, WizardError> {
        for step in [SearchStep::Location, SearchStep::Dates, SearchStep::Info] {
            self.validate(step)?;
        }

        let range = self.date_range.expect("validated above");
        let mut params = HashMap::new();
        params.insert(
            "locationValue".to_string(),
            self.location_value.clone().expect("validated above"),
        );
        params.insert("startDate".to_string(), range.start.to_string());
        params.insert("endDate".to_string(), range.end.to_string());
        params.insert("guestCount".to_string(), self.guest_count.to_string());
        params.insert("roomCount".to_string(), self.room_count.to_string());
        params.insert(
            "bathroomCount".to_string(),
            self.bathroom_count.to_string(),
        );
        Ok(params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RentStep {
    Category,
    Location,
    Info,
    Images,
    Description,
    Price,
}

impl RentStep {
    fn forward(self) -> Option<Self> {
        match self {
            Self::Category => Some(Self::Location),
            Self::Location => Some(Self::Info),
            Self::Info => Some(Self::Images),
            Self::Images => Some(Self::Description),
            Self::Description => Some(Self::Price),
            Self::Price => None,
        }
    }

    fn backward(self) -> Option<Self> {
        match self {
            Self::Category => None,
            Self::Location => Some(Self::Category),
            Self::Info => Some(Self::Location),
            Self::Images => Some(Self::Info),
            Self::Description => Some(Self::Images),
            Self::Price => Some(Self::Description),
        }
    }
}

/// A validated create-listing payload, produced by [`RentWizard::finish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub category: String,
    pub location_value: String,
    pub guest_count: u32,
    pub room_count: u32,
    pub bathroom_count: u32,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// Listing creation flow, one field group per step.
#[derive(Debug, Clone)]
pub struct RentWizard {
    step: RentStep,
    pub category: Option<String>,
    pub location_value: Option<String>,
    pub guest_count: u32,
    pub room_count: u32,
    pub bathroom_count: u32,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: f64,
}

impl Default for RentWizard {
    fn default() -> Self {
        Self {
            step: RentStep::Category,
            category: None,
            location_value: None,
            guest_count: 1,
            room_count: 1,
            bathroom_count: 1,
            image_url: None,
            title: None,
            description: None,
            price: 0.0,
        }
    }
}

impl RentWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> RentStep {
        self.step
    }

    fn validate(&self, step: RentStep) -> Result<(), WizardError> {
        let require = |field: &Option<String>, name| {
            if field.as_deref().map_or(true, str::is_empty) {
                Err(WizardError::MissingField(name))
            } else {
                Ok(())
            }
        };

        match step {
            RentStep::Category => require(&self.category, "category"),
            RentStep::Location => require(&self.location_value, "locationValue"),
            RentStep::Info => {
                if self.guest_count == 0 || self.room_count == 0 || self.bathroom_count == 0 {
                    return Err(WizardError::MissingField("counts"));
                }
                Ok(())
            }
            RentStep::Images => require(&self.image_url, "imageUrl"),
            RentStep::Description => {
                require(&self.title, "title")?;
                require(&self.description, "description")
            }
            RentStep::Price => {
                if self.price <= 0.0 {
                    return Err(WizardError::MissingField("price"));
                }
                Ok(())
            }
        }
    }

    pub fn next(&mut self) -> Result<RentStep, WizardError> {
        self.validate(self.step)?;
        match self.step.forward() {
            Some(step) => {
                self.step = step;
                Ok(step)
            }
            None => Err(WizardError::AtFinalStep),
        }
    }

    pub fn back(&mut self) -> RentStep {
        if let Some(step) = self.step.backward() {
            self.step = step;
        }
        self.step
    }

    pub fn finish(&self) -> Result<ListingDraft, WizardError> {
        for step in [
            RentStep::Category,
            RentStep::Location,
            RentStep::Info,
            RentStep::Images,
            RentStep::Description,
            RentStep::Price,
        ] {
            self.validate(step)?;
        }

        Ok(ListingDraft {
            category: self.category.clone().expect("validated above"),
            location_value: self.location_value.clone().expect("validated above"),
            guest_count: self.guest_count,
            room_count: self.room_count,
            bathroom_count: self.bathroom_count,
            image_url: self.image_url.clone().expect("validated above"),
            title: self.title.clone().expect("validated above"),
            description: self.description.clone().expect("validated above"),
            price: self.price,
        })
    }
}
