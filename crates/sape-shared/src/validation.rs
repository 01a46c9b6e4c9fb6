//! Boundary checks run before a draft is handed to a store.
//!
//! None of these rules are store invariants: the stores accept whatever they
//! are given. Callers (forms, the activity scheduling flow) run them first so
//! that invalid input never reaches a backend.

use crate::constants::{
    MIN_ACTIVITY_TITLE_LEN, MIN_PLACE_NAME_LEN, MIN_PLACE_REFERENCE_LEN, MIN_SPORT_NAME_LEN,
};
use crate::error::ValidationError;
use crate::models::{Activity, Place, Sport};
use crate::time::TimeOfDay;

fn require_len(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::Missing { field });
    }
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

pub fn validate_sport(sport: &Sport) -> Result<(), ValidationError> {
    require_len("name", &sport.name, MIN_SPORT_NAME_LEN)
}

/// Check a place draft. `max_capacity` is an optional deployment rule; when
/// `None` any positive capacity is accepted.
pub fn validate_place(place: &Place, max_capacity: Option<u32>) -> Result<(), ValidationError> {
    require_len("name", &place.name, MIN_PLACE_NAME_LEN)?;

    if let Some(reference) = place.reference.as_deref() {
        if !reference.trim().is_empty() {
            require_len("reference", reference, MIN_PLACE_REFERENCE_LEN)?;
        }
    }

    if let Some(value) = place.maximum_capacity_participants {
        let max = max_capacity.unwrap_or(u32::MAX);
        if value == 0 || value > max {
            return Err(ValidationError::Capacity { value, max });
        }
    }

    Ok(())
}

pub fn validate_activity(activity: &Activity) -> Result<(), ValidationError> {
    require_len("title", &activity.title, MIN_ACTIVITY_TITLE_LEN)?;
    if activity.sport_id.as_str().trim().is_empty() {
        return Err(ValidationError::Missing { field: "sportId" });
    }
    if activity.place_id.as_str().trim().is_empty() {
        return Err(ValidationError::Missing { field: "placeId" });
    }
    ensure_ordered(activity.start_time, activity.finish_time)
}

/// `start` must be strictly before `end`.
pub fn ensure_ordered(start: TimeOfDay, end: TimeOfDay) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::InvertedRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}
