//! HTTP request handlers

pub mod dashboard;
pub mod health;
pub mod items;
pub mod purchase;
pub mod sale;
pub mod stock;

pub use dashboard::*;
pub use health::*;
pub use items::*;
pub use purchase::*;
pub use sale::*;
pub use stock::*;

use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DateRange, ValidationError};

/// Query parameters for date-filtered transaction lists
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRangeQuery {
    /// Both bounds or neither; a single bound is rejected
    pub fn into_range(self) -> Result<Option<DateRange>, ValidationError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end))),
            (None, None) => Ok(None),
            _ => Err(ValidationError::IncompleteDateRange),
        }
    }
}
