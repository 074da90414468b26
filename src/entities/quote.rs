use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::entities::{Provider, RegionMode, VehicleCategory};
use crate::error::{invalid_input_error, Error};

// day_of_week counts from 0 for Sunday
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingContext {
    pub hour_of_day: u32,
    pub day_of_week: u32,
}

impl PricingContext {
    pub fn new(hour_of_day: u32, day_of_week: u32) -> Self {
        Self {
            hour_of_day,
            day_of_week,
        }
    }

    pub fn at<Tz: TimeZone>(moment: &DateTime<Tz>) -> Self {
        Self {
            hour_of_day: moment.hour(),
            day_of_week: moment.weekday().num_days_from_sunday(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.hour_of_day > 23 {
            return Err(invalid_input_error("Invalid hour of day"));
        }

        if self.day_of_week > 6 {
            return Err(invalid_input_error("Invalid day of week"));
        }

        Ok(())
    }

    pub fn is_rush_hour(&self) -> bool {
        matches!(self.hour_of_day, 7..=9 | 17..=19)
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.day_of_week, 0 | 6)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub provider: Provider,
    pub fare: f64,
    pub region_mode: RegionMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryQuotes {
    pub category: VehicleCategory,
    pub quotes: Vec<Quote>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub region_mode: RegionMode,
    pub categories: Vec<CategoryQuotes>,
}

impl FareEstimate {
    pub fn quotes_for(&self, category: VehicleCategory) -> Option<&[Quote]> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.quotes.as_slice())
    }
}

#[test]
fn pricing_context_ranges() {
    assert!(PricingContext::new(0, 0).validate().is_ok());
    assert!(PricingContext::new(23, 6).validate().is_ok());
    assert!(PricingContext::new(24, 2).validate().unwrap_err().is_invalid_input_error());
    assert!(PricingContext::new(3, 7).validate().unwrap_err().is_invalid_input_error());
}

#[test]
fn rush_hours_and_weekends() {
    let rush: Vec<u32> = (0..24).filter(|h| PricingContext::new(*h, 2).is_rush_hour()).collect();
    assert_eq!(rush, vec![7, 8, 9, 17, 18, 19]);

    let weekend: Vec<u32> = (0..7).filter(|d| PricingContext::new(3, *d).is_weekend()).collect();
    assert_eq!(weekend, vec![0, 6]);
}

#[test]
fn pricing_context_from_timestamp() {
    use chrono::Utc;

    // 2024-06-01 was a Saturday
    let moment = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();
    let context = PricingContext::at(&moment);

    assert_eq!(context, PricingContext::new(18, 6));
    assert!(context.is_rush_hour());
    assert!(context.is_weekend());
}
