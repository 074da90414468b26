use std::ops::RangeInclusive;

use crate::entities::{PricingContext, RateEntry, RegionMode};

pub const INTERCITY_THRESHOLD_KM: f64 = 50.0;

pub const PROVIDER_SPREAD: RangeInclusive<f64> = 0.95..=1.05;
pub const RUSH_HOUR_SURGE: RangeInclusive<f64> = 1.10..=1.20;
pub const WEEKEND_DISCOUNT: RangeInclusive<f64> = 0.90..=0.95;
pub const NOISE: RangeInclusive<f64> = -5.0..=5.0;

// draws are uniform in [0, 1)
pub trait UnitSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: rand::Rng> UnitSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

pub fn region_mode(distance_km: f64) -> RegionMode {
    if distance_km > INTERCITY_THRESHOLD_KM {
        RegionMode::Intercity
    } else {
        RegionMode::Local
    }
}

fn draw(source: &mut dyn UnitSource, range: &RangeInclusive<f64>) -> f64 {
    range.start() + source.next_unit() * (range.end() - range.start())
}

fn round_fare(fare: f64) -> f64 {
    (fare * 10.0).round() / 10.0
}

pub fn price(
    entry: &RateEntry,
    distance_km: f64,
    context: &PricingContext,
    source: &mut dyn UnitSource,
) -> f64 {
    let mut fare = entry.base_fare + entry.per_km_rate * distance_km;

    fare *= draw(source, &PROVIDER_SPREAD);

    if context.is_rush_hour() {
        fare *= draw(source, &RUSH_HOUR_SURGE);
    } else if context.is_weekend() {
        fare *= draw(source, &WEEKEND_DISCOUNT);
    }

    fare += draw(source, &NOISE);

    round_fare(fare.max(entry.base_fare))
}

#[cfg(test)]
pub(crate) struct FixedDraws {
    draws: Vec<f64>,
    next: usize,
}

#[cfg(test)]
impl FixedDraws {
    pub(crate) fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }

    pub(crate) fn constant(draw: f64) -> Self {
        Self::new(vec![draw])
    }
}

#[cfg(test)]
impl UnitSource for FixedDraws {
    fn next_unit(&mut self) -> f64 {
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }
}

#[test]
fn intercity_threshold_is_exclusive() {
    assert_eq!(region_mode(0.0), RegionMode::Local);
    assert_eq!(region_mode(50.0), RegionMode::Local);
    assert_eq!(region_mode(50.01), RegionMode::Intercity);
}

#[test]
fn off_peak_weekday_bounds() {
    let entry = RateEntry::new(30.0, 12.0);
    let context = PricingContext::new(3, 2);

    // lowest spread and lowest noise: 150 * 0.95 - 5
    let low = price(&entry, 10.0, &context, &mut FixedDraws::constant(0.0));
    assert_eq!(low, 137.5);

    // highest spread and highest noise: 150 * 1.05 + 5
    let high = price(&entry, 10.0, &context, &mut FixedDraws::constant(1.0));
    assert_eq!(high, 162.5);

    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let fare = price(&entry, 10.0, &context, &mut rng);
        assert!((30.0..=162.5).contains(&fare), "fare {} out of bounds", fare);
    }
}

#[test]
fn draws_are_consumed_in_pricing_order() {
    let entry = RateEntry::new(30.0, 12.0);

    // spread 1.0, surge 1.15, noise 0.0
    let mut draws = FixedDraws::new(vec![0.5, 0.5, 0.5]);
    let fare = price(&entry, 10.0, &PricingContext::new(8, 2), &mut draws);
    assert_eq!(fare, 172.5);

    // spread 1.0, discount 0.925, noise +2.77
    let mut draws = FixedDraws::new(vec![0.5, 0.5, 0.777]);
    let fare = price(&entry, 10.0, &PricingContext::new(3, 0), &mut draws);
    assert_eq!(fare, 141.5);
}

#[test]
fn weekend_rush_hour_only_surges() {
    let entry = RateEntry::new(30.0, 12.0);
    let saturday_rush = PricingContext::new(8, 6);

    // a discount would pull the lowest draw to 150 * 0.95 * 0.90 - 5
    let low = price(&entry, 10.0, &saturday_rush, &mut FixedDraws::constant(0.0));
    assert_eq!(low, round_fare(150.0 * 0.95 * 1.10 - 5.0));

    let high = price(&entry, 10.0, &saturday_rush, &mut FixedDraws::constant(1.0));
    assert_eq!(high, round_fare(150.0 * 1.05 * 1.20 + 5.0));
}

#[test]
fn fare_never_drops_below_base_fare() {
    let entry = RateEntry::new(10.0, 4.8);
    let context = PricingContext::new(3, 0);

    let fare = price(&entry, 0.0, &context, &mut FixedDraws::constant(0.0));
    assert_eq!(fare, 10.0);

    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        assert!(price(&entry, 0.5, &context, &mut rng) >= entry.base_fare);
    }
}

#[test]
fn rush_hour_raises_mean_fare() {
    use rand::{rngs::StdRng, SeedableRng};

    let entry = RateEntry::new(30.0, 15.0);
    let mut rng = StdRng::seed_from_u64(7);
    let samples = 2000;

    let mean = |hour: u32, rng: &mut StdRng| {
        let context = PricingContext::new(hour, 3);
        (0..samples)
            .map(|_| price(&entry, 20.0, &context, &mut *rng))
            .sum::<f64>()
            / samples as f64
    };

    let off_peak = mean(3, &mut rng);
    let rush = mean(8, &mut rng);

    // expected 330 and 330 * 1.15
    assert!((off_peak - 330.0).abs() < 3.0, "off-peak mean {}", off_peak);
    assert!((rush - 379.5).abs() < 4.0, "rush mean {}", rush);
    assert!(rush > off_peak);
}
