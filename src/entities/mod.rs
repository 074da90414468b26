mod quote;
mod rate;
mod route;

pub use quote::{CategoryQuotes, FareEstimate, PricingContext, Quote};
pub use rate::{
    CategoryRates, Provider, ProviderRates, RateEntry, RateTable, RegionMode, VehicleCategory,
};
pub use route::{Coordinates, RouteSummary};
