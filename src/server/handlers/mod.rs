pub mod distances;
pub mod fares;
