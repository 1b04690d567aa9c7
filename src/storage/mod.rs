mod store;

pub use store::*;

/// Default trip file name when none is configured
pub const DEFAULT_TRIP_FILE: &str = "trip.json";
