// Application layer - use cases over a file-backed trip.
// The CLI talks to `TripService`; the domain layer stays free of IO.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
