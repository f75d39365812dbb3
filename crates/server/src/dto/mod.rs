mod itinerary;

pub use itinerary::*;
