//! Crew scheduling building blocks: itineraries, travel-time models and the
//! multi-crew dispatch queue.

pub mod dispatch;
pub mod itinerary;
pub mod travel;

pub use dispatch::DispatchQueue;
pub use itinerary::{PlanEntry, Rollover, SurveyPlan};
pub use travel::{
    build_travel_model, haversine_km, EmpiricalTravel, GeoPoint, RoutedTravel, TravelModel,
    TravelSpec,
};
