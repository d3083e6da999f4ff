pub mod attraction;
pub mod population;
pub mod provenance;

pub use attraction::Attraction;
pub use population::CityPopulation;
pub use provenance::{Fetched, Provenance};
