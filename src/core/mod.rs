pub mod field;
pub mod footprint;
pub mod histogram;
pub mod params;
pub mod rng;
