pub mod params;
pub mod composer;
