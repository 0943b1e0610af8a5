pub mod profile;
pub mod qa;
