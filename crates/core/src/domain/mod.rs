pub mod plan;
pub mod preferences;
pub mod user;
