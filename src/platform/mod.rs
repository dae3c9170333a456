pub mod attributes;
pub mod constants;
