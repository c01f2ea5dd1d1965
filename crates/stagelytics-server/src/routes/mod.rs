pub mod datasets;
pub mod first_clear;
pub mod funnel;
pub mod health;
pub mod query;
pub mod report;
pub mod tutorial;
