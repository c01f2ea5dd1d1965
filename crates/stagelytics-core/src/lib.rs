pub mod analytics;
pub mod attrition;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod event;
pub mod filter;
pub mod first_clear;
pub mod funnel;
pub mod ingest;
pub mod report;
pub mod stage;
pub mod stats;
pub mod store;
pub mod tutorial;
pub mod users;
