pub mod auth;
pub mod dashboard;
pub mod portfolio;
pub mod property;
pub mod stock;
