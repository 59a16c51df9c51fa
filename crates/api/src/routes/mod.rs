pub mod composite;
pub mod core;
pub mod health;
pub mod metrics;
