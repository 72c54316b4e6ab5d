//! Route modules.

pub mod activities;
pub mod health;
mod params;
pub mod report;
