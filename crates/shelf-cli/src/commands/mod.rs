//! Command handlers

pub mod backup;
pub mod category;
pub mod config;
pub mod item;
pub mod order;
pub mod status;
