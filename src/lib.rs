//! Updated value of an investment indexed to the SQI daily rate series.

pub mod api;
pub mod calculator;
pub mod calendar;
pub mod config;
pub mod error;
pub mod quotation;
pub mod service;
pub mod store;
