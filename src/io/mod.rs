//! File exports: series CSV and chart JSON.

pub mod chart;
pub mod export;
