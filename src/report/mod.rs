//! Report building over already-loaded employees and attendance records.

pub mod daily;
pub mod export;
pub mod monthly;
pub mod statistics;
