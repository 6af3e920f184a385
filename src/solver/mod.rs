//! The external solver: request body, HTTP client, result normalization and loadout report.

pub mod client;
pub mod report;
pub mod request;
pub mod result;

pub use client::{OptimizeResponse, SolverClient, SolverError};
pub use request::{OptimizeRequest, SolverOptions};
pub use result::{parse_result, ParsedResult, ProfileResult};
