#![deny(warnings)]

//! Economic models for Technopoly.
//!
//! This crate provides the quarterly money flows:
//! - Financial settlement of a company (bonds, profit, market cap, loans)
//! - Revenue redistribution within a market by product effectiveness
//! - Acquisition pricing and the opening split of market revenue

pub mod distribution;
pub mod settlement;
pub mod shares;
pub mod valuation;

pub use distribution::{distribute_revenue, DistributionReport, Participant, CHURN_RATE};
pub use settlement::{settle_all, settle_company, Settlement};
pub use shares::{allocate_opening_revenue, Incumbent};
pub use valuation::{acquisition_price, ACQUISITION_PREMIUM};
