pub mod calculators;
pub mod funds;
pub mod portfolio;
pub mod scenarios;
