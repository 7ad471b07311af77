pub mod cache;
pub mod classifier;
pub mod provider;
pub mod quality;
pub mod records;
pub mod returns;

#[cfg(feature = "mfapi")]
pub mod mfapi;
