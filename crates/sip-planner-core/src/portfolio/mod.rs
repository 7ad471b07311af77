pub mod allocation;
pub mod builder;
pub mod projection;
pub mod resolution;
