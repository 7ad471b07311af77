pub mod goal;
pub mod inflation;
pub mod sip;
pub mod tax;
