//! Static data tables

pub mod constants;
pub mod macros;
