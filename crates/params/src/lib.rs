//! Height-windowed staking parameters and their resolution.

mod errors;
mod params;
pub mod serde_helpers;
mod table;

pub use errors::ParamsError;
pub use params::ParameterSet;
pub use table::ParamsTable;
