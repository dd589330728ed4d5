#![no_std]

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod cache;
pub mod error;
pub mod geometry;
pub mod memory;
pub mod selftest;
pub mod traits;
pub mod types;
#[cfg(feature = "vendor-driver")]
pub mod vendor;

#[cfg(test)]
mod mock;

pub use cache::NoDataCache;
#[cfg(feature = "dcache")]
pub use cache::CortexMDataCache;
pub use error::Error;
pub use geometry::Geometry;
pub use memory::MappedFlash;
pub use selftest::{error_trap, report_fatal, Config, Outcome, PflashSelfTest, BUFFER_LEN};
pub use traits::{DataCache, FlashMemory, PflashDriver, ProgramCheckFailure};
pub use types::{FlashStatus, Margin, Property, SecurityState, ERASE_KEY};
#[cfg(feature = "vendor-driver")]
pub use vendor::VendorFlash;
