use crate::types::{Margin, Property};

/// Controller-assisted program check failed.
///
/// Besides the driver status, the controller reports the first address that
/// did not match and the data it read there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgramCheckFailure<E> {
    pub status: E,
    pub fail_address: u32,
    pub fail_data: u32,
}

/// Operation set of an on-chip program flash driver.
///
/// Every call blocks until the controller has finished the command. The
/// implementation owns the driver handle for its whole lifetime.
pub trait PflashDriver {
    type Error;

    /// Sets up the driver handle for the device.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Reads one geometry property out of the driver handle.
    fn property(&mut self, property: Property) -> u32;

    /// Raw security state word as reported by the controller.
    fn security_state(&mut self) -> Result<u32, Self::Error>;

    /// Erases `len` bytes starting at the sector-aligned `addr`.
    fn erase(&mut self, addr: u32, len: u32, key: u32) -> Result<(), Self::Error>;

    /// Blank check of `len` bytes starting at `addr` at the given margin.
    fn verify_erase(&mut self, addr: u32, len: u32, margin: Margin) -> Result<(), Self::Error>;

    /// Programs `data` at previously erased memory starting at `addr`.
    fn program(&mut self, addr: u32, data: &[u32]) -> Result<(), Self::Error>;

    /// Program check of `expected` against the flash contents at `addr`.
    fn verify_program(
        &mut self,
        addr: u32,
        expected: &[u32],
        margin: Margin,
    ) -> Result<(), ProgramCheckFailure<Self::Error>>;
}

/// Direct (non-controller) read access to the flash array.
pub trait FlashMemory {
    fn read_word(&mut self, addr: u32) -> u32;
}

/// Data cache maintenance before reading freshly programmed flash.
pub trait DataCache {
    /// Cleans and invalidates the whole data cache.
    fn clean_invalidate(&mut self);
}
