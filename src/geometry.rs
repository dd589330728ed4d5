use crate::selftest::BUFFER_BYTES;
use crate::traits::PflashDriver;
use crate::types::Property;

/// Program flash block geometry, read once from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    pub block_base: u32,
    pub total_size: u32,
    pub sector_size: u32,
}

impl Geometry {
    pub fn read<D: PflashDriver>(driver: &mut D) -> Self {
        Geometry {
            block_base: driver.property(Property::PflashBlockBaseAddr),
            total_size: driver.property(Property::PflashTotalSize),
            sector_size: driver.property(Property::PflashSectorSize),
        }
    }

    /// Start address of the sector used for the erase/program test.
    ///
    /// This is the last sector of the block, or the one before it when the
    /// controller keeps a swap indicator in the last sector. Returns `None`
    /// when the block cannot hold the reserved sectors, is not
    /// sector-aligned, ends past the 32-bit address space, or has sectors
    /// smaller than the programmed buffer.
    pub fn target_address(&self, swap_indicator: bool) -> Option<u32> {
        if self.sector_size < BUFFER_BYTES
            || self.block_base % self.sector_size != 0
            || self.total_size % self.sector_size != 0
        {
            return None;
        }
        let reserved = if swap_indicator {
            self.sector_size.checked_mul(2)?
        } else {
            self.sector_size
        };
        let offset = self.total_size.checked_sub(reserved)?;
        // The end of the block must be representable as an address.
        self.block_base.checked_add(self.total_size)?;
        Some(self.block_base + offset)
    }
}
