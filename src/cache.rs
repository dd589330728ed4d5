use crate::traits::DataCache;

/// For parts without a data cache; maintenance is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDataCache;

impl DataCache for NoDataCache {
    fn clean_invalidate(&mut self) {}
}

/// Cortex-M7 L1 data cache, maintained through the SCB.
#[cfg(feature = "dcache")]
pub struct CortexMDataCache<'a> {
    scb: &'a mut cortex_m::peripheral::SCB,
    cpuid: &'a mut cortex_m::peripheral::CPUID,
}

#[cfg(feature = "dcache")]
impl<'a> CortexMDataCache<'a> {
    pub fn new(
        scb: &'a mut cortex_m::peripheral::SCB,
        cpuid: &'a mut cortex_m::peripheral::CPUID,
    ) -> Self {
        CortexMDataCache { scb, cpuid }
    }
}

#[cfg(feature = "dcache")]
impl DataCache for CortexMDataCache<'_> {
    fn clean_invalidate(&mut self) {
        self.scb.clean_invalidate_dcache(self.cpuid);
    }
}

#[cfg(feature = "dcache")]
impl core::fmt::Debug for CortexMDataCache<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CortexMDataCache").finish()
    }
}
