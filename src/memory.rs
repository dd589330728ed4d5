use crate::traits::FlashMemory;

/// Flash array read through the system bus.
#[derive(Debug)]
pub struct MappedFlash {
    _private: (),
}

impl MappedFlash {
    /// # Safety
    ///
    /// Every address later passed to [`FlashMemory::read_word`] must be a
    /// word-aligned, readable location in the memory-mapped flash array.
    pub unsafe fn new() -> Self {
        MappedFlash { _private: () }
    }
}

impl FlashMemory for MappedFlash {
    fn read_word(&mut self, addr: u32) -> u32 {
        // SAFETY: upheld by the caller of `MappedFlash::new`.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }
}
