//! Binding to the vendor's C flash driver.
//!
//! The driver library must be linked into the final image; this module only
//! declares its entry points.
use crate::traits::{PflashDriver, ProgramCheckFailure};
use crate::types::{FlashStatus, Margin, Property};

/// Words reserved for the driver's `flash_config_t`.
///
/// In the vendor SDK's `fsl_flash.h` that structure holds the PFlash, DFlash
/// and FlexRAM geometry words plus the callback and RAM-function pointers,
/// under 32 words on every FTFx part. Twice that leaves room for newer driver
/// revisions; the driver only touches its own prefix.
pub const FLASH_CONFIG_WORDS: usize = 64;

const _: () = assert!(core::mem::size_of::<FlashConfig>() >= 32 * core::mem::size_of::<u32>());

/// Opaque driver handle, handed to every driver call by pointer.
#[repr(C)]
pub struct FlashConfig {
    _opaque: [u32; FLASH_CONFIG_WORDS],
}

impl FlashConfig {
    pub const fn zeroed() -> Self {
        FlashConfig {
            _opaque: [0; FLASH_CONFIG_WORDS],
        }
    }
}

extern "C" {
    fn FLASH_Init(config: *mut FlashConfig) -> i32;
    fn FLASH_GetProperty(config: *mut FlashConfig, which: u32, value: *mut u32) -> i32;
    fn FLASH_GetSecurityState(config: *mut FlashConfig, state: *mut u32) -> i32;
    fn FLASH_Erase(config: *mut FlashConfig, start: u32, length: u32, key: u32) -> i32;
    fn FLASH_VerifyErase(config: *mut FlashConfig, start: u32, length: u32, margin: u32) -> i32;
    fn FLASH_Program(config: *mut FlashConfig, start: u32, src: *const u32, length: u32) -> i32;
    fn FLASH_VerifyProgram(
        config: *mut FlashConfig,
        start: u32,
        length: u32,
        expected: *const u32,
        margin: u32,
        failed_address: *mut u32,
        failed_data: *mut u32,
    ) -> i32;
}

/// The vendor driver together with the handle it owns.
pub struct VendorFlash {
    config: FlashConfig,
}

impl core::fmt::Debug for VendorFlash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VendorFlash").finish()
    }
}

impl VendorFlash {
    /// # Safety
    ///
    /// At most one `VendorFlash` may exist, and nothing else may drive the
    /// flash controller while it does.
    pub unsafe fn new() -> Self {
        VendorFlash {
            config: FlashConfig::zeroed(),
        }
    }
}

fn byte_len(words: &[u32]) -> u32 {
    (words.len() * core::mem::size_of::<u32>()) as u32
}

impl PflashDriver for VendorFlash {
    type Error = FlashStatus;

    fn init(&mut self) -> Result<(), FlashStatus> {
        self.config = FlashConfig::zeroed();
        // SAFETY: `config` is a valid, exclusively borrowed handle.
        FlashStatus::check(unsafe { FLASH_Init(&mut self.config) })
    }

    fn property(&mut self, property: Property) -> u32 {
        let mut value = 0;
        // SAFETY: valid handle and out pointer. The status is not checked;
        // an unknown property leaves `value` at zero.
        let status = unsafe { FLASH_GetProperty(&mut self.config, property.into(), &mut value) };
        if FlashStatus::check(status).is_err() {
            warn!("property {} query failed: {}", property, status);
        }
        value
    }

    fn security_state(&mut self) -> Result<u32, FlashStatus> {
        let mut state = 0;
        // SAFETY: valid handle and out pointer.
        FlashStatus::check(unsafe { FLASH_GetSecurityState(&mut self.config, &mut state) })?;
        Ok(state)
    }

    fn erase(&mut self, addr: u32, len: u32, key: u32) -> Result<(), FlashStatus> {
        // SAFETY: valid handle; the controller validates the range.
        FlashStatus::check(unsafe { FLASH_Erase(&mut self.config, addr, len, key) })
    }

    fn verify_erase(&mut self, addr: u32, len: u32, margin: Margin) -> Result<(), FlashStatus> {
        // SAFETY: valid handle; the controller validates the range.
        FlashStatus::check(unsafe {
            FLASH_VerifyErase(&mut self.config, addr, len, margin.into())
        })
    }

    fn program(&mut self, addr: u32, data: &[u32]) -> Result<(), FlashStatus> {
        // SAFETY: `data` is valid for `byte_len(data)` bytes and only read.
        FlashStatus::check(unsafe {
            FLASH_Program(&mut self.config, addr, data.as_ptr(), byte_len(data))
        })
    }

    fn verify_program(
        &mut self,
        addr: u32,
        expected: &[u32],
        margin: Margin,
    ) -> Result<(), ProgramCheckFailure<FlashStatus>> {
        let mut fail_address = 0;
        let mut fail_data = 0;
        // SAFETY: `expected` is valid for `byte_len(expected)` bytes; the out
        // pointers are valid for one word each.
        let status = unsafe {
            FLASH_VerifyProgram(
                &mut self.config,
                addr,
                byte_len(expected),
                expected.as_ptr(),
                margin.into(),
                &mut fail_address,
                &mut fail_data,
            )
        };
        FlashStatus::check(status).map_err(|status| ProgramCheckFailure {
            status,
            fail_address,
            fail_data,
        })
    }
}
