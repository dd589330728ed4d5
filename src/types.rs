//! Vendor enumerations shared by the driver seam and the self-test.
use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// Key the flash driver requires on every erase call ('kfek').
pub const ERASE_KEY: u32 = u32::from_le_bytes(*b"kfek");

/// Property tags understood by the driver's property query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Property {
    PflashSectorSize = 0x00,
    PflashTotalSize = 0x01,
    PflashBlockSize = 0x02,
    PflashBlockCount = 0x03,
    PflashBlockBaseAddr = 0x04,
}

/// Flash security state as reported by the controller.
///
/// The driver hands back the raw 32-bit word; anything that does not decode
/// into one of these is treated as "secured, state unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum SecurityState {
    NotSecure = 0xC33C_C33C,
    BackdoorEnabled = 0x5AA5_5AA5,
    BackdoorDisabled = 0x5AC3_3CA5,
}

impl SecurityState {
    /// Decodes a raw state word, `None` for an unrecognized value.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::try_from(raw).ok()
    }

    /// Console text for this state.
    pub fn describe(self) -> &'static str {
        match self {
            SecurityState::NotSecure => "Flash is UNSECURE!",
            SecurityState::BackdoorEnabled => "Flash is SECURE, BACKDOOR is ENABLED!",
            SecurityState::BackdoorDisabled => "Flash is SECURE, BACKDOOR is DISABLED!",
        }
    }
}

/// Read margin used by the controller-assisted verify commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Margin {
    Normal = 0,
    /// Nominal operating margin.
    User = 1,
    Factory = 2,
}

/// Status codes returned by the vendor flash driver.
///
/// `Success` never appears as an error; the driver binding maps it to `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i32)]
pub enum FlashStatus {
    Success = 0,
    InvalidArgument = 4,
    SizeError = 100,
    AlignmentError = 101,
    AddressError = 102,
    AccessError = 103,
    ProtectionViolation = 104,
    CommandFailure = 105,
    UnknownProperty = 106,
    EraseKeyError = 107,
    RegionExecuteOnly = 108,
    ExecuteInRamFunctionNotReady = 109,
    #[num_enum(default)]
    Unrecognized = -1,
}

impl FlashStatus {
    /// Converts a raw driver status into a `Result`.
    pub fn check(raw: i32) -> Result<(), FlashStatus> {
        match FlashStatus::from(raw) {
            FlashStatus::Success => Ok(()),
            status => Err(status),
        }
    }
}
