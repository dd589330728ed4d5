use core::fmt::{self, Debug};

/// The error type used by this library.
///
/// One variant per step of the self-test; each carries the driver's own
/// error where there is one. Every variant is fatal.
pub enum Error<E> {
    /// Driver initialisation failed.
    Init(E),
    /// The security state could not be read.
    SecurityState(E),
    /// The reported geometry leaves no sector-aligned test sector in the block.
    InvalidGeometry {
        block_base: u32,
        total_size: u32,
        sector_size: u32,
    },
    /// Sector erase failed.
    Erase { addr: u32, status: E },
    /// The erased sector did not pass the blank check.
    VerifyErase { addr: u32, status: E },
    /// Programming the buffer failed.
    Program { addr: u32, status: E },
    /// The controller program check found a mismatch.
    VerifyProgram {
        status: E,
        fail_address: u32,
        fail_data: u32,
    },
    /// Direct readback differed from the programmed word.
    Readback {
        index: usize,
        addr: u32,
        expected: u32,
        actual: u32,
    },
    /// Restoring the test sector to blank failed.
    FinalErase { addr: u32, status: E },
}

impl<E> Error<E> {
    /// Short name of the step that failed, for the console.
    pub fn step(&self) -> &'static str {
        match self {
            Error::Init(_) => "init",
            Error::SecurityState(_) => "security state",
            Error::InvalidGeometry { .. } => "geometry",
            Error::Erase { .. } => "erase",
            Error::VerifyErase { .. } => "verify erase",
            Error::Program { .. } => "program",
            Error::VerifyProgram { .. } => "verify program",
            Error::Readback { .. } => "readback",
            Error::FinalErase { .. } => "final erase",
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E>
where
    E: defmt::Format,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Init(e) => defmt::write!(fmt, "Error::Init({})", e),
            Error::SecurityState(e) => defmt::write!(fmt, "Error::SecurityState({})", e),
            Error::InvalidGeometry {
                block_base,
                total_size,
                sector_size,
            } => defmt::write!(
                fmt,
                "Error::InvalidGeometry(base={=u32:#x}, total={=u32:#x}, sector={=u32:#x})",
                block_base,
                total_size,
                sector_size
            ),
            Error::Erase { addr, status } => {
                defmt::write!(fmt, "Error::Erase({=u32:#x}, {})", addr, status)
            }
            Error::VerifyErase { addr, status } => {
                defmt::write!(fmt, "Error::VerifyErase({=u32:#x}, {})", addr, status)
            }
            Error::Program { addr, status } => {
                defmt::write!(fmt, "Error::Program({=u32:#x}, {})", addr, status)
            }
            Error::VerifyProgram {
                status,
                fail_address,
                fail_data,
            } => defmt::write!(
                fmt,
                "Error::VerifyProgram({}, addr={=u32:#x}, data={=u32:#x})",
                status,
                fail_address,
                fail_data
            ),
            Error::Readback {
                index,
                addr,
                expected,
                actual,
            } => defmt::write!(
                fmt,
                "Error::Readback([{}] {=u32:#x}: expected {=u32:#x}, read {=u32:#x})",
                index,
                addr,
                expected,
                actual
            ),
            Error::FinalErase { addr, status } => {
                defmt::write!(fmt, "Error::FinalErase({=u32:#x}, {})", addr, status)
            }
        }
    }
}

impl<E> Debug for Error<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Init(e) => write!(f, "Error::Init({:?})", e),
            Error::SecurityState(e) => write!(f, "Error::SecurityState({:?})", e),
            Error::InvalidGeometry {
                block_base,
                total_size,
                sector_size,
            } => write!(
                f,
                "Error::InvalidGeometry(base={:#x}, total={:#x}, sector={:#x})",
                block_base, total_size, sector_size
            ),
            Error::Erase { addr, status } => write!(f, "Error::Erase({:#x}, {:?})", addr, status),
            Error::VerifyErase { addr, status } => {
                write!(f, "Error::VerifyErase({:#x}, {:?})", addr, status)
            }
            Error::Program { addr, status } => {
                write!(f, "Error::Program({:#x}, {:?})", addr, status)
            }
            Error::VerifyProgram {
                status,
                fail_address,
                fail_data,
            } => write!(
                f,
                "Error::VerifyProgram({:?}, addr={:#x}, data={:#x})",
                status, fail_address, fail_data
            ),
            Error::Readback {
                index,
                addr,
                expected,
                actual,
            } => write!(
                f,
                "Error::Readback([{}] {:#x}: expected {:#x}, read {:#x})",
                index, addr, expected, actual
            ),
            Error::FinalErase { addr, status } => {
                write!(f, "Error::FinalErase({:#x}, {:?})", addr, status)
            }
        }
    }
}
