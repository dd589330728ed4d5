//! Program flash bring-up self-test.
//!
//! Initializes the driver, prints the flash geometry and security state and,
//! on an unsecured part, erases the test sector, programs a small buffer,
//! verifies it twice (controller program check and direct readback) and
//! erases the sector again. Any failure stops the sequence.
use core::fmt::{Debug, Write};

use crate::error::Error;
use crate::geometry::Geometry;
use crate::traits::{DataCache, FlashMemory, PflashDriver, ProgramCheckFailure};
use crate::types::{Margin, SecurityState, ERASE_KEY};

/// Number of words programmed by the self-test.
pub const BUFFER_LEN: usize = 4;

pub(crate) const BUFFER_BYTES: u32 = (BUFFER_LEN * core::mem::size_of::<u32>()) as u32;

/// Compile-time platform capabilities, overridable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// The last sector of the block is reserved as the swap indicator and
    /// must not be used for the test.
    pub swap_indicator: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            swap_indicator: cfg!(feature = "pflash-block-swap"),
        }
    }
}

/// How a self-test run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The test sector was erased, programmed, verified and erased again.
    Completed { geometry: Geometry, addr: u32 },
    /// The flash is secured (or its state is unknown); nothing was written.
    Skipped {
        geometry: Geometry,
        security_state: u32,
    },
}

/// Owns the driver and both buffers for the duration of one self-test run.
pub struct PflashSelfTest<D, M, C> {
    driver: D,
    memory: M,
    cache: C,
    config: Config,
    buffer: [u32; BUFFER_LEN],
    readback: [u32; BUFFER_LEN],
}

impl<D, M, C> Debug for PflashSelfTest<D, M, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PflashSelfTest")
            .field("config", &self.config)
            .field("buffer", &self.buffer)
            .field("readback", &self.readback)
            .finish()
    }
}

impl<D, M, C> PflashSelfTest<D, M, C>
where
    D: PflashDriver,
    M: FlashMemory,
    C: DataCache,
{
    pub fn new(driver: D, memory: M, cache: C) -> Self {
        Self::with_config(driver, memory, cache, Config::default())
    }

    pub fn with_config(driver: D, memory: M, cache: C, config: Config) -> Self {
        PflashSelfTest {
            driver,
            memory,
            cache,
            config,
            buffer: [0; BUFFER_LEN],
            readback: [0; BUFFER_LEN],
        }
    }

    pub fn program_buffer(&self) -> &[u32; BUFFER_LEN] {
        &self.buffer
    }

    pub fn readback_buffer(&self) -> &[u32; BUFFER_LEN] {
        &self.readback
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Gives back the driver, memory and cache.
    pub fn release(self) -> (D, M, C) {
        (self.driver, self.memory, self.cache)
    }

    /// Runs the self-test, writing progress to `out`.
    ///
    /// Stops at the first failing step; nothing after it is attempted and
    /// nothing is rolled back.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Outcome, Error<D::Error>> {
        self.driver.init().map_err(Error::Init)?;

        let geometry = Geometry::read(&mut self.driver);
        debug!(
            "pflash base={=u32:#x} total={=u32:#x} sector={=u32:#x}",
            geometry.block_base,
            geometry.total_size,
            geometry.sector_size
        );
        print_information(out, &geometry);

        let raw_state = self
            .driver
            .security_state()
            .map_err(Error::SecurityState)?;
        let state = SecurityState::from_raw(raw_state);
        match state {
            Some(state) => emit(out, format_args!("\r\n {}", state.describe())),
            // Unknown states print nothing and fall through to the secured path.
            None => {}
        }
        emit(out, format_args!("\r\n"));

        if state != Some(SecurityState::NotSecure) {
            info!("flash secured ({=u32:#x}), skipping erase/program", raw_state);
            emit(
                out,
                format_args!("\r\n Erase/Program opeation will not be executed, as Flash is SECURE!"),
            );
            return Ok(Outcome::Skipped {
                geometry,
                security_state: raw_state,
            });
        }

        let addr = self.exercise_sector(out, &geometry)?;
        Ok(Outcome::Completed { geometry, addr })
    }

    /// Runs the self-test and halts forever on failure.
    pub fn run_or_trap<W: Write>(&mut self, out: &mut W) -> Outcome
    where
        D::Error: Debug,
    {
        match self.run(out) {
            Ok(outcome) => outcome,
            Err(err) => error_trap(out, &err),
        }
    }

    fn exercise_sector<W: Write>(
        &mut self,
        out: &mut W,
        geometry: &Geometry,
    ) -> Result<u32, Error<D::Error>> {
        emit(out, format_args!("\r\n Erase a sector of flash"));

        let sector = geometry.sector_size;
        let addr = geometry
            .target_address(self.config.swap_indicator)
            .ok_or(Error::InvalidGeometry {
                block_base: geometry.block_base,
                total_size: geometry.total_size,
                sector_size: geometry.sector_size,
            })?;

        self.driver
            .erase(addr, sector, ERASE_KEY)
            .map_err(|status| Error::Erase { addr, status })?;
        self.driver
            .verify_erase(addr, sector, Margin::User)
            .map_err(|status| Error::VerifyErase { addr, status })?;
        emit(
            out,
            format_args!(
                "\r\n Successfully Erased Sector 0x{:x} -> 0x{:x}\r\n",
                addr,
                addr + sector
            ),
        );

        emit(out, format_args!("\r\n Program a buffer to a sector of flash "));
        for (i, word) in self.buffer.iter_mut().enumerate() {
            *word = i as u32;
        }
        self.driver
            .program(addr, &self.buffer)
            .map_err(|status| Error::Program { addr, status })?;
        self.driver
            .verify_program(addr, &self.buffer, Margin::User)
            .map_err(
                |ProgramCheckFailure {
                     status,
                     fail_address,
                     fail_data,
                 }| Error::VerifyProgram {
                    status,
                    fail_address,
                    fail_data,
                },
            )?;

        self.cache.clean_invalidate();
        self.read_back(addr)?;
        emit(
            out,
            format_args!(
                "\r\n Successfully Programmed and Verified Location 0x{:x} -> 0x{:x} \r\n",
                addr,
                addr + BUFFER_BYTES
            ),
        );

        // The sector may become the swap indicator, which must be left blank.
        self.driver
            .erase(addr, sector, ERASE_KEY)
            .map_err(|status| Error::FinalErase { addr, status })?;
        debug!("test sector {=u32:#x} restored to blank", addr);

        Ok(addr)
    }

    fn read_back(&mut self, addr: u32) -> Result<(), Error<D::Error>> {
        for index in 0..BUFFER_LEN {
            let word_addr = addr + (index * core::mem::size_of::<u32>()) as u32;
            let actual = self.memory.read_word(word_addr);
            self.readback[index] = actual;
            let expected = self.buffer[index];
            if actual != expected {
                warn!(
                    "readback mismatch at {=u32:#x}: {=u32:#x} != {=u32:#x}",
                    word_addr,
                    actual,
                    expected
                );
                return Err(Error::Readback {
                    index,
                    addr: word_addr,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

fn print_information<W: Write>(out: &mut W, geometry: &Geometry) {
    emit(out, format_args!("\r\n PFlash Example Start \r\n"));
    emit(out, format_args!("\r\n PFlash Information: "));
    emit(
        out,
        format_args!(
            "\r\n Program Flash Block Base:\tHex: (0x{:x})",
            geometry.block_base
        ),
    );
    emit(
        out,
        format_args!(
            "\r\n Total Program Flash Size:\t{} KB, Hex: (0x{:x})",
            geometry.total_size / 1024,
            geometry.total_size
        ),
    );
    emit(
        out,
        format_args!(
            "\r\n Program Flash Sector Size:\t{} KB, Hex: (0x{:x}) ",
            geometry.sector_size / 1024,
            geometry.sector_size
        ),
    );
}

/// Console output is best effort: a failing sink never aborts the test.
fn emit<W: Write>(out: &mut W, args: core::fmt::Arguments<'_>) {
    let _ = out.write_fmt(args);
}

/// Writes the halt banner and the failed step to `out`.
pub fn report_fatal<W: Write, E: Debug>(out: &mut W, err: &Error<E>) {
    emit(
        out,
        format_args!("\r\n\r\n\r\n\t---- HALTED DUE TO FLASH ERROR! ----"),
    );
    emit(out, format_args!("\r\n\t{} failed: {:?}\r\n", err.step(), err));
}

/// Reports `err` and traps forever.
pub fn error_trap<W: Write, E: Debug>(out: &mut W, err: &Error<E>) -> ! {
    error!("halted due to flash error in {=str}", err.step());
    report_fatal(out, err);
    loop {
        core::hint::spin_loop();
    }
}
