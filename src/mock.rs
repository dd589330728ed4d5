//! In-memory flash driver used by the unit tests.
extern crate std;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use crate::traits::{DataCache, FlashMemory, PflashDriver, ProgramCheckFailure};
use crate::types::{FlashStatus, Margin, Property, SecurityState, ERASE_KEY};

pub const BACKDOOR_ENABLED: u32 = 0x5AA5_5AA5;

const ERASED: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Init,
    Property,
    SecurityState,
    Erase,
    VerifyErase,
    Program,
    VerifyProgram,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    Property(Property),
    SecurityState,
    Erase { addr: u32, len: u32, key: u32 },
    VerifyErase { addr: u32, len: u32, margin: Margin },
    Program { addr: u32, data: Vec<u32> },
    VerifyProgram { addr: u32, len: usize, margin: Margin },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::Init => Op::Init,
            Call::Property(_) => Op::Property,
            Call::SecurityState => Op::SecurityState,
            Call::Erase { .. } => Op::Erase,
            Call::VerifyErase { .. } => Op::VerifyErase,
            Call::Program { .. } => Op::Program,
            Call::VerifyProgram { .. } => Op::VerifyProgram,
        }
    }
}

struct Injected {
    op: Op,
    nth: usize,
    status: FlashStatus,
}

pub struct MockDriver {
    block_base: u32,
    total_size: u32,
    sector_size: u32,
    security_state: u32,
    words: Rc<RefCell<Vec<u32>>>,
    calls: Vec<Call>,
    failure: Option<Injected>,
}

impl MockDriver {
    /// Unsecured flash block, fully erased.
    pub fn new(block_base: u32, total_size: u32, sector_size: u32) -> Self {
        MockDriver {
            block_base,
            total_size,
            sector_size,
            security_state: SecurityState::NotSecure.into(),
            words: Rc::new(RefCell::new(vec![ERASED; (total_size / 4) as usize])),
            calls: Vec::new(),
            failure: None,
        }
    }

    pub fn with_security_state(mut self, raw: u32) -> Self {
        self.security_state = raw;
        self
    }

    /// Makes the first call of `op` report `status`.
    pub fn failing(self, op: Op, status: FlashStatus) -> Self {
        self.failing_nth(op, 1, status)
    }

    /// Makes the `nth` (1-based) call of `op` report `status`.
    pub fn failing_nth(mut self, op: Op, nth: usize, status: FlashStatus) -> Self {
        self.failure = Some(Injected { op, nth, status });
        self
    }

    /// Direct-read view of this driver's flash array.
    pub fn memory(&self) -> MockMemory {
        MockMemory {
            block_base: self.block_base,
            words: Rc::clone(&self.words),
            corrupt: None,
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls that change or check the flash array.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call.op(),
                    Op::Erase | Op::VerifyErase | Op::Program | Op::VerifyProgram
                )
            })
            .count()
    }

    pub fn is_blank(&self, addr: u32, len: u32) -> bool {
        let words = self.words.borrow();
        self.range(addr, len)
            .map(|range| words[range].iter().all(|&w| w == ERASED))
            .unwrap_or(false)
    }

    fn record(&mut self, call: Call) -> Result<(), FlashStatus> {
        let op = call.op();
        self.calls.push(call);
        match &self.failure {
            Some(injected) if injected.op == op => {
                let seen = self.calls.iter().filter(|c| c.op() == op).count();
                if seen == injected.nth {
                    return Err(injected.status);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn range(&self, addr: u32, len: u32) -> Option<core::ops::Range<usize>> {
        let offset = addr.checked_sub(self.block_base)?;
        let end = offset.checked_add(len)?;
        if offset % 4 != 0 || len % 4 != 0 || end > self.total_size {
            return None;
        }
        Some((offset / 4) as usize..(end / 4) as usize)
    }
}

impl PflashDriver for MockDriver {
    type Error = FlashStatus;

    fn init(&mut self) -> Result<(), FlashStatus> {
        self.record(Call::Init)
    }

    fn property(&mut self, property: Property) -> u32 {
        self.calls.push(Call::Property(property));
        match property {
            Property::PflashSectorSize => self.sector_size,
            Property::PflashTotalSize | Property::PflashBlockSize => self.total_size,
            Property::PflashBlockCount => 1,
            Property::PflashBlockBaseAddr => self.block_base,
        }
    }

    fn security_state(&mut self) -> Result<u32, FlashStatus> {
        self.record(Call::SecurityState)?;
        Ok(self.security_state)
    }

    fn erase(&mut self, addr: u32, len: u32, key: u32) -> Result<(), FlashStatus> {
        self.record(Call::Erase { addr, len, key })?;
        if key != ERASE_KEY {
            return Err(FlashStatus::EraseKeyError);
        }
        if addr % self.sector_size != 0 || len % self.sector_size != 0 {
            return Err(FlashStatus::AlignmentError);
        }
        let range = self.range(addr, len).ok_or(FlashStatus::AddressError)?;
        self.words.borrow_mut()[range].fill(ERASED);
        Ok(())
    }

    fn verify_erase(&mut self, addr: u32, len: u32, margin: Margin) -> Result<(), FlashStatus> {
        self.record(Call::VerifyErase { addr, len, margin })?;
        if self.is_blank(addr, len) {
            Ok(())
        } else {
            Err(FlashStatus::CommandFailure)
        }
    }

    fn program(&mut self, addr: u32, data: &[u32]) -> Result<(), FlashStatus> {
        self.record(Call::Program {
            addr,
            data: data.to_vec(),
        })?;
        let range = self
            .range(addr, (data.len() * 4) as u32)
            .ok_or(FlashStatus::AddressError)?;
        let mut words = self.words.borrow_mut();
        for (cell, &value) in words[range].iter_mut().zip(data) {
            // Programming can only clear bits.
            *cell &= value;
        }
        Ok(())
    }

    fn verify_program(
        &mut self,
        addr: u32,
        expected: &[u32],
        margin: Margin,
    ) -> Result<(), ProgramCheckFailure<FlashStatus>> {
        let range = self
            .range(addr, (expected.len() * 4) as u32)
            .ok_or(ProgramCheckFailure {
                status: FlashStatus::AddressError,
                fail_address: addr,
                fail_data: 0,
            })?;
        let words = Rc::clone(&self.words);
        let words = words.borrow();
        let first_word = words.get(range.start).copied().unwrap_or(ERASED);
        if let Err(status) = self.record(Call::VerifyProgram {
            addr,
            len: expected.len(),
            margin,
        }) {
            return Err(ProgramCheckFailure {
                status,
                fail_address: addr,
                fail_data: first_word,
            });
        }
        for (i, (&actual, &wanted)) in words[range].iter().zip(expected).enumerate() {
            if actual != wanted {
                return Err(ProgramCheckFailure {
                    status: FlashStatus::CommandFailure,
                    fail_address: addr + 4 * i as u32,
                    fail_data: actual,
                });
            }
        }
        Ok(())
    }
}

/// Direct-read path over the mock array; can flip bits of one word.
pub struct MockMemory {
    block_base: u32,
    words: Rc<RefCell<Vec<u32>>>,
    corrupt: Option<u32>,
    reads: Rc<Cell<usize>>,
}

impl MockMemory {
    /// Reads of `addr` return the stored word with its low bit flipped.
    pub fn corrupting(mut self, addr: u32) -> Self {
        self.corrupt = Some(addr);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl FlashMemory for MockMemory {
    fn read_word(&mut self, addr: u32) -> u32 {
        self.reads.set(self.reads.get() + 1);
        let offset = addr
            .checked_sub(self.block_base)
            .unwrap_or_else(|| panic!("direct read of {:#x} below the block", addr));
        let word = *self
            .words
            .borrow()
            .get((offset / 4) as usize)
            .unwrap_or_else(|| panic!("direct read of {:#x} past the block", addr));
        if self.corrupt == Some(addr) {
            word ^ 1
        } else {
            word
        }
    }
}

/// Counts invalidations and, when watching a memory, how many direct reads
/// had already happened at each one.
#[derive(Debug, Default)]
pub struct CountingCache {
    pub count: usize,
    pub reads_at_invalidate: Vec<usize>,
    reads: Option<Rc<Cell<usize>>>,
}

impl CountingCache {
    pub fn watching(memory: &MockMemory) -> Self {
        CountingCache {
            reads: Some(Rc::clone(&memory.reads)),
            ..Default::default()
        }
    }
}

impl DataCache for CountingCache {
    fn clean_invalidate(&mut self) {
        self.count += 1;
        if let Some(reads) = &self.reads {
            self.reads_at_invalidate.push(reads.get());
        }
    }
}
