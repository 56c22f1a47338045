//! CPU execution engine for the CDP1802.
//!
//! Implements the fetch-decode-execute cycle, the interrupt response and
//! the two DMA transfers. Execution never fails: every opcode is defined
//! and all arithmetic wraps.

use crate::cpu::bus::Bus;
use crate::cpu::decode::{self, Condition, Operation};
use crate::cpu::registers::Registers;
use log::{debug, trace};

/// Machine cycles charged for an interrupt response.
pub const INTERRUPT_CYCLES: u32 = 1;

/// Machine cycles charged for one step while idle.
pub const IDLE_CYCLES: u32 = 2;

/// The CDP1802 CPU attached to a host bus.
pub struct Cpu<B: Bus> {
    regs: Registers,
    bus: B,
    /// Machine cycles consumed since construction.
    cycles: u64,
}

impl<B: Bus> Cpu<B> {
    /// Create a CPU in its power-on state. No bus traffic happens until
    /// [`Cpu::reset`] or [`Cpu::step`].
    pub fn new(bus: B) -> Self {
        Self {
            regs: Registers::new(),
            bus,
            cycles: 0,
        }
    }

    /// Hardware reset: I, N, X, P and R0 cleared, interrupts enabled,
    /// Q cleared and the bus lines driven to zero.
    pub fn reset(&mut self) {
        debug!("CPU reset");
        self.regs.i = 0;
        self.regs.n = 0;
        self.regs.x = 0;
        self.regs.p = 0;
        self.regs.r[0] = 0;
        self.regs.ie = true;
        self.regs.idle = false;
        self.set_q(false);
        self.bus.output(0, 0);
    }

    /// Execute a single instruction.
    ///
    /// Returns the machine cycles consumed.
    pub fn step(&mut self) -> u32 {
        if self.regs.idle {
            self.cycles += IDLE_CYCLES as u64;
            return IDLE_CYCLES;
        }

        let pc = self.regs.pc();
        let opcode = self.fetch();
        let instr = decode::decode(opcode);
        self.regs.i = instr.i();
        self.regs.n = instr.n();
        trace!("{:04X}: {:02X} {}", pc, opcode, instr.info().mnemonic);

        self.execute(instr.operation());

        let cost = instr.cycles();
        self.cycles += cost as u64;
        cost
    }

    /// Run for at least `budget` machine cycles.
    ///
    /// The last instruction may overshoot the budget; the actual number
    /// of cycles consumed is returned, saturated to `u32::MAX`.
    pub fn run(&mut self, budget: u32) -> u32 {
        let budget = budget as u64;
        let idle_cost = IDLE_CYCLES as u64;
        let mut done: u64 = 0;
        while done < budget {
            if self.regs.idle {
                // Only an interrupt or DMA ends IDL, so charge the rest at once
                let idle = (budget - done + idle_cost - 1) / idle_cost * idle_cost;
                self.cycles += idle;
                done += idle;
                break;
            }
            done += self.step() as u64;
        }
        u32::try_from(done).unwrap_or(u32::MAX)
    }

    /// Interrupt response: save X:P in T, disable interrupts, and continue
    /// with P = 1, X = 2. The next [`Cpu::step`] fetches from R1.
    ///
    /// This does not check IE; arbitration is the host's job.
    pub fn interrupt(&mut self) -> u32 {
        debug!("interrupt, T := {:02X}", self.regs.xp());
        self.regs.ie = false;
        self.regs.t = self.regs.xp();
        self.regs.p = 1;
        self.regs.x = 2;
        self.regs.idle = false;
        self.cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }

    /// Take an interrupt only if IE is set.
    pub fn interrupt_if_enabled(&mut self) -> Option<u32> {
        if self.regs.ie {
            Some(self.interrupt())
        } else {
            None
        }
    }

    /// DMA-in cycle: M(R0) := byte; R0 += 1.
    pub fn dma_in(&mut self, byte: u8) {
        let addr = self.regs.inc(0);
        debug!("DMA in {:04X} := {:02X}", addr, byte);
        self.bus.write(addr, byte);
        self.regs.idle = false;
    }

    /// DMA-out cycle: returns M(R0); R0 += 1.
    pub fn dma_out(&mut self) -> u8 {
        let addr = self.regs.inc(0);
        let byte = self.bus.read(addr);
        debug!("DMA out {:04X} = {:02X}", addr, byte);
        self.regs.idle = false;
        byte
    }

    /// Latch Q and drive the Q line.
    pub fn set_q(&mut self, q: bool) {
        self.regs.q = q;
        self.bus.set_q(q);
    }

    // ==================== Observers ====================

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Current program counter, R(P).
    pub fn pc(&self) -> u16 {
        self.regs.pc()
    }

    pub fn q(&self) -> bool {
        self.regs.q
    }

    pub fn is_idle(&self) -> bool {
        self.regs.idle
    }

    /// Machine cycles consumed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    // ==================== Internals ====================

    /// Read M(R(P)) and advance R(P).
    fn fetch(&mut self) -> u8 {
        let addr = self.regs.inc(self.regs.p);
        self.bus.read(addr)
    }

    fn read_x(&self) -> u8 {
        self.bus.read(self.regs.rx())
    }

    fn carry_in(&self) -> u16 {
        self.regs.df as u16
    }

    /// 1 when DF signals a borrow (DF clear).
    fn borrow_in(&self) -> i16 {
        (!self.regs.df) as i16
    }

    fn add(&mut self, a: u8, b: u8, carry: u16) {
        let sum = a as u16 + b as u16 + carry;
        self.regs.d = sum as u8;
        self.regs.df = sum & 0x100 != 0;
    }

    fn subtract(&mut self, minuend: u8, subtrahend: u8, borrow: i16) {
        let diff = minuend as i16 - subtrahend as i16 - borrow;
        self.regs.d = diff as u8;
        self.regs.df = diff >= 0;
    }

    /// Ring shift: the vacated bit is filled from DF only when DF was set.
    fn shift_right(&mut self, ring: bool) {
        let fill = if ring && self.regs.df { 0x80 } else { 0 };
        self.regs.df = self.regs.d & 0x01 != 0;
        self.regs.d = (self.regs.d >> 1) | fill;
    }

    fn shift_left(&mut self, ring: bool) {
        let fill = if ring && self.regs.df { 0x01 } else { 0 };
        self.regs.df = self.regs.d & 0x80 != 0;
        self.regs.d = (self.regs.d << 1) | fill;
    }

    fn test(&self, condition: Condition) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Q => self.regs.q,
            Condition::NotQ => !self.regs.q,
            Condition::Zero => self.regs.d == 0,
            Condition::NonZero => self.regs.d != 0,
            Condition::Df => self.regs.df,
            Condition::NotDf => !self.regs.df,
            Condition::Ef(flag) => self.ef(flag),
            Condition::NotEf(flag) => !self.ef(flag),
            Condition::InterruptsEnabled => self.regs.ie,
        }
    }

    fn ef(&self, flag: u8) -> bool {
        match flag {
            1 => self.bus.ef1(),
            2 => self.bus.ef2(),
            3 => self.bus.ef3(),
            _ => self.bus.ef4(),
        }
    }

    fn short_branch(&mut self, taken: bool) {
        let p = self.regs.p;
        if taken {
            let target = self.bus.read(self.regs.pc());
            self.regs.set_low(p, target);
        } else {
            self.regs.inc(p);
        }
    }

    fn long_branch(&mut self, taken: bool) {
        let pc = self.regs.pc();
        if taken {
            let high = self.bus.read(pc);
            let low = self.bus.read(pc.wrapping_add(1));
            self.regs.set_r(self.regs.p, u16::from_be_bytes([high, low]));
        } else {
            self.regs.set_r(self.regs.p, pc.wrapping_add(2));
        }
    }

    fn long_skip(&mut self, taken: bool) {
        if taken {
            let pc = self.regs.pc();
            self.regs.set_r(self.regs.p, pc.wrapping_add(2));
        }
    }

    /// Pop X:P from M(R(X)) for RET and DIS.
    fn ret(&mut self, ie: bool) {
        let addr = self.regs.inc(self.regs.x);
        let packed = self.bus.read(addr);
        self.regs.set_xp(packed);
        self.regs.ie = ie;
    }

    fn execute(&mut self, operation: Operation) {
        let n = self.regs.n;
        match operation {
            // ==================== Memory reference ====================
            Operation::Idle => {
                debug!("IDL at {:04X}", self.regs.pc().wrapping_sub(1));
                self.regs.idle = true;
                let value = self.bus.read(self.regs.r[0]);
                self.bus.output(0, value);
            }
            Operation::LoadViaN => {
                self.regs.d = self.bus.read(self.regs.r(n));
            }
            Operation::LoadAdvance => {
                let addr = self.regs.inc(n);
                self.regs.d = self.bus.read(addr);
            }
            Operation::Store => {
                self.bus.write(self.regs.r(n), self.regs.d);
            }
            Operation::LoadViaX => {
                self.regs.d = self.read_x();
            }
            Operation::LoadViaXAdvance => {
                let addr = self.regs.inc(self.regs.x);
                self.regs.d = self.bus.read(addr);
            }
            Operation::LoadImmediate => {
                self.regs.d = self.fetch();
            }
            Operation::StoreViaXDecrement => {
                let addr = self.regs.dec(self.regs.x);
                self.bus.write(addr, self.regs.d);
            }

            // ==================== Register operations ====================
            Operation::Increment => {
                self.regs.inc(n);
            }
            Operation::Decrement => {
                self.regs.dec(n);
            }
            Operation::IncrementX => {
                self.regs.inc(self.regs.x);
            }
            Operation::GetLow => {
                self.regs.d = self.regs.r(n) as u8;
            }
            Operation::GetHigh => {
                self.regs.d = (self.regs.r(n) >> 8) as u8;
            }
            Operation::PutLow => {
                self.regs.set_low(n, self.regs.d);
            }
            Operation::PutHigh => {
                self.regs.set_high(n, self.regs.d);
            }

            // ==================== Logic ====================
            Operation::Or => {
                let operand = self.read_x();
                self.regs.d |= operand;
            }
            Operation::And => {
                let operand = self.read_x();
                self.regs.d &= operand;
            }
            Operation::Xor => {
                let operand = self.read_x();
                self.regs.d ^= operand;
            }
            Operation::OrImmediate => {
                let operand = self.fetch();
                self.regs.d |= operand;
            }
            Operation::AndImmediate => {
                let operand = self.fetch();
                self.regs.d &= operand;
            }
            Operation::XorImmediate => {
                let operand = self.fetch();
                self.regs.d ^= operand;
            }
            Operation::ShiftRight => self.shift_right(false),
            Operation::ShiftRightCarry => self.shift_right(true),
            Operation::ShiftLeft => self.shift_left(false),
            Operation::ShiftLeftCarry => self.shift_left(true),

            // ==================== Arithmetic ====================
            Operation::Add => {
                let operand = self.read_x();
                self.add(operand, self.regs.d, 0);
            }
            Operation::AddImmediate => {
                let operand = self.fetch();
                self.add(operand, self.regs.d, 0);
            }
            Operation::AddCarry => {
                let operand = self.read_x();
                self.add(operand, self.regs.d, self.carry_in());
            }
            Operation::AddCarryImmediate => {
                let operand = self.fetch();
                self.add(operand, self.regs.d, self.carry_in());
            }
            Operation::SubtractD => {
                let operand = self.read_x();
                self.subtract(operand, self.regs.d, 0);
            }
            Operation::SubtractDImmediate => {
                let operand = self.fetch();
                self.subtract(operand, self.regs.d, 0);
            }
            Operation::SubtractDBorrow => {
                let operand = self.read_x();
                self.subtract(operand, self.regs.d, self.borrow_in());
            }
            Operation::SubtractDBorrowImmediate => {
                let operand = self.fetch();
                self.subtract(operand, self.regs.d, self.borrow_in());
            }
            Operation::SubtractMemory => {
                let operand = self.read_x();
                self.subtract(self.regs.d, operand, 0);
            }
            Operation::SubtractMemoryImmediate => {
                let operand = self.fetch();
                self.subtract(self.regs.d, operand, 0);
            }
            Operation::SubtractMemoryBorrow => {
                let operand = self.read_x();
                self.subtract(self.regs.d, operand, self.borrow_in());
            }
            Operation::SubtractMemoryBorrowImmediate => {
                let operand = self.fetch();
                self.subtract(self.regs.d, operand, self.borrow_in());
            }

            // ==================== Branch and skip ====================
            Operation::ShortBranch(condition) => {
                let taken = self.test(condition);
                self.short_branch(taken);
            }
            Operation::LongBranch(condition) => {
                let taken = self.test(condition);
                self.long_branch(taken);
            }
            Operation::LongSkip(condition) => {
                let taken = self.test(condition);
                self.long_skip(taken);
            }

            // ==================== Control ====================
            Operation::NoOperation | Operation::Reserved => {}
            Operation::SetP => self.regs.p = n,
            Operation::SetX => self.regs.x = n,
            Operation::ResetQ => self.set_q(false),
            Operation::SetQ => self.set_q(true),
            Operation::Save => {
                self.bus.write(self.regs.rx(), self.regs.t);
            }
            Operation::Mark => {
                self.regs.t = self.regs.xp();
                self.bus.write(self.regs.r[2], self.regs.t);
                self.regs.x = self.regs.p;
                self.regs.dec(2);
            }
            Operation::Return => self.ret(true),
            Operation::Disable => self.ret(false),

            // ==================== Input/output ====================
            Operation::Output => {
                let addr = self.regs.inc(self.regs.x);
                let value = self.bus.read(addr);
                self.bus.output(n, value);
            }
            Operation::Input => {
                // R(X) is not advanced
                self.regs.d = self.bus.input(n & 0x07);
                self.bus.write(self.regs.rx(), self.regs.d);
            }
        }
    }
}

impl<B: Bus + Default> Default for Cpu<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: Bus> std::fmt::Debug for Cpu<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}
