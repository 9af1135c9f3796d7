//! RA8876 Host Interface Simulator
//!
//! Desktop model of the RA8876 4-wire serial host interface, for driving the
//! `ra8876` crate without hardware.
//!
//! The model understands the one-byte cycle prefix that starts every chip
//! select window:
//!
//! | Prefix | Cycle |
//! |--------|-------|
//! | `0x00` | command write (selects a register address) |
//! | `0x40` | status read (no address phase) |
//! | `0x80` | data write to the selected register |
//! | `0xC0` | data read from the selected register |
//!
//! It keeps a 256-entry register file, synthesizes the status byte from the
//! simulated engine state, and records every decoded frame so tests can make
//! assertions about bus traffic.
//!
//! # Example
//!
//! ```
//! use embedded_hal::spi::SpiDevice;
//! use ra8876_sim::SimulatedChip;
//!
//! let mut chip = SimulatedChip::new();
//! chip.write(&[0x00, 0x50]).unwrap(); // select CVSSA0
//! chip.write(&[0x80, 0x42]).unwrap(); // data write
//! assert_eq!(chip.register(0x50), 0x42);
//! ```

// Register file is 256 entries indexed by u8 address.
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

// ---------------------------------------------------------------------------
// Chip constants the model reacts to
// ---------------------------------------------------------------------------

const PREFIX_COMMAND_WRITE: u8 = 0x00;
const PREFIX_STATUS_READ: u8 = 0x40;
const PREFIX_DATA_WRITE: u8 = 0x80;
const PREFIX_DATA_READ: u8 = 0xC0;
const PREFIX_MASK: u8 = 0xC0;

const REG_SRR: u8 = 0x00;
const REG_CCR: u8 = 0x01;
const REG_MRWDP: u8 = 0x04;
const REG_DCR0: u8 = 0x67;
const REG_DCR1: u8 = 0x76;
const REG_SDRCR: u8 = 0xE4;

const STATUS_WRITE_FIFO_FULL: u8 = 0x80;
const STATUS_SDRAM_READY: u8 = 0x40;
const STATUS_CORE_BUSY: u8 = 0x08;
const STATUS_INHIBIT: u8 = 0x02;

/// Start bit shared by both draw control registers.
const DRAW_START: u8 = 0x80;

// ---------------------------------------------------------------------------
// Behavior knobs
// ---------------------------------------------------------------------------

/// How the simulated silicon responds to bring-up and drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behavior {
    /// PLLs lock after reconfiguration (CCR bit 7 reads back set).
    pub pll_locks: bool,
    /// SDRAM reports ready after initialization is requested.
    pub sdram_comes_up: bool,
    /// Soft reset returns to normal operation (status inhibit bit clears).
    pub soft_reset_completes: bool,
    /// Status reads that report the engine busy after each draw trigger.
    /// `None` keeps the engine busy forever.
    pub busy_polls_per_draw: Option<u32>,
    /// Status reads that report the memory write FIFO full after each byte
    /// written to the memory data port. `None` keeps it full forever.
    pub fifo_full_polls_per_write: Option<u32>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            pll_locks: true,
            sdram_comes_up: true,
            soft_reset_completes: true,
            busy_polls_per_draw: Some(3),
            fifo_full_polls_per_write: Some(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One decoded byte exchange on the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Command write selecting a register address.
    Command(u8),
    /// Data written to the selected register.
    DataWrite {
        /// Register the byte landed in.
        register: u8,
        /// Byte written.
        value: u8,
    },
    /// Data read from the selected register.
    DataRead {
        /// Register that was read.
        register: u8,
        /// Byte returned to the host.
        value: u8,
    },
    /// Status register read.
    StatusRead(u8),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(reg) => write!(f, "CMD  {reg:#04x}"),
            Self::DataWrite { register, value } => write!(f, "WR   [{register:#04x}] <- {value:#04x}"),
            Self::DataRead { register, value } => write!(f, "RD   [{register:#04x}] -> {value:#04x}"),
            Self::StatusRead(value) => write!(f, "STAT {value:#04x}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ChipState {
    registers: [u8; 256],
    selected: u8,
    behavior: Behavior,
    sdram_ready: bool,
    inhibit: bool,
    in_reset: bool,
    busy_remaining: Option<u32>,
    fifo_full_remaining: Option<u32>,
    frames: Vec<Frame>,
    memory_port: Vec<u8>,
    draw_triggers: Vec<(u8, u8)>,
    hard_resets: u32,
}

impl ChipState {
    fn new(behavior: Behavior) -> Self {
        Self {
            registers: [0; 256],
            selected: 0,
            behavior,
            sdram_ready: false,
            inhibit: false,
            in_reset: false,
            busy_remaining: Some(0),
            fifo_full_remaining: Some(0),
            frames: Vec::new(),
            memory_port: Vec::new(),
            draw_triggers: Vec::new(),
            hard_resets: 0,
        }
    }

    /// Power-on register defaults. Everything clears; nothing is retained.
    fn power_on_reset(&mut self) {
        self.registers = [0; 256];
        self.sdram_ready = false;
        self.restart_state_machine();
    }

    /// Soft reset: host interface and engines restart, configuration
    /// registers keep their values.
    fn restart_state_machine(&mut self) {
        self.selected = 0;
        self.busy_remaining = Some(0);
        self.fifo_full_remaining = Some(0);
    }

    /// Count down one status read of a held flag.
    fn tick(remaining: &mut Option<u32>) -> bool {
        match *remaining {
            None => true,
            Some(0) => false,
            Some(n) => {
                *remaining = Some(n - 1);
                true
            }
        }
    }

    fn status(&mut self) -> u8 {
        let mut status = 0;
        if self.sdram_ready {
            status |= STATUS_SDRAM_READY;
        }
        if self.inhibit {
            status |= STATUS_INHIBIT;
        }
        if Self::tick(&mut self.busy_remaining) {
            status |= STATUS_CORE_BUSY;
        }
        if Self::tick(&mut self.fifo_full_remaining) {
            status |= STATUS_WRITE_FIFO_FULL;
        }
        status
    }

    fn write_selected(&mut self, value: u8) {
        let register = self.selected;
        match register {
            REG_SRR if value & 0x01 != 0 => {
                self.restart_state_machine();
                self.inhibit = !self.behavior.soft_reset_completes;
                return;
            }
            REG_CCR => {
                let locked = if self.behavior.pll_locks { value } else { value & 0x7F };
                self.registers[usize::from(REG_CCR)] = locked;
                return;
            }
            REG_MRWDP => {
                self.memory_port.push(value);
                self.fifo_full_remaining = self.behavior.fifo_full_polls_per_write;
                return;
            }
            REG_SDRCR if value & 0x01 != 0 => {
                self.sdram_ready = self.behavior.sdram_comes_up;
            }
            REG_DCR0 | REG_DCR1 if value & DRAW_START != 0 => {
                self.draw_triggers.push((register, value));
                self.busy_remaining = self.behavior.busy_polls_per_draw;
                // Start bit self-clears once the engine accepts the command.
                self.registers[usize::from(register)] = value & !DRAW_START;
                return;
            }
            _ => {}
        }
        self.registers[usize::from(register)] = value;
    }

    /// Clock one byte of the current cycle. Returns the byte driven on MISO.
    fn shift(&mut self, cycle: &mut Option<u8>, byte: u8) -> u8 {
        let Some(prefix) = *cycle else {
            *cycle = Some(byte & PREFIX_MASK);
            return 0;
        };
        let frame = match prefix {
            PREFIX_COMMAND_WRITE => {
                self.selected = byte;
                Frame::Command(byte)
            }
            PREFIX_DATA_WRITE => {
                self.write_selected(byte);
                Frame::DataWrite { register: self.selected, value: byte }
            }
            PREFIX_DATA_READ => {
                let value = self.registers[usize::from(self.selected)];
                Frame::DataRead { register: self.selected, value }
            }
            PREFIX_STATUS_READ => Frame::StatusRead(self.status()),
            _ => return 0,
        };
        tracing::trace!("{}", frame);
        self.frames.push(frame);
        match frame {
            Frame::DataRead { value, .. } | Frame::StatusRead(value) => value,
            Frame::Command(_) | Frame::DataWrite { .. } => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulatedChip
// ---------------------------------------------------------------------------

/// Simulated RA8876 on the far end of an SPI device.
///
/// Cloning yields another handle to the same chip, so a test can hand one
/// clone to the driver and inspect the other.
#[derive(Debug, Clone)]
pub struct SimulatedChip {
    state: Rc<RefCell<ChipState>>,
}

impl Default for SimulatedChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChip {
    /// Chip with default [`Behavior`]: everything comes up and draws finish
    /// after a few status polls.
    pub fn new() -> Self {
        Self::with_behavior(Behavior::default())
    }

    /// Chip with custom silicon behavior.
    pub fn with_behavior(behavior: Behavior) -> Self {
        Self { state: Rc::new(RefCell::new(ChipState::new(behavior))) }
    }

    /// Replace the behavior knobs. Takes effect from the next bus cycle.
    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.borrow_mut().behavior = behavior;
    }

    /// Current value of a register.
    pub fn register(&self, address: u8) -> u8 {
        self.state.borrow().registers[usize::from(address)]
    }

    /// Copy of the whole register file.
    pub fn registers(&self) -> [u8; 256] {
        self.state.borrow().registers
    }

    /// Preload a register without generating bus traffic.
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[usize::from(address)] = value;
    }

    /// Every decoded frame since creation or the last [`clear_log`](Self::clear_log).
    pub fn frames(&self) -> Vec<Frame> {
        self.state.borrow().frames.clone()
    }

    /// `(register, value)` for every data write, in bus order.
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .frames
            .iter()
            .filter_map(|frame| match *frame {
                Frame::DataWrite { register, value } => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    /// Bytes written through the memory data port.
    pub fn memory_port_writes(&self) -> Vec<u8> {
        self.state.borrow().memory_port.clone()
    }

    /// `(register, value)` of every draw command that set the start bit.
    pub fn draw_triggers(&self) -> Vec<(u8, u8)> {
        self.state.borrow().draw_triggers.clone()
    }

    /// Number of completed hardware reset pulses.
    pub fn hard_resets(&self) -> u32 {
        self.state.borrow().hard_resets
    }

    /// Forget recorded frames, port writes and draw triggers.
    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.frames.clear();
        state.memory_port.clear();
        state.draw_triggers.clear();
    }

    /// Reset line wired to this chip.
    pub fn reset_pin(&self) -> ResetLine {
        ResetLine { state: Rc::clone(&self.state) }
    }
}

impl spi::ErrorType for SimulatedChip {
    type Error = Infallible;
}

impl SpiDevice for SimulatedChip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        let mut cycle = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        state.shift(&mut cycle, byte);
                    }
                }
                Operation::Read(bytes) => {
                    for byte in bytes.iter_mut() {
                        *byte = state.shift(&mut cycle, 0);
                    }
                }
                Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let out = state.shift(&mut cycle, write.get(i).copied().unwrap_or(0));
                        if let Some(slot) = read.get_mut(i) {
                            *slot = out;
                        }
                    }
                }
                Operation::TransferInPlace(bytes) => {
                    for byte in bytes.iter_mut() {
                        *byte = state.shift(&mut cycle, *byte);
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ResetLine
// ---------------------------------------------------------------------------

/// Active-low reset input of a [`SimulatedChip`].
///
/// Holding the line low keeps the chip in reset; the rising edge clears the
/// register file.
#[derive(Debug, Clone)]
pub struct ResetLine {
    state: Rc<RefCell<ChipState>>,
}

impl digital::ErrorType for ResetLine {
    type Error = Infallible;
}

impl OutputPin for ResetLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().in_reset = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.in_reset {
            state.in_reset = false;
            state.power_on_reset();
            state.inhibit = false;
            state.hard_resets += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn write_reg(chip: &mut SimulatedChip, reg: u8, value: u8) {
        chip.write(&[PREFIX_COMMAND_WRITE, reg]).unwrap();
        chip.write(&[PREFIX_DATA_WRITE, value]).unwrap();
    }

    fn read_reg(chip: &mut SimulatedChip, reg: u8) -> u8 {
        chip.write(&[PREFIX_COMMAND_WRITE, reg]).unwrap();
        let mut buf = [PREFIX_DATA_READ, 0x00];
        chip.transfer_in_place(&mut buf).unwrap();
        buf[1]
    }

    fn status(chip: &mut SimulatedChip) -> u8 {
        let mut buf = [PREFIX_STATUS_READ, 0x00];
        chip.transfer_in_place(&mut buf).unwrap();
        buf[1]
    }

    #[test]
    fn test_register_write_then_read() {
        let mut chip = SimulatedChip::new();
        write_reg(&mut chip, 0x5A, 0x34);
        assert_eq!(read_reg(&mut chip, 0x5A), 0x34);
        assert_eq!(
            chip.frames(),
            vec![
                Frame::Command(0x5A),
                Frame::DataWrite { register: 0x5A, value: 0x34 },
                Frame::Command(0x5A),
                Frame::DataRead { register: 0x5A, value: 0x34 },
            ]
        );
    }

    #[test]
    fn test_status_read_has_no_address_phase() {
        let mut chip = SimulatedChip::new();
        let _ = status(&mut chip);
        assert_eq!(chip.frames(), vec![Frame::StatusRead(0)]);
    }

    #[test]
    fn test_sdram_ready_after_init_request() {
        let mut chip = SimulatedChip::new();
        assert_eq!(status(&mut chip) & STATUS_SDRAM_READY, 0);
        write_reg(&mut chip, REG_SDRCR, 0x01);
        assert_ne!(status(&mut chip) & STATUS_SDRAM_READY, 0);
    }

    #[test]
    fn test_pll_lock_failure_clears_bit7() {
        let mut chip = SimulatedChip::with_behavior(Behavior { pll_locks: false, ..Behavior::default() });
        write_reg(&mut chip, REG_CCR, 0x80);
        assert_eq!(read_reg(&mut chip, REG_CCR), 0x00);
    }

    #[test]
    fn test_draw_busy_counts_down() {
        let mut chip = SimulatedChip::new();
        write_reg(&mut chip, REG_DCR1, 0xE0);
        assert_eq!(chip.draw_triggers(), vec![(REG_DCR1, 0xE0)]);
        assert_eq!(chip.register(REG_DCR1), 0x60);
        let busy: Vec<bool> = (0..4).map(|_| status(&mut chip) & STATUS_CORE_BUSY != 0).collect();
        assert_eq!(busy, vec![true, true, true, false]);
    }

    #[test]
    fn test_stuck_engine_stays_busy() {
        let mut chip = SimulatedChip::with_behavior(Behavior {
            busy_polls_per_draw: None,
            ..Behavior::default()
        });
        write_reg(&mut chip, REG_DCR0, 0x80);
        for _ in 0..100 {
            assert_ne!(status(&mut chip) & STATUS_CORE_BUSY, 0);
        }
    }

    #[test]
    fn test_soft_reset_keeps_registers() {
        let mut chip = SimulatedChip::new();
        write_reg(&mut chip, 0x20, 0xAA);
        write_reg(&mut chip, REG_DCR1, 0xE0);
        write_reg(&mut chip, REG_SRR, 0x01);
        assert_eq!(chip.register(0x20), 0xAA);
        assert_eq!(status(&mut chip) & (STATUS_INHIBIT | STATUS_CORE_BUSY), 0);
    }

    #[test]
    fn test_fifo_full_counts_down_after_each_write() {
        let mut chip = SimulatedChip::with_behavior(Behavior {
            fifo_full_polls_per_write: Some(2),
            ..Behavior::default()
        });
        assert_eq!(status(&mut chip) & STATUS_WRITE_FIFO_FULL, 0);
        write_reg(&mut chip, REG_MRWDP, 0x41);
        let full: Vec<bool> = (0..3).map(|_| status(&mut chip) & STATUS_WRITE_FIFO_FULL != 0).collect();
        assert_eq!(full, vec![true, true, false]);
    }

    #[test]
    fn test_stuck_fifo_stays_full() {
        let mut chip = SimulatedChip::with_behavior(Behavior {
            fifo_full_polls_per_write: None,
            ..Behavior::default()
        });
        write_reg(&mut chip, REG_MRWDP, 0x41);
        for _ in 0..100 {
            assert_ne!(status(&mut chip) & STATUS_WRITE_FIFO_FULL, 0);
        }
    }

    #[test]
    fn test_soft_reset_can_hang_in_inhibit() {
        let mut chip = SimulatedChip::with_behavior(Behavior {
            soft_reset_completes: false,
            ..Behavior::default()
        });
        write_reg(&mut chip, REG_SRR, 0x01);
        assert_ne!(status(&mut chip) & STATUS_INHIBIT, 0);
    }

    #[test]
    fn test_reset_line_rising_edge_clears_registers() {
        let mut chip = SimulatedChip::new();
        write_reg(&mut chip, 0x20, 0xAA);
        let mut rst = chip.reset_pin();
        rst.set_high().unwrap();
        assert_eq!(chip.hard_resets(), 0, "no edge without a low phase");
        rst.set_low().unwrap();
        rst.set_high().unwrap();
        assert_eq!(chip.hard_resets(), 1);
        assert_eq!(chip.register(0x20), 0);
    }

    #[test]
    fn test_memory_port_bytes_are_captured() {
        let mut chip = SimulatedChip::new();
        write_reg(&mut chip, REG_MRWDP, 0x1F);
        write_reg(&mut chip, REG_MRWDP, 0xF8);
        assert_eq!(chip.memory_port_writes(), vec![0x1F, 0xF8]);
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(Frame::Command(0x04).to_string(), "CMD  0x04");
        assert_eq!(
            Frame::DataWrite { register: 0xE0, value: 0x29 }.to_string(),
            "WR   [0xe0] <- 0x29"
        );
    }
}
