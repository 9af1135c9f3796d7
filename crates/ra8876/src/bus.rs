//! Framed register transport.
//!
//! Every exchange with the RA8876 is a two-byte chip select window: a cycle
//! prefix followed by one byte of payload (or a dummy byte that clocks out
//! the response). One window maps to one [`SpiDevice`] transaction, so the
//! device implementation owns chip select and bus locking and releases both
//! on every exit path, including errors.
//!
//! Multi-byte registers are written and read as successive single-byte
//! accesses at N, N+1, ... least significant byte first.

use embedded_hal::spi::SpiDevice;

use crate::error::Error;
use crate::registers::{CMD_WRITE, DATA_READ, DATA_WRITE, STATUS_READ};

/// Host interface cycle type, the first byte of every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cycle {
    /// Select a register address.
    CommandWrite,
    /// Write the selected register.
    DataWrite,
    /// Read the selected register.
    DataRead,
    /// Read the status register (no address phase).
    StatusRead,
}

impl Cycle {
    /// Prefix byte sent before the payload.
    pub const fn prefix(self) -> u8 {
        match self {
            Self::CommandWrite => CMD_WRITE,
            Self::DataWrite => DATA_WRITE,
            Self::DataRead => DATA_READ,
            Self::StatusRead => STATUS_READ,
        }
    }
}

// ---------------------------------------------------------------------------
// RegisterBus
// ---------------------------------------------------------------------------

/// Register access layer on top of an [`SpiDevice`].
#[derive(Debug)]
pub struct RegisterBus<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> RegisterBus<SPI> {
    /// Wrap an SPI device. The device must be configured for SPI mode 0/3.
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the bus and return the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }

    fn write_cycle(&mut self, cycle: Cycle, byte: u8) -> Result<(), Error> {
        self.spi.write(&[cycle.prefix(), byte]).map_err(|_| Error::Bus)
    }

    fn read_cycle(&mut self, cycle: Cycle) -> Result<u8, Error> {
        let mut frame = [cycle.prefix(), 0x00];
        self.spi.transfer_in_place(&mut frame).map_err(|_| Error::Bus)?;
        let [_, response] = frame;
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Raw cycles
    // -----------------------------------------------------------------------

    /// Select `register` for the following data cycles.
    pub fn write_command(&mut self, register: u8) -> Result<(), Error> {
        self.write_cycle(Cycle::CommandWrite, register)
    }

    /// Write one byte to the selected register.
    pub fn write_data(&mut self, value: u8) -> Result<(), Error> {
        self.write_cycle(Cycle::DataWrite, value)
    }

    /// Read one byte from the selected register.
    pub fn read_data(&mut self) -> Result<u8, Error> {
        self.read_cycle(Cycle::DataRead)
    }

    /// Read the status register.
    pub fn read_status(&mut self) -> Result<u8, Error> {
        self.read_cycle(Cycle::StatusRead)
    }

    // -----------------------------------------------------------------------
    // Registers
    // -----------------------------------------------------------------------

    /// Write an 8-bit register.
    pub fn write_reg(&mut self, register: u8, value: u8) -> Result<(), Error> {
        self.write_command(register)?;
        self.write_data(value)
    }

    /// Read an 8-bit register.
    pub fn read_reg(&mut self, register: u8) -> Result<u8, Error> {
        self.write_command(register)?;
        self.read_data()
    }

    /// Write a 16-bit register pair starting at `register`.
    pub fn write_reg16(&mut self, register: u8, value: u16) -> Result<(), Error> {
        self.write_bytes(register, &value.to_le_bytes())
    }

    /// Read a 16-bit register pair starting at `register`.
    pub fn read_reg16(&mut self, register: u8) -> Result<u16, Error> {
        let mut bytes = [0u8; 2];
        self.read_bytes(register, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Write a 32-bit register group starting at `register`.
    pub fn write_reg32(&mut self, register: u8, value: u32) -> Result<(), Error> {
        self.write_bytes(register, &value.to_le_bytes())
    }

    /// Read a 32-bit register group starting at `register`.
    pub fn read_reg32(&mut self, register: u8) -> Result<u32, Error> {
        let mut bytes = [0u8; 4];
        self.read_bytes(register, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read `register`, apply `f`, and write the result back.
    pub fn modify_reg(&mut self, register: u8, f: impl FnOnce(u8) -> u8) -> Result<(), Error> {
        let value = self.read_reg(register)?;
        self.write_reg(register, f(value))
    }

    fn write_bytes(&mut self, register: u8, bytes: &[u8]) -> Result<(), Error> {
        let mut address = register;
        for &byte in bytes {
            self.write_reg(address, byte)?;
            address = address.wrapping_add(1);
        }
        Ok(())
    }

    fn read_bytes(&mut self, register: u8, bytes: &mut [u8]) -> Result<(), Error> {
        let mut address = register;
        for byte in bytes.iter_mut() {
            *byte = self.read_reg(address)?;
            address = address.wrapping_add(1);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn write_frame(prefix: u8, byte: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![prefix, byte]),
            SpiTransaction::transaction_end(),
        ]
    }

    fn read_frame(prefix: u8, response: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![prefix, 0x00], vec![0xFF, response]),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn test_write_reg_is_command_then_data() {
        let mut expectations = write_frame(CMD_WRITE, 0x12);
        expectations.extend(write_frame(DATA_WRITE, 0x40));
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        bus.write_reg(0x12, 0x40).unwrap();

        spi.done();
    }

    #[test]
    fn test_read_reg_clocks_dummy_byte() {
        let mut expectations = write_frame(CMD_WRITE, 0x01);
        expectations.extend(read_frame(DATA_READ, 0x80));
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        assert_eq!(bus.read_reg(0x01).unwrap(), 0x80);

        spi.done();
    }

    #[test]
    fn test_status_read_skips_command_write() {
        let expectations = read_frame(STATUS_READ, 0x48);
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        assert_eq!(bus.read_status().unwrap(), 0x48);

        spi.done();
    }

    #[test]
    fn test_write_reg16_low_byte_first() {
        let mut expectations = Vec::new();
        expectations.extend(write_frame(CMD_WRITE, 0x5A));
        expectations.extend(write_frame(DATA_WRITE, 0x00));
        expectations.extend(write_frame(CMD_WRITE, 0x5B));
        expectations.extend(write_frame(DATA_WRITE, 0x04));
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        bus.write_reg16(0x5A, 1024).unwrap();

        spi.done();
    }

    #[test]
    fn test_write_reg32_walks_four_addresses() {
        let mut expectations = Vec::new();
        for (offset, byte) in [0x78u8, 0x56, 0x34, 0x12].into_iter().enumerate() {
            expectations.extend(write_frame(CMD_WRITE, 0x50 + offset as u8));
            expectations.extend(write_frame(DATA_WRITE, byte));
        }
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        bus.write_reg32(0x50, 0x1234_5678).unwrap();

        spi.done();
    }

    #[test]
    fn test_read_reg16_assembles_little_endian() {
        let mut expectations = Vec::new();
        expectations.extend(write_frame(CMD_WRITE, 0x63));
        expectations.extend(read_frame(DATA_READ, 0x20));
        expectations.extend(write_frame(CMD_WRITE, 0x64));
        expectations.extend(read_frame(DATA_READ, 0x01));
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        assert_eq!(bus.read_reg16(0x63).unwrap(), 0x0120);

        spi.done();
    }

    #[test]
    fn test_modify_reg_reads_then_writes() {
        let mut expectations = Vec::new();
        expectations.extend(write_frame(CMD_WRITE, 0x03));
        expectations.extend(read_frame(DATA_READ, 0x01));
        expectations.extend(write_frame(CMD_WRITE, 0x03));
        expectations.extend(write_frame(DATA_WRITE, 0x05));
        let mut spi = SpiMock::new(&expectations);

        let mut bus = RegisterBus::new(spi.clone());
        bus.modify_reg(0x03, |icr| icr | 0x04).unwrap();

        spi.done();
    }

    #[test]
    fn test_cycle_prefixes() {
        assert_eq!(Cycle::CommandWrite.prefix(), 0x00);
        assert_eq!(Cycle::StatusRead.prefix(), 0x40);
        assert_eq!(Cycle::DataWrite.prefix(), 0x80);
        assert_eq!(Cycle::DataRead.prefix(), 0xC0);
    }
}
