//! RA8876 register map
//!
//! Source: RAiO RA8876 Technical Specification v1.0
//!
//! # Multi-byte registers
//!
//! Addresses, widths and coordinates wider than 8 bits occupy consecutive
//! register addresses, least significant byte first. Only the `0` address
//! of each group is listed here; [`RegisterBus`](crate::RegisterBus)
//! derives N+1, N+2, N+3.
//!
//! # Status register
//!
//! The status register has no address. It is read with its own cycle type
//! (`0x40` prefix) and never needs a preceding command write.

// ---------------------------------------------------------------------------
// Host interface cycle prefixes
// ---------------------------------------------------------------------------

/// Command write: the following byte selects a register address.
pub const CMD_WRITE: u8 = 0x00;
/// Status read: the following dummy byte clocks out the status register.
pub const STATUS_READ: u8 = 0x40;
/// Data write to the currently selected register.
pub const DATA_WRITE: u8 = 0x80;
/// Data read from the currently selected register.
pub const DATA_READ: u8 = 0xC0;

// ---------------------------------------------------------------------------
// Status register bits
// ---------------------------------------------------------------------------

/// Host memory write FIFO full.
pub const STATUS_WRITE_FIFO_FULL: u8 = 0x80;
/// SDRAM ready for access.
pub const STATUS_SDRAM_READY: u8 = 0x40;
/// Core task busy (2D engine executing).
pub const STATUS_CORE_BUSY: u8 = 0x08;
/// Operation inhibited (still in reset, or not yet in normal mode).
pub const STATUS_INHIBIT: u8 = 0x02;

// ---------------------------------------------------------------------------
// Chip configuration
// ---------------------------------------------------------------------------

/// Software reset register. Bit 0 = reset (self-clearing).
pub const SRR: u8 = 0x00;
/// Chip configuration register.
///
/// bit 7 = PLL reconfigure (reads back 1 once all PLLs lock),
/// bits\[4:3\] = TFT output width, bit 0 = host data bus width.
pub const CCR: u8 = 0x01;
/// Memory access control register.
pub const MACR: u8 = 0x02;
/// Input control register. Bit 2 = text mode.
pub const ICR: u8 = 0x03;
/// Memory read/write data port.
pub const MRWDP: u8 = 0x04;

// ---------------------------------------------------------------------------
// PLL
// ---------------------------------------------------------------------------

/// Scan (pixel) clock PLL control 1: output divider `k << 1`.
pub const PPLLC1: u8 = 0x05;
/// Scan (pixel) clock PLL control 2: feedback multiplier `n`.
pub const PPLLC2: u8 = 0x06;
/// Memory clock PLL control 1.
pub const MPLLC1: u8 = 0x07;
/// Memory clock PLL control 2.
pub const MPLLC2: u8 = 0x08;
/// Core clock PLL control 1.
pub const SPLLC1: u8 = 0x09;
/// Core clock PLL control 2.
pub const SPLLC2: u8 = 0x0A;

// ---------------------------------------------------------------------------
// Display timing
// ---------------------------------------------------------------------------

/// Main/PIP window control. Bits\[3:2\] = main image color depth.
pub const MPWCTR: u8 = 0x10;
/// Display configuration register.
///
/// bit 7 = PCLK falling edge, bit 6 = display on, bit 5 = color bar test,
/// bit 3 = vertical scan direction, bits\[2:0\] = output color order.
pub const DPCR: u8 = 0x12;
/// Panel scan clock and data setting.
///
/// bit 7 = HSYNC polarity, bit 6 = VSYNC polarity, bit 5 = DE polarity.
pub const PCSR: u8 = 0x13;
/// Horizontal display width, in units of 8 pixels, minus 1.
pub const HDWR: u8 = 0x14;
/// Horizontal display width fine tune (0..=7).
pub const HDWFTR: u8 = 0x15;
/// Horizontal non-display period, in units of 8 pixels, minus 1.
pub const HNDR: u8 = 0x16;
/// Horizontal non-display period fine tune.
pub const HNDFTR: u8 = 0x17;
/// HSYNC start position, in units of 8 pixels, minus 1.
pub const HSTR: u8 = 0x18;
/// HSYNC pulse width, in units of 8 pixels, minus 1.
pub const HPWR: u8 = 0x19;
/// Vertical display height minus 1 (16-bit).
pub const VDHR0: u8 = 0x1A;
/// Vertical non-display period minus 1 (16-bit).
pub const VNDR0: u8 = 0x1C;
/// VSYNC start position minus 1.
pub const VSTR: u8 = 0x1E;
/// VSYNC pulse width minus 1.
pub const VPWR: u8 = 0x1F;

// ---------------------------------------------------------------------------
// Main window
// ---------------------------------------------------------------------------

/// Main image start address (32-bit).
pub const MISA0: u8 = 0x20;
/// Main image width (16-bit).
pub const MIW0: u8 = 0x24;
/// Main window upper-left X (16-bit).
pub const MWULX0: u8 = 0x26;
/// Main window upper-left Y (16-bit).
pub const MWULY0: u8 = 0x28;

// ---------------------------------------------------------------------------
// Canvas and active window
// ---------------------------------------------------------------------------

/// Canvas start address (32-bit).
pub const CVSSA0: u8 = 0x50;
/// Canvas image width (16-bit).
pub const CVS_IMWTH0: u8 = 0x54;
/// Active window upper-left X (16-bit).
pub const AWUL_X0: u8 = 0x56;
/// Active window upper-left Y (16-bit).
pub const AWUL_Y0: u8 = 0x58;
/// Active window width (16-bit).
pub const AW_WTH0: u8 = 0x5A;
/// Active window height (16-bit).
pub const AW_HT0: u8 = 0x5C;
/// Canvas addressing mode and color depth.
///
/// bit 2 = linear addressing, bits\[1:0\] = color depth.
pub const AW_COLOR: u8 = 0x5E;
/// Graphic read/write position X (16-bit).
pub const CURH0: u8 = 0x5F;
/// Graphic read/write position Y (16-bit).
pub const CURV0: u8 = 0x61;
/// Text cursor X (16-bit).
pub const F_CURX0: u8 = 0x63;
/// Text cursor Y (16-bit).
pub const F_CURY0: u8 = 0x65;

// ---------------------------------------------------------------------------
// 2D geometry engine
// ---------------------------------------------------------------------------

/// Draw control 0: line and triangle commands.
pub const DCR0: u8 = 0x67;
/// Point 1 X (16-bit).
pub const DLHSR0: u8 = 0x68;
/// Point 1 Y (16-bit).
pub const DLVSR0: u8 = 0x6A;
/// Point 2 X (16-bit).
pub const DLHER0: u8 = 0x6C;
/// Point 2 Y (16-bit).
pub const DLVER0: u8 = 0x6E;
/// Point 3 X (16-bit).
pub const DTPH0: u8 = 0x70;
/// Point 3 Y (16-bit).
pub const DTPV0: u8 = 0x72;
/// Draw control 1: rectangle and ellipse commands.
pub const DCR1: u8 = 0x76;
/// Ellipse major (horizontal) radius (16-bit).
pub const ELL_A0: u8 = 0x77;
/// Ellipse minor (vertical) radius (16-bit).
pub const ELL_B0: u8 = 0x79;
/// Ellipse centre X (16-bit).
pub const DEHR0: u8 = 0x7B;
/// Ellipse centre Y (16-bit).
pub const DEVR0: u8 = 0x7D;

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Character control 0: font size bits\[5:4\], encoding bits\[1:0\].
pub const CCR0: u8 = 0xCC;
/// Character control 1: bit 6 = transparent background,
/// bits\[3:2\] = X scale - 1, bits\[1:0\] = Y scale - 1.
pub const CCR1: u8 = 0xCD;
/// Foreground color, red channel (bits\[7:3\] used at 16 bpp).
pub const FGCR: u8 = 0xD2;
/// Foreground color, green channel (bits\[7:2\] used at 16 bpp).
pub const FGCG: u8 = 0xD3;
/// Foreground color, blue channel (bits\[7:3\] used at 16 bpp).
pub const FGCB: u8 = 0xD4;

// ---------------------------------------------------------------------------
// SDRAM
// ---------------------------------------------------------------------------

/// SDRAM attribute: bank count, row and column address widths.
pub const SDRAR: u8 = 0xE0;
/// SDRAM mode: CAS latency.
pub const SDRMD: u8 = 0xE1;
/// SDRAM auto refresh interval (16-bit).
pub const SDR_REF_ITVL0: u8 = 0xE2;
/// SDRAM control. Bit 0 = start initialization.
pub const SDRCR: u8 = 0xE4;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// SRR: start a software reset.
pub const SRR_SOFT_RESET: u8 = 0x01;
/// CCR: PLL reconfigure / lock.
pub const CCR_PLL_RECONFIGURE: u8 = 0x80;
/// SDRCR: start SDRAM initialization.
pub const SDRCR_INIT: u8 = 0x01;
/// ICR: text mode select.
pub const ICR_TEXT_MODE: u8 = 0x04;
/// DPCR: display on.
pub const DPCR_DISPLAY_ON: u8 = 0x40;
/// DPCR: color bar test pattern.
pub const DPCR_COLOR_BAR: u8 = 0x20;
/// AW_COLOR: linear (non-block) canvas addressing.
pub const AW_COLOR_LINEAR: u8 = 0x04;
/// CCR1: transparent character background.
pub const CCR1_TRANSPARENT: u8 = 0x40;
