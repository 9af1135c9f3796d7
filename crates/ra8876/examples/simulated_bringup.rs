//! RA8876 bring-up against the simulated controller.
//!
//! Runs the full init sequence, draws a few primitives and prints what went
//! over the bus. Set RUST_LOG=trace to see every decoded frame.
//! Run with: cargo run -p ra8876 --example simulated_bringup --features tracing

use core::fmt::Write as _;

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_hal_mock::eh1::delay::NoopDelay;
use ra8876::{Ra8876, Ra8876Config};
use ra8876_sim::SimulatedChip;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let chip = SimulatedChip::new();
    let config = Ra8876Config::default();
    let mut display = Ra8876::new(chip.clone(), Some(chip.reset_pin()), NoopDelay::new(), config);

    println!("RA8876 simulated bring-up");
    println!(
        "Panel: {}x{} @ {} kHz dot clock\n",
        config.display.width, config.display.height, config.display.dot_clock_khz
    );

    display.init()?;
    if let Some(plans) = display.clock_plans() {
        println!("  memory clock: {} kHz (n={}, k={})", plans.memory.freq_khz, plans.memory.n, plans.memory.k);
        println!("  core clock:   {} kHz (n={}, k={})", plans.core.freq_khz, plans.core.n, plans.core.k);
        println!("  scan clock:   {} kHz (n={}, k={})", plans.scan.freq_khz, plans.scan.n, plans.scan.k);
    }
    println!("  bring-up frames: {}\n", chip.frames().len());
    chip.clear_log();

    display.clear_screen(Rgb565::BLACK)?;
    display.fill_circle(Point::new(512, 300), 100, Rgb565::RED)?;
    display.draw_triangle(Point::new(100, 500), Point::new(300, 500), Point::new(200, 350), Rgb565::GREEN)?;
    Rectangle::new(Point::new(700, 50), Size::new(200, 120))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
        .draw(&mut display)?;

    display.set_cursor(20, 20)?;
    display.set_text_color(Rgb565::WHITE);
    writeln!(display, "RA8876 ready")?;

    println!("Drawing:");
    println!("  engine commands: {}", chip.draw_triggers().len());
    println!("  memory port bytes: {}", chip.memory_port_writes().len());
    println!("  frames: {}", chip.frames().len());

    Ok(())
}
