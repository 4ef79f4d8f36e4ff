//! # pinbus
//!
//! Low-level access to Linux GPIO lines and SPI buses behind a compact,
//! bit-packed configuration protocol. This crate is the only layer that
//! touches the kernel device interfaces; everything above it — the logic
//! deciding when to assert a pin or what to send over the bus — calls in
//! through the [`GpioBus`] and [`SpiBus`] traits.
//!
//! ## Crate Structure
//!
//! - **`pin`**: The per-line configuration model: [`PinState`],
//!   [`PinDirection`], [`PinPolarity`], and [`PinConfig`] with its packed
//!   byte encoding. Raw bit manipulation stays inside this module.
//! - **`gpio`**: The [`GpioBus`] trait and [`GpioChip`], which claims a
//!   fixed set of lines on a GPIO character device via `gpio-cdev` and
//!   reads/writes their logical state.
//! - **`spi`**: The [`SpiBus`] trait, the packed [`SpiMode`] record, and
//!   [`SpiDevice`], which performs full- and half-duplex transfers over a
//!   spidev node.
//! - **`mock`**: In-memory [`MockGpioChip`] and [`MockSpiDevice`] sharing
//!   the drivers' validation, for callers and tests without hardware.
//! - **`error`**: The [`BusError`] taxonomy and crate-wide [`Result`].
//!
//! ## Concurrency
//!
//! Every operation is synchronous and blocks the calling thread until the
//! kernel returns; there are no background threads, timeouts, or internal
//! locks. Handles take `&mut self`, so one handle cannot be used from two
//! threads without caller-supplied exclusion, while distinct handles are
//! fully independent.

pub mod error;
pub mod gpio;
pub mod mock;
pub mod pin;
pub mod spi;

pub use error::{BusError, Result};
pub use gpio::{GpioBus, GpioChip};
pub use mock::{MockGpioChip, MockSpiDevice};
pub use pin::{PinConfig, PinDirection, PinPolarity, PinState};
pub use spi::{ClockMode, SpiBus, SpiDevice, SpiMode};
