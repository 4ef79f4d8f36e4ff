//! Mock bus implementations.
//!
//! In-memory stand-ins for the Linux drivers, for testing callers without
//! physical hardware. Both mocks apply the same argument validation and
//! closed-handle checks as the real drivers, so contract tests written
//! against them hold for the kernel-backed implementations too.
//!
//! # Available Mocks
//!
//! - [`MockGpioChip`] - line set with per-line direction/polarity, plus a
//!   [`MockGpioChip::drive`] knob to simulate the peripheral side of an
//!   input line
//! - [`MockSpiDevice`] - records transmitted frames and returns scripted
//!   response bytes queued by the test

use std::collections::VecDeque;

use crate::error::{BusError, Result};
use crate::gpio::{validate_request, GpioBus};
use crate::pin::{PinConfig, PinDirection, PinState};
use crate::spi::{SpiBus, SpiMode};

// =============================================================================
// MockGpioChip
// =============================================================================

struct MockLine {
    offset: u32,
    config: PinConfig,
    state: PinState,
}

/// Mock GPIO chip holding its line states in memory.
///
/// Output lines start at their configured initial state; input lines
/// start inactive and can be moved from the outside with
/// [`MockGpioChip::drive`].
pub struct MockGpioChip {
    inner: Option<Vec<MockLine>>,
}

impl MockGpioChip {
    /// Create a mock chip claiming `lines` with per-line configuration.
    ///
    /// Applies the same structural validation as [`crate::GpioChip::open`]:
    /// non-empty, duplicate-free lines with a matching configuration
    /// count.
    pub fn open(lines: &[u32], config: &[PinConfig]) -> Result<MockGpioChip> {
        validate_request(lines, config)?;
        let lines = lines
            .iter()
            .zip(config)
            .map(|(&offset, &cfg)| MockLine {
                offset,
                config: cfg,
                state: match cfg.direction {
                    PinDirection::Out => cfg.state,
                    PinDirection::In => PinState::Inactive,
                },
            })
            .collect();
        Ok(MockGpioChip { inner: Some(lines) })
    }

    /// Force a line to a state from the peripheral side, regardless of
    /// its direction. Lets tests present input levels for `get` to read.
    pub fn drive(&mut self, line: u32, state: PinState) -> Result<()> {
        let lines = self.inner.as_mut().ok_or(BusError::InvalidHandle)?;
        let entry = lines
            .iter_mut()
            .find(|l| l.offset == line)
            .ok_or_else(|| {
                BusError::InvalidArgument(format!(
                    "GPIO line {line} was not requested at open time"
                ))
            })?;
        entry.state = state;
        Ok(())
    }
}

impl GpioBus for MockGpioChip {
    fn get(&mut self, lines: &[u32]) -> Result<Vec<PinConfig>> {
        let held = self.inner.as_ref().ok_or(BusError::InvalidHandle)?;
        let mut values = Vec::with_capacity(lines.len());
        for &offset in lines {
            let line = held.iter().find(|l| l.offset == offset).ok_or_else(|| {
                BusError::InvalidArgument(format!(
                    "GPIO line {offset} was not requested at open time"
                ))
            })?;
            let mut cfg = line.config;
            cfg.state = line.state;
            values.push(cfg);
        }
        Ok(values)
    }

    fn set(&mut self, lines: &[u32], values: &[PinState]) -> Result<()> {
        let held = self.inner.as_mut().ok_or(BusError::InvalidHandle)?;
        if lines.len() != values.len() {
            return Err(BusError::InvalidArgument(format!(
                "GPIO line and value counts differ: {} and {}",
                lines.len(),
                values.len()
            )));
        }
        // Validate every target before touching any line.
        for &offset in lines {
            let line = held.iter().find(|l| l.offset == offset).ok_or_else(|| {
                BusError::InvalidArgument(format!(
                    "GPIO line {offset} was not requested at open time"
                ))
            })?;
            if line.config.direction != PinDirection::Out {
                return Err(BusError::InvalidArgument(format!(
                    "GPIO line {offset} was not requested as an output"
                )));
            }
        }
        for (&offset, &state) in lines.iter().zip(values) {
            if let Some(line) = held.iter_mut().find(|l| l.offset == offset) {
                line.state = state;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.take().map(|_| ()).ok_or(BusError::InvalidHandle)
    }
}

// =============================================================================
// MockSpiDevice
// =============================================================================

struct MockSpiState {
    half_duplex: bool,
    responses: VecDeque<u8>,
    written: Vec<Vec<u8>>,
}

/// Mock SPI device that records writes and replays queued responses.
///
/// Response bytes are consumed in queue order; once the queue is empty,
/// zero bytes are returned, matching an idle bus.
pub struct MockSpiDevice {
    inner: Option<MockSpiState>,
}

impl MockSpiDevice {
    /// Create a mock device with the given mode.
    pub fn open(mode: SpiMode) -> MockSpiDevice {
        MockSpiDevice {
            inner: Some(MockSpiState {
                half_duplex: mode.half_duplex,
                responses: VecDeque::new(),
                written: Vec::new(),
            }),
        }
    }

    /// Queue bytes for subsequent `io` calls to return.
    pub fn queue_response(&mut self, bytes: &[u8]) {
        if let Some(state) = self.inner.as_mut() {
            state.responses.extend(bytes);
        }
    }

    /// Frames transmitted so far, one entry per `io` call that sent data.
    pub fn written(&self) -> &[Vec<u8>] {
        match &self.inner {
            Some(state) => &state.written,
            None => &[],
        }
    }
}

impl SpiBus for MockSpiDevice {
    fn io(&mut self, output: &[u8], input_len: usize, split: bool) -> Result<Vec<u8>> {
        let state = self.inner.as_mut().ok_or(BusError::InvalidHandle)?;
        if state.half_duplex && !split && !output.is_empty() && input_len > 0 {
            return Err(BusError::InvalidArgument(
                "half-duplex device cannot transmit and receive simultaneously".into(),
            ));
        }
        if !output.is_empty() {
            state.written.push(output.to_vec());
        }
        let len = if split {
            input_len
        } else {
            output.len().max(input_len)
        };
        let mut received = Vec::with_capacity(len);
        for _ in 0..len {
            received.push(state.responses.pop_front().unwrap_or(0));
        }
        Ok(received)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.take().map(|_| ()).ok_or(BusError::InvalidHandle)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::PinPolarity;

    fn three_line_chip() -> MockGpioChip {
        MockGpioChip::open(
            &[2, 5, 7],
            &[
                PinConfig::input(),
                PinConfig::output(PinState::Inactive),
                PinConfig::output(PinState::Active).active_low(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_gpio_get_returns_requested_order() {
        let mut chip = three_line_chip();
        chip.drive(2, PinState::Active).unwrap();

        let values = chip.get(&[7, 2]).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].state, PinState::Active); // line 7 initial
        assert_eq!(values[0].polarity, PinPolarity::ActiveLow);
        assert_eq!(values[1].state, PinState::Active); // line 2, driven
        assert_eq!(values[1].direction, PinDirection::In);
    }

    #[test]
    fn test_gpio_get_unknown_line_rejected() {
        let mut chip = three_line_chip();
        assert!(matches!(
            chip.get(&[3]),
            Err(BusError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_gpio_set_rejects_input_line() {
        let mut chip = three_line_chip();
        let before = chip.get(&[5]).unwrap()[0].state;

        // Line 2 is an input; nothing may be written, not even line 5.
        let result = chip.set(&[5, 2], &[PinState::Active, PinState::Active]);
        assert!(matches!(result, Err(BusError::InvalidArgument(_))));
        assert_eq!(chip.get(&[5]).unwrap()[0].state, before);
    }

    #[test]
    fn test_gpio_set_and_read_back() {
        let mut chip = three_line_chip();
        chip.set(&[5, 7], &[PinState::Active, PinState::Inactive])
            .unwrap();
        let values = chip.get(&[5, 7]).unwrap();
        assert_eq!(values[0].state, PinState::Active);
        assert_eq!(values[1].state, PinState::Inactive);
    }

    #[test]
    fn test_gpio_single_pin_helpers() {
        let mut chip = three_line_chip();
        chip.set_pin(5, PinState::Active).unwrap();
        assert_eq!(chip.get_pin(5).unwrap().state, PinState::Active);
    }

    #[test]
    fn test_gpio_closed_chip_rejects_everything() {
        let mut chip = three_line_chip();
        chip.close().unwrap();

        assert!(matches!(chip.get(&[2]), Err(BusError::InvalidHandle)));
        assert!(matches!(
            chip.set(&[5], &[PinState::Active]),
            Err(BusError::InvalidHandle)
        ));
        assert!(matches!(chip.close(), Err(BusError::InvalidHandle)));
    }

    #[test]
    fn test_gpio_chips_are_independent() {
        let mut a = MockGpioChip::open(&[1], &[PinConfig::output(PinState::Inactive)]).unwrap();
        let mut b = MockGpioChip::open(&[1], &[PinConfig::output(PinState::Inactive)]).unwrap();

        a.set(&[1], &[PinState::Active]).unwrap();
        assert_eq!(b.get(&[1]).unwrap()[0].state, PinState::Inactive);
    }

    #[test]
    fn test_spi_full_duplex_length_is_max() {
        let mut spi = MockSpiDevice::open(SpiMode::default());
        spi.queue_response(&[0xa0, 0xa1]);

        let received = spi.io(&[1, 2, 3, 4], 2, false).unwrap();
        assert_eq!(received, vec![0xa0, 0xa1, 0, 0]);
        assert_eq!(spi.written(), &[vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_spi_half_duplex_length_is_input_len() {
        let mut spi = MockSpiDevice::open(SpiMode::default());
        spi.queue_response(&[0xb0, 0xb1, 0xb2]);

        let received = spi.io(&[1, 2, 3, 4], 2, true).unwrap();
        assert_eq!(received, vec![0xb0, 0xb1]);
    }

    #[test]
    fn test_spi_half_duplex_mode_rejects_simultaneous_io() {
        let mode = SpiMode {
            half_duplex: true,
            ..SpiMode::default()
        };
        let mut spi = MockSpiDevice::open(mode);

        assert!(matches!(
            spi.io(&[1], 1, false),
            Err(BusError::InvalidArgument(_))
        ));
        // Sequential phases are fine on the same device.
        assert_eq!(spi.io(&[1], 1, true).unwrap().len(), 1);
    }

    #[test]
    fn test_spi_closed_device_rejects_io() {
        let mut spi = MockSpiDevice::open(SpiMode::default());
        spi.close().unwrap();

        assert!(matches!(spi.io(&[1], 0, false), Err(BusError::InvalidHandle)));
        assert!(matches!(spi.close(), Err(BusError::InvalidHandle)));
    }
}
