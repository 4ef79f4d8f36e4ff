//! GPIO line driver over the Linux character device interface.
//!
//! [`GpioChip::open`] claims a fixed set of lines on one GPIO controller
//! through the `gpio-cdev` crate, each with its own direction, polarity,
//! and initial state. The returned handle owns the kernel line requests
//! until [`GpioBus::close`] releases them.
//!
//! All calls are synchronous and block the invoking thread for the
//! duration of the kernel I/O. The driver performs no internal locking;
//! a handle takes `&mut self` for every operation, so sharing one across
//! threads requires caller-side mutual exclusion. Distinct handles are
//! fully independent.

use std::path::Path;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use log::{debug, info};

use crate::error::{BusError, Result};
use crate::pin::{PinConfig, PinDirection, PinPolarity, PinState};

/// Synchronous access to a set of GPIO lines claimed at open time.
///
/// Implemented by [`GpioChip`] for real hardware and by
/// [`crate::mock::MockGpioChip`] for tests. All operations fail with
/// [`BusError::InvalidHandle`] once the handle has been closed.
pub trait GpioBus {
    /// Read the logical state of the given lines.
    ///
    /// Returns one [`PinConfig`] per requested line, in request order,
    /// with the state freshly read and direction/polarity echoing the
    /// open-time configuration. Lines may be any subset of the open-time
    /// line set, in any order; a line outside the set fails with
    /// [`BusError::InvalidArgument`].
    fn get(&mut self, lines: &[u32]) -> Result<Vec<PinConfig>>;

    /// Write logical state to the given output lines.
    ///
    /// `values` carries one [`PinState`] per entry in `lines`. Every
    /// targeted line must have been requested as an output; otherwise the
    /// call fails with [`BusError::InvalidArgument`] before any line is
    /// written. The kernel applies each line's configured polarity
    /// inversion.
    fn set(&mut self, lines: &[u32], values: &[PinState]) -> Result<()>;

    /// Release the line reservations and invalidate the handle.
    ///
    /// Any further operation, including a second `close`, fails with
    /// [`BusError::InvalidHandle`].
    fn close(&mut self) -> Result<()>;

    /// Read a single line.
    fn get_pin(&mut self, line: u32) -> Result<PinConfig> {
        self.get(std::slice::from_ref(&line))?
            .pop()
            .ok_or_else(|| BusError::io("GPIO read", "driver returned no value"))
    }

    /// Write a single output line.
    fn set_pin(&mut self, line: u32, state: PinState) -> Result<()> {
        self.set(std::slice::from_ref(&line), std::slice::from_ref(&state))
    }
}

/// Reject structurally invalid open parameters before any kernel call.
pub(crate) fn validate_request(lines: &[u32], config: &[PinConfig]) -> Result<()> {
    if lines.is_empty() {
        return Err(BusError::InvalidArgument(
            "no GPIO lines requested".into(),
        ));
    }
    if lines.len() != config.len() {
        return Err(BusError::InvalidArgument(format!(
            "GPIO line and configuration counts differ: {} and {}",
            lines.len(),
            config.len()
        )));
    }
    for (i, line) in lines.iter().enumerate() {
        if lines[..i].contains(line) {
            return Err(BusError::InvalidArgument(format!(
                "GPIO line {line} requested more than once"
            )));
        }
    }
    Ok(())
}

struct RequestedLine {
    offset: u32,
    config: PinConfig,
    handle: LineHandle,
}

struct OpenChip {
    device: String,
    lines: Vec<RequestedLine>,
}

/// An open GPIO chip holding kernel requests for a fixed line set.
///
/// The constructor is [`GpioChip::open`]; the only destructor is
/// [`GpioBus::close`]. Dropping an unclosed handle still releases the
/// kernel requests, but close failures are then invisible to the caller.
pub struct GpioChip {
    inner: Option<OpenChip>,
}

impl GpioChip {
    /// Claim `lines` on the chip at `device` with per-line configuration.
    ///
    /// # Arguments
    /// * `device` - GPIO character device node (e.g. `/dev/gpiochip0`)
    /// * `consumer` - label the kernel reports as the lines' owner
    /// * `lines` - non-empty line offsets on the chip, no duplicates
    /// * `config` - one [`PinConfig`] per line, same length and order
    ///
    /// Structural problems (length mismatch, duplicate or out-of-range
    /// line) fail with [`BusError::InvalidArgument`]; an unopenable device
    /// or already-claimed line fails with
    /// [`BusError::ResourceUnavailable`].
    pub fn open(
        device: impl AsRef<Path>,
        consumer: &str,
        lines: &[u32],
        config: &[PinConfig],
    ) -> Result<GpioChip> {
        validate_request(lines, config)?;
        let path = device.as_ref();

        let mut chip = Chip::new(path).map_err(|e| {
            BusError::unavailable(&format!("failed to open GPIO device {}", path.display()), e)
        })?;
        let num_lines = chip.num_lines();
        if let Some(bad) = lines.iter().find(|&&line| line >= num_lines) {
            return Err(BusError::InvalidArgument(format!(
                "GPIO line {bad} out of range for {} ({num_lines} lines)",
                path.display()
            )));
        }

        let mut requested = Vec::with_capacity(lines.len());
        for (&offset, &cfg) in lines.iter().zip(config) {
            let mut flags = match cfg.direction {
                PinDirection::In => LineRequestFlags::INPUT,
                PinDirection::Out => LineRequestFlags::OUTPUT,
            };
            if cfg.polarity == PinPolarity::ActiveLow {
                flags |= LineRequestFlags::ACTIVE_LOW;
            }
            let initial = if cfg.state.is_active() { 1 } else { 0 };
            let handle = chip
                .get_line(offset)
                .and_then(|line| line.request(flags, initial, consumer))
                .map_err(|e| {
                    BusError::unavailable(
                        &format!(
                            "failed to request GPIO line {offset} on {}",
                            path.display()
                        ),
                        e,
                    )
                })?;
            requested.push(RequestedLine {
                offset,
                config: cfg,
                handle,
            });
        }

        info!(
            "opened GPIO chip {} with {} line(s) for '{consumer}'",
            path.display(),
            requested.len()
        );
        Ok(GpioChip {
            inner: Some(OpenChip {
                device: path.display().to_string(),
                lines: requested,
            }),
        })
    }
}

impl GpioBus for GpioChip {
    fn get(&mut self, lines: &[u32]) -> Result<Vec<PinConfig>> {
        let open = self.inner.as_ref().ok_or(BusError::InvalidHandle)?;
        let mut values = Vec::with_capacity(lines.len());
        for &offset in lines {
            let line = open
                .lines
                .iter()
                .find(|l| l.offset == offset)
                .ok_or_else(|| {
                    BusError::InvalidArgument(format!(
                        "GPIO line {offset} was not requested at open time"
                    ))
                })?;
            let raw = line.handle.get_value().map_err(|e| {
                BusError::io(&format!("failed to read GPIO line {offset}"), e)
            })?;
            let mut cfg = line.config;
            cfg.state = if raw != 0 {
                PinState::Active
            } else {
                PinState::Inactive
            };
            values.push(cfg);
        }
        Ok(values)
    }

    fn set(&mut self, lines: &[u32], values: &[PinState]) -> Result<()> {
        let open = self.inner.as_ref().ok_or(BusError::InvalidHandle)?;
        if lines.len() != values.len() {
            return Err(BusError::InvalidArgument(format!(
                "GPIO line and value counts differ: {} and {}",
                lines.len(),
                values.len()
            )));
        }

        // Validate every target before touching any line.
        let mut targets = Vec::with_capacity(lines.len());
        for &offset in lines {
            let line = open
                .lines
                .iter()
                .find(|l| l.offset == offset)
                .ok_or_else(|| {
                    BusError::InvalidArgument(format!(
                        "GPIO line {offset} was not requested at open time"
                    ))
                })?;
            if line.config.direction != PinDirection::Out {
                return Err(BusError::InvalidArgument(format!(
                    "GPIO line {offset} was not requested as an output"
                )));
            }
            targets.push(line);
        }

        for (line, &state) in targets.iter().zip(values) {
            let raw = if state.is_active() { 1 } else { 0 };
            line.handle.set_value(raw).map_err(|e| {
                BusError::io(
                    &format!("failed to write GPIO line {}", line.offset),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let open = self.inner.take().ok_or(BusError::InvalidHandle)?;
        info!("closed GPIO chip {}", open.device);
        // Dropping the line handles releases the kernel requests.
        Ok(())
    }
}

impl Drop for GpioChip {
    fn drop(&mut self) {
        if let Some(open) = self.inner.take() {
            debug!("releasing GPIO chip {} on drop", open.device);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
