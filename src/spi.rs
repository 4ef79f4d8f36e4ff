//! SPI bus driver over the Linux spidev interface.
//!
//! [`SpiDevice::open`] configures one spidev node (one bus/chip-select
//! pair) with a clock speed and a packed [`SpiMode`], then performs
//! synchronous byte transfers through [`SpiBus::io`]. Full-duplex calls
//! exchange bytes in both directions simultaneously; half-duplex calls
//! clock the whole output phase before the receive phase begins.
//!
//! Like the GPIO driver, every call blocks the invoking thread until the
//! kernel returns, and a descriptor requires caller-side mutual exclusion
//! if shared across threads.

use std::path::Path;

use log::{debug, info};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::error::{BusError, Result};

const CLOCK_MODE_MASK: u8 = 0b11;
const LSB_FIRST: u8 = 1 << 2;
const HALF_DUPLEX: u8 = 1 << 3;
const RESERVED_MASK: u8 = !(CLOCK_MODE_MASK | LSB_FIRST | HALF_DUPLEX);

/// Module parameter holding the kernel's per-message transfer limit.
const BUFSIZ_PARAM: &str = "/sys/module/spidev/parameters/bufsiz";

/// SPI clock polarity/phase combination (modes 0 through 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// CPOL=0, CPHA=0.
    Mode0,
    /// CPOL=0, CPHA=1.
    Mode1,
    /// CPOL=1, CPHA=0.
    Mode2,
    /// CPOL=1, CPHA=1.
    Mode3,
}

/// Packed SPI device mode: clock mode, bit order, and duplex selection.
///
/// The byte form places the clock mode in bits 0–1, LSB-first in bit 2,
/// and half-duplex (3-wire) in bit 3; bits 4–7 are reserved. As with
/// [`crate::pin::PinConfig`], calling code uses the typed record and the
/// byte encoding exists only at the protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiMode {
    /// Clock polarity and phase.
    pub clock: ClockMode,
    /// Transmit least-significant bit first instead of most-significant.
    pub lsb_first: bool,
    /// Use a shared 3-wire data line; transmit and receive phases must
    /// then be sequential.
    pub half_duplex: bool,
}

impl Default for SpiMode {
    fn default() -> Self {
        SpiMode {
            clock: ClockMode::Mode0,
            lsb_first: false,
            half_duplex: false,
        }
    }
}

impl SpiMode {
    /// Encode into the packed byte form.
    pub fn pack(self) -> u8 {
        let mut bits = match self.clock {
            ClockMode::Mode0 => 0,
            ClockMode::Mode1 => 1,
            ClockMode::Mode2 => 2,
            ClockMode::Mode3 => 3,
        };
        if self.lsb_first {
            bits |= LSB_FIRST;
        }
        if self.half_duplex {
            bits |= HALF_DUPLEX;
        }
        bits
    }

    /// Decode from the packed byte form.
    ///
    /// Fails with [`BusError::InvalidArgument`] if any bit outside the
    /// recognized set (0–3) is set.
    pub fn unpack(bits: u8) -> Result<Self> {
        if bits & RESERVED_MASK != 0 {
            return Err(BusError::InvalidArgument(format!(
                "unrecognized bits set in SPI mode byte 0x{bits:02x}"
            )));
        }
        Ok(SpiMode {
            clock: match bits & CLOCK_MODE_MASK {
                1 => ClockMode::Mode1,
                2 => ClockMode::Mode2,
                3 => ClockMode::Mode3,
                _ => ClockMode::Mode0,
            },
            lsb_first: bits & LSB_FIRST != 0,
            half_duplex: bits & HALF_DUPLEX != 0,
        })
    }

    fn to_flags(self) -> SpiModeFlags {
        let mut flags = match self.clock {
            ClockMode::Mode0 => SpiModeFlags::SPI_MODE_0,
            ClockMode::Mode1 => SpiModeFlags::SPI_MODE_1,
            ClockMode::Mode2 => SpiModeFlags::SPI_MODE_2,
            ClockMode::Mode3 => SpiModeFlags::SPI_MODE_3,
        };
        // Chip select is wired active-high; the kernel default is active-low.
        flags |= SpiModeFlags::SPI_CS_HIGH;
        if self.lsb_first {
            flags |= SpiModeFlags::SPI_LSB_FIRST;
        }
        if self.half_duplex {
            flags |= SpiModeFlags::SPI_3WIRE;
        }
        flags
    }
}

/// Synchronous byte transfers over an open SPI device.
///
/// Implemented by [`SpiDevice`] for real hardware and by
/// [`crate::mock::MockSpiDevice`] for tests.
pub trait SpiBus {
    /// Exchange bytes with the device.
    ///
    /// With `split` false the exchange is full-duplex: transmit and
    /// receive happen simultaneously and the returned buffer has length
    /// `max(output.len(), input_len)`, zero bytes being clocked out once
    /// `output` is drained. With `split` true the exchange is
    /// half-duplex: all of `output` is clocked out first, then exactly
    /// `input_len` bytes are clocked in.
    ///
    /// The call either completes the full exchange or fails; no partial
    /// buffer is ever returned.
    fn io(&mut self, output: &[u8], input_len: usize, split: bool) -> Result<Vec<u8>>;

    /// Release the device and invalidate the descriptor.
    fn close(&mut self) -> Result<()>;

    /// Receive `count` bytes while transmitting zeros.
    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.io(&[], count, false)
    }

    /// Transmit `output`, discarding anything received.
    fn write(&mut self, output: &[u8]) -> Result<()> {
        self.io(output, 0, false).map(|_| ())
    }

    /// Transmit a single byte.
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write(std::slice::from_ref(&byte))
    }
}

struct OpenSpi {
    device: String,
    spi: Spidev,
    half_duplex: bool,
    bufsiz: usize,
}

/// An open SPI device node.
///
/// The constructor is [`SpiDevice::open`]; the only destructor is
/// [`SpiBus::close`]. Dropping an unclosed descriptor releases the file
/// descriptor without reporting close failures.
pub struct SpiDevice {
    inner: Option<OpenSpi>,
}

impl SpiDevice {
    /// Open and configure the spidev node at `device`.
    ///
    /// # Arguments
    /// * `device` - spidev node (e.g. `/dev/spidev0.0`)
    /// * `hz` - requested clock frequency; hardware may round it down
    /// * `mode` - clock mode, bit order, and duplex selection
    ///
    /// The device is configured for 8-bit words with chip select active
    /// high. Failure to open or configure the node fails with
    /// [`BusError::ResourceUnavailable`].
    pub fn open(device: impl AsRef<Path>, hz: u32, mode: SpiMode) -> Result<SpiDevice> {
        let path = device.as_ref();
        let bufsiz = read_spidev_bufsiz()?;

        let mut spi = Spidev::open(path).map_err(|e| {
            BusError::unavailable(&format!("failed to open SPI device {}", path.display()), e)
        })?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(hz)
            .lsb_first(mode.lsb_first)
            .mode(mode.to_flags())
            .build();
        spi.configure(&options).map_err(|e| {
            BusError::unavailable(
                &format!("failed to configure SPI device {}", path.display()),
                e,
            )
        })?;

        info!(
            "opened SPI device {} at {hz} Hz (mode 0x{:02x})",
            path.display(),
            mode.pack()
        );
        Ok(SpiDevice {
            inner: Some(OpenSpi {
                device: path.display().to_string(),
                spi,
                half_duplex: mode.half_duplex,
                bufsiz,
            }),
        })
    }
}

impl SpiBus for SpiDevice {
    fn io(&mut self, output: &[u8], input_len: usize, split: bool) -> Result<Vec<u8>> {
        let open = self.inner.as_mut().ok_or(BusError::InvalidHandle)?;
        if open.half_duplex && !split && !output.is_empty() && input_len > 0 {
            return Err(BusError::InvalidArgument(
                "half-duplex device cannot transmit and receive simultaneously".into(),
            ));
        }
        if output.is_empty() && input_len == 0 {
            return Ok(Vec::new());
        }
        if split {
            half_duplex_transfer(open, output, input_len)
        } else {
            full_duplex_transfer(open, output, input_len)
        }
    }

    fn close(&mut self) -> Result<()> {
        let open = self.inner.take().ok_or(BusError::InvalidHandle)?;
        info!("closed SPI device {}", open.device);
        Ok(())
    }
}

impl Drop for SpiDevice {
    fn drop(&mut self) {
        if let Some(open) = self.inner.take() {
            debug!("releasing SPI device {} on drop", open.device);
        }
    }
}

/// One simultaneous exchange covering the longer of the two directions.
fn full_duplex_transfer(open: &mut OpenSpi, output: &[u8], input_len: usize) -> Result<Vec<u8>> {
    let len = output.len().max(input_len);
    let mut tx = vec![0u8; len];
    tx[..output.len()].copy_from_slice(output);
    let mut rx = vec![0u8; len];

    {
        let mut transfer = SpidevTransfer::read_write(&tx, &mut rx);
        open.spi.transfer(&mut transfer).map_err(|e| {
            BusError::io(&format!("SPI transfer failed on {}", open.device), e)
        })?;
    }
    Ok(rx)
}

/// Transmit phase then receive phase, each kernel message bounded by the
/// spidev buffer size and packing both phases together when they fit.
fn half_duplex_transfer(open: &mut OpenSpi, output: &[u8], input_len: usize) -> Result<Vec<u8>> {
    let mut rx = vec![0u8; input_len];
    let mut sent = 0;
    let mut received = 0;

    while sent < output.len() || received < input_len {
        let tx_len = (output.len() - sent).min(open.bufsiz);
        let rx_len = (input_len - received).min(open.bufsiz - tx_len);

        let tx_chunk = &output[sent..sent + tx_len];
        let rx_chunk = &mut rx[received..received + rx_len];
        let mut transfers = Vec::with_capacity(2);
        if tx_len > 0 {
            transfers.push(SpidevTransfer::write(tx_chunk));
        }
        if rx_len > 0 {
            transfers.push(SpidevTransfer::read(rx_chunk));
        }
        open.spi.transfer_multiple(&mut transfers).map_err(|e| {
            BusError::io(&format!("SPI transfer failed on {}", open.device), e)
        })?;

        sent += tx_len;
        received += rx_len;
    }
    Ok(rx)
}

/// Read the kernel's spidev transfer size limit.
fn read_spidev_bufsiz() -> Result<usize> {
    let text = std::fs::read_to_string(BUFSIZ_PARAM)
        .map_err(|e| BusError::unavailable("failed to read spidev bufsiz", e))?;
    match text.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(BusError::ResourceUnavailable(format!(
            "failed to parse spidev bufsiz: {}",
            text.trim()
        ))),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
