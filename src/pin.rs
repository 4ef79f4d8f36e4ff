//! GPIO pin configuration model.
//!
//! A pin's requested state travels between layers as a single packed byte
//! with three independent fields:
//!
//! | bit | field     | values                        |
//! |-----|-----------|-------------------------------|
//! | 0   | state     | 0 inactive, 1 active          |
//! | 1   | direction | 0 input, 1 output             |
//! | 2   | polarity  | 0 active-high, 1 active-low   |
//!
//! Bits 3–7 are reserved and must be zero. Calling code works with the
//! typed [`PinConfig`] record; the byte form exists only for callers that
//! speak the packed protocol, via [`PinConfig::pack`] and
//! [`PinConfig::unpack`]. No raw bit manipulation leaks past this module.

use crate::error::{BusError, Result};

const STATE_MASK: u8 = 1;
const STATE_ACTIVE: u8 = 1;
const DIR_MASK: u8 = 1 << 1;
const DIR_OUT: u8 = 1 << 1;
const POLARITY_MASK: u8 = 1 << 2;
const ACTIVE_LOW: u8 = 1 << 2;
const RESERVED_MASK: u8 = !(STATE_MASK | DIR_MASK | POLARITY_MASK);

/// Logical level of a line: active or inactive.
///
/// Whether "active" means electrically high or low depends on the line's
/// configured [`PinPolarity`]; the kernel applies the inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Line is at its inactive logical level.
    Inactive,
    /// Line is at its active logical level.
    Active,
}

impl PinState {
    /// True if the state is [`PinState::Active`].
    pub fn is_active(self) -> bool {
        self == PinState::Active
    }
}

/// Signal direction of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    /// Line is read by this side.
    In,
    /// Line is driven by this side.
    Out,
}

/// Electrical meaning of "active" for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPolarity {
    /// Active corresponds to a high voltage level.
    ActiveHigh,
    /// Active corresponds to a low voltage level.
    ActiveLow,
}

/// Full per-line configuration: state, direction, and active polarity.
///
/// For output lines the state field is the initial (or requested) level;
/// for input lines it is the observed level on read and ignored on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Requested or observed logical level.
    pub state: PinState,
    /// Signal direction requested at open time.
    pub direction: PinDirection,
    /// Active polarity requested at open time.
    pub polarity: PinPolarity,
}

impl PinConfig {
    /// An input line with active-high polarity.
    pub fn input() -> Self {
        PinConfig {
            state: PinState::Inactive,
            direction: PinDirection::In,
            polarity: PinPolarity::ActiveHigh,
        }
    }

    /// An output line with active-high polarity and the given initial state.
    pub fn output(initial: PinState) -> Self {
        PinConfig {
            state: initial,
            direction: PinDirection::Out,
            polarity: PinPolarity::ActiveHigh,
        }
    }

    /// Same configuration with active-low polarity.
    pub fn active_low(mut self) -> Self {
        self.polarity = PinPolarity::ActiveLow;
        self
    }

    /// Encode into the packed byte form.
    pub fn pack(self) -> u8 {
        let mut bits = 0;
        if self.state == PinState::Active {
            bits |= STATE_ACTIVE;
        }
        if self.direction == PinDirection::Out {
            bits |= DIR_OUT;
        }
        if self.polarity == PinPolarity::ActiveLow {
            bits |= ACTIVE_LOW;
        }
        bits
    }

    /// Decode from the packed byte form.
    ///
    /// Fails with [`BusError::InvalidArgument`] if any reserved bit (3–7)
    /// is set.
    pub fn unpack(bits: u8) -> Result<Self> {
        if bits & RESERVED_MASK != 0 {
            return Err(BusError::InvalidArgument(format!(
                "reserved bits set in pin configuration byte 0x{bits:02x}"
            )));
        }
        Ok(PinConfig {
            state: if bits & STATE_MASK == STATE_ACTIVE {
                PinState::Active
            } else {
                PinState::Inactive
            },
            direction: if bits & DIR_MASK == DIR_OUT {
                PinDirection::Out
            } else {
                PinDirection::In
            },
            polarity: if bits & POLARITY_MASK == ACTIVE_LOW {
                PinPolarity::ActiveLow
            } else {
                PinPolarity::ActiveHigh
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
