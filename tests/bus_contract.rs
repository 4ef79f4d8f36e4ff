//! Contract tests for the GPIO and SPI bus traits.
//!
//! Exercised against the mock implementations, which share argument
//! validation with the kernel-backed drivers. Callers are expected to
//! hold handles behind the traits, so several tests go through
//! `Box<dyn GpioBus>` / `Box<dyn SpiBus>`.

use pinbus::{
    BusError, GpioBus, MockGpioChip, MockSpiDevice, PinConfig, PinState, SpiBus, SpiMode,
};

fn open_boxed_chip() -> Box<dyn GpioBus> {
    let chip = MockGpioChip::open(
        &[2, 5, 7],
        &[
            PinConfig::input(),
            PinConfig::output(PinState::Inactive),
            PinConfig::output(PinState::Active),
        ],
    )
    .unwrap();
    Box::new(chip)
}

#[test]
fn gpio_open_rejects_mismatched_lengths() {
    let one_config = [PinConfig::input()];
    assert!(matches!(
        MockGpioChip::open(&[1, 2], &one_config),
        Err(BusError::InvalidArgument(_))
    ));
    assert!(matches!(
        MockGpioChip::open(&[], &one_config),
        Err(BusError::InvalidArgument(_))
    ));
    assert!(matches!(
        MockGpioChip::open(&[1], &[]),
        Err(BusError::InvalidArgument(_))
    ));
}

#[test]
fn gpio_subset_read_follows_request_order() {
    let mut chip = open_boxed_chip();

    let values = chip.get(&[7, 2]).unwrap();
    assert_eq!(values[0].state, PinState::Active);
    assert_eq!(values[1].state, PinState::Inactive);

    // Reversed request, reversed answer.
    let values = chip.get(&[2, 7]).unwrap();
    assert_eq!(values[0].state, PinState::Inactive);
    assert_eq!(values[1].state, PinState::Active);
}

#[test]
fn gpio_write_then_read_round_trips_through_trait_object() {
    let mut chip = open_boxed_chip();

    chip.set(&[5, 7], &[PinState::Active, PinState::Inactive])
        .unwrap();
    let values = chip.get(&[5, 7]).unwrap();
    assert_eq!(values[0].state, PinState::Active);
    assert_eq!(values[1].state, PinState::Inactive);
}

#[test]
fn gpio_close_invalidates_handle() {
    let mut chip = open_boxed_chip();
    chip.close().unwrap();

    assert!(matches!(chip.get(&[2]), Err(BusError::InvalidHandle)));
    assert!(matches!(chip.close(), Err(BusError::InvalidHandle)));
}

#[test]
fn spi_duplex_selection_controls_returned_length() {
    let mut spi: Box<dyn SpiBus> = Box::new(MockSpiDevice::open(SpiMode::default()));

    // Full-duplex: reception covers the whole exchange.
    assert_eq!(spi.io(&[1, 2, 3, 4], 2, false).unwrap().len(), 4);
    // Half-duplex: reception is exactly what was asked for.
    assert_eq!(spi.io(&[1, 2, 3, 4], 2, true).unwrap().len(), 2);
    // Nothing to exchange, nothing returned.
    assert!(spi.io(&[], 0, false).unwrap().is_empty());
}

#[test]
fn spi_convenience_helpers_delegate_to_io() {
    let mut device = MockSpiDevice::open(SpiMode::default());

    device.write(&[0xaa]).unwrap();
    device.write_byte(0xbb).unwrap();
    assert_eq!(device.written(), &[vec![0xaa], vec![0xbb]]);

    device.queue_response(&[0x11, 0x22]);
    assert_eq!(device.read(2).unwrap(), vec![0x11, 0x22]);
}

#[test]
fn spi_close_invalidates_descriptor() {
    let mut spi: Box<dyn SpiBus> = Box::new(MockSpiDevice::open(SpiMode::default()));
    spi.close().unwrap();

    assert!(matches!(spi.io(&[1], 1, true), Err(BusError::InvalidHandle)));
    assert!(matches!(spi.close(), Err(BusError::InvalidHandle)));
}
