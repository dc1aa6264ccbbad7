//! Unit tests for power, FIFO and interrupt register access

use crate::common::{MockError, addr, create_mock_driver};
use icm20948_dmp::{Bank, ClockSource, Error, FifoMode, InterruptEnables, Status};

#[test]
fn test_power_bits() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(Bank::Bank0, addr::PWR_MGMT_1, 0x41);

    driver.set_sleep(false).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::PWR_MGMT_1), 0x01);

    driver.set_low_power(true).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::PWR_MGMT_1), 0x21);

    driver.set_clock_source(ClockSource::Stop).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::PWR_MGMT_1), 0x27);
}

#[test]
fn test_enable_spi_mode() {
    let (mut driver, interface) = create_mock_driver();
    driver.enable_spi_mode().unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::USER_CTRL), 0x10);
}

#[test]
fn test_data_ready() {
    let (mut driver, interface) = create_mock_driver();

    assert!(!driver.data_ready().unwrap());
    assert_eq!(driver.require_data_ready(), Err(Error::NoData));

    interface.set_register(Bank::Bank0, addr::INT_STATUS_1, 0x01);
    assert!(driver.data_ready().unwrap());
    assert_eq!(driver.require_data_ready(), Ok(()));
}

#[test]
fn test_read_failure_is_transport_error() {
    let (mut driver, interface) = create_mock_driver();
    interface.fail_next_read();

    let error = driver.read_who_am_i().unwrap_err();
    assert_eq!(error, Error::Bus(MockError::Communication));
    assert_eq!(error.status(), Status::Transport);

    // Single failure only
    assert_eq!(driver.read_who_am_i(), Ok(0xEA));
}

#[test]
fn test_write_interrupt_enables() {
    let (mut driver, interface) = create_mock_driver();

    let enables = InterruptEnables::dmp_streaming()
        .with_i2c_master(true)
        .with_raw_data_ready(true)
        .with_fifo_watermark(0x01);
    driver.set_interrupt_enables(&enables).unwrap();

    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE), 0x18);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_1), 0x01);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_2), 0x1F);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_3), 0x01);
}

#[test]
fn test_interrupt_enables_write_every_register() {
    let (mut driver, interface) = create_mock_driver();
    interface.fail_writes_to(Bank::Bank0, addr::INT_ENABLE_1, 1);

    let enables = InterruptEnables::new()
        .with_wake_on_fsync(true)
        .with_raw_data_ready(true)
        .with_fifo_overflow(0x03)
        .with_fifo_watermark(0x04);
    let result = driver.set_interrupt_enables(&enables);

    assert_eq!(result, Err(Error::Bus(MockError::Communication)));
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE), 0x80);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_1), 0x00);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_2), 0x03);
    assert_eq!(interface.get_register(Bank::Bank0, addr::INT_ENABLE_3), 0x04);
}

#[test]
fn test_read_interrupt_enables() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(Bank::Bank0, addr::INT_ENABLE, 0x70);
    interface.set_register(Bank::Bank0, addr::INT_ENABLE_1, 0x01);
    interface.set_register(Bank::Bank0, addr::INT_ENABLE_2, 0x1F);
    interface.set_register(Bank::Bank0, addr::INT_ENABLE_3, 0x02);

    let mut enables = InterruptEnables::new();
    driver.read_interrupt_enables(&mut enables).unwrap();

    assert_eq!(
        enables,
        InterruptEnables::new()
            .with_dmp(true)
            .with_pll_ready(true)
            .with_wake_on_motion(true)
            .with_raw_data_ready(true)
            .with_fifo_overflow(0x1F)
            .with_fifo_watermark(0x02)
    );
}

#[test]
fn test_read_interrupt_enables_partial_failure() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(Bank::Bank0, addr::INT_ENABLE_2, 0x1F);
    interface.fail_next_read();

    let mut enables = InterruptEnables::new().with_dmp(true);
    let result = driver.read_interrupt_enables(&mut enables);

    assert_eq!(result, Err(Error::Bus(MockError::Communication)));
    // INT_ENABLE failed, so `dmp` keeps its previous value
    assert!(enables.dmp);
    assert_eq!(enables.fifo_overflow, 0x1F);
}

#[test]
fn test_fifo_count() {
    let (mut driver, interface) = create_mock_driver();
    assert_eq!(driver.fifo_count(), Ok(0));

    interface.push_fifo(&[0u8; 300]);
    assert_eq!(driver.fifo_count(), Ok(300));
}

#[test]
fn test_read_fifo() {
    let (mut driver, interface) = create_mock_driver();
    interface.push_fifo(&[1, 2, 3, 4]);

    let mut buf = [0u8; 3];
    driver.read_fifo(&mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3]);
    assert_eq!(interface.fifo_len(), 1);

    assert_eq!(driver.read_fifo(&mut []), Err(Error::NoData));
}

#[test]
fn test_reset_fifo_sequence() {
    let (mut driver, interface) = create_mock_driver();
    driver.reset_fifo().unwrap();
    assert_eq!(
        interface.writes_to(Bank::Bank0, addr::FIFO_RST),
        vec![0x1F, 0x1E]
    );
}

#[test]
fn test_fifo_mode_and_enable() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_fifo_mode(FifoMode::Snapshot).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::FIFO_MODE), 0x1F);
    driver.set_fifo_mode(FifoMode::Stream).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::FIFO_MODE), 0x00);

    driver.set_fifo_enable(true).unwrap();
    driver.set_dmp_enable(true).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::USER_CTRL), 0xC0);

    driver.reset_dmp().unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::USER_CTRL), 0xC8);
}
