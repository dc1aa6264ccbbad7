//! Unit tests for bank switching functionality

use crate::common::{MockError, MockInterface, Operation, addr, create_mock_driver};
use icm20948_dmp::{Bank, Error, Icm20948Driver, RegisterAddress};

#[test]
fn test_new_selects_bank0_and_checks_id() {
    let interface = MockInterface::new();
    let probe = interface.clone();

    let driver = Icm20948Driver::new(interface).unwrap();
    assert_eq!(driver.current_bank(), Some(Bank::Bank0));

    let ops = probe.operations();
    assert_eq!(
        ops[0],
        Operation::BankSwitch {
            from: Bank::Bank0,
            to: Bank::Bank0
        }
    );
    assert_eq!(
        ops[1],
        Operation::ReadRegister {
            bank: Bank::Bank0,
            address: addr::WHO_AM_I,
            value: 0xEA
        }
    );
}

#[test]
fn test_wrong_device_id() {
    let interface = MockInterface::new();
    interface.set_who_am_i(0x12);

    let result = Icm20948Driver::new(interface);
    assert!(matches!(result, Err(Error::InvalidDevice(0x12))));
}

#[test]
fn test_bank_switch_noop() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.select_bank(Bank::Bank0).unwrap();

    assert_eq!(
        interface.bank_switch_count(),
        0,
        "No bank switch should occur for same bank"
    );
}

#[test]
fn test_bank_switch_sequence() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    driver.select_bank(Bank::Bank1).unwrap();
    driver.select_bank(Bank::Bank2).unwrap();
    driver.select_bank(Bank::Bank2).unwrap();
    driver.select_bank(Bank::Bank3).unwrap();
    driver.select_bank(Bank::Bank0).unwrap();

    let bank_switches: Vec<_> = interface
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            Operation::BankSwitch { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        bank_switches,
        vec![
            (Bank::Bank0, Bank::Bank1),
            (Bank::Bank1, Bank::Bank2),
            (Bank::Bank2, Bank::Bank3),
            (Bank::Bank3, Bank::Bank0),
        ]
    );
}

#[test]
fn test_failed_switch_invalidates_cache() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    interface.fail_bank_switch(true);
    let result = driver.select_bank(Bank::Bank3);
    assert_eq!(result, Err(Error::Bus(MockError::BankSwitch)));
    assert_eq!(driver.current_bank(), None);

    interface.fail_bank_switch(false);

    // The hardware never left bank 0, but the driver cannot know that
    driver.select_bank(Bank::Bank0).unwrap();
    assert_eq!(interface.bank_switch_count(), 1);
    assert_eq!(driver.current_bank(), Some(Bank::Bank0));
}

#[test]
fn test_failed_switch_skips_access() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();
    interface.fail_bank_switch(true);

    let mut buf = [0u8; 2];
    let result = driver.read_register(RegisterAddress::new(Bank::Bank2, 0x50), &mut buf);
    assert!(result.is_err());
    assert!(
        interface
            .operations()
            .iter()
            .all(|op| !matches!(op, Operation::ReadRegister { .. })),
        "no read after a failed select"
    );
}

#[test]
fn test_select_bank_index_rejects_out_of_range() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    assert_eq!(driver.select_bank_index(4), Err(Error::InvalidParameter));
    assert!(interface.operations().is_empty());

    driver.select_bank_index(2).unwrap();
    assert_eq!(interface.current_bank(), Bank::Bank2);
}

#[test]
fn test_register_access_selects_bank() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(Bank::Bank3, 0x14, 0x5A);
    interface.clear_operations();

    let mut value = [0u8];
    driver
        .read_register(RegisterAddress::new(Bank::Bank3, 0x14), &mut value)
        .unwrap();
    assert_eq!(value[0], 0x5A);

    driver
        .write_register(RegisterAddress::new(Bank::Bank3, 0x16), &[0xA5])
        .unwrap();

    assert_eq!(interface.bank_switch_count(), 1);
    assert_eq!(interface.get_register(Bank::Bank3, 0x16), 0xA5);
}

#[test]
fn test_sw_reset_invalidates_cache() {
    let (mut driver, interface) = create_mock_driver();

    driver.sw_reset().unwrap();
    assert_eq!(driver.current_bank(), None);
    assert_eq!(interface.get_register(Bank::Bank0, addr::PWR_MGMT_1) & 0x80, 0x80);

    interface.clear_operations();
    driver.read_who_am_i().unwrap();
    assert_eq!(interface.bank_switch_count(), 1);
}
