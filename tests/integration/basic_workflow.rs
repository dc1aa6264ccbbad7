//! Integration tests for basic workflow scenarios

use crate::common::{MockError, TEST_FIRMWARE, addr, create_mock_driver};
use icm20948_dmp::dmp::{
    DMP_LOAD_START, DMP_START_ADDRESS, DmpOdrRegister, DmpReadOutcome, DmpRecord, DmpSensor,
    HeaderBits, Quaternion6,
};
use icm20948_dmp::{Bank, ClockSource, Error, InterruptEnables, PeripheralSlot, Status};

const MAG: u8 = 0x0C;

fn game_rotation_record(x: i32) -> DmpRecord {
    DmpRecord {
        header: HeaderBits::QUAT6,
        quat6: Some(Quaternion6 { x, y: 0, z: -x }),
        footer: 0x0001,
        ..Default::default()
    }
}

fn wire(record: &DmpRecord) -> Vec<u8> {
    let mut out = vec![0u8; record.wire_len()];
    record.encode(&mut out).unwrap();
    out
}

#[test]
fn test_dmp_bring_up_and_stream() {
    let (mut driver, interface) = create_mock_driver();

    driver.sw_reset().unwrap();
    // Reset completes: sleeping, auto clock
    interface.set_register(Bank::Bank0, addr::PWR_MGMT_1, 0x41);
    driver.set_sleep(false).unwrap();
    driver.set_clock_source(ClockSource::AutoSelect).unwrap();
    assert_eq!(interface.get_register(Bank::Bank0, addr::PWR_MGMT_1), 0x01);

    // Magnetometer behind the auxiliary master
    interface.set_peripheral_register(0x01, 0x09);
    driver.i2c_master_enable(true).unwrap();
    assert_eq!(driver.i2c_master_single_read(MAG, 0x01), Ok(0x09));
    driver
        .configure_peripheral(0, &PeripheralSlot::read(MAG, 0x10, 9))
        .unwrap();

    // Firmware
    driver.attach_dmp_firmware(&TEST_FIRMWARE);
    driver.load_dmp_firmware().unwrap();
    driver.set_dmp_start_address(DMP_START_ADDRESS).unwrap();
    assert_eq!(
        interface.dmp_memory(DMP_LOAD_START, TEST_FIRMWARE.len()),
        TEST_FIRMWARE.to_vec()
    );

    // Outputs
    driver
        .enable_dmp_sensor(DmpSensor::GameRotationVector, true)
        .unwrap();
    driver
        .set_dmp_sensor_period(DmpOdrRegister::Quat6, 0)
        .unwrap();
    driver
        .set_interrupt_enables(&InterruptEnables::dmp_streaming())
        .unwrap();
    driver.set_fifo_enable(true).unwrap();
    driver.set_dmp_enable(true).unwrap();
    driver.reset_dmp().unwrap();
    driver.reset_fifo().unwrap();

    let mut enables = InterruptEnables::new();
    driver.read_interrupt_enables(&mut enables).unwrap();
    assert_eq!(enables, InterruptEnables::dmp_streaming());

    // Stream: one full record, one split across two polls
    let first = game_rotation_record(1 << 30);
    let second = game_rotation_record(-(1 << 16));
    let second_wire = wire(&second);
    interface.push_fifo(&wire(&first));
    interface.push_fifo(&second_wire[..5]);
    interface.push_fifo_pending(&second_wire[5..]);

    let mut records = Vec::new();
    for _ in 0..4 {
        match driver.read_dmp_data().unwrap() {
            DmpReadOutcome::Incomplete(_) => interface.release_fifo(second_wire.len()),
            outcome => records.extend(outcome.into_record()),
        }
    }

    assert_eq!(records, vec![first, second]);
    assert_eq!(interface.fifo_len(), 0);
}

#[test]
fn test_error_recovery() {
    let (mut driver, interface) = create_mock_driver();
    driver.attach_dmp_firmware(&TEST_FIRMWARE);

    // A failed DMP write leaves the driver usable
    interface.fail_next_write();
    let result = driver.enable_dmp_sensor(DmpSensor::Accelerometer, true);
    assert_eq!(result, Err(Error::Bus(MockError::Communication)));
    assert_eq!(result.unwrap_err().status(), Status::Transport);

    driver
        .enable_dmp_sensor(DmpSensor::Accelerometer, true)
        .unwrap();

    // A failed record read can be resynchronised with a FIFO reset
    interface.push_fifo(&[0x80, 0x00, 0x00]);
    interface.fail_next_read();
    assert!(driver.read_dmp_data().is_err());

    driver.reset_fifo().unwrap();
    assert_eq!(driver.dmp_decoder().staged_len(), 0);
}

#[test]
fn test_bank_switching_during_workflow() {
    let (mut driver, interface) = create_mock_driver();
    driver.attach_dmp_firmware(&TEST_FIRMWARE);
    interface.clear_operations();

    // Bank 3 then Bank 2 then back to Bank 0
    driver
        .configure_peripheral(1, &PeripheralSlot::write(MAG, 0x31, 0x08))
        .unwrap();
    driver.set_dmp_start_address(DMP_START_ADDRESS).unwrap();
    driver.set_fifo_enable(true).unwrap();

    assert_eq!(interface.bank_switch_count(), 3);
    assert_eq!(driver.current_bank(), Some(Bank::Bank0));
    assert_eq!(interface.current_bank(), Bank::Bank0);
}
