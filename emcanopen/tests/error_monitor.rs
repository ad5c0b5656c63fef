mod common;

use common::{EmEvent, MockPeriphery, RecordingEmergency};
use emcanopen::core::{EmergencyCode, FaultCode};
use emcanopen::periphery::ErrorFlags;
use emcanopen::{CanModule, Error, RxSlot, TxSlot};

#[test]
fn persistent_bus_off_is_reported_once() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();

    state.lock().unwrap().error_flags = ErrorFlags::BUS_OFF;
    module.check_errors();
    module.check_errors();
    module.check_errors();

    assert_eq!(em.reports_of(FaultCode::CanTxBusOff), 1);

    // Recovery clears the standing fault
    state.lock().unwrap().error_flags = ErrorFlags::NONE;
    module.check_errors();
    assert_eq!(em.resets_of(FaultCode::CanTxBusOff), 1);
}

#[test]
fn bus_off_shadows_warning_and_passive() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();

    state.lock().unwrap().error_flags =
        ErrorFlags::BUS_OFF | ErrorFlags::WARNING | ErrorFlags::PASSIVE;
    module.check_errors();

    assert_eq!(em.reports_of(FaultCode::CanTxBusOff), 1);
    assert_eq!(em.reports_of(FaultCode::CanBusWarning), 0);
    assert_eq!(em.reports_of(FaultCode::CanTxBusPassive), 0);
}

#[test]
fn warning_edges_report_and_clear() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();

    state.lock().unwrap().error_flags = ErrorFlags::WARNING;
    module.check_errors();
    assert_eq!(
        em.events(),
        vec![EmEvent::Report(
            FaultCode::CanBusWarning,
            EmergencyCode::NoError,
            ErrorFlags::WARNING.into_bits(),
        )]
    );

    // Unchanged status produces no further calls at all
    module.check_errors();
    assert_eq!(em.events().len(), 1);

    state.lock().unwrap().error_flags = ErrorFlags::NONE;
    module.check_errors();
    assert_eq!(em.resets_of(FaultCode::CanBusWarning), 1);
}

#[test]
fn passive_is_suppressed_during_bootup() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();
    module.set_normal_mode().unwrap();

    state.lock().unwrap().error_flags = ErrorFlags::PASSIVE;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanTxBusPassive), 0);

    // Bootup frame leaves, and the next status change reports passive
    state.lock().unwrap().free_mailboxes = 1;
    module.on_mailbox_free();
    state.lock().unwrap().error_flags = ErrorFlags::PASSIVE | ErrorFlags::WARNING;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanTxBusPassive), 1);
}

#[test]
fn passive_recovery_clears_standing_overflow() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();
    module.set_normal_mode().unwrap();

    // Arm overflow reporting, then provoke a TX overflow fault
    state.lock().unwrap().free_mailboxes = 1;
    module.on_mailbox_free();
    state.lock().unwrap().free_mailboxes = 0;
    let handle = module.configure_tx(0, 0x181, false, 1, false).unwrap();
    module.send(handle, &[0x01]).unwrap();
    assert_eq!(module.send(handle, &[0x02]), Err(Error::TxOverflow));
    assert_eq!(em.reports_of(FaultCode::CanTxOverflow), 1);

    state.lock().unwrap().error_flags = ErrorFlags::PASSIVE;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanTxBusPassive), 1);

    state.lock().unwrap().error_flags = ErrorFlags::NONE;
    module.check_errors();
    assert_eq!(em.resets_of(FaultCode::CanTxBusPassive), 1);
    assert_eq!(em.resets_of(FaultCode::CanTxOverflow), 1);
}

#[test]
fn rx_overrun_of_either_fifo_is_reported() {
    let em = RecordingEmergency::default();
    let (periphery, state) = MockPeriphery::new();
    let mut rx = [RxSlot::new(); 1];
    let mut tx = [TxSlot::new(); 1];

    let module = CanModule::new(periphery, &mut rx, &mut tx, 500, &em).unwrap();

    state.lock().unwrap().error_flags = ErrorFlags::RX_FIFO0_OVERRUN;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanRxOverflow), 1);

    state.lock().unwrap().error_flags = ErrorFlags::RX_FIFO1_OVERRUN;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanRxOverflow), 2);

    // Overrun is reported even while bus-off shadows the counters
    state.lock().unwrap().error_flags = ErrorFlags::BUS_OFF | ErrorFlags::RX_FIFO0_OVERRUN;
    module.check_errors();
    assert_eq!(em.reports_of(FaultCode::CanRxOverflow), 3);
}
