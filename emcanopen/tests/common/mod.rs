#![allow(dead_code)]

// Pulls in the host critical-section implementation for the tests.
use critical_section as _;

use std::sync::{Arc, Mutex};

use emcanopen::config::NominalBitTiming;
use emcanopen::core::{CobId, EmergencyCode, FaultCode};
use emcanopen::emergency::Emergency;
use emcanopen::frame::{Data, Frame};
use emcanopen::periphery::{
    ErrorFlags, FilterConfig, Mailbox, Notifications, Periphery, PeripheryError, RxFifo,
};

/// Observable state of the test peripheral.
#[derive(Default)]
pub struct PeripheryState {
    pub free_mailboxes: usize,
    pub sent: Vec<Frame>,
    pub rx_pending: Vec<Frame>,
    pub error_flags: ErrorFlags,
    pub running: bool,
    pub stop_count: u32,
    pub notifications: Notifications,
    pub timing: Option<NominalBitTiming>,
    pub filters: Vec<(usize, FilterConfig)>,
    pub fail_start: bool,
    pub fail_add: bool,
}

/// Test double standing in for a CAN peripheral backend.
pub struct MockPeriphery(Arc<Mutex<PeripheryState>>);

impl MockPeriphery {
    pub fn new() -> (Self, Arc<Mutex<PeripheryState>>) {
        let state = Arc::new(Mutex::new(PeripheryState::default()));
        (Self(state.clone()), state)
    }
}

impl Periphery for MockPeriphery {
    fn stop(&mut self) {
        let mut state = self.0.lock().unwrap();
        state.running = false;
        state.stop_count += 1;
    }

    fn apply_timing(&mut self, timing: &NominalBitTiming) -> Result<(), PeripheryError> {
        self.0.lock().unwrap().timing = Some(*timing);
        Ok(())
    }

    fn start(&mut self) -> Result<(), PeripheryError> {
        let mut state = self.0.lock().unwrap();
        if state.fail_start {
            return Err(PeripheryError);
        }
        state.running = true;
        Ok(())
    }

    fn activate_notifications(&mut self, set: Notifications) -> Result<(), PeripheryError> {
        self.0.lock().unwrap().notifications = set;
        Ok(())
    }

    fn set_filter(&mut self, bank: usize, filter: FilterConfig) -> Result<(), PeripheryError> {
        self.0.lock().unwrap().filters.push((bank, filter));
        Ok(())
    }

    fn free_mailbox_count(&self) -> usize {
        self.0.lock().unwrap().free_mailboxes
    }

    fn add_message(&mut self, frame: &Frame) -> Result<Mailbox, PeripheryError> {
        let mut state = self.0.lock().unwrap();
        if state.fail_add || state.free_mailboxes == 0 {
            return Err(PeripheryError);
        }
        state.free_mailboxes -= 1;
        state.sent.push(*frame);
        Ok(Mailbox::new(0))
    }

    fn get_message(&mut self, fifo: RxFifo) -> Option<Frame> {
        let _ = fifo;
        let mut state = self.0.lock().unwrap();
        if state.rx_pending.is_empty() {
            None
        } else {
            Some(state.rx_pending.remove(0))
        }
    }

    fn error_flags(&self) -> ErrorFlags {
        self.0.lock().unwrap().error_flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmEvent {
    Report(FaultCode, EmergencyCode, u32),
    Reset(FaultCode, u32),
}

/// Emergency sink recording reports and tracking active fault conditions.
///
/// Resetting an inactive fault is a no-op, like in the real subsystem, so a
/// recorded `Reset` always marks an actual active-to-inactive transition.
#[derive(Default)]
pub struct RecordingEmergency {
    events: Mutex<Vec<EmEvent>>,
    active: Mutex<Vec<FaultCode>>,
}

impl RecordingEmergency {
    pub fn events(&self) -> Vec<EmEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reports_of(&self, code: FaultCode) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, EmEvent::Report(c, _, _) if *c == code))
            .count()
    }

    pub fn resets_of(&self, code: FaultCode) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, EmEvent::Reset(c, _) if *c == code))
            .count()
    }
}

impl Emergency for RecordingEmergency {
    fn report(&self, code: FaultCode, class: EmergencyCode, aux: u32) {
        self.events
            .lock()
            .unwrap()
            .push(EmEvent::Report(code, class, aux));
        let mut active = self.active.lock().unwrap();
        if !active.contains(&code) {
            active.push(code);
        }
    }

    fn reset(&self, code: FaultCode, aux: u32) {
        let mut active = self.active.lock().unwrap();
        if let Some(pos) = active.iter().position(|c| *c == code) {
            active.remove(pos);
            self.events.lock().unwrap().push(EmEvent::Reset(code, aux));
        }
    }

    fn is_active(&self, code: FaultCode) -> bool {
        self.active.lock().unwrap().contains(&code)
    }
}

pub fn frame(ident: u16, rtr: bool, data: &[u8]) -> Frame {
    Frame::new(CobId::new(ident, rtr).unwrap(), Data::new(data).unwrap())
}
