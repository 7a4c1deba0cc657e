//! Simulated CiA-402 drive.
//!
//! One `SimulatedDrive` per node. The power state machine advances on
//! controlword writes; motion advances on statusword reads, so a test can
//! count exactly how many polls a set-point takes to complete.

use std::collections::HashMap;

use servo_common::cia402::{AxisState, ControlWord};
use servo_common::link::{LinkError, Register};
use tracing::{debug, trace};

// ─── Status Words ───────────────────────────────────────────────────

/// Statusword emitted in each drive state (remote bit set).
pub const fn status_pattern(state: AxisState) -> u16 {
    match state {
        AxisState::NotReadyToSwitchOn => 0x0000,
        AxisState::SwitchOnDisabled => 0x0240,
        AxisState::ReadyToSwitchOn => 0x0231,
        AxisState::SwitchedOn => 0x0233,
        AxisState::OperationEnabled => 0x0237,
        AxisState::QuickStopActive => 0x0211,
        AxisState::FaultReactionActive => 0x020F,
        AxisState::Fault => 0x0208,
    }
}

const TARGET_REACHED: u16 = 0x0400;

/// Mode codes the drive moves in.
const MODE_PROFILE_POSITION: i32 = 1;
const MODE_PROFILE_VELOCITY: i32 = 3;

// ─── Motion ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Idle,
    Positioning {
        start: i32,
        target: i32,
        done: u32,
    },
    Ramping {
        target: i32,
        done: u32,
    },
}

/// Software model of one servo drive.
#[derive(Debug)]
pub struct SimulatedDrive {
    state: AxisState,
    control_word: u16,
    mode: i32,
    mode_echo: Option<i32>,
    position: i32,
    velocity: i32,
    motion: Motion,
    queued: Option<i32>,
    /// Status reads a set-point takes to complete.
    reads_per_move: u32,
    never_reach: bool,
    error_code: i32,
    digital_outputs: i32,
    units_factor: i32,
    registers: HashMap<Register, i32>,
    failing_write: Option<Register>,
}

impl SimulatedDrive {
    /// Create a drive in `SwitchOnDisabled`, completing set-points after
    /// `reads_per_move` statusword reads.
    pub fn new(reads_per_move: u32) -> Self {
        Self {
            state: AxisState::SwitchOnDisabled,
            control_word: 0,
            mode: 0,
            mode_echo: None,
            position: 0,
            velocity: 0,
            motion: Motion::Idle,
            queued: None,
            reads_per_move: reads_per_move.max(1),
            never_reach: false,
            error_code: 0,
            digital_outputs: 0,
            units_factor: 10_000.0f32.to_bits() as i32,
            registers: HashMap::new(),
            failing_write: None,
        }
    }

    // ─── Knobs ──────────────────────────────────────────────────────

    /// Never report target reached for new set-points.
    pub fn set_never_reach(&mut self, never: bool) {
        self.never_reach = never;
    }

    /// Echo `code` from the mode display instead of the written mode.
    pub fn set_mode_echo(&mut self, code: Option<i32>) {
        self.mode_echo = code;
    }

    /// Enter fault reaction with the given error code. The next status read
    /// completes the reaction and latches `Fault`.
    pub fn inject_fault(&mut self, error_code: u16) {
        self.error_code = i32::from(error_code);
        self.state = AxisState::FaultReactionActive;
        self.stop_motion();
    }

    /// Refuse every write to `register`.
    pub fn fail_writes(&mut self, register: Option<Register>) {
        self.failing_write = register;
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Current power state.
    pub fn state(&self) -> AxisState {
        self.state
    }

    /// Actual position in counts.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Current value of the digital output register.
    pub fn digital_outputs(&self) -> i32 {
        self.digital_outputs
    }

    /// Whether a set-point is running.
    pub fn is_moving(&self) -> bool {
        self.motion != Motion::Idle
    }

    // ─── Register Access ────────────────────────────────────────────

    /// Read a register. Statusword reads advance the motion model.
    pub fn read(&mut self, register: Register) -> i32 {
        match register {
            Register::StatusWord => i32::from(self.status_word()),
            Register::ControlWord => i32::from(self.control_word),
            Register::ModesOfOperation => self.mode,
            Register::ModesOfOperationDisplay => self.mode_echo.unwrap_or(self.mode),
            Register::PositionActual => self.position,
            Register::VelocityActual => self.velocity,
            Register::ErrorCode => self.error_code,
            Register::DigitalOutputs => self.digital_outputs,
            Register::UnitsFactor => self.units_factor,
            other => self.registers.get(&other).copied().unwrap_or(0),
        }
    }

    /// Write a register.
    pub fn write(&mut self, register: Register, value: i32) -> Result<(), LinkError> {
        if self.failing_write == Some(register) {
            return Err(LinkError::SdoWriteFailed(register));
        }
        match register {
            Register::ControlWord => {
                self.apply_control_word(value as u16);
                Ok(())
            }
            Register::ModesOfOperation => {
                if self.state == AxisState::OperationEnabled {
                    return Err(LinkError::OperationNotAllowed(
                        "mode change while operation enabled".to_string(),
                    ));
                }
                debug!(mode = value, "Simulated drive mode set");
                self.mode = value;
                Ok(())
            }
            Register::StatusWord
            | Register::ModesOfOperationDisplay
            | Register::PositionActual
            | Register::VelocityActual
            | Register::ErrorCode => Err(LinkError::OperationNotAllowed(format!(
                "{register} is read-only"
            ))),
            Register::DigitalOutputs => {
                self.digital_outputs = value;
                Ok(())
            }
            Register::UnitsFactor => {
                self.units_factor = value;
                Ok(())
            }
            other => {
                self.registers.insert(other, value);
                Ok(())
            }
        }
    }

    // ─── State Machine ──────────────────────────────────────────────

    fn status_word(&mut self) -> u16 {
        if self.state == AxisState::FaultReactionActive {
            // Report the reaction once, then latch the fault.
            self.state = AxisState::Fault;
            return status_pattern(AxisState::FaultReactionActive);
        }
        if self.state != AxisState::OperationEnabled {
            return status_pattern(self.state);
        }
        self.advance();
        let mut raw = status_pattern(self.state);
        if self.motion == Motion::Idle {
            raw |= TARGET_REACHED;
        }
        raw
    }

    fn apply_control_word(&mut self, raw: u16) {
        let previous = ControlWord::from_bits_retain(self.control_word);
        let word = ControlWord::from_bits_retain(raw);
        self.control_word = raw;

        let reset_edge = word.contains(ControlWord::FAULT_RESET)
            && !previous.contains(ControlWord::FAULT_RESET);
        if matches!(self.state, AxisState::Fault | AxisState::FaultReactionActive) {
            if reset_edge && self.state == AxisState::Fault {
                debug!(error_code = self.error_code, "Simulated drive fault reset");
                self.error_code = 0;
                self.state = AxisState::SwitchOnDisabled;
            }
            return;
        }
        if word.contains(ControlWord::FAULT_RESET) {
            return;
        }

        let from = self.state;
        self.state = next_state(from, raw);
        if from != self.state {
            trace!(from = %from, to = %self.state, control_word = %word, "Simulated drive transition");
        }
        if self.state != AxisState::OperationEnabled {
            self.stop_motion();
            return;
        }

        match self.mode {
            MODE_PROFILE_POSITION => {
                let set_point_edge = word.contains(ControlWord::NEW_SET_POINT)
                    && !previous.contains(ControlWord::NEW_SET_POINT);
                if set_point_edge {
                    self.accept_set_point(
                        word.contains(ControlWord::CHANGE_SET_IMMEDIATELY),
                        word.contains(ControlWord::RELATIVE),
                    );
                }
            }
            MODE_PROFILE_VELOCITY if from == AxisState::OperationEnabled => {
                let target = self.register(Register::TargetVelocity);
                self.motion = Motion::Ramping { target, done: 0 };
            }
            _ => {}
        }
    }

    fn accept_set_point(&mut self, immediate: bool, relative: bool) {
        let demand = self.register(Register::TargetPosition);
        let base = match (self.queued, self.motion) {
            (Some(queued), _) if !immediate => queued,
            (_, Motion::Positioning { target, .. }) => target,
            _ => self.position,
        };
        let target = if relative { base.saturating_add(demand) } else { demand };

        if immediate || self.motion == Motion::Idle {
            debug!(target, immediate, "Simulated drive set-point started");
            self.queued = None;
            self.motion = Motion::Positioning {
                start: self.position,
                target,
                done: 0,
            };
        } else {
            debug!(target, "Simulated drive set-point queued");
            self.queued = Some(target);
        }
    }

    fn advance(&mut self) {
        if self.never_reach {
            return;
        }
        let total = self.reads_per_move;
        match self.motion {
            Motion::Idle => {}
            Motion::Positioning { start, target, done } => {
                let done = done + 1;
                if done >= total {
                    self.position = target;
                    self.velocity = 0;
                    self.motion = Motion::Idle;
                    if let Some(next) = self.queued.take() {
                        self.motion = Motion::Positioning {
                            start: self.position,
                            target: next,
                            done: 0,
                        };
                    }
                } else {
                    let span = i64::from(target) - i64::from(start);
                    let step = span * i64::from(done) / i64::from(total);
                    self.position = (i64::from(start) + step) as i32;
                    self.velocity = self.register(Register::ProfileVelocity) * span.signum() as i32;
                    self.motion = Motion::Positioning { start, target, done };
                }
            }
            Motion::Ramping { target, done } => {
                let done = done + 1;
                if done >= total {
                    self.velocity = target;
                    self.motion = Motion::Idle;
                } else {
                    self.motion = Motion::Ramping { target, done };
                }
            }
        }
    }

    fn stop_motion(&mut self) {
        self.motion = Motion::Idle;
        self.queued = None;
        self.velocity = 0;
    }

    fn register(&self, register: Register) -> i32 {
        self.registers.get(&register).copied().unwrap_or(0)
    }
}

/// CiA-402 transition table for a controlword outside the fault states.
fn next_state(state: AxisState, raw: u16) -> AxisState {
    use AxisState::*;

    let voltage = raw & 0x0002 != 0;
    let quick_stop = raw & 0x0004 != 0;
    if !voltage {
        return SwitchOnDisabled;
    }
    if !quick_stop {
        return match state {
            OperationEnabled | QuickStopActive => QuickStopActive,
            _ => SwitchOnDisabled,
        };
    }
    match (state, raw & 0x000F) {
        // Shutdown.
        (SwitchOnDisabled | ReadyToSwitchOn | SwitchedOn | OperationEnabled, 0x06) => {
            ReadyToSwitchOn
        }
        // Switch on / disable operation.
        (ReadyToSwitchOn | SwitchedOn | OperationEnabled, 0x07) => SwitchedOn,
        // Enable operation.
        (SwitchedOn | OperationEnabled | QuickStopActive, 0x0F) => OperationEnabled,
        (current, _) => current,
    }
}
