//! Virtual pin layer for the AT8236 H-bridge motor drivers.
//!
//! The host addresses each motor with a coarse step/dir pin pair, but
//! the AT8236 wants its two bridge inputs driven directly: high side,
//! low side, or neither (coast). This layer keeps the step/dir bits per
//! channel and recomputes both physical outputs from the full truth
//! table on every update, so the bridge can never be told to conduct on
//! both sides at once.

use embedded_hal::digital::{OutputPin, StatefulOutputPin};

use crate::GpioBackend;
use crate::common::pins::{AT8236_CHANNELS, PinAddr, Role};

/// Physical pin pair wired to one AT8236.
#[derive(Debug, Clone, Copy)]
pub struct MotorPins {
    pub high: u32,
    pub low: u32,
}

/// One configured motor channel: the two claimed outputs plus the
/// logical step/dir state they are derived from.
struct At8236Channel<O> {
    high: O,
    low: O,
    step: bool,
    dir: bool,
}

impl<O: StatefulOutputPin> At8236Channel<O> {
    /// Reapply the combinational output function.
    ///
    /// `!step` coasts, `step && dir` drives the low side, `step &&
    /// !dir` drives the high side. Deasserting edges are written first
    /// so the pair is never observed as (1, 1).
    fn apply(&mut self) {
        let (high, low) = match (self.step, self.dir) {
            (false, _) => (false, false),
            (true, true) => (false, true),
            (true, false) => (true, false),
        };
        if !high {
            let _ = self.high.set_low();
        }
        if !low {
            let _ = self.low.set_low();
        }
        if high {
            let _ = self.high.set_high();
        }
        if low {
            let _ = self.low.set_high();
        }
    }

    fn set(&mut self, role: Role, val: bool) {
        match role {
            Role::Step => self.step = val,
            Role::Dir => self.dir = val,
        }
        self.apply();
    }

    fn toggle(&mut self, role: Role) {
        match role {
            Role::Step => self.step = !self.step,
            Role::Dir => self.dir = !self.dir,
        }
        self.apply();
    }
}

/// Handle returned by [`DigitalOuts::setup`].
///
/// Virtual pins keep no register pointer, only the original pin number;
/// channel and role are re-decoded on every operation.
pub enum GpioOut<O> {
    Hw(O),
    Motor { pin: u32 },
}

/// Digital-output front end. Every operation dispatches on the pin
/// class first: motor window pins are routed to the channel logic, all
/// others fall through to the physical backend unchanged.
pub struct DigitalOuts<B: GpioBackend> {
    backend: B,
    motor_pins: [MotorPins; AT8236_CHANNELS],
    channels: [Option<At8236Channel<B::Out>>; AT8236_CHANNELS],
}

impl<B: GpioBackend> DigitalOuts<B> {
    pub fn new(backend: B, motor_pins: [MotorPins; AT8236_CHANNELS]) -> Self {
        Self {
            backend,
            motor_pins,
            channels: core::array::from_fn(|_| None),
        }
    }

    /// Claim both bridge inputs of `channel`, driven low. Runs at most
    /// once per channel no matter which of its virtual pins arrives
    /// first; a second setup must not reset already written state.
    fn configure(&mut self, channel: usize) -> &mut At8236Channel<B::Out> {
        let pins = self.motor_pins[channel];
        let backend = &mut self.backend;
        self.channels[channel].get_or_insert_with(|| At8236Channel {
            high: backend.out_setup(pins.high, false),
            low: backend.out_setup(pins.low, false),
            step: false,
            dir: false,
        })
    }

    pub fn setup(&mut self, pin: u32, val: bool) -> GpioOut<B::Out> {
        match PinAddr::decode(pin) {
            PinAddr::Motor { channel, role } => {
                self.configure(channel).set(role, val);
                GpioOut::Motor { pin }
            }
            PinAddr::Hw(pin) => GpioOut::Hw(self.backend.out_setup(pin, val)),
        }
    }

    pub fn write(&mut self, out: &mut GpioOut<B::Out>, val: bool) {
        match out {
            GpioOut::Motor { pin } => {
                if let PinAddr::Motor { channel, role } = PinAddr::decode(*pin) {
                    self.configure(channel).set(role, val);
                }
            }
            GpioOut::Hw(out) => {
                let _ = out.set_state(val.into());
            }
        }
    }

    pub fn toggle(&mut self, out: &mut GpioOut<B::Out>) {
        match out {
            GpioOut::Motor { pin } => {
                if let PinAddr::Motor { channel, role } = PinAddr::decode(*pin) {
                    self.configure(channel).toggle(role);
                }
            }
            // Physical toggle is a read-modify-write on the output
            // register, keep interrupts out of it.
            GpioOut::Hw(out) => critical_section::with(|_| {
                let _ = out.toggle();
            }),
        }
    }

    /// Restore a known output mode and level.
    ///
    /// Virtual pins have no mode register, so this is a plain write.
    /// Physical pins get their pin configuration reapplied as well.
    pub fn reset(&mut self, out: &mut GpioOut<B::Out>, val: bool) {
        match out {
            GpioOut::Motor { pin } => {
                if let PinAddr::Motor { channel, role } = PinAddr::decode(*pin) {
                    self.configure(channel).set(role, val);
                }
            }
            GpioOut::Hw(out) => critical_section::with(|_| {
                self.backend.out_reset(out, val);
            }),
        }
    }
}
