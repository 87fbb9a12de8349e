/*!
Std only implementations: simulated hardware for running the board
logic on the host.
*/
extern crate std;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use defmt_or_log::trace;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

use crate::common::pins::MAX_GPIO;
use crate::{Dispatcher, GpioBackend, TimerDevice};

struct SimTimerState {
    counter: u32,
    period: u32,
    pending: bool,
    force_updates: u32,
    tick_on_read: bool,
}

/// Simulated scheduling timer: a counter that wraps at the programmed
/// period and raises a pending update when it does. Clones share the
/// same state, keep one handle to drive time from the test.
#[derive(Clone)]
pub struct SimTimer {
    state: Rc<RefCell<SimTimerState>>,
}

impl SimTimer {
    pub fn new(period: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimTimerState {
                counter: 0,
                period,
                pending: false,
                force_updates: 0,
                tick_on_read: false,
            })),
        }
    }

    /// Let `ticks` of simulated time pass.
    pub fn advance(&self, ticks: u32) {
        let mut s = self.state.borrow_mut();
        s.counter += ticks;
        while s.counter >= s.period {
            s.counter -= s.period;
            s.pending = true;
        }
    }

    /// Make every counter read advance time by one tick, so spin loops
    /// on the simulated clock terminate.
    pub fn tick_on_read(&self, enable: bool) {
        self.state.borrow_mut().tick_on_read = enable;
    }

    pub fn pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn counter_value(&self) -> u32 {
        self.state.borrow().counter
    }

    pub fn force_updates(&self) -> u32 {
        self.state.borrow().force_updates
    }
}

impl TimerDevice for SimTimer {
    fn counter(&self) -> u32 {
        let mut s = self.state.borrow_mut();
        if s.tick_on_read {
            s.counter += 1;
        }
        s.counter
    }

    fn period(&self) -> u32 {
        self.state.borrow().period
    }

    fn set_period(&self, ticks: u32) {
        self.state.borrow_mut().period = ticks;
    }

    fn zero_counter(&self) {
        self.state.borrow_mut().counter = 0;
    }

    fn force_update(&self) {
        // A real update event reloads the period register; the sim
        // applies set_period immediately, only the count matters here.
        self.state.borrow_mut().force_updates += 1;
    }

    fn clear_update_flag(&self) {
        self.state.borrow_mut().pending = false;
    }
}

/// Canned scheduler hook: returns a programmable next deadline and
/// counts how often it was asked.
pub struct SimScheduler {
    pub next: u32,
    pub dispatched: u32,
}

impl SimScheduler {
    pub fn new() -> Self {
        Self {
            next: 0,
            dispatched: 0,
        }
    }
}

impl Default for SimScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for SimScheduler {
    fn dispatch_many(&mut self) -> u32 {
        self.dispatched += 1;
        self.next
    }
}

#[derive(Default)]
struct SimBoardState {
    levels: HashMap<u32, bool>,
    setups: HashMap<u32, u32>,
}

/// Recording GPIO backend. Clones share the board state so tests can
/// sample pin levels while the code under test owns the backend.
#[derive(Clone, Default)]
pub struct SimGpio {
    board: Rc<RefCell<SimBoardState>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current output level of `pin` (false if never driven).
    pub fn level(&self, pin: u32) -> bool {
        *self.board.borrow().levels.get(&pin).unwrap_or(&false)
    }

    /// How many times `pin` was claimed through `out_setup`.
    pub fn setup_count(&self, pin: u32) -> u32 {
        *self.board.borrow().setups.get(&pin).unwrap_or(&0)
    }
}

/// Handle to one simulated push-pull output.
pub struct SimPin {
    board: Rc<RefCell<SimBoardState>>,
    pin: u32,
}

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.board.borrow_mut().levels.insert(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.board.borrow_mut().levels.insert(self.pin, true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(*self.board.borrow().levels.get(&self.pin).unwrap_or(&false))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

impl GpioBackend for SimGpio {
    type Out = SimPin;

    fn out_setup(&mut self, pin: u32, val: bool) -> SimPin {
        if pin >= MAX_GPIO {
            defmt_or_log::panic!("Invalid GPIO pin {}", pin);
        }
        trace!("sim gpio setup pin {} = {}", pin, val);
        let mut board = self.board.borrow_mut();
        *board.setups.entry(pin).or_insert(0) += 1;
        board.levels.insert(pin, val);
        SimPin {
            board: self.board.clone(),
            pin,
        }
    }

    fn out_reset(&mut self, out: &mut SimPin, val: bool) {
        self.board.borrow_mut().levels.insert(out.pin, val);
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use test_log::test;

    use super::*;
    use crate::common::clock::{TickTimer, timer_is_before};

    /// Scripted scheduler: hands out a fixed list of deadlines.
    struct ScriptedScheduler {
        deadlines: std::vec::Vec<u32>,
        served: usize,
    }

    impl Dispatcher for ScriptedScheduler {
        fn dispatch_many(&mut self) -> u32 {
            let next = self.deadlines[self.served.min(self.deadlines.len() - 1)];
            self.served += 1;
            next
        }
    }

    #[test]
    fn dispatch_chain_follows_the_deadline_script() {
        let sim = SimTimer::new(1000);
        let timer = TickTimer::new(sim.clone());
        timer.kick();

        let deadlines = std::vec![120, 180, 300, 1700, 1702];
        let mut sched = ScriptedScheduler {
            deadlines: deadlines.clone(),
            served: 0,
        };

        // Run the interrupt chain to completion.
        for _ in 0..deadlines.len() {
            sim.advance(sim.period());
            assert!(sim.pending());
            timer.on_interrupt(&mut sched);
        }
        assert_eq!(sched.served, deadlines.len());

        // Every deadline was honored no earlier than asked for, within
        // the clamped margin.
        let mut fire_times = std::vec::Vec::new();
        let mut t = 50u32; // kick target
        for d in &deadlines[..deadlines.len() - 1] {
            fire_times.push(t);
            t = if timer_is_before(*d, t + 2) { t + 2 } else { *d };
        }
        fire_times.push(t);
        assert_eq!(timer.read_time(), *fire_times.last().unwrap());
    }

    #[test]
    fn sim_pin_is_a_stateful_output() {
        let mut gpio = SimGpio::new();
        let mut pin = gpio.out_setup(3, false);
        assert!(pin.is_set_low().unwrap());
        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());
        pin.toggle().unwrap();
        assert!(pin.is_set_low().unwrap());
        assert!(gpio.setup_count(3) == 1);
    }
}
