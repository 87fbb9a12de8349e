//! Monotonic tick clock built on one 16 bit general purpose timer.
//!
//! The hardware counter wraps at the programmed period; every wrap
//! raises the update interrupt and the elapsed period is folded into a
//! 32 bit software base. `base + counter` is therefore valid at any
//! moment and monotonic modulo 2^32. Consumers must compare ticks with
//! [`timer_is_before`], never with an unsigned subtraction.

use core::sync::atomic::Ordering;

use defmt_or_log::trace;
use portable_atomic::AtomicU32;

use crate::{Dispatcher, TimerDevice};

/// Tick rate after the hardware prescaler. One tick is one microsecond.
pub const TIMER_FREQ: u32 = 1_000_000;

/// Shortest delay `schedule_at` will program. Rescheduling races the
/// free-running counter, anything closer than this can be missed
/// entirely while the compare registers are rewritten.
pub const MIN_SCHEDULE_TICKS: i32 = 2;

/// Delay used by [`TickTimer::kick`] to start (or restart) the
/// interrupt chain.
pub const KICK_TICKS: u32 = 50;

/// Period programmed at init, before the first kick takes over.
pub const TICK_PERIOD_INIT: u32 = 1000;

/// `true` if `t1` comes before `t2`, tolerating wraparound.
#[inline]
pub fn timer_is_before(t1: u32, t2: u32) -> bool {
    (t1.wrapping_sub(t2) as i32) < 0
}

/// Microseconds to ticks.
#[inline]
pub const fn timer_from_us(us: u32) -> u32 {
    us * (TIMER_FREQ / 1_000_000)
}

/// The extended scheduling clock.
///
/// Every method takes `&self`: the base is a relaxed atomic and the
/// device is register-style interior mutable, so the clock can live in
/// a plain static owned by the period-elapsed interrupt. `read_time`
/// is safe from any context at any time. The mutating entry points are
/// not reentrant: `on_interrupt` belongs to the handler alone, and a
/// `schedule_at` or `kick` from thread context must run with the
/// update interrupt masked so it cannot race the handler's fold.
pub struct TickTimer<D: TimerDevice> {
    dev: D,
    base: AtomicU32,
}

impl<D: TimerDevice> TickTimer<D> {
    pub const fn new(dev: D) -> Self {
        Self {
            dev,
            base: AtomicU32::new(0),
        }
    }

    /// Current extended tick count. Never causes a reschedule.
    pub fn read_time(&self) -> u32 {
        self.base.load(Ordering::Relaxed).wrapping_add(self.dev.counter())
    }

    /// Arm the hardware to interrupt at or after `next`.
    ///
    /// The base is rebased to the current time, the counter restarts
    /// from zero and the new period is latched synchronously.
    pub fn schedule_at(&self, next: u32) {
        let now = self.read_time();
        let mut diff = next.wrapping_sub(now) as i32;
        if diff < MIN_SCHEDULE_TICKS {
            diff = MIN_SCHEDULE_TICKS;
        }
        self.base.store(now, Ordering::Relaxed);
        self.dev.set_period(diff as u32);
        self.dev.zero_counter();
        self.dev.force_update();
    }

    /// Start (or restart) the dispatch chain a short while from now.
    pub fn kick(&self) {
        let next = self.read_time().wrapping_add(KICK_TICKS);
        trace!("timer kick, next dispatch at {}", next);
        self.schedule_at(next);
    }

    /// Period-elapsed interrupt body.
    ///
    /// The flag clear and the base fold run with nested interrupts
    /// still enabled; only the dispatch-and-reschedule span masks
    /// interrupts, so a thread-context kick cannot slip between the
    /// dispatch result and the compare register writes.
    pub fn on_interrupt(&self, sched: &mut impl Dispatcher) {
        self.dev.clear_update_flag();
        let folded = self.base.load(Ordering::Relaxed).wrapping_add(self.dev.period());
        self.base.store(folded, Ordering::Relaxed);

        critical_section::with(|_| {
            let next = sched.dispatch_many();
            self.schedule_at(next);
        });
    }

    /// Spin until `us` microseconds have elapsed. Pure busy loop, no
    /// yield; a missed hardware deadline in the meantime only delays
    /// dispatch.
    pub fn busy_wait(&self, us: u32) {
        let end = self.read_time().wrapping_add(timer_from_us(us));
        while timer_is_before(self.read_time(), end) {}
    }
}


#[cfg(all(test, feature = "std"))]
mod sim_tests {
    use super::*;
    use crate::std::{SimScheduler, SimTimer};
    use test_log::test;

    fn make_timer(period: u32) -> (TickTimer<SimTimer>, SimTimer) {
        let sim = SimTimer::new(period);
        let handle = sim.clone();
        (TickTimer::new(sim), handle)
    }

    #[test]
    fn read_time_is_base_plus_counter() {
        let (timer, sim) = make_timer(1000);
        assert_eq!(timer.read_time(), 0);
        sim.advance(17);
        assert_eq!(timer.read_time(), 17);
    }

    #[test]
    fn schedule_in_the_past_clamps_to_minimum_margin() {
        let (timer, sim) = make_timer(1000);
        sim.advance(100);
        let now = timer.read_time();
        // Target already passed: the effective delay must still be the
        // safe minimum, never zero or negative.
        timer.schedule_at(now.wrapping_sub(500));
        assert_eq!(sim.period(), MIN_SCHEDULE_TICKS as u32);
        assert_eq!(sim.counter_value(), 0);
        // Rebasing must not move the clock.
        assert_eq!(timer.read_time(), now);
    }

    #[test]
    fn schedule_rebases_and_programs_the_exact_delay() {
        let (timer, sim) = make_timer(1000);
        sim.advance(250);
        let now = timer.read_time();
        timer.schedule_at(now.wrapping_add(300));
        assert_eq!(sim.period(), 300);
        assert_eq!(sim.force_updates(), 1);
        assert_eq!(timer.read_time(), now);
    }

    #[test]
    fn interrupt_folds_exactly_one_period_per_call() {
        let (timer, sim) = make_timer(1000);
        let mut sched = SimScheduler::new();
        let mut expected = 0u32;
        for i in 1..=5u32 {
            let period = sim.period();
            expected += period;
            sched.next = expected + 400;
            sim.advance(period);
            assert!(sim.pending());
            timer.on_interrupt(&mut sched);
            assert!(!sim.pending());
            assert_eq!(sched.dispatched, i);
            // No double count, no skip: the base advanced by the
            // elapsed period and was rebased to now.
            assert_eq!(timer.read_time(), expected);
            assert_eq!(sim.period(), 400);
        }
    }

    #[test]
    fn read_time_is_monotonic_across_wraparound() {
        let (timer, sim) = make_timer(1000);
        timer.base.store(u32::MAX - 1500, Ordering::Relaxed);
        let mut sched = SimScheduler::new();
        let mut last = timer.read_time();
        for _ in 0..4 {
            sched.next = timer.read_time().wrapping_add(600);
            sim.advance(sim.period());
            timer.on_interrupt(&mut sched);
            let now = timer.read_time();
            assert!(
                !timer_is_before(now, last),
                "clock went backwards: {} then {}",
                last,
                now
            );
            last = now;
        }
        // The 32 bit value itself wrapped during the run.
        assert!(last < 1_000_000);
    }

    #[test]
    fn kick_schedules_fifty_ticks_out() {
        let (timer, sim) = make_timer(1000);
        sim.advance(10);
        timer.kick();
        assert_eq!(sim.period(), KICK_TICKS);
    }

    #[test]
    fn interrupt_path_needs_no_exclusive_access() {
        // The handler only ever holds a shared reference to the clock,
        // so a concurrent read_time never has to wait for it.
        let (timer, sim) = make_timer(1000);
        let reader = &timer;
        let mut sched = SimScheduler::new();
        sched.next = 1400;
        sim.advance(1000);
        timer.on_interrupt(&mut sched);
        assert_eq!(reader.read_time(), 1000);
        assert_eq!(sim.period(), 400);
    }

    #[test]
    fn busy_wait_spins_for_the_requested_time() {
        let (timer, sim) = make_timer(u32::MAX);
        sim.tick_on_read(true);
        let start = timer.read_time();
        timer.busy_wait(200);
        let elapsed = timer.read_time().wrapping_sub(start);
        assert!(elapsed >= 200, "only {} ticks elapsed", elapsed);
    }
}
