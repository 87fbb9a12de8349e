//! TIM2 binding for the tick clock.
//!
//! TIM2 runs from the APB1 clock with the prescaler set so one count is
//! one microsecond; the auto-reload period is what [`TickTimer`]
//! reprograms on every reschedule.

use ch32_hal::pac;
use defmt_or_log::debug;

use crate::common::clock::{TICK_PERIOD_INIT, TIMER_FREQ, TickTimer, timer_from_us, timer_is_before};
use crate::{Dispatcher, TimerDevice};

/// Register access to TIM2 for the tick clock.
pub struct Tim2;

impl TimerDevice for Tim2 {
    fn counter(&self) -> u32 {
        pac::TIM2.cnt().read().cnt() as u32
    }

    fn period(&self) -> u32 {
        pac::TIM2.atrlr().read().atrlr() as u32
    }

    fn set_period(&self, ticks: u32) {
        // 16 bit reload register: a farther deadline simply fires early
        // and gets rescheduled by the next dispatch.
        pac::TIM2
            .atrlr()
            .write(|w| w.set_atrlr(ticks.min(u16::MAX as u32) as u16));
    }

    fn zero_counter(&self) {
        pac::TIM2.cnt().write(|w| w.set_cnt(0));
    }

    fn force_update(&self) {
        pac::TIM2.swevgr().write(|w| w.set_ug(true));
    }

    fn clear_update_flag(&self) {
        pac::TIM2.intfr().write(|w| w.set_uif(false));
    }
}

/// Mutated by the TIM2 handler once the chain is running; thread
/// context reschedules only through [`timer_kick`], which masks
/// interrupts around the call.
static TICK_TIMER: TickTimer<Tim2> = TickTimer::new(Tim2);

/// Bring up TIM2 and start the dispatch chain.
pub fn timer_init(sysclk_hz: u32) {
    critical_section::with(|_| {
        pac::RCC.apb1pcenr().modify(|w| w.set_tim2en(true));

        pac::TIM2
            .psc()
            .write(|w| w.set_psc((sysclk_hz / TIMER_FREQ - 1) as u16));
        pac::TIM2.atrlr().write(|w| w.set_atrlr(TICK_PERIOD_INIT as u16));
        pac::TIM2.cnt().write(|w| w.set_cnt(0));
        pac::TIM2.dmaintenr().modify(|w| w.set_uie(true));
        pac::TIM2.ctlr1().modify(|w| w.set_cen(true));

        unsafe {
            qingke::pfic::set_priority(pac::Interrupt::TIM2 as u8, 1 << 4);
            qingke::pfic::enable_interrupt(pac::Interrupt::TIM2 as u8);
        }

        TICK_TIMER.kick();
        debug!("tick timer running at {} Hz", TIMER_FREQ);
    });
}

/// Current extended tick count; 0 before [`timer_init`].
pub fn timer_read_time() -> u32 {
    TICK_TIMER.read_time()
}

/// Force an imminent reschedule, e.g. after the scheduler queue gained
/// an early deadline.
pub fn timer_kick() {
    critical_section::with(|_| {
        TICK_TIMER.kick();
    });
}

/// Spin for `us` microseconds.
pub fn busy_wait(us: u32) {
    let end = timer_read_time().wrapping_add(timer_from_us(us));
    while timer_is_before(timer_read_time(), end) {}
}

/// TIM2 interrupt body. The board crate's handler calls this with the
/// scheduler's dispatch hook. Nested interrupts stay enabled through
/// the flag clear and the base fold; [`TickTimer::on_interrupt`] masks
/// them only around dispatch-and-reschedule.
pub fn on_timer_interrupt(sched: &mut impl Dispatcher) {
    TICK_TIMER.on_interrupt(sched);
}
