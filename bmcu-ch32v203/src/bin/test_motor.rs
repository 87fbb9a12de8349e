#![no_std]
#![no_main]

use bmcu_ch32v203::{MOTOR_PINS, init, irqs};
use boardcore::prelude::*;
use boardcore::{HwGpio, busy_wait, timer_read_time};
use defmt_or_log::info;

/// No timers queued yet: keep the chain alive one millisecond out.
pub struct IdleSched;

impl Dispatcher for IdleSched {
    fn dispatch_many(&mut self) -> u32 {
        timer_read_time().wrapping_add(1000)
    }
}

irqs!(IdleSched);

#[qingke_rt::entry]
fn main() -> ! {
    let _p = init();
    install_scheduler(IdleSched);

    let mut outs = DigitalOuts::new(HwGpio, MOTOR_PINS);
    let mut step = outs.setup(at8236_pin(0, Role::Step), false);
    let mut dir = outs.setup(at8236_pin(0, Role::Dir), false);
    info!("motor 1 exercise, one direction flip per second");

    let mut forward = true;
    loop {
        outs.write(&mut dir, forward);
        // 500 coarse steps, then turn around.
        for _ in 0..500 {
            outs.write(&mut step, true);
            busy_wait(1000);
            outs.write(&mut step, false);
            busy_wait(1000);
        }
        forward = !forward;
    }
}
