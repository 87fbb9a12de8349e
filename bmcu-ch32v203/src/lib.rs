#![no_std]
/*!
 * Pin bindings and init for the BMCU-C mainboard (CH32V203C8T6).
 *
 * The mapping of pin to function is:
 * rs485: USART1 PA9 PA10, direction enable PA12
 * debug probe: PA13, PA14
 * status led: PD1
 * motor bridges (high, low): M1 PA15 PB3, M2 PB4 PB5, M3 PB6 PB7,
 * M4 PB8 PB9
 * spool sense: PA0..PA7
 * */

use boardcore::common::at8236::MotorPins;
use boardcore::common::pins::gpio;
use ch32_hal::{self as hal, Peripherals, rcc};

// RS-485 transceiver and debug header
pub const RS485_TX: u32 = gpio('A', 9);
pub const RS485_RX: u32 = gpio('A', 10);
pub const RS485_DE: u32 = gpio('A', 12);

// WS2812B status LED
pub const STATUS_LED: u32 = gpio('D', 1);

/// Bridge input pairs of the four AT8236 drivers, in channel order.
pub const MOTOR_PINS: [MotorPins; 4] = [
    MotorPins { high: gpio('A', 15), low: gpio('B', 3) },
    MotorPins { high: gpio('B', 4), low: gpio('B', 5) },
    MotorPins { high: gpio('B', 6), low: gpio('B', 7) },
    MotorPins { high: gpio('B', 8), low: gpio('B', 9) },
];

/// System clock configured by [`init`].
pub const SYSCLK_HZ: u32 = 144_000_000;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    defmt_or_log::error!("\n\n\n{}", info);

    loop {}
}

pub fn init() -> Peripherals {
    let config = hal::Config {
        rcc: rcc::Config::SYSCLK_FREQ_144MHZ_HSI,
        ..Default::default()
    };
    let p = hal::init(config);
    boardcore::timer_init(SYSCLK_HZ);
    p
}

/// Binds the TIM2 update interrupt to a scheduler installed at runtime.
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! irqs {
    ($sched:ty) => {
        pub mod irqs_mod {
            use core::cell::RefCell;

            use critical_section::Mutex;

            pub static SCHEDULER: Mutex<RefCell<Option<$sched>>> =
                Mutex::new(RefCell::new(None));

            pub fn install_scheduler(sched: $sched) {
                critical_section::with(|cs| {
                    SCHEDULER.borrow_ref_mut(cs).replace(sched);
                });
            }

            #[qingke_rt::interrupt]
            fn TIM2() {
                // Nested interrupts stay enabled here. Thread-context
                // accessors of SCHEDULER mask interrupts and no other
                // handler touches it, so the handler is the exclusive
                // owner for its whole run and can take the token
                // without masking.
                let cs = unsafe { critical_section::CriticalSection::new() };
                if let Some(sched) = SCHEDULER.borrow_ref_mut(cs).as_mut() {
                    ::boardcore::on_timer_interrupt(sched);
                }
            }
        }
        pub use irqs_mod::*;
    };
}
