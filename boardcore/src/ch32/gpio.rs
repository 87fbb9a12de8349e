use ch32_hal::gpio::{AnyPin, Level, Output, Speed};

use crate::GpioBackend;
use crate::common::pins::MAX_GPIO;

/// Physical GPIO backend over the hal's push-pull outputs.
pub struct HwGpio;

impl GpioBackend for HwGpio {
    type Out = Output<'static>;

    fn out_setup(&mut self, pin: u32, val: bool) -> Output<'static> {
        if pin >= MAX_GPIO {
            defmt_or_log::panic!("Invalid GPIO pin {}", pin);
        }
        let pin = unsafe { AnyPin::steal(pin as u8) };
        Output::new(pin, Level::from(val), Speed::Low)
    }

    fn out_reset(&mut self, out: &mut Output<'static>, val: bool) {
        // The hal keeps the pin in push-pull output mode for the whole
        // lifetime of the handle, only the level needs restoring.
        if val {
            out.set_high();
        } else {
            out.set_low();
        }
    }
}
