use ch32_hal::gpio::Output;
use ch32_hal::mode;
use ch32_hal::usart::{self, Uart};

/// USART wrapper for an RS-485 transceiver in half duplex.
///
/// The direction-enable pin is raised for the whole transmit and only
/// dropped once the last byte has left the shifter, then the bus is
/// released back to the receiver.
pub struct Rs485Serial<'a, T: usart::Instance> {
    uart: Uart<'a, T, mode::Blocking>,
    de: Output<'a>,
}

impl<'a, T: usart::Instance> Rs485Serial<'a, T> {
    pub fn new(uart: Uart<'a, T, mode::Blocking>, mut de: Output<'a>) -> Self {
        de.set_low();
        Self { uart, de }
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), usart::Error> {
        self.de.set_high();
        let ret = self
            .uart
            .blocking_write(buf)
            .and_then(|_| self.uart.blocking_flush());
        self.de.set_low();
        ret
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<(), usart::Error> {
        self.uart.blocking_read(buf)
    }
}
