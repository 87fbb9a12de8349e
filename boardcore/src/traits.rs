use embedded_hal::digital::StatefulOutputPin;

/// Register-level access to the free-running scheduling timer.
///
/// Models the small slice of a general purpose 16 bit timer the tick
/// clock needs: a counter that wraps at a programmable period and
/// raises an update event when it does. Registers are interior-mutable
/// by nature, so every method takes `&self`; serializing writers is the
/// clock's job, not the device's.
pub trait TimerDevice {
    /// Counter value since the last reschedule.
    fn counter(&self) -> u32;
    /// Currently programmed auto-reload period.
    fn period(&self) -> u32;
    fn set_period(&self, ticks: u32);
    fn zero_counter(&self);
    /// Force a register update event so a freshly written period takes
    /// effect now instead of after one spurious extra period.
    fn force_update(&self);
    /// Acknowledge the pending period-elapsed interrupt.
    fn clear_update_flag(&self);
}

/// Hook into the cooperative scheduler's dispatch loop.
pub trait Dispatcher {
    /// Run every expired timer and return the next absolute tick to
    /// fire at.
    fn dispatch_many(&mut self) -> u32;
}

/// Physical digital-output layer beneath the virtual pin dispatch.
///
/// Invalid pin numbers are fatal, there is no recoverable path for a
/// miswired configuration.
pub trait GpioBackend {
    type Out: StatefulOutputPin;
    /// Claim a pin, switch it to push-pull output and drive it to `val`.
    fn out_setup(&mut self, pin: u32, val: bool) -> Self::Out;
    /// Re-apply output mode and level on an already claimed pin.
    fn out_reset(&mut self, out: &mut Self::Out, val: bool);
}
