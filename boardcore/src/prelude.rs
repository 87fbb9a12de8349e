pub use crate::common::at8236::{DigitalOuts, GpioOut, MotorPins};
pub use crate::common::clock::{TickTimer, timer_from_us, timer_is_before};
pub use crate::common::jump::JumpContext;
pub use crate::common::pins::{PinAddr, Role, at8236_pin, gpio};
pub use crate::{Dispatcher, GpioBackend, TimerDevice};
