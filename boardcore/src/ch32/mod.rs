mod gpio;
pub use gpio::*;

mod serial;
pub use serial::*;

mod timer;
pub use timer::*;
