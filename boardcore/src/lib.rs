#![no_std]
/*!
Board support core for the BMCU-C motion controller (CH32V203).

The portable pieces live in [`common`]: the tick clock that extends the
16 bit hardware timer, the virtual pin layer that drives the AT8236
motor bridges, the non-local jump used by the scheduler shutdown path
and the init-time memory pool. The `ch32` feature binds them to the
real peripherals, the `std` feature provides simulated hardware for
tests on the host.
*/

#[cfg(feature = "std")]
pub mod std;

#[cfg(feature = "ch32")]
mod ch32;
#[cfg(feature = "ch32")]
pub use ch32::*;

pub mod common;

mod traits;
pub use traits::*;

pub mod prelude;
