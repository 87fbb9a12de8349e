//! Pin numbering shared with the host configuration tool.
//!
//! Physical pins are numbered `(bank - 'A') * 16 + n` like the usual
//! PA0..PE15 naming. The AT8236 motor channels get a reserved window
//! above the physical space: two virtual pins per channel, step on the
//! even offset and dir on the odd one. The window is decoded once at
//! the digital-output boundary, everything past that point works on a
//! [`PinAddr`].

/// Pin number of `P<bank><n>`, e.g. `gpio('A', 15)` for PA15.
pub const fn gpio(bank: char, n: u32) -> u32 {
    (bank as u32 - 'A' as u32) * 16 + n
}

/// Ports A..E, 16 pins each.
pub const MAX_GPIO: u32 = 5 * 16;

/// First virtual pin of motor channel 1.
pub const AT8236_PIN_BASE: u32 = 0x100;
/// Virtual pins per motor channel.
pub const AT8236_PIN_STRIDE: u32 = 2;
/// Number of AT8236 H-bridge channels on the board.
pub const AT8236_CHANNELS: usize = 4;

/// Which of a channel's two logical bits a virtual pin addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Step,
    Dir,
}

/// Virtual pin number of one motor channel signal.
pub const fn at8236_pin(channel: usize, role: Role) -> u32 {
    let role = match role {
        Role::Step => 0,
        Role::Dir => 1,
    };
    AT8236_PIN_BASE + channel as u32 * AT8236_PIN_STRIDE + role
}

/// Decoded pin number: either a physical GPIO or a motor channel bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAddr {
    Hw(u32),
    Motor { channel: usize, role: Role },
}

impl PinAddr {
    /// Total over the whole 32 bit pin space: anything outside the
    /// AT8236 window is handed to the physical layer, which decides
    /// whether it exists.
    pub const fn decode(pin: u32) -> PinAddr {
        let end = AT8236_PIN_BASE + AT8236_PIN_STRIDE * AT8236_CHANNELS as u32;
        if pin >= AT8236_PIN_BASE && pin < end {
            let rel = pin - AT8236_PIN_BASE;
            PinAddr::Motor {
                channel: (rel / AT8236_PIN_STRIDE) as usize,
                role: if rel & 1 == 0 { Role::Step } else { Role::Dir },
            }
        } else {
            PinAddr::Hw(pin)
        }
    }
}

/// One named pin range exported to the host, `DECL_ENUMERATION` style.
pub struct PinEnum {
    pub name: &'static str,
    pub base: u32,
    pub count: u32,
}

/// Names the host configuration tool may map onto pin numbers. The
/// firmware side never parses these, it only sees the numbers.
pub static PIN_ENUMERATIONS: &[PinEnum] = &[
    PinEnum { name: "PA0", base: gpio('A', 0), count: 16 },
    PinEnum { name: "PB0", base: gpio('B', 0), count: 16 },
    PinEnum { name: "PC0", base: gpio('C', 0), count: 16 },
    PinEnum { name: "PD0", base: gpio('D', 0), count: 16 },
    PinEnum { name: "PE0", base: gpio('E', 0), count: 16 },
    PinEnum { name: "AT8236_M1_STEP", base: at8236_pin(0, Role::Step), count: 1 },
    PinEnum { name: "AT8236_M1_DIR", base: at8236_pin(0, Role::Dir), count: 1 },
    PinEnum { name: "AT8236_M2_STEP", base: at8236_pin(1, Role::Step), count: 1 },
    PinEnum { name: "AT8236_M2_DIR", base: at8236_pin(1, Role::Dir), count: 1 },
    PinEnum { name: "AT8236_M3_STEP", base: at8236_pin(2, Role::Step), count: 1 },
    PinEnum { name: "AT8236_M3_DIR", base: at8236_pin(2, Role::Dir), count: 1 },
    PinEnum { name: "AT8236_M4_STEP", base: at8236_pin(3, Role::Step), count: 1 },
    PinEnum { name: "AT8236_M4_DIR", base: at8236_pin(3, Role::Dir), count: 1 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_pins_decode_to_hw() {
        assert_eq!(PinAddr::decode(gpio('A', 0)), PinAddr::Hw(0));
        assert_eq!(PinAddr::decode(gpio('E', 15)), PinAddr::Hw(79));
        // Unmapped but outside the virtual window: still physical, the
        // backend is the one that rejects it.
        assert_eq!(PinAddr::decode(0x90), PinAddr::Hw(0x90));
        assert_eq!(
            PinAddr::decode(AT8236_PIN_BASE + AT8236_PIN_STRIDE * 4),
            PinAddr::Hw(AT8236_PIN_BASE + AT8236_PIN_STRIDE * 4)
        );
    }

    #[test]
    fn virtual_pins_decode_to_channel_and_role() {
        for channel in 0..AT8236_CHANNELS {
            for role in [Role::Step, Role::Dir] {
                let pin = at8236_pin(channel, role);
                assert_eq!(PinAddr::decode(pin), PinAddr::Motor { channel, role });
            }
        }
    }

    #[test]
    fn enumeration_table_is_consistent() {
        for e in PIN_ENUMERATIONS {
            for offset in 0..e.count {
                // Every named pin decodes without overlapping the other
                // address class.
                match PinAddr::decode(e.base + offset) {
                    PinAddr::Hw(pin) => assert!(pin < MAX_GPIO),
                    PinAddr::Motor { channel, .. } => assert!(channel < AT8236_CHANNELS),
                }
            }
        }
    }
}
