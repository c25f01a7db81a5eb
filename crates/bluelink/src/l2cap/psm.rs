//! PSMs of the channels this engine can terminate

use std::fmt;

/// Protocol/Service Multiplexer
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PSM {
    AVCTP,
    AVCTP_BROWSING,
    /// ATT over BR/EDR
    ATT,
    EATT,
    Dynamic(u16),
}

/// Fixed assignments, `(psm, value, name)`
const ASSIGNED: [(PSM, u16, &str); 4] = [
    (PSM::AVCTP, 0x0017, "AVCTP"),
    (PSM::AVCTP_BROWSING, 0x001B, "AVCTP-Browsing"),
    (PSM::ATT, 0x001F, "ATT"),
    (PSM::EATT, 0x0027, "EATT"),
];

/// Dynamically assigned PSMs start here and are always odd
const DYNAMIC_PSM_MIN: u16 = 0x1001;

impl PSM {
    /// Dynamic PSMs must be odd and at least 0x1001
    pub fn is_valid(&self) -> bool {
        match *self {
            PSM::Dynamic(value) => value % 2 == 1 && value >= DYNAMIC_PSM_MIN,
            _ => true,
        }
    }

    pub fn value(&self) -> u16 {
        match *self {
            PSM::Dynamic(value) => value,
            fixed => ASSIGNED
                .iter()
                .find(|(psm, _, _)| *psm == fixed)
                .map_or(0, |(_, value, _)| *value),
        }
    }

    pub fn from_value(value: u16) -> Option<Self> {
        if let Some((psm, _, _)) = ASSIGNED.iter().find(|(_, v, _)| *v == value) {
            return Some(*psm);
        }
        let dynamic = PSM::Dynamic(value);
        dynamic.is_valid().then_some(dynamic)
    }

    fn name(&self) -> &'static str {
        ASSIGNED
            .iter()
            .find(|(psm, _, _)| psm == self)
            .map_or("Dynamic PSM", |(_, _, name)| *name)
    }
}

impl fmt::Display for PSM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#06x})", self.name(), self.value())
    }
}
