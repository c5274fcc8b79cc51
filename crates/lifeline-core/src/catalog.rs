//! Fixed table of alert types shared by transmitters and receivers.

/// Number of entries in the alert table.
pub const ALERT_COUNT: u8 = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Ok,
    Info,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Ok => "OK",
            Self::Info => "INFO",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlertDescriptor {
    pub code: AlertCode,
    pub long_name: &'static str,
    pub short_name: &'static str,
    pub priority: Priority,
}

/// Validated index into the alert table (0..=14).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AlertCode(u8);

impl AlertCode {
    pub const EMERGENCY: Self = Self(0);
    pub const OTHER: Self = Self(ALERT_COUNT - 1);

    pub const fn new(raw: u8) -> Option<Self> {
        if raw < ALERT_COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Out-of-range values collapse onto [`AlertCode::OTHER`].
    pub const fn clamped(raw: u32) -> Self {
        if raw < ALERT_COUNT as u32 {
            Self(raw as u8)
        } else {
            Self::OTHER
        }
    }

    /// Accepts `A`..=`O` in either case.
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        Self::new(upper as u8 - b'A')
    }

    pub const fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub fn descriptor(self) -> &'static AlertDescriptor {
        &ALERTS[self.0 as usize]
    }

    pub fn all() -> impl Iterator<Item = AlertCode> {
        (0..ALERT_COUNT).map(Self)
    }
}

const fn entry(
    code: u8,
    long_name: &'static str,
    short_name: &'static str,
    priority: Priority,
) -> AlertDescriptor {
    AlertDescriptor {
        code: AlertCode(code),
        long_name,
        short_name,
        priority,
    }
}

static ALERTS: [AlertDescriptor; ALERT_COUNT as usize] = [
    entry(0, "EMERGENCY", "EMERG", Priority::Critical),
    entry(1, "MEDICAL EMERGENCY", "MEDICAL", Priority::Critical),
    entry(2, "FIRE OUTBREAK", "FIRE", Priority::Critical),
    entry(3, "ACCIDENT", "ACCIDENT", Priority::Critical),
    entry(4, "SECURITY THREAT", "SECURITY", Priority::High),
    entry(5, "FLOOD WARNING", "FLOOD", Priority::High),
    entry(6, "TRAPPED / NEED RESCUE", "RESCUE", Priority::High),
    entry(7, "NEED FOOD / WATER", "SUPPLIES", Priority::Medium),
    entry(8, "NEED SHELTER", "SHELTER", Priority::Medium),
    entry(9, "NEED TRANSPORT", "TRANSPORT", Priority::Medium),
    entry(10, "POWER OUTAGE", "POWER", Priority::Medium),
    entry(11, "ALL SAFE", "SAFE", Priority::Ok),
    entry(12, "CHECK-IN", "CHECK-IN", Priority::Ok),
    entry(13, "TEST MESSAGE", "TEST", Priority::Info),
    entry(14, "OTHER EMERGENCY", "OTHER", Priority::High),
];

pub fn descriptors() -> &'static [AlertDescriptor] {
    &ALERTS
}

/// Resolves a raw code, clamping anything unknown to the last entry.
pub fn lookup(raw: u32) -> &'static AlertDescriptor {
    AlertCode::clamped(raw).descriptor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_codes_match_positions() {
        for (idx, desc) in descriptors().iter().enumerate() {
            assert_eq!(desc.code.index() as usize, idx);
        }
    }

    #[test]
    fn letters_cover_a_through_o() {
        assert_eq!(AlertCode::from_letter('a'), AlertCode::new(0));
        assert_eq!(AlertCode::from_letter('O'), Some(AlertCode::OTHER));
        assert_eq!(AlertCode::from_letter('P'), None);
        assert_eq!(AlertCode::from_letter('3'), None);
        assert_eq!(AlertCode::OTHER.letter(), 'O');
    }

    #[test]
    fn unknown_codes_resolve_to_other() {
        assert_eq!(lookup(99).long_name, "OTHER EMERGENCY");
        assert_eq!(lookup(2).short_name, "FIRE");
        assert_eq!(AlertCode::new(15), None);
    }
}
