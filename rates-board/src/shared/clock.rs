//! World clocks shown along the top of the board

use chrono::{DateTime, Utc};
use chrono_tz::{America, Asia, Europe, Tz};

/// Clock refresh interval
pub const CLOCK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(1000);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldClock {
    pub label: &'static str,
    pub zone: Tz,
}

/// Moscow, Dubai, Bangkok, London and New York, in display order
pub const KIOSK_CLOCKS: [WorldClock; 5] = [
    WorldClock {
        label: "MOSCOW",
        zone: Europe::Moscow,
    },
    WorldClock {
        label: "DUBAI",
        zone: Asia::Dubai,
    },
    WorldClock {
        label: "BANGKOK",
        zone: Asia::Bangkok,
    },
    WorldClock {
        label: "LONDON",
        zone: Europe::London,
    },
    WorldClock {
        label: "NEW YORK",
        zone: America::New_York,
    },
];

/// 24-hour `HH:MM:SS` wall time in `zone`
pub fn format_clock(zone: Tz, now: DateTime<Utc>) -> String {
    now.with_timezone(&zone).format("%H:%M:%S").to_string()
}
