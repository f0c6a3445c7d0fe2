// Alarm repetition codec.
//
// The device encodes weekly repetition as a bitmask with one bit per
// weekday (Monday = 2 ... Sunday = 128) and uses the literal value 0 as a
// "ring tomorrow only" sentinel. A handful of masks double as firmware
// presets (62 weekdays, 192 weekend, 254 every day); they decode to the
// same sets their bits describe but are matched explicitly first because
// the firmware documents them as distinct values.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One weekday, in device bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// The device bit for this day (Monday = 2 ... Sunday = 128).
    pub fn bit(self) -> u8 {
        match self {
            Weekday::Monday => 2,
            Weekday::Tuesday => 4,
            Weekday::Wednesday => 8,
            Weekday::Thursday => 16,
            Weekday::Friday => 32,
            Weekday::Saturday => 64,
            Weekday::Sunday => 128,
        }
    }

    /// Lowercase English day name, as the platform's repetition maps use.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

/// A set of weekdays, stored as the device bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// Monday through Friday (firmware preset mask 62).
    pub const WEEKDAYS: WeekdaySet = WeekdaySet(62);
    /// Saturday and Sunday (firmware preset mask 192).
    pub const WEEKEND: WeekdaySet = WeekdaySet(192);
    /// All seven days (firmware preset mask 254).
    pub const EVERY_DAY: WeekdaySet = WeekdaySet(254);

    pub const fn empty() -> Self {
        WeekdaySet(0)
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        WeekdaySet(days.iter().fold(0, |mask, day| mask | day.bit()))
    }

    /// Reconstruct a set from a raw mask, ignoring the unused low bit.
    pub fn from_mask(mask: u8) -> Self {
        WeekdaySet(mask & 0b1111_1110)
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & day.bit() != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= day.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        Weekday::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Weekday::name)).finish()
    }
}

// The platform's repetition model is a day-name → bool map; serialize the
// set in that shape so core can pass it straight through alarm CRUD.
impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for day in Weekday::ALL {
            map.serialize_entry(day.name(), &self.contains(day))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = std::collections::BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut set = WeekdaySet::empty();
        for day in Weekday::ALL {
            if flags.get(day.name()).copied().unwrap_or(false) {
                set.insert(day);
            }
        }
        Ok(set)
    }
}

/// Decoded alarm repetition.
///
/// Mask 0 is not "no days": the firmware treats it as a one-shot alarm that
/// rings at the next occurrence of its time, so it gets its own variant
/// rather than an empty `WeekdaySet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// One-shot: ring at the next occurrence (device mask 0).
    Tomorrow,
    /// Ring weekly on the given days.
    Weekly(WeekdaySet),
}

impl Repetition {
    /// Decode a device `daynm` mask.
    pub fn from_mask(mask: u8) -> Self {
        // Sentinels first; the remaining masks are plain bit sets.
        match mask {
            0 => Repetition::Tomorrow,
            62 => Repetition::Weekly(WeekdaySet::WEEKDAYS),
            192 => Repetition::Weekly(WeekdaySet::WEEKEND),
            254 => Repetition::Weekly(WeekdaySet::EVERY_DAY),
            other => Repetition::Weekly(WeekdaySet::from_mask(other)),
        }
    }

    /// Encode back to the device `daynm` mask.
    pub fn mask(self) -> u8 {
        match self {
            Repetition::Tomorrow => 0,
            Repetition::Weekly(set) => set.mask(),
        }
    }

    /// The weekdays this repetition covers; empty for a one-shot alarm.
    pub fn weekdays(self) -> WeekdaySet {
        match self {
            Repetition::Tomorrow => WeekdaySet::empty(),
            Repetition::Weekly(set) => set,
        }
    }
}
