//! Venue reference data and the view helpers that format it.
//!
//! Times are kept as the `"HH:MM"` strings the venue data is written in;
//! `"00:00"` as a closing time means midnight at the end of the day.

use chrono::{DateTime, Datelike, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use super::id::{SpecialId, VenueId};

/// Kind of venue, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VenueType {
    DiveBar,
    SportsBar,
    Club,
    Brewery,
    Hangout,
    Pool,
}

/// Category of a weekly special.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialType {
    HappyHour,
    LadiesNight,
    TriviaNight,
    Karaoke,
    LiveMusic,
    CollegeNight,
    DrinkSpecial,
    FoodSpecial,
}

impl std::str::FromStr for SpecialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_owned()))
            .map_err(|_| format!("invalid special type: {s}"))
    }
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenHours {
    #[serde(with = "weekday_name")]
    pub day: Weekday,
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub closed: bool,
}

/// A recurring weekly special.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Special {
    pub id: SpecialId,
    pub title: String,
    pub description: String,
    #[serde(with = "weekday_name")]
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: SpecialType,
    pub recurring: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A bar or club from the bundled venue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub types: Vec<VenueType>,
    pub rating: f32,
    /// 1 to 4.
    pub price_level: u8,
    pub open_hours: Vec<OpenHours>,
    pub specials: Vec<Special>,
    pub featured_image: String,
    pub images: Vec<String>,
    pub location: Location,
}

impl Venue {
    /// Hours for `day`, if listed.
    #[must_use]
    pub fn hours_on(&self, day: Weekday) -> Option<&OpenHours> {
        self.open_hours.iter().find(|h| h.day == day)
    }

    /// Whether the venue lists open hours for `day`.
    #[must_use]
    pub fn is_open_on(&self, day: Weekday) -> bool {
        self.hours_on(day).is_some_and(|h| !h.closed)
    }

    /// Specials that run on `day`.
    pub fn specials_on(&self, day: Weekday) -> impl Iterator<Item = &Special> {
        self.specials.iter().filter(move |s| s.day == day)
    }
}

/// English name of a weekday, as used in venue data.
#[must_use]
pub const fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Name of the local weekday at `now`.
#[must_use]
pub fn current_day_name<Tz: TimeZone>(now: &DateTime<Tz>) -> &'static str {
    day_name(now.weekday())
}

fn split_time(time: &str) -> Option<(u32, &str)> {
    let (hours, minutes) = time.split_once(':')?;
    let hour = hours.trim().parse::<u32>().ok()?;
    (hour < 24 && minutes.len() == 2 && minutes.bytes().all(|b| b.is_ascii_digit()))
        .then_some((hour, minutes))
}

const fn twelve_hour(hour: u32) -> (u32, &'static str) {
    let display = if hour % 12 == 0 { 12 } else { hour % 12 };
    (display, if hour >= 12 { "PM" } else { "AM" })
}

/// `"19:30"` to `"7:30 PM"`. Unparseable input is returned unchanged.
#[must_use]
pub fn format_time_slot(slot: &str) -> String {
    match split_time(slot) {
        Some((hour, minutes)) => {
            let (display, meridiem) = twelve_hour(hour);
            format!("{display}:{minutes} {meridiem}")
        }
        None => slot.to_owned(),
    }
}

/// Like [`format_time_slot`] but drops `:00`, so `"16:00"` becomes `"4 PM"`.
#[must_use]
pub fn format_clock_time(time: &str) -> String {
    match split_time(time) {
        Some((hour, "00")) => {
            let (display, meridiem) = twelve_hour(hour);
            format!("{display} {meridiem}")
        }
        Some(_) => format_time_slot(time),
        None => time.to_owned(),
    }
}

/// `"4 PM - 2 AM"`, or `"Closed today"` when there are no hours.
#[must_use]
pub fn format_open_hours(hours: Option<&OpenHours>) -> String {
    match hours {
        Some(h) if !h.closed => {
            format!("{} - {}", format_clock_time(&h.open), format_clock_time(&h.close))
        }
        _ => "Closed today".to_owned(),
    }
}

/// One `$` per price level.
#[must_use]
pub fn format_price(level: u8) -> String {
    "$".repeat(usize::from(level))
}

/// Half-hour slots from 7 PM through 2:30 AM.
#[must_use]
pub fn time_slots() -> Vec<String> {
    (19..24)
        .chain(0..=2)
        .flat_map(|hour| [format!("{hour}:00"), format!("{hour}:30")])
        .collect()
}

mod weekday_name {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::day_name(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Weekday>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn hours(open: &str, close: &str) -> OpenHours {
        OpenHours {
            day: Weekday::Fri,
            open: open.to_owned(),
            close: close.to_owned(),
            closed: false,
        }
    }

    #[test]
    fn test_format_time_slot() {
        assert_eq!(format_time_slot("19:30"), "7:30 PM");
        assert_eq!(format_time_slot("0:00"), "12:00 AM");
        assert_eq!(format_time_slot("12:00"), "12:00 PM");
        assert_eq!(format_time_slot("late"), "late");
    }

    #[test]
    fn test_format_open_hours() {
        assert_eq!(format_open_hours(Some(&hours("16:00", "02:00"))), "4 PM - 2 AM");
        assert_eq!(format_open_hours(Some(&hours("16:30", "00:00"))), "4:30 PM - 12 AM");
        assert_eq!(format_open_hours(None), "Closed today");

        let mut closed = hours("", "");
        closed.closed = true;
        assert_eq!(format_open_hours(Some(&closed)), "Closed today");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(2), "$$");
        assert_eq!(format_price(0), "");
    }

    #[test]
    fn test_time_slots() {
        let slots = time_slots();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first().unwrap(), "19:00");
        assert_eq!(slots.last().unwrap(), "2:30");
        assert!(slots.contains(&"0:00".to_owned()));
    }

    #[test]
    fn test_current_day_name() {
        let friday = Utc.with_ymd_and_hms(2026, 10, 16, 22, 0, 0).unwrap();
        assert_eq!(current_day_name(&friday), "Friday");
    }

    #[test]
    fn test_special_json_uses_full_day_names() {
        let special = Special {
            id: SpecialId::new("1-1"),
            title: "Open Mic Night".to_owned(),
            description: String::new(),
            day: Weekday::Tue,
            start_time: "20:00".to_owned(),
            end_time: "23:00".to_owned(),
            kind: SpecialType::LiveMusic,
            recurring: true,
        };
        let json = serde_json::to_value(&special).unwrap();
        assert_eq!(json["day"], "Tuesday");
        assert_eq!(json["type"], "live-music");
        assert_eq!(json["startTime"], "20:00");
        let back: Special = serde_json::from_value(json).unwrap();
        assert_eq!(back, special);
    }

    #[test]
    fn test_special_type_from_str() {
        assert_eq!("happy-hour".parse::<SpecialType>().unwrap(), SpecialType::HappyHour);
        assert!("brunch".parse::<SpecialType>().is_err());
    }
}
