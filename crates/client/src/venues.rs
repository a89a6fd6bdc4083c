//! Bundled venue list.
//!
//! Venue data ships with the app and never changes at runtime, so lookups
//! borrow from a lazily built static list.

use std::sync::LazyLock;

use barbuddy_core::{
    Location, OpenHours, Special, SpecialId, SpecialType, Venue, VenueId, VenueType,
};
use chrono::Weekday;

const FEATURED_IMAGE: &str = "https://images.pexels.com/photos/1267320/pexels-photo-1267320.jpeg";

static VENUES: LazyLock<Vec<Venue>> = LazyLock::new(build_venues);

/// Every bundled venue.
#[must_use]
pub fn all() -> &'static [Venue] {
    &VENUES
}

/// Venue by id.
#[must_use]
pub fn find(id: &VenueId) -> Option<&'static Venue> {
    VENUES.iter().find(|v| &v.id == id)
}

/// Every special running on `day`, paired with its venue.
#[must_use]
pub fn specials_for_day(day: Weekday) -> Vec<(&'static Venue, &'static Special)> {
    VENUES
        .iter()
        .flat_map(|venue| venue.specials_on(day).map(move |special| (venue, special)))
        .collect()
}

/// Every special of one kind, paired with its venue.
#[must_use]
pub fn specials_by_type(kind: SpecialType) -> Vec<(&'static Venue, &'static Special)> {
    VENUES
        .iter()
        .flat_map(|venue| {
            venue
                .specials
                .iter()
                .filter(move |s| s.kind == kind)
                .map(move |special| (venue, special))
        })
        .collect()
}

/// Venues of one type.
#[must_use]
pub fn by_type(kind: VenueType) -> Vec<&'static Venue> {
    VENUES.iter().filter(|v| v.types.contains(&kind)).collect()
}

// =============================================================================
// Fixture data
// =============================================================================

fn open(day: Weekday, open: &str, close: &str) -> OpenHours {
    OpenHours {
        day,
        open: open.to_owned(),
        close: close.to_owned(),
        closed: false,
    }
}

fn closed(day: Weekday) -> OpenHours {
    OpenHours {
        day,
        open: String::new(),
        close: String::new(),
        closed: true,
    }
}

fn special(
    id: &str,
    title: &str,
    description: &str,
    day: Weekday,
    window: (&str, &str),
    kind: SpecialType,
) -> Special {
    Special {
        id: SpecialId::new(id),
        title: title.to_owned(),
        description: description.to_owned(),
        day,
        start_time: window.0.to_owned(),
        end_time: window.1.to_owned(),
        kind,
        recurring: true,
    }
}

struct Contact<'a> {
    address: &'a str,
    phone: &'a str,
    website: &'a str,
    instagram: &'a str,
}

#[allow(clippy::too_many_arguments)]
fn venue(
    id: &str,
    name: &str,
    description: &str,
    contact: &Contact<'_>,
    types: Vec<VenueType>,
    (rating, price_level): (f32, u8),
    open_hours: Vec<OpenHours>,
    specials: Vec<Special>,
    (latitude, longitude): (f64, f64),
) -> Venue {
    Venue {
        id: VenueId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        address: contact.address.to_owned(),
        phone: contact.phone.to_owned(),
        website: Some(contact.website.to_owned()),
        instagram: Some(contact.instagram.to_owned()),
        types,
        rating,
        price_level,
        open_hours,
        specials,
        featured_image: FEATURED_IMAGE.to_owned(),
        images: vec![FEATURED_IMAGE.to_owned()],
        location: Location {
            latitude,
            longitude,
        },
    }
}

#[allow(clippy::too_many_lines)]
fn build_venues() -> Vec<Venue> {
    use Weekday::{Fri, Mon, Sat, Sun, Thu, Tue, Wed};

    vec![
        venue(
            "1",
            "The Hummingbird Stage & Taproom",
            "Live music venue with a great selection of craft beers and regular performances.",
            &Contact {
                address: "430 Cherry St, Macon, GA 31201",
                phone: "(478) 741-9130",
                website: "https://www.thebirdstage.com/",
                instagram: "hummingbirdmacon",
            },
            vec![VenueType::Hangout],
            (4.6, 2),
            vec![
                closed(Mon),
                open(Tue, "16:00", "00:00"),
                open(Wed, "16:00", "00:00"),
                open(Thu, "16:00", "00:00"),
                open(Fri, "16:00", "02:00"),
                open(Sat, "16:00", "02:00"),
                closed(Sun),
            ],
            vec![
                special(
                    "1-1",
                    "Open Mic Night",
                    "Show off your talent with $3 craft beer pints",
                    Tue,
                    ("20:00", "23:00"),
                    SpecialType::LiveMusic,
                ),
                special(
                    "1-2",
                    "Happy Hour",
                    "$2 off all drafts and appetizers",
                    Wed,
                    ("16:00", "19:00"),
                    SpecialType::HappyHour,
                ),
            ],
            (32.8370, -83.6325),
        ),
        venue(
            "2",
            "The Library Taphouse and Kitchen",
            "Casual bar with a wide selection of beers on tap and traditional pub fare.",
            &Contact {
                address: "2644 Riverside Dr, Macon, GA 31204",
                phone: "(478) 743-5500",
                website: "https://www.thelibrarymacon.com/",
                instagram: "thelibrarymacon",
            },
            vec![VenueType::SportsBar],
            (4.3, 2),
            vec![
                open(Mon, "16:00", "00:00"),
                open(Tue, "16:00", "00:00"),
                open(Wed, "16:00", "00:00"),
                open(Thu, "16:00", "00:00"),
                open(Fri, "16:00", "02:00"),
                open(Sat, "12:00", "02:00"),
                open(Sun, "12:00", "00:00"),
            ],
            vec![special(
                "2-1",
                "Happy Hour",
                "Mon\u{2013}Fri 4\u{2013}7 PM: select drafts, 2-for-1 wells & $3 wine",
                Mon,
                ("16:00", "19:00"),
                SpecialType::HappyHour,
            )],
            (32.8365, -83.6320),
        ),
        venue(
            "5",
            "Late Nite",
            "Vibrant nightclub with DJs, dancing, and weekend events.",
            &Contact {
                address: "496 2nd St, Macon, GA 31201",
                phone: "(478) 254-7009",
                website: "https://thisweekendatlatenite.com/",
                instagram: "latenitemacon",
            },
            vec![VenueType::Club],
            (4.1, 3),
            vec![
                closed(Mon),
                closed(Tue),
                closed(Wed),
                open(Thu, "22:00", "03:00"),
                open(Fri, "22:00", "03:00"),
                open(Sat, "22:00", "03:00"),
                closed(Sun),
            ],
            vec![special(
                "5-1",
                "College Night",
                "No cover with college ID. $3 shots all night!",
                Thu,
                ("22:00", "03:00"),
                SpecialType::CollegeNight,
            )],
            (32.8406, -83.6325),
        ),
        venue(
            "6",
            "JBA",
            "Just Because Art Bar & Lounge offers craft cocktails in an upscale setting with regular live music and art exhibitions.",
            &Contact {
                address: "499 Martin Luther King Jr Blvd, Macon, GA 31201",
                phone: "(478) 257-6456",
                website: "https://www.jbamacon.com/",
                instagram: "jbamacongeorgia",
            },
            vec![VenueType::Club, VenueType::Hangout, VenueType::Pool],
            (4.7, 3),
            vec![
                closed(Mon),
                closed(Tue),
                open(Wed, "17:00", "00:00"),
                open(Thu, "17:00", "00:00"),
                open(Fri, "17:00", "02:00"),
                open(Sat, "17:00", "02:00"),
                open(Sun, "16:00", "22:00"),
            ],
            vec![special(
                "6-1",
                "Karaoke Night",
                "Sing your heart out every Wednesday with $5 signature cocktails",
                Wed,
                ("20:00", "00:00"),
                SpecialType::Karaoke,
            )],
            (32.8412, -83.6330),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        let late_nite = find(&VenueId::new("5")).unwrap();
        assert_eq!(late_nite.name, "Late Nite");
        assert_eq!(late_nite.price_level, 3);
        assert!(find(&VenueId::new("404")).is_none());
    }

    #[test]
    fn test_ids_unique_and_hours_complete() {
        let mut ids: Vec<_> = all().iter().map(|v| v.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), all().len());
        for venue in all() {
            assert_eq!(venue.open_hours.len(), 7, "{}", venue.name);
        }
    }

    #[test]
    fn test_specials_for_day() {
        let wednesday: Vec<_> = specials_for_day(Weekday::Wed)
            .into_iter()
            .map(|(v, s)| (v.id.as_str(), s.id.as_str()))
            .collect();
        assert_eq!(wednesday, vec![("1", "1-2"), ("6", "6-1")]);
        assert!(specials_for_day(Weekday::Sun).is_empty());
    }

    #[test]
    fn test_specials_by_type() {
        let happy_hours = specials_by_type(SpecialType::HappyHour);
        assert_eq!(happy_hours.len(), 2);
        assert!(specials_by_type(SpecialType::TriviaNight).is_empty());
    }

    #[test]
    fn test_by_type() {
        let pool: Vec<_> = by_type(VenueType::Pool).iter().map(|v| v.name.as_str()).collect();
        assert_eq!(pool, vec!["JBA"]);
    }

    #[test]
    fn test_is_open_on() {
        let bird = find(&VenueId::new("1")).unwrap();
        assert!(!bird.is_open_on(Weekday::Mon));
        assert!(bird.is_open_on(Weekday::Fri));
    }
}
