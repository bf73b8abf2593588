//! # Timezone Resolver
//!
//! Guesses the viewer's UTC offset for `local.svg` from request hints.
//! Every failure degrades to `None` (render as UTC); nothing is surfaced.

use std::collections::HashMap;

use chrono::{DateTime, Offset, TimeZone};
use chrono_tz::Tz;
use domains::TimezoneHints;

/// ISO 3166-1 alpha-2 -> representative IANA zone (the most populous one for
/// countries spanning several zones).
const COUNTRY_TIMEZONES: &[(&str, &str)] = &[
    ("AD", "Europe/Andorra"), ("AE", "Asia/Dubai"), ("AF", "Asia/Kabul"),
    ("AG", "America/Antigua"), ("AL", "Europe/Tirane"), ("AM", "Asia/Yerevan"),
    ("AO", "Africa/Luanda"), ("AR", "America/Argentina/Buenos_Aires"),
    ("AT", "Europe/Vienna"), ("AU", "Australia/Sydney"), ("AZ", "Asia/Baku"),
    ("BA", "Europe/Sarajevo"), ("BB", "America/Barbados"), ("BD", "Asia/Dhaka"),
    ("BE", "Europe/Brussels"), ("BF", "Africa/Ouagadougou"), ("BG", "Europe/Sofia"),
    ("BH", "Asia/Bahrain"), ("BI", "Africa/Bujumbura"), ("BJ", "Africa/Porto-Novo"),
    ("BN", "Asia/Brunei"), ("BO", "America/La_Paz"), ("BR", "America/Sao_Paulo"),
    ("BS", "America/Nassau"), ("BT", "Asia/Thimphu"), ("BW", "Africa/Gaborone"),
    ("BY", "Europe/Minsk"), ("BZ", "America/Belize"), ("CA", "America/Toronto"),
    ("CD", "Africa/Kinshasa"), ("CF", "Africa/Bangui"), ("CG", "Africa/Brazzaville"),
    ("CH", "Europe/Zurich"), ("CI", "Africa/Abidjan"), ("CL", "America/Santiago"),
    ("CM", "Africa/Douala"), ("CN", "Asia/Shanghai"), ("CO", "America/Bogota"),
    ("CR", "America/Costa_Rica"), ("CU", "America/Havana"), ("CV", "Atlantic/Cape_Verde"),
    ("CY", "Asia/Nicosia"), ("CZ", "Europe/Prague"), ("DE", "Europe/Berlin"),
    ("DJ", "Africa/Djibouti"), ("DK", "Europe/Copenhagen"), ("DM", "America/Dominica"),
    ("DO", "America/Santo_Domingo"), ("DZ", "Africa/Algiers"), ("EC", "America/Guayaquil"),
    ("EE", "Europe/Tallinn"), ("EG", "Africa/Cairo"), ("ER", "Africa/Asmara"),
    ("ES", "Europe/Madrid"), ("ET", "Africa/Addis_Ababa"), ("FI", "Europe/Helsinki"),
    ("FJ", "Pacific/Fiji"), ("FR", "Europe/Paris"), ("GA", "Africa/Libreville"),
    ("GB", "Europe/London"), ("GD", "America/Grenada"), ("GE", "Asia/Tbilisi"),
    ("GH", "Africa/Accra"), ("GM", "Africa/Banjul"), ("GN", "Africa/Conakry"),
    ("GQ", "Africa/Malabo"), ("GR", "Europe/Athens"), ("GT", "America/Guatemala"),
    ("GW", "Africa/Bissau"), ("GY", "America/Guyana"), ("HK", "Asia/Hong_Kong"),
    ("HN", "America/Tegucigalpa"), ("HR", "Europe/Zagreb"), ("HT", "America/Port-au-Prince"),
    ("HU", "Europe/Budapest"), ("ID", "Asia/Jakarta"), ("IE", "Europe/Dublin"),
    ("IL", "Asia/Jerusalem"), ("IN", "Asia/Kolkata"), ("IQ", "Asia/Baghdad"),
    ("IR", "Asia/Tehran"), ("IS", "Atlantic/Reykjavik"), ("IT", "Europe/Rome"),
    ("JM", "America/Jamaica"), ("JO", "Asia/Amman"), ("JP", "Asia/Tokyo"),
    ("KE", "Africa/Nairobi"), ("KG", "Asia/Bishkek"), ("KH", "Asia/Phnom_Penh"),
    ("KP", "Asia/Pyongyang"), ("KR", "Asia/Seoul"), ("KW", "Asia/Kuwait"),
    ("KZ", "Asia/Almaty"), ("LA", "Asia/Vientiane"), ("LB", "Asia/Beirut"),
    ("LI", "Europe/Vaduz"), ("LK", "Asia/Colombo"), ("LR", "Africa/Monrovia"),
    ("LS", "Africa/Maseru"), ("LT", "Europe/Vilnius"), ("LU", "Europe/Luxembourg"),
    ("LV", "Europe/Riga"), ("LY", "Africa/Tripoli"), ("MA", "Africa/Casablanca"),
    ("MC", "Europe/Monaco"), ("MD", "Europe/Chisinau"), ("ME", "Europe/Podgorica"),
    ("MG", "Indian/Antananarivo"), ("MK", "Europe/Skopje"), ("ML", "Africa/Bamako"),
    ("MM", "Asia/Yangon"), ("MN", "Asia/Ulaanbaatar"), ("MO", "Asia/Macau"),
    ("MR", "Africa/Nouakchott"), ("MT", "Europe/Malta"), ("MU", "Indian/Mauritius"),
    ("MV", "Indian/Maldives"), ("MW", "Africa/Blantyre"), ("MX", "America/Mexico_City"),
    ("MY", "Asia/Kuala_Lumpur"), ("MZ", "Africa/Maputo"), ("NA", "Africa/Windhoek"),
    ("NE", "Africa/Niamey"), ("NG", "Africa/Lagos"), ("NI", "America/Managua"),
    ("NL", "Europe/Amsterdam"), ("NO", "Europe/Oslo"), ("NP", "Asia/Kathmandu"),
    ("NZ", "Pacific/Auckland"), ("OM", "Asia/Muscat"), ("PA", "America/Panama"),
    ("PE", "America/Lima"), ("PG", "Pacific/Port_Moresby"), ("PH", "Asia/Manila"),
    ("PK", "Asia/Karachi"), ("PL", "Europe/Warsaw"), ("PR", "America/Puerto_Rico"),
    ("PS", "Asia/Gaza"), ("PT", "Europe/Lisbon"), ("PY", "America/Asuncion"),
    ("QA", "Asia/Qatar"), ("RO", "Europe/Bucharest"), ("RS", "Europe/Belgrade"),
    ("RU", "Europe/Moscow"), ("RW", "Africa/Kigali"), ("SA", "Asia/Riyadh"),
    ("SB", "Pacific/Guadalcanal"), ("SC", "Indian/Mahe"), ("SD", "Africa/Khartoum"),
    ("SE", "Europe/Stockholm"), ("SG", "Asia/Singapore"), ("SI", "Europe/Ljubljana"),
    ("SK", "Europe/Bratislava"), ("SL", "Africa/Freetown"), ("SM", "Europe/San_Marino"),
    ("SN", "Africa/Dakar"), ("SO", "Africa/Mogadishu"), ("SR", "America/Paramaribo"),
    ("SS", "Africa/Juba"), ("SV", "America/El_Salvador"), ("SY", "Asia/Damascus"),
    ("SZ", "Africa/Mbabane"), ("TD", "Africa/Ndjamena"), ("TG", "Africa/Lome"),
    ("TH", "Asia/Bangkok"), ("TJ", "Asia/Dushanbe"), ("TL", "Asia/Dili"),
    ("TM", "Asia/Ashgabat"), ("TN", "Africa/Tunis"), ("TO", "Pacific/Tongatapu"),
    ("TR", "Europe/Istanbul"), ("TT", "America/Port_of_Spain"), ("TW", "Asia/Taipei"),
    ("TZ", "Africa/Dar_es_Salaam"), ("UA", "Europe/Kyiv"), ("UG", "Africa/Kampala"),
    ("US", "America/New_York"), ("UY", "America/Montevideo"), ("UZ", "Asia/Tashkent"),
    ("VA", "Europe/Vatican"), ("VE", "America/Caracas"), ("VN", "Asia/Ho_Chi_Minh"),
    ("VU", "Pacific/Efate"), ("WS", "Pacific/Apia"), ("YE", "Asia/Aden"),
    ("ZA", "Africa/Johannesburg"), ("ZM", "Africa/Lusaka"), ("ZW", "Africa/Harare"),
];

/// Resolves viewer offsets from a static country table.
pub struct TimezoneResolver {
    countries: HashMap<&'static str, &'static str>,
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimezoneResolver {
    pub fn new() -> Self {
        Self {
            countries: COUNTRY_TIMEZONES.iter().copied().collect(),
        }
    }

    /// Case-insensitive country -> IANA zone name.
    pub fn timezone_for_country(&self, country: &str) -> Option<&'static str> {
        self.countries
            .get(country.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    /// Offset in minutes east of UTC at `at_ms`, or `None` when nothing usable
    /// was supplied.
    ///
    /// Proxy-originated requests only trust `Accept-Language`; the geolocation
    /// headers would describe the proxy, not the viewer.
    pub fn resolve_offset(&self, hints: &TimezoneHints, at_ms: i64, via_proxy: bool) -> Option<i32> {
        let timezone = if via_proxy {
            self.from_accept_language(hints)
        } else {
            hints
                .edge_timezone
                .as_deref()
                .filter(|tz| !tz.is_empty())
                .or_else(|| hints.edge_country.as_deref().and_then(|c| self.timezone_for_country(c)))
                .or_else(|| hints.client_country.as_deref().and_then(|c| self.timezone_for_country(c)))
                .or_else(|| self.from_accept_language(hints))
        }?;

        let offset = offset_minutes_at(timezone, at_ms);
        if offset.is_none() {
            tracing::warn!(timezone = %timezone, "unresolvable timezone, falling back to UTC");
        }
        offset
    }

    fn from_accept_language(&self, hints: &TimezoneHints) -> Option<&'static str> {
        hints
            .accept_language
            .as_deref()
            .and_then(region_from_accept_language)
            .and_then(|region| self.timezone_for_country(region))
    }
}

/// Region subtag of the first language range, e.g. `US` from
/// `en-US,en;q=0.9` or `TW` from `zh-Hant-TW`.
pub fn region_from_accept_language(header: &str) -> Option<&str> {
    let first = header.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    tag.split('-')
        .skip(1)
        .find(|sub| sub.len() == 2 && sub.bytes().all(|b| b.is_ascii_alphabetic()))
}

/// UTC offset of `timezone` at the given instant, honoring DST on that date.
pub fn offset_minutes_at(timezone: &str, at_ms: i64) -> Option<i32> {
    let tz: Tz = timezone.parse().ok()?;
    let utc = DateTime::from_timestamp_millis(at_ms)?;
    let offset = tz.offset_from_utc_datetime(&utc.naive_utc());
    Some(offset.fix().local_minus_utc() / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ms(y: i32, mo: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap().timestamp_millis()
    }

    #[test]
    fn dst_is_honored_on_the_requested_date() {
        assert_eq!(offset_minutes_at("America/New_York", ms(2024, 1, 15)), Some(-300));
        assert_eq!(offset_minutes_at("America/New_York", ms(2024, 7, 15)), Some(-240));
        assert_eq!(offset_minutes_at("Asia/Kolkata", ms(2024, 7, 15)), Some(330));
        assert_eq!(offset_minutes_at("Not/AZone", ms(2024, 7, 15)), None);
    }

    #[test]
    fn accept_language_region_extraction() {
        assert_eq!(region_from_accept_language("en-US,en;q=0.9"), Some("US"));
        assert_eq!(region_from_accept_language("ja-jp"), Some("jp"));
        assert_eq!(region_from_accept_language("zh-Hant-TW,zh;q=0.8"), Some("TW"));
        assert_eq!(region_from_accept_language("de-DE;q=0.7"), Some("DE"));
        assert_eq!(region_from_accept_language("fr"), None);
        assert_eq!(region_from_accept_language(""), None);
    }

    #[test]
    fn resolution_order_prefers_rich_timezone() {
        let resolver = TimezoneResolver::new();
        let hints = TimezoneHints {
            edge_timezone: Some("Asia/Tokyo".into()),
            edge_country: Some("us".into()),
            client_country: Some("GB".into()),
            accept_language: Some("de-DE".into()),
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), false), Some(540));

        let hints = TimezoneHints {
            edge_timezone: None,
            ..hints
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), false), Some(-300));

        let hints = TimezoneHints {
            edge_country: Some("XX".into()),
            ..hints
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), false), Some(0));

        let hints = TimezoneHints {
            client_country: None,
            ..hints
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), false), Some(60));
    }

    #[test]
    fn proxied_requests_only_use_accept_language() {
        let resolver = TimezoneResolver::new();
        let hints = TimezoneHints {
            edge_timezone: Some("America/Los_Angeles".into()),
            edge_country: Some("US".into()),
            client_country: None,
            accept_language: Some("ja-JP,ja;q=0.9".into()),
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), true), Some(540));

        let hints = TimezoneHints {
            accept_language: None,
            ..hints
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), true), None);
    }

    #[test]
    fn bad_rich_timezone_degrades_to_none() {
        let resolver = TimezoneResolver::new();
        let hints = TimezoneHints {
            edge_timezone: Some("Mars/Olympus_Mons".into()),
            ..Default::default()
        };
        assert_eq!(resolver.resolve_offset(&hints, ms(2024, 1, 15), false), None);
    }

    #[test]
    fn every_table_entry_is_a_known_zone() {
        for (country, zone) in COUNTRY_TIMEZONES {
            assert!(zone.parse::<Tz>().is_ok(), "{country} -> {zone}");
        }
    }
}
