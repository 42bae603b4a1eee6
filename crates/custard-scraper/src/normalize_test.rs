use chrono::NaiveDate;

use super::*;

fn raw(flavor: &str) -> RawFlavor {
    RawFlavor {
        location: "Kopps".to_string(),
        flavor: Some(flavor.to_string()),
        ..Default::default()
    }
}

#[test]
fn missing_description_becomes_empty_string() {
    let record = normalize_flavor(raw("Butter Pecan"));
    assert_eq!(record.description(), "");
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["description"], "");
}

#[test]
fn missing_flavor_becomes_empty_string() {
    let record = normalize_flavor(RawFlavor {
        location: "Oscars".to_string(),
        ..Default::default()
    });
    assert_eq!(record.flavor(), "");
    assert_eq!(record.location(), "Oscars");
}

#[test]
fn text_fields_are_whitespace_collapsed() {
    let record = normalize_flavor(RawFlavor {
        location: "  Culvers (Sussex) ".to_string(),
        flavor: Some("\n  Turtle\tSundae  ".to_string()),
        description: Some("Caramel,\n pecans,   and fudge.".to_string()),
        ..Default::default()
    });
    assert_eq!(record.location(), "Culvers (Sussex)");
    assert_eq!(record.flavor(), "Turtle Sundae");
    assert_eq!(record.description(), "Caramel, pecans, and fudge.");
}

#[test]
fn blank_url_is_dropped() {
    let record = normalize_flavor(RawFlavor {
        url: Some("   ".to_string()),
        ..raw("Mint")
    });
    assert!(record.url().is_none());
}

#[test]
fn date_and_url_pass_through() {
    let date = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let record = normalize_flavor(RawFlavor {
        date: Some(date),
        url: Some("https://example.com/f".to_string()),
        ..raw("Peach")
    });
    assert_eq!(record.date(), Some(date));
    assert_eq!(record.url(), Some("https://example.com/f"));
}

#[test]
fn normalizing_twice_is_stable() {
    let first = normalize_flavor(RawFlavor {
        description: Some(" a  b ".to_string()),
        ..raw(" Mint ")
    });
    let second = normalize_flavor(RawFlavor {
        location: first.location().to_string(),
        flavor: Some(first.flavor().to_string()),
        description: Some(first.description().to_string()),
        date: first.date(),
        url: first.url().map(str::to_string),
    });
    assert_eq!(first, second);
}
