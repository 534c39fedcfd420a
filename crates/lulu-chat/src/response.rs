//! Fixed assistant texts and the shop info template.

use std::fmt;

use lulu_core::types::ShopRecord;

use crate::backend::BackendErrorKind;

/// Heading placed above every shop info block.
pub const SHOP_INFO_HEADER: &str = "Here's the information for the shop you requested:";

/// Directory query that matched no shop.
pub const SHOP_NOT_FOUND: &str = "Sorry, I couldn't find a matching shop. Please try specifying the town or shop name more clearly.";

pub const FALLBACK_UNAVAILABLE: &str = "AI model unreachable, please retry.";
pub const FALLBACK_TIMEOUT: &str = "The AI model took too long to respond, please retry.";
pub const FALLBACK_MALFORMED: &str =
    "The AI model returned a response I could not read, please retry.";

const MISSING_FIELD: &str = "N/A";

/// Build a map search link for a coordinate pair.
pub fn maps_link(latitude: impl fmt::Display, longitude: impl fmt::Display) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        latitude, longitude
    )
}

/// Render the shop info turn body.
pub fn format_shop_info(shop: &ShopRecord) -> String {
    let name = shop.name.as_deref().unwrap_or(MISSING_FIELD);
    let location = shop.physical_location.as_deref().unwrap_or(MISSING_FIELD);
    let hours = shop.business_hours.as_deref().unwrap_or_default();

    let mut body = format!(
        "{}\n\n**{}**\n📍 {}\n🕒 {}",
        SHOP_INFO_HEADER, name, location, hours
    );
    if let Some((lat, lon)) = shop.coordinates() {
        body.push_str(&format!("\n🌍 [View on Maps]({})", maps_link(lat, lon)));
    }
    body
}

/// The apology shown in place of a model answer.
pub fn fallback_text(kind: BackendErrorKind) -> &'static str {
    match kind {
        BackendErrorKind::Unavailable => FALLBACK_UNAVAILABLE,
        BackendErrorKind::Timeout => FALLBACK_TIMEOUT,
        BackendErrorKind::Malformed => FALLBACK_MALFORMED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mathare() -> ShopRecord {
        ShopRecord {
            name: Some("Mathare".to_string()),
            physical_location: Some("Juja Road".to_string()),
            latitude: Some((-1.26).into()),
            longitude: Some(36.86.into()),
            business_hours: Some("8am-6pm".to_string()),
        }
    }

    #[test]
    fn test_format_full_record() {
        let body = format_shop_info(&mathare());
        assert!(body.starts_with(SHOP_INFO_HEADER));
        assert!(body.contains("**Mathare**"));
        assert!(body.contains("📍 Juja Road"));
        assert!(body.contains("🕒 8am-6pm"));
        assert!(body.contains("query=-1.26,36.86)"));
    }

    #[test]
    fn test_format_without_coordinates_has_no_link() {
        let shop = ShopRecord {
            longitude: None,
            ..mathare()
        };
        let body = format_shop_info(&shop);
        assert!(!body.contains("google.com/maps"));
        assert!(body.ends_with("🕒 8am-6pm"));
    }

    #[test]
    fn test_format_missing_fields() {
        let body = format_shop_info(&ShopRecord::default());
        assert!(body.contains("**N/A**"));
        assert!(body.contains("📍 N/A"));
    }

    #[test]
    fn test_zero_coordinate_still_linked() {
        let shop = ShopRecord {
            latitude: Some(0.0.into()),
            longitude: Some(36.5.into()),
            ..mathare()
        };
        assert!(format_shop_info(&shop).contains("query=0,36.5"));
    }

    #[test]
    fn test_link_uses_coordinates_as_written() {
        let shop: ShopRecord = serde_json::from_str(
            r#"{"SHOP NAME": "Thika", "Latitude": "-1.0330", "Longitude": "37.0690"}"#,
        )
        .unwrap();
        assert!(format_shop_info(&shop).contains("query=-1.0330,37.0690)"));
    }

    #[test]
    fn test_fallbacks_are_distinct() {
        let texts = [
            fallback_text(BackendErrorKind::Unavailable),
            fallback_text(BackendErrorKind::Timeout),
            fallback_text(BackendErrorKind::Malformed),
        ];
        assert_ne!(texts[0], texts[1]);
        assert_ne!(texts[1], texts[2]);
        assert_ne!(texts[0], texts[2]);
    }

    #[test]
    fn test_fallbacks_avoid_escalation_keywords() {
        for text in [FALLBACK_UNAVAILABLE, FALLBACK_TIMEOUT, FALLBACK_MALFORMED] {
            let lower = text.to_lowercase();
            assert!(!lower.contains("sorry"), "{}", text);
            assert!(!lower.contains("unable"), "{}", text);
        }
    }
}
