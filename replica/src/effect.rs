//! Filter map → CSS `filter` effect string.

use events::Filters;

/// Unit suffix for a known CSS filter function, `None` for unknown names.
fn unit_for(name: &str) -> Option<&'static str> {
    match name {
        "blur" => Some("px"),
        "hue-rotate" => Some("deg"),
        "brightness" | "contrast" | "grayscale" | "invert" | "opacity" | "saturate" | "sepia" => {
            Some("")
        }
        _ => None,
    }
}

/// Derive the visual effect string for a filter map.
///
/// Unknown filter names are kept in the map but contribute nothing here.
/// An empty result is `"none"`, which clears any previous effect.
#[must_use]
pub fn filter_effect(filters: &Filters) -> String {
    let parts: Vec<String> = filters
        .iter()
        .filter_map(|(name, value)| unit_for(name).map(|unit| format!("{name}({value}{unit})")))
        .collect();

    if parts.is_empty() {
        "none".to_owned()
    } else {
        parts.join(" ")
    }
}
