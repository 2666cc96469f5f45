//! Client-generated element identifiers.

use events::ElementKind;
use uuid::Uuid;

/// Fresh element id of the form `<kind>-<uuid>`.
#[must_use]
pub fn next_element_id(kind: ElementKind) -> String {
    format!("{kind}-{}", Uuid::new_v4())
}
