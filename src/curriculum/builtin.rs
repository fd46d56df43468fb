//! The roadmap shipped with the binary

use once_cell::sync::Lazy;

use super::model::Curriculum;

/// Embedded roadmap definition
const ROADMAP_JSON: &str = include_str!("../../data/roadmap.json");

/// Parsed roadmap (parsed once, on first use)
static BUILTIN: Lazy<Curriculum> = Lazy::new(|| {
    serde_json::from_str(ROADMAP_JSON).expect("embedded data/roadmap.json is valid")
});

/// Get the built-in roadmap
pub fn builtin() -> &'static Curriculum {
    &BUILTIN
}
