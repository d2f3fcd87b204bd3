use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static KEY_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("key noise pattern"));
static LABEL_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("label noise pattern"));

/// Known dataset-name irregularities between the card list and the other sources.
const NAME_ALIASES: &[(&str, &str)] = &[("Park2025", "Park 2025"), ("T1DM-UOM", "T1D-UOM")];

const DIABETES_LABELS: &[(&str, &str)] = &[
    ("type 1 diabetes", "T1D"),
    ("type i diabetes", "T1D"),
    ("type 1", "T1D"),
    ("t1d", "T1D"),
    ("t1dm", "T1D"),
    ("type 2 diabetes", "T2D"),
    ("type ii diabetes", "T2D"),
    ("type 2", "T2D"),
    ("t2d", "T2D"),
    ("t2dm", "T2D"),
    ("prediabetes", "PreD"),
    ("prediabetic", "PreD"),
    ("pre diabetes", "PreD"),
    ("pre diabetic", "PreD"),
    ("pred", "PreD"),
    ("no diabetes", "ND"),
    ("non diabetic", "ND"),
    ("non diabetes", "ND"),
    ("nondiabetic", "ND"),
    ("nd", "ND"),
];

/// Canonical population order; unranked labels sort after these.
pub const POPULATION_ORDER: [&str; 4] = ["ND", "PreD", "T2D", "T1D"];

pub fn normalize_key(raw: &str) -> String {
    KEY_NOISE.replace_all(raw.trim(), "").to_lowercase()
}

pub fn alias_for(name: &str) -> Option<&'static str> {
    NAME_ALIASES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

/// Maps free-text clinical labels to `T1D`, `T2D`, `PreD` or `ND`.
/// Anything unrecognised comes back unchanged.
pub fn normalize_diabetes_label(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let key = LABEL_NOISE.replace_all(&lowered, " ");
    let key = key.trim();
    DIABETES_LABELS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn population_rank(code: &str) -> usize {
    POPULATION_ORDER
        .iter()
        .position(|known| *known == code)
        .unwrap_or(usize::MAX)
}

pub fn compare_population(a: &str, b: &str) -> Ordering {
    population_rank(a)
        .cmp(&population_rank(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// URL-style id used by the detail route: lower case, whitespace runs become `-`.
pub fn slug(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_drops_separators_and_case() {
        assert_eq!(normalize_key(" T1DM_UOM - v2 "), "t1dmuomv2");
        assert_eq!(normalize_key("Park 2025"), normalize_key("park-2025"));
    }

    #[test]
    fn label_ignores_punctuation() {
        assert_eq!(normalize_diabetes_label("Non-diabetic"), "ND");
        assert_eq!(normalize_diabetes_label("  Type II Diabetes "), "T2D");
        assert_eq!(normalize_diabetes_label("pre-diabetes"), "PreD");
    }

    #[test]
    fn slug_matches_route_ids() {
        assert_eq!(slug("Park 2025"), "park-2025");
        assert_eq!(slug("CGMacros"), "cgmacros");
    }
}
