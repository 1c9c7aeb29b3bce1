//! Identifier normalization shared by the catalog and the endpoint registry.

/// Prefix for every catalog-derived endpoint key.
pub const PUBLIC_KEY_PREFIX: &str = "public";

/// Normalize a display name into a catalog identifier.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_`, and trims leading/trailing underscores.
/// `"Dog CEO"` → `"dog_ceo"`, `"Open-Meteo"` → `"open_meteo"`.
pub fn normalize_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Key of an auto endpoint: `public.<api>.<endpoint>`.
pub fn endpoint_key(api_name: &str, endpoint_name: &str) -> String {
    format!(
        "{}.{}.{}",
        PUBLIC_KEY_PREFIX,
        normalize_id(api_name),
        normalize_id(endpoint_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_lowercases() {
        assert_eq!(normalize_id("Dog CEO"), "dog_ceo");
        assert_eq!(normalize_id("Open-Meteo"), "open_meteo");
        assert_eq!(normalize_id("  REST   Countries!! "), "rest_countries");
        assert_eq!(normalize_id("Cat--Facts__API"), "cat_facts_api");
    }

    #[test]
    fn non_ascii_is_treated_as_separator() {
        assert_eq!(normalize_id("Café Öffnungszeiten"), "caf_ffnungszeiten");
        assert_eq!(normalize_id("***"), "");
    }

    #[test]
    fn endpoint_key_format() {
        assert_eq!(endpoint_key("Dog CEO", "random"), "public.dog_ceo.random");
        assert_eq!(
            endpoint_key("Open-Meteo", "Forecast Daily"),
            "public.open_meteo.forecast_daily"
        );
    }
}
