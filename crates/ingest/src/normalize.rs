use std::collections::HashMap;

use apiloom_connector::RawEntry;
use apiloom_core::{
    normalize_id, AuthMode, CatalogEntry, CorsSupport, EndpointDef, HealthStatus, HttpMethod,
};
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::curated::{curated_base_url, curated_endpoints};

/// Entries scoring below this never enter the catalog.
pub const MIN_QUALITY_SCORE: f64 = 0.4;

/// Bar auth-bearing entries must clear when strict auth filtering is on.
pub const STRICT_AUTH_SCORE: f64 = 0.70;

/// Knobs for [`filter_by_quality`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub min_score: f64,
    pub require_https: bool,
    pub strict_auth: bool,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_score: MIN_QUALITY_SCORE,
            require_https: false,
            strict_auth: true,
        }
    }
}

impl From<&apiloom_core::config::IngestConfig> for QualityThresholds {
    fn from(c: &apiloom_core::config::IngestConfig) -> Self {
        Self {
            min_score: c.min_quality.max(MIN_QUALITY_SCORE),
            require_https: c.require_https,
            strict_auth: c.strict_auth,
        }
    }
}

// ── Classification ──────────────────────────────────────────────

pub fn classify_auth(raw: Option<&str>) -> AuthMode {
    let auth = raw.unwrap_or("").trim().to_lowercase();
    match auth.as_str() {
        "" | "no" | "none" => AuthMode::None,
        a if a.contains("oauth") => AuthMode::OAuth,
        a if a.contains("key") => AuthMode::ApiKey,
        _ => AuthMode::Custom,
    }
}

pub fn classify_cors(raw: Option<&str>) -> CorsSupport {
    match raw.unwrap_or("").trim().to_lowercase().as_str() {
        "yes" | "true" => CorsSupport::Yes,
        "no" | "false" => CorsSupport::No,
        _ => CorsSupport::Unknown,
    }
}

/// Heuristic in [0, 1], rounded to two decimals.
///
/// Base 0.5; +0.20 HTTPS; +0.10 explicit CORS; +0.15 no auth;
/// +0.05 description longer than 20 characters.
pub fn quality_score(https: bool, cors: CorsSupport, auth: AuthMode, description: &str) -> f64 {
    let mut score = 0.5;
    if https {
        score += 0.20;
    }
    if cors == CorsSupport::Yes {
        score += 0.10;
    }
    if auth == AuthMode::None {
        score += 0.15;
    }
    if description.chars().count() > 20 {
        score += 0.05;
    }
    ((score * 100.0_f64).round() / 100.0).clamp(0.0, 1.0)
}

/// Curated host first, then scheme+host of the link, then the link verbatim.
pub fn resolve_base_url(name: &str, link: &str) -> String {
    if let Some(url) = curated_base_url(name) {
        return url.to_string();
    }
    match url::Url::parse(link) {
        Ok(parsed) if parsed.host_str().is_some() => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            }
        }
        _ => link.to_string(),
    }
}

/// Curated operations, or a single generic `default` GET against `/`.
pub fn synthesize_endpoints(name: &str, description: &str) -> Vec<EndpointDef> {
    curated_endpoints(name).unwrap_or_else(|| {
        vec![EndpointDef {
            name: "default".to_string(),
            path: "/".to_string(),
            method: HttpMethod::Get,
            description: if description.is_empty() {
                format!("Call {name}")
            } else {
                description.to_string()
            },
            parameters: None,
            sample_response: None,
        }]
    })
}

// ── Normalization ───────────────────────────────────────────────

/// Raw entry → catalog entry, or `None` when the entry is unusable or
/// scores below [`MIN_QUALITY_SCORE`].
pub fn normalize(raw: &RawEntry, source_id: &str) -> Option<CatalogEntry> {
    normalize_at(raw, source_id, Utc::now())
}

/// [`normalize`] with an explicit check timestamp, so a whole batch shares one.
pub fn normalize_at(raw: &RawEntry, source_id: &str, checked_at: DateTime<Utc>) -> Option<CatalogEntry> {
    let name = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
    let link = raw.link.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
    if normalize_id(name).is_empty() {
        return None;
    }

    let description = raw.description.as_deref().unwrap_or("").trim().to_string();
    let auth = classify_auth(raw.auth.as_deref());
    let cors = classify_cors(raw.cors.as_deref());
    let https = raw.https.unwrap_or_else(|| link.starts_with("https://"));
    let score = quality_score(https, cors, auth, &description);

    if score < MIN_QUALITY_SCORE {
        trace!(api = name, score, "rejected below minimum quality");
        return None;
    }

    Some(CatalogEntry {
        name: name.to_string(),
        auth,
        https,
        cors,
        category: raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Uncategorized")
            .to_string(),
        base_url: resolve_base_url(name, link),
        docs_url: Some(link.to_string()),
        endpoints: synthesize_endpoints(name, &description),
        description,
        source: source_id.to_string(),
        quality_score: score,
        last_checked: checked_at,
        health: HealthStatus::Unknown,
    })
}

/// Normalize a batch; returns the entries and how many were rejected.
pub fn normalize_batch(raws: &[RawEntry], source_id: &str) -> (Vec<CatalogEntry>, usize) {
    let checked_at = Utc::now();
    let entries: Vec<CatalogEntry> = raws
        .iter()
        .filter_map(|raw| normalize_at(raw, source_id, checked_at))
        .collect();
    let rejected = raws.len() - entries.len();
    (entries, rejected)
}

/// Keep the highest-scoring entry per name (compared by normalized id, so
/// case and punctuation differences collapse). First seen wins ties; output
/// keeps first-seen order.
pub fn deduplicate_entries(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<CatalogEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let id = normalize_id(&entry.name);
        match index.get(&id) {
            Some(&i) => {
                if entry.quality_score > kept[i].quality_score {
                    kept[i] = entry;
                }
            }
            None => {
                index.insert(id, kept.len());
                kept.push(entry);
            }
        }
    }
    kept
}

pub fn filter_by_quality(entries: Vec<CatalogEntry>, thresholds: &QualityThresholds) -> Vec<CatalogEntry> {
    entries
        .into_iter()
        .filter(|e| e.quality_score >= thresholds.min_score)
        .filter(|e| !thresholds.require_https || e.https)
        .filter(|e| {
            !thresholds.strict_auth || e.auth == AuthMode::None || e.quality_score >= STRICT_AUTH_SCORE
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiloom_connector::curated_entries;

    fn raw(name: &str, auth: &str, https: bool, cors: &str, description: &str) -> RawEntry {
        RawEntry {
            name: Some(name.into()),
            description: Some(description.into()),
            auth: Some(auth.into()),
            https: Some(https),
            cors: Some(cors.into()),
            link: Some(format!("https://{}.example.org/docs", normalize_id(name))),
            category: Some("Testing".into()),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn auth_classification() {
        assert_eq!(classify_auth(None), AuthMode::None);
        assert_eq!(classify_auth(Some("")), AuthMode::None);
        assert_eq!(classify_auth(Some("No")), AuthMode::None);
        assert_eq!(classify_auth(Some("OAuth")), AuthMode::OAuth);
        assert_eq!(classify_auth(Some("apiKey")), AuthMode::ApiKey);
        assert_eq!(classify_auth(Some("X-Mashape-Key")), AuthMode::ApiKey);
        assert_eq!(classify_auth(Some("User-Agent")), AuthMode::Custom);
    }

    #[test]
    fn cors_classification() {
        assert_eq!(classify_cors(Some("yes")), CorsSupport::Yes);
        assert_eq!(classify_cors(Some("TRUE")), CorsSupport::Yes);
        assert_eq!(classify_cors(Some("no")), CorsSupport::No);
        assert_eq!(classify_cors(Some("unknown")), CorsSupport::Unknown);
        assert_eq!(classify_cors(None), CorsSupport::Unknown);
    }

    #[test]
    fn dog_ceo_scores_with_and_without_description_bonus() {
        let dog = curated_entries()
            .into_iter()
            .find(|e| e.name.as_deref() == Some("Dog CEO"))
            .unwrap();
        let entry = normalize(&dog, "builtin").unwrap();
        assert_eq!(entry.auth, AuthMode::None);
        assert!(approx(entry.quality_score, 0.95));

        let no_cors = normalize(&raw("Dog CEO", "", true, "unknown", "dogs"), "builtin").unwrap();
        assert!(approx(no_cors.quality_score, 0.85));

        let long = normalize(&raw("Dog CEO", "", true, "yes", "Random pictures of dogs by breed"), "builtin").unwrap();
        assert!(approx(long.quality_score, 1.0));
    }

    #[test]
    fn rejects_missing_name_or_link() {
        let mut r = raw("Thing", "", true, "yes", "x");
        r.link = None;
        assert!(normalize(&r, "s").is_none());

        let mut r = raw("Thing", "", true, "yes", "x");
        r.name = Some("   ".into());
        assert!(normalize(&r, "s").is_none());
    }

    #[test]
    fn base_url_resolution() {
        assert_eq!(resolve_base_url("Dog CEO", "https://dog.ceo/dog-api/"), "https://dog.ceo/api");
        assert_eq!(resolve_base_url("Unknown", "https://api.thing.io/v2/docs?x=1"), "https://api.thing.io");
        assert_eq!(resolve_base_url("Unknown", "http://localhost:8080/docs"), "http://localhost:8080");
        assert_eq!(resolve_base_url("Unknown", "not a url"), "not a url");
    }

    #[test]
    fn generic_endpoint_for_unknown_apis() {
        let entry = normalize(&raw("Mystery API", "", true, "yes", "Does things"), "s").unwrap();
        assert_eq!(entry.endpoints.len(), 1);
        assert_eq!(entry.endpoints[0].name, "default");
        assert_eq!(entry.endpoints[0].path, "/");
        assert_eq!(entry.endpoints[0].method, HttpMethod::Get);
    }

    #[test]
    fn every_normalized_entry_clears_minimum() {
        let (entries, rejected) = normalize_batch(&curated_entries(), "builtin");
        assert_eq!(entries.len() + rejected, curated_entries().len());
        assert!(entries.iter().all(|e| e.quality_score >= MIN_QUALITY_SCORE));
        assert!(entries.iter().all(|e| e.last_checked == entries[0].last_checked));
    }

    #[test]
    fn dedupe_keeps_highest_score_and_is_idempotent() {
        let low = normalize(&raw("Jokes", "apiKey", false, "no", "short"), "a").unwrap();
        let high = normalize(&raw("JOKES", "", true, "yes", "a much longer description here"), "b").unwrap();
        let other = normalize(&raw("Weather", "", true, "no", "w"), "a").unwrap();

        let once = deduplicate_entries(vec![low.clone(), other.clone(), high.clone()]);
        assert_eq!(once.len(), 2);
        assert_eq!(once[0].source, "b");
        assert_eq!(once[1].name, "Weather");

        let twice = deduplicate_entries(once.clone());
        assert_eq!(once, twice);

        let reversed = deduplicate_entries(vec![high, low]);
        assert_eq!(reversed[0].source, "b");
    }

    #[test]
    fn quality_filter_thresholds() {
        let free = normalize(&raw("Free", "", false, "no", "x"), "s").unwrap(); // 0.65
        let keyed_weak = normalize(&raw("Keyed", "apiKey", false, "unknown", "x"), "s").unwrap(); // 0.50
        let keyed_strong = normalize(&raw("Strong", "apiKey", true, "yes", "x"), "s").unwrap(); // 0.80
        let all = vec![free, keyed_weak, keyed_strong];

        let lenient = QualityThresholds { min_score: 0.4, require_https: false, strict_auth: false };
        assert_eq!(filter_by_quality(all.clone(), &lenient).len(), 3);

        let strict = QualityThresholds { strict_auth: true, ..lenient };
        let names: Vec<_> = filter_by_quality(all.clone(), &strict).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Free", "Strong"]);

        let https = QualityThresholds { require_https: true, ..lenient };
        let names: Vec<_> = filter_by_quality(all.clone(), &https).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Strong"]);

        let high = QualityThresholds { min_score: 0.7, ..lenient };
        assert_eq!(filter_by_quality(all, &high).len(), 1);
    }
}
