//! Parameter handling: validation against the declared schema, path
//! substitution, and per-step merging for flows.

use std::collections::BTreeMap;

use apiloom_core::{AutoFlowStep, AutoRegisteredEndpoint};
use serde_json::Value;

pub type Params = BTreeMap<String, String>;

/// Step selector (index as a string, endpoint key, or `*`) → params.
pub type ParamsByStep = BTreeMap<String, Params>;

/// Applies to every step of a flow.
pub const ALL_STEPS: &str = "*";

/// Flatten a JSON object into string params. Strings pass through, other
/// scalars use their JSON text, nulls are dropped, arrays and objects are
/// sent as compact JSON. Non-objects yield no params.
pub fn params_from_json(value: &Value) -> Params {
    let Some(obj) = value.as_object() else {
        return Params::new();
    };
    obj.iter()
        .filter_map(|(k, v)| {
            let s = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((k.clone(), s))
        })
        .collect()
}

/// `{"0": {...}, "public.x.y": {...}}` → [`ParamsByStep`]. Top-level
/// values that are not objects are plain params for every step, so a flat
/// `{"breed": "hound"}` lands under `*`. An explicit `*` object wins over
/// flat values with the same name.
pub fn params_by_step_from_json(value: &Value) -> ParamsByStep {
    let Some(obj) = value.as_object() else {
        return ParamsByStep::new();
    };
    let (selectors, flat): (Vec<_>, Vec<_>) = obj.iter().partition(|(_, v)| v.is_object());

    let mut by_step: ParamsByStep = selectors
        .into_iter()
        .map(|(k, v)| (k.clone(), params_from_json(v)))
        .collect();

    let shared: Value = Value::Object(flat.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let mut all = params_from_json(&shared);
    if all.is_empty() {
        return by_step;
    }
    if let Some(explicit) = by_step.remove(ALL_STEPS) {
        all.extend(explicit);
    }
    by_step.insert(ALL_STEPS.to_string(), all);
    by_step
}

/// Required parameters that are absent or blank.
pub fn missing_required(endpoint: &AutoRegisteredEndpoint, params: &Params) -> Vec<String> {
    endpoint
        .parameters
        .iter()
        .flatten()
        .filter(|(_, spec)| spec.required)
        .filter(|(name, _)| !matches!(params.get(*name), Some(v) if !v.trim().is_empty()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Replace `{name}` tokens with URL-encoded values. Tokens without a value
/// stay literal. Returns the URL and the names consumed by the path.
pub fn substitute_path(template: &str, params: &Params) -> (String, Vec<String>) {
    let mut out = String::with_capacity(template.len());
    let mut used = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let end = start + len;
        let name = &rest[start + 1..end];
        out.push_str(&rest[..start]);
        match params.get(name) {
            Some(value) => {
                out.push_str(&urlencoding::encode(value));
                used.push(name.to_string());
            }
            None => out.push_str(&rest[start..=end]),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    (out, used)
}

/// Params for step `index` of a flow: the step's fixed params, then `*`,
/// then the entry for its endpoint key, then the entry for its index.
/// Later layers win.
pub fn merge_step_params(index: usize, step: &AutoFlowStep, by_step: &ParamsByStep) -> Params {
    let mut merged = step.params.clone().unwrap_or_default();
    let index = index.to_string();
    for selector in [ALL_STEPS, step.endpoint_key.as_str(), index.as_str()] {
        if let Some(layer) = by_step.get(selector) {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiloom_core::{AuthMode, HealthStatus, HttpMethod, ParamSpec};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn flat_flow_params_apply_to_every_step() {
        let by_step = params_by_step_from_json(&json!({"breed": "hound", "limit": 3}));
        assert_eq!(by_step.len(), 1);
        assert_eq!(by_step[ALL_STEPS], params(&[("breed", "hound"), ("limit", "3")]));

        let by_step = params_by_step_from_json(&json!({
            "breed": "hound",
            "*": {"breed": "pug"},
            "1": {"limit": "5"}
        }));
        assert_eq!(by_step[ALL_STEPS], params(&[("breed", "pug")]));
        assert_eq!(by_step["1"], params(&[("limit", "5")]));

        assert!(params_by_step_from_json(&json!({"gone": null})).is_empty());
        assert!(params_by_step_from_json(&json!([1, 2])).is_empty());
    }

    #[test]
    fn json_params_flatten_to_strings() {
        let p = params_from_json(&json!({"a": "x", "b": 2, "c": true, "d": null, "e": [1, 2]}));
        assert_eq!(p, params(&[("a", "x"), ("b", "2"), ("c", "true"), ("e", "[1,2]")]));
        assert!(params_from_json(&json!("nope")).is_empty());
    }

    #[test]
    fn substitution_encodes_and_leaves_unknown_tokens() {
        let (url, used) = substitute_path(
            "https://x.io/{country}/{city}/{missing}",
            &params(&[("country", "de"), ("city", "Frankfurt am Main")]),
        );
        assert_eq!(url, "https://x.io/de/Frankfurt%20am%20Main/{missing}");
        assert_eq!(used, vec!["country", "city"]);

        let (url, used) = substitute_path("https://x.io/{unclosed", &params(&[("unclosed", "v")]));
        assert_eq!(url, "https://x.io/{unclosed");
        assert!(used.is_empty());
    }

    #[test]
    fn missing_required_checks_blank_values() {
        let mut declared = BTreeMap::new();
        declared.insert("latitude".to_string(), ParamSpec::required("number", ""));
        declared.insert("longitude".to_string(), ParamSpec::required("number", ""));
        declared.insert("current_weather".to_string(), ParamSpec::optional("boolean", ""));
        let ep = AutoRegisteredEndpoint {
            key: "public.open_meteo.forecast".into(),
            api_name: "Open-Meteo".into(),
            endpoint_name: "forecast".into(),
            description: String::new(),
            category: "Weather".into(),
            url: "https://api.open-meteo.com/v1/forecast".into(),
            method: HttpMethod::Get,
            auth: AuthMode::None,
            parameters: Some(declared),
            sample_phrases: Vec::new(),
            quality_score: 0.95,
            health: HealthStatus::Unknown,
        };
        assert_eq!(
            missing_required(&ep, &params(&[("latitude", "52.5"), ("longitude", " ")])),
            vec!["longitude"]
        );
        assert!(missing_required(&ep, &params(&[("latitude", "1"), ("longitude", "2")])).is_empty());
    }

    #[test]
    fn step_params_layer_in_order() {
        let step = AutoFlowStep {
            endpoint_key: "public.x.y".into(),
            description: String::new(),
            optional: false,
            params: Some(params(&[("a", "fixed"), ("b", "fixed")])),
        };
        let mut by_step = ParamsByStep::new();
        by_step.insert("*".into(), params(&[("b", "all"), ("c", "all")]));
        by_step.insert("public.x.y".into(), params(&[("c", "key")]));
        by_step.insert("1".into(), params(&[("d", "index")]));
        by_step.insert("0".into(), params(&[("d", "other")]));

        let merged = merge_step_params(1, &step, &by_step);
        assert_eq!(merged, params(&[("a", "fixed"), ("b", "all"), ("c", "key"), ("d", "index")]));
    }
}
