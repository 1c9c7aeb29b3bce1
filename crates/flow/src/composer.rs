use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use apiloom_catalog::CatalogStore;
use apiloom_core::{
    endpoint_key, normalize_id, AuthMode, AutoFlow, AutoFlowStep, FlowProvenance,
};
use apiloom_registry::RegistrySync;
use chrono::Utc;
use tracing::{debug, info};

use crate::templates::{FlowTemplate, TemplateStep, FLOW_TEMPLATES};

/// Builds flows from templates and categories against the live catalog.
pub struct FlowComposer {
    store: Arc<CatalogStore>,
    registry: Arc<RegistrySync>,
}

impl FlowComposer {
    pub fn new(store: Arc<CatalogStore>, registry: Arc<RegistrySync>) -> Self {
        Self { store, registry }
    }

    /// Resolve every template; store the complete ones as the new set of
    /// auto flows. Templates with any unresolved step are dropped whole.
    pub fn generate_auto_flows(&self) -> Vec<AutoFlow> {
        let flows: Vec<AutoFlow> = FLOW_TEMPLATES
            .iter()
            .filter_map(|t| self.materialize(t))
            .collect();
        info!(
            generated = flows.len(),
            templates = FLOW_TEMPLATES.len(),
            "auto flows generated"
        );
        self.store.replace_auto_flows(flows.clone());
        flows
    }

    fn materialize(&self, template: &FlowTemplate) -> Option<AutoFlow> {
        let mut steps = Vec::with_capacity(template.steps.len());
        for step in template.steps {
            match self.resolve(step) {
                Some(resolved) => steps.push(resolved),
                None => {
                    debug!(
                        flow = template.id,
                        api = step.api,
                        operation = step.operation,
                        "template step unresolved, dropping flow"
                    );
                    return None;
                }
            }
        }

        Some(AutoFlow {
            id: template.id.to_string(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            steps,
            categories: template.categories.iter().map(|c| c.to_string()).collect(),
            created_at: Utc::now(),
            provenance: FlowProvenance::Auto,
        })
    }

    fn resolve(&self, step: &TemplateStep) -> Option<AutoFlowStep> {
        let entry = self.store.get_api(step.api)?;
        let op_id = normalize_id(step.operation);
        let endpoint = entry.endpoints.iter().find(|ep| normalize_id(&ep.name) == op_id)?;
        let key = endpoint_key(&entry.name, &endpoint.name);
        // Must also be visible through the endpoint view the executor uses.
        self.registry.endpoint(&key)?;

        let params = (!step.params.is_empty()).then(|| {
            step.params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        });

        Some(AutoFlowStep {
            endpoint_key: key,
            description: step.description.to_string(),
            optional: step.optional,
            params,
        })
    }

    /// Ad hoc flow: per category, the first no-auth API and its first
    /// endpoint that needs no parameters (else its first endpoint).
    /// Needs at least two resolved steps. Stored as a manual flow.
    pub fn generate_category_flow(&self, categories: &[String]) -> Option<AutoFlow> {
        let mut seen = Vec::new();
        let mut steps = Vec::new();
        let mut used = Vec::new();

        for category in categories {
            let lower = category.trim().to_lowercase();
            if lower.is_empty() || seen.contains(&lower) {
                continue;
            }
            seen.push(lower);

            let Some(entry) = self
                .store
                .by_category(category.trim())
                .into_iter()
                .find(|e| e.auth == AuthMode::None && !e.endpoints.is_empty())
            else {
                debug!(category = %category, "no keyless API in category");
                continue;
            };
            let endpoint = entry
                .endpoints
                .iter()
                .find(|ep| ep.required_params().is_empty())
                .or_else(|| entry.endpoints.first())?;

            steps.push(AutoFlowStep {
                endpoint_key: endpoint_key(&entry.name, &endpoint.name),
                description: format!("{}: {}", entry.name, endpoint.description),
                optional: false,
                params: None,
            });
            used.push(category.trim().to_string());
        }

        if steps.len() < 2 {
            return None;
        }

        let id = format!(
            "category-{}",
            used.iter().map(|c| normalize_id(c)).collect::<Vec<_>>().join("-")
        );
        let flow = AutoFlow {
            id,
            name: format!("Category mix: {}", used.join(" + ")),
            description: format!("One keyless API from each of: {}", used.join(", ")),
            steps,
            categories: used,
            created_at: Utc::now(),
            provenance: FlowProvenance::Manual,
        };
        self.store.store_flow(flow.clone());
        info!(flow = %flow.id, steps = flow.steps.len(), "category flow stored");
        Some(flow)
    }

    /// Numbered step list for a stored flow.
    pub fn describe_flow(&self, id: &str) -> Option<String> {
        let flow = self.store.get_flow(id)?;
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", flow.name, flow.description);
        for (i, step) in flow.steps.iter().enumerate() {
            let _ = write!(out, "{}. {} ({})", i + 1, step.description, step.endpoint_key);
            if step.optional {
                out.push_str(" [optional]");
            }
            if let Some(params) = &step.params {
                let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                let _ = write!(out, " with {}", rendered.join(", "));
            }
            out.push('\n');
        }
        Some(out.trim_end().to_string())
    }
}
