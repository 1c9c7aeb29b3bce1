use std::sync::RwLock;
use std::time::Duration;

use apiloom_core::{normalize_id, AutoRegisteredEndpoint, HttpMethod};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::RegistryError;

/// What the capability registry receives for one auto endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityManifest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub method: HttpMethod,
    /// JSON schema of the query/path parameters.
    pub parameters: Value,
    pub display_fields: Vec<String>,
    pub tags: Vec<String>,
    pub sample_phrases: Vec<String>,
}

impl CapabilityManifest {
    pub fn from_endpoint(endpoint: &AutoRegisteredEndpoint, display_fields: Vec<String>) -> Self {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, spec) in endpoint.parameters.iter().flatten() {
            properties.insert(
                name.clone(),
                json!({ "type": spec.kind, "description": spec.description }),
            );
            if spec.required {
                required.push(Value::String(name.clone()));
            }
        }

        let mut tags = vec![
            "public".to_string(),
            normalize_id(&endpoint.api_name),
            endpoint.auth.as_str().to_string(),
        ];
        let category = endpoint.category.to_lowercase();
        if !category.is_empty() {
            tags.push(category);
        }

        Self {
            id: endpoint.key.clone(),
            name: format!("{} {}", endpoint.api_name, endpoint.endpoint_name),
            description: endpoint.description.clone(),
            url: endpoint.url.clone(),
            method: endpoint.method,
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
            display_fields,
            tags,
            sample_phrases: endpoint.sample_phrases.clone(),
        }
    }
}

/// Destination for capability manifests.
#[async_trait]
pub trait CapabilityRegistry: Send + Sync {
    /// Register or replace the manifest with the same id.
    async fn register(&self, manifest: CapabilityManifest) -> Result<(), RegistryError>;

    fn name(&self) -> &str;
}

// ── In-memory backend ───────────────────────────────────────────

/// Default backend when no external registry URL is configured.
#[derive(Debug, Default)]
pub struct InMemoryCapabilityRegistry {
    manifests: RwLock<IndexMap<String, CapabilityManifest>>,
}

impl InMemoryCapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<CapabilityManifest> {
        self.manifests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn list(&self) -> Vec<CapabilityManifest> {
        self.manifests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.manifests.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CapabilityRegistry for InMemoryCapabilityRegistry {
    async fn register(&self, manifest: CapabilityManifest) -> Result<(), RegistryError> {
        self.manifests
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(manifest.id.clone(), manifest);
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

// ── HTTP backend ────────────────────────────────────────────────

/// POSTs each manifest as JSON to a fixed URL.
pub struct HttpCapabilityRegistry {
    client: reqwest::Client,
    url: String,
}

impl HttpCapabilityRegistry {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl CapabilityRegistry for HttpCapabilityRegistry {
    async fn register(&self, manifest: CapabilityManifest) -> Result<(), RegistryError> {
        debug!(id = %manifest.id, url = %self.url, "registering capability");
        let response = self.client.post(&self.url).json(&manifest).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Rejected {
            id: manifest.id,
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use apiloom_core::{AuthMode, HealthStatus, ParamSpec};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    fn endpoint() -> AutoRegisteredEndpoint {
        let mut parameters = BTreeMap::new();
        parameters.insert("breed".to_string(), ParamSpec::required("string", "Breed name"));
        parameters.insert("count".to_string(), ParamSpec::optional("integer", "How many"));
        AutoRegisteredEndpoint {
            key: "public.dog_ceo.by_breed".into(),
            api_name: "Dog CEO".into(),
            endpoint_name: "by_breed".into(),
            description: "Random image of a breed".into(),
            category: "Animals".into(),
            url: "https://dog.ceo/api/breed/{breed}/images/random".into(),
            method: HttpMethod::Get,
            auth: AuthMode::None,
            parameters: Some(parameters),
            sample_phrases: vec!["use Dog CEO".into()],
            quality_score: 0.95,
            health: HealthStatus::Unknown,
        }
    }

    #[test]
    fn manifest_carries_parameter_schema_and_tags() {
        let manifest = CapabilityManifest::from_endpoint(&endpoint(), vec!["message".into()]);
        assert_eq!(manifest.id, "public.dog_ceo.by_breed");
        assert_eq!(manifest.parameters["type"], "object");
        assert_eq!(manifest.parameters["properties"]["breed"]["type"], "string");
        assert_eq!(manifest.parameters["required"], json!(["breed"]));
        assert_eq!(manifest.tags, vec!["public", "dog_ceo", "none", "animals"]);
        assert_eq!(manifest.display_fields, vec!["message"]);

        let wire = serde_json::to_value(&manifest).unwrap();
        assert!(wire.get("samplePhrases").is_some());
        assert!(wire.get("displayFields").is_some());
    }

    #[tokio::test]
    async fn in_memory_registry_upserts() {
        let registry = InMemoryCapabilityRegistry::new();
        let manifest = CapabilityManifest::from_endpoint(&endpoint(), Vec::new());
        registry.register(manifest.clone()).await.unwrap();
        registry.register(manifest).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("public.dog_ceo.by_breed").is_some());
    }

    #[tokio::test]
    async fn http_registry_posts_and_reports_rejections() {
        let router = Router::new()
            .route(
                "/ok",
                post(|Json(m): Json<CapabilityManifest>| async move {
                    assert_eq!(m.id, "public.dog_ceo.by_breed");
                    StatusCode::CREATED
                }),
            )
            .route("/nope", post(|| async { (StatusCode::CONFLICT, "exists") }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let manifest = CapabilityManifest::from_endpoint(&endpoint(), Vec::new());

        let ok = HttpCapabilityRegistry::new(&format!("http://{addr}/ok"), Duration::from_secs(2)).unwrap();
        ok.register(manifest.clone()).await.unwrap();

        let nope = HttpCapabilityRegistry::new(&format!("http://{addr}/nope"), Duration::from_secs(2)).unwrap();
        match nope.register(manifest).await {
            Err(RegistryError::Rejected { status, body, .. }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "exists");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
