//! `ApiSpecification` handler: normalizes the OpenAPI 2/3 document into a
//! `NormalizedApi` and materializes the environment-wide `Api` singleton for
//! its basePath (§3).

use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use async_trait::async_trait;

use crate::client::ScopedClient;
use crate::errors::{Error, Result};
use crate::model::kinds::api::ApiSpec;
use crate::model::kinds::api_specification::{ApiSpecification, NormalizedApi};
use crate::model::meta::{labels as label_keys, owned_by_label, Condition, ConditionStatus, ObjectMeta, ObjectRef, OwnerReference, COND_BLOCKED, COND_PROCESSING, COND_READY};
use crate::model::resource::{Kind, Resource};
use crate::naming::{normalize_base_path, slug};
use crate::runtime::context::EngineContext;
use crate::runtime::{now, Action, Handler};
use crate::store::ObjectStore;

pub struct ApiSpecificationHandler;

#[async_trait]
impl Handler<ApiSpecification, EngineContext> for ApiSpecificationHandler {
    async fn reconcile(&self, mut obj: ApiSpecification, ctx: Arc<EngineContext>) -> Result<Action> {
        let gen = obj.metadata.generation;
        let normalized = match parse_open_api_document(&obj.spec.open_api_document, &obj.spec.category) {
            Ok(n) => n,
            Err(e) => {
                obj.conditions_mut().upsert(Condition::new(COND_BLOCKED, ConditionStatus::True, "InvalidDocument", e.to_string(), gen, now()));
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "InvalidDocument", "", gen, now()));
                ctx.api_specifications.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        };

        let owner = OwnerReference::controller("ApiSpecification", &obj.metadata.namespace, &obj.metadata.name, obj.metadata.uid);
        let owned_by = owned_by_label(&owner.kind, &owner.namespace, &owner.name);
        let ns = ctx.environment.clone();

        if let Some(existing) = ctx.apis.get(&ns, &normalized.name).await {
            if existing.metadata.owned_by() != Some(owned_by.as_str()) {
                obj.conditions_mut().upsert(Condition::new(
                    COND_BLOCKED,
                    ConditionStatus::True,
                    "ApiNameConflict",
                    format!("basePath {} is already owned by another ApiSpecification", normalized.base_path),
                    gen,
                    now(),
                ));
                obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::False, "ApiNameConflict", "", gen, now()));
                ctx.api_specifications.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
                return Ok(Action::AwaitChange);
            }
        }

        let api_spec =
            ApiSpec { base_path: normalized.base_path.clone(), version: normalized.version.clone(), category: normalized.category.clone(), oauth2_scopes: normalized.oauth2_scopes.clone(), x_vendor: normalized.x_vendor };

        let client = ScopedClient::new(&ctx.apis, ctx.environment.clone());
        let (api, _) = client
            .create_or_update(&ns, &normalized.name, &owner, now(), |existing| {
                let mut o = existing.unwrap_or_else(|| Resource::new(Kind::Api, ObjectMeta::new(&ns, &normalized.name, now()), api_spec.clone()));
                o.spec = api_spec.clone();
                o.metadata.labels.insert(label_keys::BASEPATH.to_string(), normalize_base_path(&normalized.base_path));
                o.status.active = true;
                o.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "", gen, now()));
                o
            })
            .await?;

        obj.status.api = Some(ObjectRef::new("Api", &api.metadata.namespace, &api.metadata.name));
        obj.status.document_fingerprint = document_fingerprint(&obj.spec.open_api_document);
        obj.conditions_mut().remove(COND_BLOCKED);
        obj.conditions_mut().upsert(Condition::new(COND_READY, ConditionStatus::True, "Provisioned", "normalized api is ready", gen, now()));
        obj.conditions_mut().upsert(Condition::new(COND_PROCESSING, ConditionStatus::False, "Done", "", gen, now()));

        ctx.api_specifications.update(obj).await.map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Action::AwaitChange)
    }
}

fn document_fingerprint(raw: &str) -> String {
    let mut h = Sha256::new();
    h.update(raw.as_bytes());
    format!("{:x}", h.finalize())
}

/// Parses either an OpenAPI 2 (`basePath`/`securityDefinitions`) or OpenAPI 3
/// (`servers[0].url`/`components.securitySchemes`) document, accepting
/// either JSON or YAML input.
fn parse_open_api_document(raw: &str, category: &str) -> Result<NormalizedApi> {
    let doc: Value = serde_json::from_str(raw).or_else(|_| serde_yaml::from_str(raw)).map_err(|e| Error::Fatal(format!("cannot parse OpenAPI document: {e}")))?;

    let base_path = base_path_of(&doc)?;
    let version = doc.get("info").and_then(|i| i.get("version")).and_then(Value::as_str).unwrap_or_default().to_string();
    let x_vendor = doc.get("x-vendor").and_then(Value::as_bool).unwrap_or(false);
    let oauth2_scopes = oauth2_scopes_of(&doc);

    Ok(NormalizedApi { name: slug(&base_path), base_path, version, category: category.to_string(), oauth2_scopes, x_vendor })
}

fn base_path_of(doc: &Value) -> Result<String> {
    if let Some(bp) = doc.get("basePath").and_then(Value::as_str) {
        return Ok(bp.to_string());
    }
    if let Some(server_url) = doc.get("servers").and_then(Value::as_array).and_then(|s| s.first()).and_then(|s| s.get("url")).and_then(Value::as_str) {
        if let Ok(parsed) = url::Url::parse(server_url) {
            return Ok(parsed.path().to_string());
        }
        return Ok(server_url.to_string());
    }
    Err(Error::Fatal("OpenAPI document has neither basePath nor servers[0].url".to_string()).into())
}

fn oauth2_scopes_of(doc: &Value) -> Vec<String> {
    let mut scopes = std::collections::BTreeSet::new();
    let schemes = doc.get("securityDefinitions").or_else(|| doc.get("components").and_then(|c| c.get("securitySchemes")));
    if let Some(Value::Object(map)) = schemes {
        for scheme in map.values() {
            if scheme.get("type").and_then(Value::as_str) != Some("oauth2") {
                continue;
            }
            if let Some(Value::Object(s)) = scheme.get("scopes") {
                scopes.extend(s.keys().cloned());
            }
            if let Some(Value::Object(flows)) = scheme.get("flows") {
                for flow in flows.values() {
                    if let Some(Value::Object(s)) = flow.get("scopes") {
                        scopes.extend(s.keys().cloned());
                    }
                }
            }
        }
    }
    scopes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openapi2_document() {
        let doc = r#"{
            "basePath": "/Eni/Checkout/v1",
            "info": {"version": "1.2.0"},
            "securityDefinitions": {"oauth2": {"type": "oauth2", "scopes": {"read": "r", "write": "w"}}}
        }"#;
        let normalized = parse_open_api_document(doc, "eni").unwrap();
        assert_eq!(normalized.base_path, "/Eni/Checkout/v1");
        assert_eq!(normalized.name, "eni-checkout-v1");
        assert_eq!(normalized.version, "1.2.0");
        assert_eq!(normalized.oauth2_scopes, vec!["read".to_string(), "write".to_string()]);
        assert!(!normalized.x_vendor);
    }

    #[test]
    fn parses_openapi3_yaml_document_with_vendor_extension() {
        let doc = "servers:\n  - url: https://upstream.example/checkout/v1\ninfo:\n  version: 2.0.0\nx-vendor: true\n";
        let normalized = parse_open_api_document(doc, "eni").unwrap();
        assert_eq!(normalized.base_path, "/checkout/v1");
        assert_eq!(normalized.name, "checkout-v1");
        assert!(normalized.x_vendor);
    }

    #[test]
    fn rejects_document_without_base_path() {
        assert!(parse_open_api_document("{\"info\":{}}", "eni").is_err());
    }

    #[test]
    fn fingerprint_is_deterministic_and_content_sensitive() {
        let a = document_fingerprint("{\"basePath\":\"/x\"}");
        let b = document_fingerprint("{\"basePath\":\"/x\"}");
        let c = document_fingerprint("{\"basePath\":\"/y\"}");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
