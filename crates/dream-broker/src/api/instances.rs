//! Service instance lifecycle: create (PUT), update (PATCH), delete.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::request_object;
use crate::error::{BrokerError, BrokerResult};
use crate::registry::Instance;
use crate::response::TextJson;
use crate::state::BrokerState;

/// Reject bodies that don't name this service and one of its plans.
fn check_service_plan(
    state: &BrokerState,
    verb: &str,
    config: &Map<String, Value>,
) -> BrokerResult<()> {
    state
        .catalog
        .validate(config.get("service_id"), config.get("plan_id"))
        .map_err(|e| {
            debug!("service/plan mismatch");
            BrokerError::NotFound(format!("{} {}", verb, e))
        })
}

/// `PUT /v2/service_instances/{instance_id}`
///
/// Creates the instance, replacing any existing record with the same id.
pub async fn put_instance(
    State(state): State<BrokerState>,
    Path(instance_id): Path<String>,
    body: Bytes,
) -> BrokerResult<(StatusCode, TextJson<Instance>)> {
    info!("service_instances PUT {}", instance_id);

    let config = request_object(&body);
    check_service_plan(&state, "PUT", &config)?;
    debug!(config = ?config, "provisioning instance");

    let mut instance = Instance::new(&instance_id);
    instance.merge(&config);
    state.instances.upsert(instance.clone());

    Ok((StatusCode::CREATED, TextJson(instance)))
}

/// `PATCH /v2/service_instances/{instance_id}`
///
/// Shallow-merges the body into an existing instance.
pub async fn patch_instance(
    State(state): State<BrokerState>,
    Path(instance_id): Path<String>,
    body: Bytes,
) -> BrokerResult<(StatusCode, TextJson<Instance>)> {
    info!("service_instances PATCH {}", instance_id);

    let config = request_object(&body);
    debug!(config = ?config, "updating instance");
    check_service_plan(&state, "PATCH", &config)?;

    let updated = state
        .instances
        .update(&instance_id, |instance| {
            instance.merge(&config);
            instance.clone()
        })
        .ok_or_else(|| {
            BrokerError::NotFound(format!(
                "{} not a valid service instance for PATCH",
                instance_id
            ))
        })?;

    Ok((StatusCode::CREATED, TextJson(updated)))
}

/// `DELETE /v2/service_instances/{instance_id}`
///
/// Idempotent: deleting an unknown instance still succeeds.
pub async fn delete_instance(
    State(state): State<BrokerState>,
    Path(instance_id): Path<String>,
) -> TextJson<Value> {
    info!("services_instances DEL {}", instance_id);
    state.instances.delete(&instance_id);
    TextJson(json!({}))
}

/// Any other method on an instance path.
pub async fn unknown_method(method: Method, Path(instance_id): Path<String>) -> BrokerError {
    BrokerError::NotFound(format!(
        "services instances {} unknown method {}",
        instance_id, method
    ))
}
