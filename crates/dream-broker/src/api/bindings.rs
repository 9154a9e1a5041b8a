//! Service binding lifecycle: get, create/update, delete.
//!
//! Every binding operation needs its owning instance; an unknown instance
//! is reported as 410 Gone. Unlike instance deletion, deleting a binding
//! that doesn't exist is an error.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::parse_json;
use crate::error::{BrokerError, BrokerResult};
use crate::registry::{Binding, Credentials, Instance};
use crate::response::TextJson;
use crate::state::BrokerState;

fn instance_gone(instance_id: &str) -> BrokerError {
    BrokerError::Gone(format!("service instance {} not found", instance_id))
}

/// `GET /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
///
/// Returns the configuration payload stored for the binding.
pub async fn get_binding(
    State(state): State<BrokerState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> BrokerResult<TextJson<Value>> {
    info!(
        "service_bindings GET instance {} binding {}",
        instance_id, binding_id
    );

    let instance = state
        .instances
        .find(&instance_id)
        .ok_or_else(|| instance_gone(&instance_id))?;

    instance
        .bindings
        .get(&binding_id)
        .map(|binding| TextJson(binding.config.clone()))
        .ok_or_else(|| BrokerError::NotFound(format!("service binding {} not found", binding_id)))
}

/// `PUT` / `PATCH` on a binding path.
///
/// Stores the body under the binding id and returns the issued credentials.
/// PUT answers 201, PATCH 200; otherwise the two are the same operation.
pub async fn put_binding(
    State(state): State<BrokerState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    method: Method,
    body: Bytes,
) -> BrokerResult<(StatusCode, TextJson<Credentials>)> {
    info!("service_bindings_putch {} {}", instance_id, binding_id);

    // An unknown instance is 410 even when the body is also malformed.
    let parsed = parse_json(&body);
    let credentials = state.binding_credentials();
    let issued = credentials.clone();

    state
        .instances
        .update(&instance_id, move |instance| -> Result<(), serde_json::Error> {
            let config = parsed?.unwrap_or_else(|| Value::Object(Map::new()));
            debug!(config = %config, "storing binding");
            instance.bindings.insert(
                binding_id.clone(),
                Binding {
                    id: binding_id,
                    config,
                    credentials: issued,
                },
            );
            Ok(())
        })
        .ok_or_else(|| instance_gone(&instance_id))?
        .map_err(|e| {
            BrokerError::BadRequest(format!("invalid binding body: {}", e))
        })?;

    let status = if method == Method::PATCH {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, TextJson(credentials)))
}

/// `DELETE` on a binding path.
///
/// Returns the owning instance as it stands after the removal.
pub async fn delete_binding(
    State(state): State<BrokerState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> BrokerResult<TextJson<Instance>> {
    info!("service_bindings_delete {} {}", instance_id, binding_id);

    let remaining = state
        .instances
        .update(&instance_id, |instance| {
            instance
                .bindings
                .remove(&binding_id)
                .map(|_| instance.clone())
        })
        .ok_or_else(|| instance_gone(&instance_id))?
        .ok_or_else(|| {
            BrokerError::NotFound(format!(
                "service instance {} binding {} not found, cannot delete",
                instance_id, binding_id
            ))
        })?;

    Ok(TextJson(remaining))
}

/// Any other method on a binding path.
pub async fn unknown_method(
    method: Method,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> BrokerError {
    BrokerError::NotFound(format!(
        "services instances {} binding {} unknown method {}",
        instance_id, binding_id, method
    ))
}
