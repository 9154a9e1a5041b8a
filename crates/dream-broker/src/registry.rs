//! In-memory instance registry.
//!
//! Maps instance ids to [`Instance`] records, each of which owns its
//! bindings. Nothing is persisted; a restart forgets everything.
//!
//! Read-modify-write goes through `update` on the store, which holds the
//! entry exclusively while the closure runs, so concurrent requests on the
//! same instance can't lose each other's updates.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Credentials handed back when a binding is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A binding on an instance: the caller's configuration plus the
/// credentials issued for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub id: String,

    /// Opaque payload exactly as the caller sent it.
    pub config: Value,

    pub credentials: Credentials,
}

/// A provisioned (simulated) occurrence of a service plan.
///
/// Any request fields beyond the ones modelled here are kept in `extra`
/// and echoed back alongside the typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,

    #[serde(default)]
    pub space_guid: String,

    #[serde(default)]
    pub service_id: String,

    #[serde(default)]
    pub plan_id: String,

    /// Bindings keyed by binding id (unique within this instance only).
    #[serde(default)]
    pub bindings: BTreeMap<String, Binding>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instance {
    /// An empty record for `id`, with no plan and no bindings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            space_guid: String::new(),
            service_id: String::new(),
            plan_id: String::new(),
            bindings: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Shallow-merge request fields into this record.
    ///
    /// `id` comes from the path and `bindings` is owned by the broker, so both
    /// are ignored if present in the body.
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "id" | "bindings" => {}
                "space_guid" => self.space_guid = string_value(value),
                "service_id" => self.service_id = string_value(value),
                "plan_id" => self.plan_id = string_value(value),
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

fn string_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Storage for instance records.
pub trait InstanceStore: Send + Sync {
    /// Look up an instance by id.
    fn find(&self, id: &str) -> Option<Instance>;

    /// Run `f` against the instance while it is locked.
    ///
    /// Returns false without calling `f` when the instance doesn't exist.
    /// Handlers call `update`, which carries a result out.
    fn modify(&self, id: &str, f: &mut dyn FnMut(&mut Instance)) -> bool;

    /// Insert or fully replace the record under `instance.id`.
    fn upsert(&self, instance: Instance);

    /// Remove an instance and its bindings.
    ///
    /// Absence is not an error; returns whether anything was removed.
    fn delete(&self, id: &str) -> bool;

    /// Copy of every record, ordered by id.
    fn snapshot(&self) -> BTreeMap<String, Instance>;
}

impl dyn InstanceStore {
    /// Atomic read-modify-write of one instance.
    ///
    /// `None` when the instance doesn't exist; otherwise whatever `f` returned.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut out = None;
        self.modify(id, &mut |instance| {
            if let Some(f) = f.take() {
                out = Some(f(instance));
            }
        });
        out
    }
}

/// In-memory instance store using DashMap.
#[derive(Debug, Default)]
pub struct InMemoryInstanceStore {
    instances: DashMap<String, Instance>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceStore for InMemoryInstanceStore {
    fn find(&self, id: &str) -> Option<Instance> {
        tracing::debug!("find_instance: {}", id);
        self.instances.get(id).map(|entry| entry.value().clone())
    }

    fn modify(&self, id: &str, f: &mut dyn FnMut(&mut Instance)) -> bool {
        match self.instances.get_mut(id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    fn upsert(&self, instance: Instance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    fn delete(&self, id: &str) -> bool {
        let removed = self.instances.remove(id).is_some();
        tracing::debug!(instance_id = %id, removed, "delete_instance");
        removed
    }

    fn snapshot(&self) -> BTreeMap<String, Instance> {
        self.instances
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
