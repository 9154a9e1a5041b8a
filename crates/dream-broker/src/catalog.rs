//! The service catalog: one "dream" service with a big and a small plan.
//!
//! Service and plan ids are random v4 UUIDs generated once per process.
//! They change on every restart, so a marketplace that cached the old ids
//! has to refetch the catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BrokerError;

/// Path (relative to the base URL) of the operator console.
pub const CONSOLE_PATH: &str = "v2/console";

/// Path (relative to the base URL) of the service logo.
pub const IMAGE_PATH: &str = "v2/image";

/// Plan display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub bullets: Vec<String>,
}

/// A tier of the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub plan_updateable: bool,
    pub metadata: PlanMetadata,
    pub free: bool,
}

/// OAuth client the marketplace registers for the service dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardClient {
    pub id: String,
    pub secret: String,
    pub redirect_uri: String,
}

/// Marketplace listing block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingMetadata {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub blurb: String,
    #[serde(rename = "longDescription")]
    pub long_description: String,
}

/// Service display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub listing: ListingMetadata,
    pub bullets: Vec<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    pub plan_updateable: bool,
    pub plans: Vec<Plan>,
    pub dashboard_client: DashboardClient,
    pub metadata: ServiceMetadata,
}

/// The `GET /v2/catalog` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

/// Immutable service template.
///
/// URL fields are left blank here and filled in per request by
/// [`ServiceCatalog::resolve`], which returns a fresh value instead of
/// touching shared state.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    service: Service,
}

impl ServiceCatalog {
    /// Build the dream service with freshly generated ids.
    pub fn dreams() -> Self {
        let big_dreams = Plan {
            id: Uuid::new_v4().to_string(),
            name: "big_dreams".to_string(),
            description: "A Big Dream".to_string(),
            plan_updateable: true,
            metadata: PlanMetadata {
                bullets: vec!["Dreams are cheap".to_string(), "Even big dreams".to_string()],
            },
            free: false,
        };

        let small_dreams = Plan {
            id: Uuid::new_v4().to_string(),
            name: "small_dreams".to_string(),
            description: "A Small Dream".to_string(),
            plan_updateable: true,
            metadata: PlanMetadata {
                bullets: vec!["Small dreams are barely worth having".to_string()],
            },
            free: true,
        };

        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: "dream".to_string(),
            description: "Imaginary Service".to_string(),
            bindable: true,
            plan_updateable: true,
            plans: vec![big_dreams, small_dreams],
            dashboard_client: DashboardClient {
                id: "user".to_string(),
                secret: "pass".to_string(),
                redirect_uri: String::new(),
            },
            metadata: ServiceMetadata {
                listing: ListingMetadata {
                    image_url: String::new(),
                    blurb: "dreams are cheap".to_string(),
                    long_description: "Dream services ranging from free to cheap".to_string(),
                },
                bullets: vec!["Dreams of all sizes".to_string()],
                image_url: String::new(),
                display_name: "Broker of dreams".to_string(),
            },
        };

        Self { service }
    }

    /// The unresolved template.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Find a plan by name ("big_dreams", "small_dreams").
    pub fn plan_by_name(&self, name: &str) -> Option<&Plan> {
        self.service.plans.iter().find(|p| p.name == name)
    }

    /// The service with URLs made absolute against `base_url`.
    ///
    /// `base_url` must end with `/`.
    pub fn resolve_service(&self, base_url: &str) -> Service {
        let mut service = self.service.clone();
        let image_url = format!("{}{}", base_url, IMAGE_PATH);
        service.dashboard_client.redirect_uri = format!("{}{}", base_url, CONSOLE_PATH);
        service.metadata.image_url = image_url.clone();
        service.metadata.listing.image_url = image_url;
        service
    }

    /// Full catalog response for a request arriving at `base_url`.
    pub fn resolve(&self, base_url: &str) -> Catalog {
        Catalog {
            services: vec![self.resolve_service(base_url)],
        }
    }

    /// Check that `service_id` is this service and `plan_id` one of its plans.
    ///
    /// Ids arrive as raw JSON; anything other than a matching string is
    /// rejected with 404, quoting both values (`None` when absent).
    pub fn validate(
        &self,
        service_id: Option<&Value>,
        plan_id: Option<&Value>,
    ) -> Result<(), BrokerError> {
        let service_ok = service_id.and_then(Value::as_str) == Some(self.service.id.as_str());
        let plan_ok = plan_id
            .and_then(Value::as_str)
            .is_some_and(|id| self.service.plans.iter().any(|p| p.id == id));

        if service_ok && plan_ok {
            return Ok(());
        }

        Err(BrokerError::NotFound(format!(
            "service({}) or plan ({}) not me",
            display_id(service_id),
            display_id(plan_id),
        )))
    }
}

fn display_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "None".to_string(),
    }
}
