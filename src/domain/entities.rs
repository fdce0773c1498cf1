//! Domain entities: typed snapshots of server-owned records
//!
//! The client never persists any of these; each is fetched per call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to another record by name (host, guest, activation key, template).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
}

/// Lifecycle environment of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub library: bool,
}

/// A registered managed host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct System {
    pub id: Option<u64>,
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub ipv4_address: Option<String>,
    #[serde(rename = "serviceLevel")]
    pub service_level: Option<String>,
    #[serde(rename = "releaseVer")]
    pub release_ver: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub environment: Option<NamedRef>,
    pub activation_key: Vec<NamedRef>,
    pub host: Option<NamedRef>,
    pub guests: Vec<NamedRef>,
    pub template: Option<NamedRef>,
    pub facts: BTreeMap<String, Value>,
}

impl System {
    /// Key under which custom info is stored: the numeric id when the server
    /// provides one, the uuid otherwise.
    pub fn custom_info_key(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.uuid.clone())
    }

    /// A record without uuid and name is what the server sends for a rejected write.
    pub fn is_empty(&self) -> bool {
        self.uuid.is_empty() && self.name.is_empty()
    }
}

/// Filters accepted by the system listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemQuery {
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub pool_id: Option<String>,
}

impl SystemQuery {
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(v) = &self.name {
            pairs.push(("name", v.as_str()));
        }
        if let Some(v) = &self.uuid {
            pairs.push(("uuid", v.as_str()));
        }
        if let Some(v) = &self.pool_id {
            pairs.push(("pool_id", v.as_str()));
        }
        pairs
    }
}

/// Installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Package {
    /// `name-version-release.arch`
    pub fn nvra(&self) -> String {
        format!(
            "{}-{}-{}.{}",
            self.name, self.version, self.release, self.arch
        )
    }
}

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[serde(alias = "pending")]
    Waiting,
    Running,
    #[serde(alias = "succeeded")]
    Finished,
    #[serde(alias = "failed")]
    Error,
    TimedOut,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Waiting | Self::Running)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::TimedOut => "timed_out",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

/// Server-tracked unit of asynchronous work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: String,
    pub state: TaskState,
    #[serde(default)]
    pub result_description: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub finish_time: Option<String>,
}

/// Filters for the remote task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub environment_id: Option<u64>,
    pub system_name: Option<String>,
    pub system_uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Releases {
    #[serde(default)]
    pub releases: Vec<String>,
}

/// Certificate serial attached to an entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serial {
    pub id: Value,
}

/// Consumed subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entitlement {
    pub entitlement_id: String,
    pub serials: Vec<Serial>,
    pub pool_name: String,
    pub expires: Option<String>,
    pub consumed: Option<i64>,
    pub quantity: Option<i64>,
    pub sla: Option<String>,
    pub contract_number: Option<String>,
    pub provided_products: Vec<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscriptions {
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedProduct {
    pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub value: Value,
}

/// Subscription pool a system could consume from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pool {
    pub id: String,
    pub product_name: String,
    pub end_date: Option<String>,
    pub consumed: Option<i64>,
    pub quantity: i64,
    pub sockets: Option<Value>,
    pub provided_products: Vec<ProvidedProduct>,
    pub product_attributes: Vec<ProductAttribute>,
}

impl Pool {
    pub fn is_unlimited(&self) -> bool {
        self.quantity == -1
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.product_attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pools {
    #[serde(default)]
    pub pools: Vec<Pool>,
}

/// Flags narrowing the available-pool listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolFilter {
    pub match_system: bool,
    pub match_installed: bool,
    pub no_overlap: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemGroup {
    pub id: u64,
    pub name: String,
}

/// Arbitrary user-defined key/value metadata; a key may hold several values.
pub type CustomInfo = BTreeMap<String, Vec<String>>;

/// Registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    #[serde(skip)]
    pub org: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activation_keys: Vec<String>,
    #[serde(rename = "cType")]
    pub consumer_type: String,
    #[serde(rename = "releaseVer", skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(rename = "serviceLevel", skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    pub facts: BTreeMap<String, String>,
}

/// Partial update of a system; unset fields are left untouched on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "releaseVer", skip_serializing_if = "Option::is_none")]
    pub release_ver: Option<String>,
    #[serde(rename = "serviceLevel", skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<u64>,
}

/// Where a systems report is generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    Org(String),
    Environment(u64),
}

/// Raw report returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub body: Vec<u8>,
    pub content_disposition: Option<String>,
}
