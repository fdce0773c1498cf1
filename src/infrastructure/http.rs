//! Blocking HTTP implementation of `ServerApi`
//!
//! JSON over HTTPS with basic auth. Path segments are percent-encoded through
//! `url`, so names with spaces or slashes are safe.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};
use url::Url;

use crate::application::ApplicationError;
use crate::config::ServerSettings;
use crate::domain::{
    CustomInfo, Environment, Package, PackageAction, PoolFilter, Pools, Registration, Releases,
    Report, ReportFormat, ReportScope, Subscriptions, System, SystemGroup, SystemQuery,
    SystemUpdate, Task, TaskFilter, UnsubscribeTarget,
};
use crate::infrastructure::error::{ApiError, ApiResult, InfraError, InfraResult};
use crate::infrastructure::traits::ServerApi;

/// `ServerApi` over a single reqwest blocking client.
pub struct HttpApi {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl HttpApi {
    pub fn new(server: &ServerSettings) -> InfraResult<Self> {
        let base_url = Url::parse(&server.url).map_err(|e| ApplicationError::Config {
            message: format!("invalid server url {}: {e}", server.url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApplicationError::Config {
                message: format!("server url cannot carry a path: {}", server.url),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(server.timeout_secs.map(Duration::from_secs))
            .danger_accept_invalid_certs(server.insecure)
            .user_agent(concat!("katello-system/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InfraError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            username: server.username.clone(),
            password: server.password.clone(),
        })
    }

    /// Base URL plus the given path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        }
    }

    /// Send and map non-2xx statuses; 404 becomes `ApiError::NotFound`.
    fn execute(&self, builder: RequestBuilder, resource: &str) -> ApiResult<Response> {
        let response = builder.send().map_err(|e| ApiError::Transport {
            resource: resource.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        debug!("{} -> {}", resource, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = server_message(&body, status);
        if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound {
                resource: resource.to_string(),
                message,
            })
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                resource: resource.to_string(),
                message,
            })
        }
    }

    fn decode<T: DeserializeOwned>(response: Response, resource: &str) -> ApiResult<T> {
        response.json::<T>().map_err(|e| ApiError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> ApiResult<T> {
        let url = self.endpoint(segments);
        let resource = url.path().to_string();
        trace!("GET {} {:?}", resource, query);
        let response = self.execute(self.request(Method::GET, url).query(query), &resource)?;
        Self::decode(response, &resource)
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> ApiResult<T> {
        let response = self.send_raw(method, segments, body)?;
        let resource = self.endpoint(segments).path().to_string();
        Self::decode(response, &resource)
    }

    fn send_raw(&self, method: Method, segments: &[&str], body: Option<&Value>) -> ApiResult<Response> {
        let url = self.endpoint(segments);
        let resource = url.path().to_string();
        trace!("{} {}", method, resource);
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, &resource)
    }
}

/// Pull a human message out of an error body (`displayMessage`, `errors`) or fall back to the status.
fn server_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = value.get("displayMessage").and_then(Value::as_str) {
            return msg.to_string();
        }
        if let Some(errors) = value.get("errors").and_then(Value::as_array) {
            let joined = errors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return joined;
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

impl ServerApi for HttpApi {
    fn environments(&self, org: &str, name: Option<&str>) -> ApiResult<Vec<Environment>> {
        let query = match name {
            Some(name) => vec![("name", name)],
            None => vec![("library", "true")],
        };
        self.get(&["organizations", org, "environments"], &query)
    }

    fn systems_by_org(&self, org: &str, query: &SystemQuery) -> ApiResult<Vec<System>> {
        self.get(&["organizations", org, "systems"], &query.pairs())
    }

    fn systems_by_env(&self, env_id: u64, query: &SystemQuery) -> ApiResult<Vec<System>> {
        let id = env_id.to_string();
        self.get(&["environments", id.as_str(), "systems"], &query.pairs())
    }

    fn system(&self, uuid: &str) -> ApiResult<System> {
        self.get(&["systems", uuid], &[])
    }

    fn register(&self, registration: &Registration) -> ApiResult<Option<System>> {
        let body = serde_json::to_value(registration).map_err(|e| ApiError::Decode {
            resource: "registration".into(),
            message: e.to_string(),
        })?;
        self.send(
            Method::POST,
            &["organizations", registration.org.as_str(), "systems"],
            Some(&body),
        )
    }

    fn unregister(&self, uuid: &str) -> ApiResult<()> {
        self.send_raw(Method::DELETE, &["systems", uuid], None)
            .map(|_| ())
    }

    fn remove_deletion_record(&self, uuid: &str) -> ApiResult<()> {
        self.send_raw(Method::DELETE, &["consumers", uuid, "deletionrecord"], None)
            .map(|_| ())
    }

    fn update_system(&self, uuid: &str, update: &SystemUpdate) -> ApiResult<Option<System>> {
        let body = json!({ "system": update });
        self.send(Method::PUT, &["systems", uuid], Some(&body))
    }

    fn releases_for_system(&self, uuid: &str) -> ApiResult<Releases> {
        self.get(&["systems", uuid, "releases"], &[])
    }

    fn releases_for_environment(&self, env_id: u64) -> ApiResult<Releases> {
        let id = env_id.to_string();
        self.get(&["environments", id.as_str(), "releases"], &[])
    }

    fn packages(&self, uuid: &str) -> ApiResult<Vec<Package>> {
        self.get(&["systems", uuid, "packages"], &[])
    }

    fn package_action(&self, uuid: &str, action: &PackageAction) -> ApiResult<Task> {
        let method = match action {
            PackageAction::Install(_) | PackageAction::InstallGroups(_) => Method::POST,
            PackageAction::Remove(_) | PackageAction::RemoveGroups(_) => Method::DELETE,
            PackageAction::Update(_) => Method::PUT,
        };
        let body = if action.targets_groups() {
            json!({ "groups": action.names() })
        } else {
            json!({ "packages": action.names() })
        };
        self.send(method, &["systems", uuid, "packages"], Some(&body))
    }

    fn task_status(&self, task_id: &str) -> ApiResult<Task> {
        self.get(&["systems", "tasks", task_id], &[])
    }

    fn tasks(&self, org: &str, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        let env_id = filter.environment_id.map(|id| id.to_string());
        let mut query = Vec::new();
        if let Some(id) = &env_id {
            query.push(("environment_id", id.as_str()));
        }
        if let Some(name) = &filter.system_name {
            query.push(("system_name", name.as_str()));
        }
        if let Some(uuid) = &filter.system_uuid {
            query.push(("system_uuid", uuid.as_str()));
        }
        self.get(&["organizations", org, "systems", "tasks"], &query)
    }

    fn subscribe(&self, uuid: &str, pool: &str, quantity: u32) -> ApiResult<()> {
        let body = json!({ "pool": pool, "quantity": quantity });
        self.send_raw(Method::POST, &["systems", uuid, "subscriptions"], Some(&body))
            .map(|_| ())
    }

    fn subscriptions(&self, uuid: &str) -> ApiResult<Subscriptions> {
        self.get(&["systems", uuid, "subscriptions"], &[])
    }

    fn available_pools(&self, uuid: &str, filter: PoolFilter) -> ApiResult<Pools> {
        let mut query = Vec::new();
        if filter.match_system {
            query.push(("match_system", "true"));
        }
        if filter.match_installed {
            query.push(("match_installed", "true"));
        }
        if filter.no_overlap {
            query.push(("no_overlap", "true"));
        }
        self.get(&["systems", uuid, "pools"], &query)
    }

    fn unsubscribe(&self, uuid: &str, target: &UnsubscribeTarget) -> ApiResult<()> {
        let segments: Vec<&str> = match target {
            UnsubscribeTarget::All => vec!["systems", uuid, "subscriptions"],
            UnsubscribeTarget::Serial(serial) => {
                vec!["systems", uuid, "subscriptions", "serials", serial.as_str()]
            }
            UnsubscribeTarget::Entitlement(id) => vec!["systems", uuid, "subscriptions", id.as_str()],
        };
        self.send_raw(Method::DELETE, &segments, None).map(|_| ())
    }

    fn report(&self, scope: &ReportScope, format: ReportFormat) -> ApiResult<Report> {
        let env_id;
        let segments: Vec<&str> = match scope {
            ReportScope::Org(org) => vec!["organizations", org.as_str(), "systems", "report"],
            ReportScope::Environment(id) => {
                env_id = id.to_string();
                vec!["environments", env_id.as_str(), "systems", "report"]
            }
        };
        let url = self.endpoint(&segments);
        let resource = url.path().to_string();
        let builder = self
            .request(Method::GET, url)
            .header(ACCEPT, format.mime_type());
        let response = self.execute(builder, &resource)?;
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().map_err(|e| ApiError::Decode {
            resource: resource.clone(),
            message: e.to_string(),
        })?;
        Ok(Report {
            body: body.to_vec(),
            content_disposition,
        })
    }

    fn system_groups(&self, org: &str, names: &[String]) -> ApiResult<Vec<SystemGroup>> {
        let joined = names.join(",");
        self.get(
            &["organizations", org, "system_groups"],
            &[("name", joined.as_str())],
        )
    }

    fn add_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>> {
        let body = json!({ "system": { "system_group_ids": group_ids } });
        self.send(Method::POST, &["systems", uuid, "system_groups"], Some(&body))
    }

    fn remove_system_groups(&self, uuid: &str, group_ids: &[u64]) -> ApiResult<Option<System>> {
        let body = json!({ "system": { "system_group_ids": group_ids } });
        self.send(Method::DELETE, &["systems", uuid, "system_groups"], Some(&body))
    }

    fn custom_info(&self, system_key: &str, keyname: Option<&str>) -> ApiResult<CustomInfo> {
        match keyname {
            Some(key) => self.get(&["custom_info", "system", system_key, key], &[]),
            None => self.get(&["custom_info", "system", system_key], &[]),
        }
    }

    fn add_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        value: &str,
    ) -> ApiResult<CustomInfo> {
        let body = json!({ "keyname": keyname, "value": value });
        self.send(
            Method::POST,
            &["custom_info", "system", system_key],
            Some(&body),
        )
    }

    fn update_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        current: &str,
        new: &str,
    ) -> ApiResult<CustomInfo> {
        let body = json!({ "value": new });
        self.send(
            Method::PUT,
            &["custom_info", "system", system_key, keyname, current],
            Some(&body),
        )
    }

    fn remove_custom_info(
        &self,
        system_key: &str,
        keyname: &str,
        value: Option<&str>,
    ) -> ApiResult<bool> {
        let mut segments = vec!["custom_info", "system", system_key, keyname];
        if let Some(value) = value {
            segments.push(value);
        }
        let resource = self.endpoint(&segments).path().to_string();
        let response = self.send_raw(Method::DELETE, &segments, None)?;
        let body = response.text().map_err(|e| ApiError::Decode {
            resource: resource.clone(),
            message: e.to_string(),
        })?;
        // No content is a successful delete.
        if body.trim().is_empty() {
            return Ok(true);
        }
        let value = serde_json::from_str::<Value>(&body).map_err(|e| ApiError::Decode {
            resource,
            message: e.to_string(),
        })?;
        Ok(truthy(&value))
    }
}

/// Loose truthiness of a JSON reply: `null`, `false`, `0` and empty values are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
