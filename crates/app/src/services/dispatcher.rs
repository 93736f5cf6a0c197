//! Resource dispatcher — carries one request from URI to representation.
//!
//! Each request goes `Received → Located → Executed → Decorated → Sent`, and
//! any stage may short-circuit into a failure:
//!
//! - **Located**: the [`ResourceLocator`] resolves the path. Unresolvable
//!   paths fail here and never reach the control system.
//! - **Executed**: the (method, entity kind) pair selects the
//!   [`DeviceModel`] calls. Unsupported pairs fail with `MethodNotAllowed`,
//!   bad bodies with `MalformedRequestBody`, and control-system errors pass
//!   through as upstream failures.
//! - **Decorated**: member names are re-canonicalised from what the control
//!   system reported and the [`LinkGraphBuilder`] computes the links.
//! - **Sent**: the [`ResponseAssembler`] produces the final representation.
//!
//! There is no authorisation at this layer. The dispatcher keeps no state
//! between requests.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use tangorest_domain::attribute::{AttributeInfoUpdate, DataValue};
use tangorest_domain::entity::{ChildKind, EntityRef};
use tangorest_domain::path::{DevicePath, MemberName};

use crate::ports::DeviceModel;
use crate::services::assembler::{
    ErrorRepresentation, Failure, FailureKind, Representation, ResponseAssembler,
};
use crate::services::link_graph::LinkGraphBuilder;
use crate::services::locator::ResourceLocator;

/// Query parameter filtering the device list and device collections.
pub const WILDCARD_PARAM: &str = "wildcard";

const DEFAULT_WILDCARD: &str = "*";

/// Request methods the dispatcher distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Head,
    Options,
    Other,
}

impl Method {
    /// Parse an upper-case method name; unknown names map to [`Method::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "POST" => Self::Post,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Methods each entity kind supports.
#[must_use]
pub fn allowed_methods(entity: &EntityRef) -> &'static [Method] {
    match entity {
        EntityRef::Database
        | EntityRef::DeviceList
        | EntityRef::Device(_)
        | EntityRef::DeviceState(_)
        | EntityRef::Collection(_, ChildKind::Commands) => &[Method::Get],
        EntityRef::Collection(..)
        | EntityRef::Attribute(_)
        | EntityRef::AttributeInfo(..)
        | EntityRef::Property(..) => &[Method::Get, Method::Put],
        EntityRef::Command(..) => &[Method::Get, Method::Post],
    }
}

/// A transport-independent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Request path, optionally followed by a query string.
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Deserialize)]
struct WriteAttributeBody {
    value: DataValue,
}

#[derive(Deserialize)]
struct ExecuteCommandBody {
    #[serde(default)]
    input: Option<DataValue>,
}

#[derive(Deserialize)]
struct WritePropertyBody {
    values: Vec<String>,
}

/// Body of a collection write: member name to new value.
type BulkBody<V> = BTreeMap<String, V>;

/// Result of the execute stage: the canonical entity, its payload and the
/// children the link graph needs.
struct Executed {
    entity: EntityRef,
    payload: Map<String, Value>,
    children: Vec<EntityRef>,
}

impl Executed {
    fn new(entity: EntityRef, payload: Map<String, Value>) -> Self {
        Self {
            entity,
            payload,
            children: Vec::new(),
        }
    }
}

/// Routes requests to the device model and decorates the results.
pub struct ResourceDispatcher<M> {
    model: M,
    locator: ResourceLocator,
}

impl<M: DeviceModel + Sync> ResourceDispatcher<M> {
    /// Create a dispatcher over `model`, addressing resources with `locator`.
    pub fn new(model: M, locator: ResourceLocator) -> Self {
        Self { model, locator }
    }

    #[must_use]
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// Every failed stage produces an [`ErrorRepresentation`]; its kind
    /// determines the status code.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn dispatch(&self, request: &Request) -> Result<Representation, ErrorRepresentation> {
        match self.handle(request).await {
            Ok(representation) => {
                tracing::debug!("sent");
                Ok(representation)
            }
            Err(failure) => {
                if failure.kind.is_upstream() || failure.kind == FailureKind::Internal {
                    tracing::warn!(kind = ?failure.kind, detail = %failure.detail, "request failed");
                } else {
                    tracing::debug!(kind = ?failure.kind, detail = %failure.detail, "request failed");
                }
                Err(failure.into())
            }
        }
    }

    async fn handle(&self, request: &Request) -> Result<Representation, Failure> {
        let entity = self.locator.decode(&request.path)?;
        tracing::debug!(kind = %entity.kind(), "located");

        let executed = self.execute(request, entity).await?;
        tracing::debug!(kind = %executed.entity.kind(), "executed");

        let links =
            LinkGraphBuilder::new(&self.locator).build(&executed.entity, &executed.children);
        tracing::debug!(relations = links.len(), "decorated");

        Ok(ResponseAssembler::assemble(executed.payload, links))
    }

    async fn execute(&self, request: &Request, entity: EntityRef) -> Result<Executed, Failure> {
        match (request.method, entity) {
            (Method::Get, EntityRef::Database) => Ok(self.read_root()),
            (Method::Get, EntityRef::DeviceList) => self.list_devices(request).await,
            (Method::Get, EntityRef::Device(device)) => self.read_device(device).await,
            (Method::Get, EntityRef::DeviceState(device)) => {
                let summary = self.model.read_state(&device).await?;
                let payload = ResponseAssembler::payload(&summary)?;
                Ok(Executed::new(EntityRef::DeviceState(device), payload))
            }
            (Method::Get, EntityRef::Collection(device, kind)) => {
                self.list_children(request, device, kind).await
            }
            (Method::Put, EntityRef::Collection(device, ChildKind::Attributes)) => {
                self.write_attributes(request, device).await
            }
            (Method::Put, EntityRef::Collection(device, ChildKind::Properties)) => {
                self.write_properties(request, device).await
            }
            (Method::Get, EntityRef::Attribute(attribute)) => {
                let (device, name) = attribute.into_parts();
                let reading = self.model.read_attribute(&device, &name).await?;
                let name = canonical(&reading.name, name);
                let payload = ResponseAssembler::payload(&reading)?;
                Ok(Executed::new(EntityRef::attribute(device, name), payload))
            }
            (Method::Put, EntityRef::Attribute(attribute)) => {
                let body: WriteAttributeBody = parse_body(&request.body)?;
                let (device, name) = attribute.into_parts();
                let reading = self
                    .model
                    .write_attribute(&device, &name, body.value)
                    .await?;
                tracing::info!(device = %device, attribute = %reading.name, "attribute written");
                let name = canonical(&reading.name, name);
                let payload = ResponseAssembler::payload(&reading)?;
                Ok(Executed::new(EntityRef::attribute(device, name), payload))
            }
            (Method::Get, EntityRef::AttributeInfo(device, name)) => {
                let info = self.model.attribute_info(&device, &name).await?;
                let name = canonical(&info.name, name);
                let payload = ResponseAssembler::payload(&info)?;
                Ok(Executed::new(EntityRef::AttributeInfo(device, name), payload))
            }
            (Method::Put, EntityRef::AttributeInfo(device, name)) => {
                let update: AttributeInfoUpdate = parse_body(&request.body)?;
                let info = self
                    .model
                    .write_attribute_info(&device, &name, update)
                    .await?;
                tracing::info!(device = %device, attribute = %info.name, "attribute configured");
                let name = canonical(&info.name, name);
                let payload = ResponseAssembler::payload(&info)?;
                Ok(Executed::new(EntityRef::AttributeInfo(device, name), payload))
            }
            (Method::Get, EntityRef::Command(device, name)) => {
                let info = self.model.command_info(&device, &name).await?;
                let name = canonical(&info.name, name);
                let payload = ResponseAssembler::payload(&info)?;
                Ok(Executed::new(EntityRef::Command(device, name), payload))
            }
            (Method::Post, EntityRef::Command(device, name)) => {
                let input = if request.body.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    parse_body::<ExecuteCommandBody>(&request.body)?.input
                };
                let result = self.model.execute_command(&device, &name, input).await?;
                tracing::info!(device = %device, command = %result.name, "command executed");
                let name = canonical(&result.name, name);
                let payload = ResponseAssembler::payload(&result)?;
                Ok(Executed::new(EntityRef::Command(device, name), payload))
            }
            (Method::Get, EntityRef::Property(device, name)) => {
                let property = self.model.read_property(&device, &name).await?;
                let name = canonical(&property.name, name);
                let payload = ResponseAssembler::payload(&property)?;
                Ok(Executed::new(EntityRef::Property(device, name), payload))
            }
            (Method::Put, EntityRef::Property(device, name)) => {
                let body: WritePropertyBody = parse_body(&request.body)?;
                let property = self
                    .model
                    .write_property(&device, &name, body.values)
                    .await?;
                tracing::info!(device = %device, property = %property.name, "property written");
                let name = canonical(&property.name, name);
                let payload = ResponseAssembler::payload(&property)?;
                Ok(Executed::new(EntityRef::Property(device, name), payload))
            }
            (
                method,
                entity @ (EntityRef::Database
                | EntityRef::DeviceList
                | EntityRef::Device(_)
                | EntityRef::DeviceState(_)
                | EntityRef::Collection(..)
                | EntityRef::Attribute(_)
                | EntityRef::AttributeInfo(..)
                | EntityRef::Command(..)
                | EntityRef::Property(..)),
            ) => Err(self.not_allowed(method, &entity)),
        }
    }

    fn read_root(&self) -> Executed {
        let mut payload = Map::new();
        payload.insert("version".to_string(), json!(self.locator.version().as_str()));
        Executed::new(EntityRef::Database, payload)
    }

    async fn list_devices(&self, request: &Request) -> Result<Executed, Failure> {
        let mut devices = self.model.list_devices(wildcard(request)).await?;
        devices.sort();
        devices.dedup();

        let names: Vec<String> = devices.iter().map(ToString::to_string).collect();
        let mut payload = Map::new();
        payload.insert("devices".to_string(), json!(names));
        Ok(Executed {
            entity: EntityRef::DeviceList,
            payload,
            children: devices.into_iter().map(EntityRef::Device).collect(),
        })
    }

    async fn read_device(&self, device: DevicePath) -> Result<Executed, Failure> {
        let info = self.model.device_info(&device).await?;
        let summary = self.model.read_state(&device).await?;

        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(device.to_string()));
        payload.insert("state".to_string(), json!(summary.state));
        payload.insert("status".to_string(), json!(summary.status));
        payload.insert("info".to_string(), Value::Object(ResponseAssembler::payload(&info)?));
        for kind in ChildKind::ALL {
            let children = self
                .model
                .list_children(&device, kind, DEFAULT_WILDCARD)
                .await?;
            let names: Vec<&str> = children.iter().filter_map(EntityRef::member_name).collect();
            payload.insert(kind.segment().to_string(), json!(names));
        }
        Ok(Executed::new(EntityRef::Device(device), payload))
    }

    /// Commands are listed with their descriptions, other collections by
    /// name only.
    async fn list_children(
        &self,
        request: &Request,
        device: DevicePath,
        kind: ChildKind,
    ) -> Result<Executed, Failure> {
        let children = self
            .model
            .list_children(&device, kind, wildcard(request))
            .await?;

        let items = if kind == ChildKind::Commands {
            let mut infos = Vec::with_capacity(children.len());
            for child in &children {
                if let EntityRef::Command(_, name) = child {
                    let info = self.model.command_info(&device, name).await?;
                    infos.push(Value::Object(ResponseAssembler::payload(&info)?));
                }
            }
            Value::Array(infos)
        } else {
            let names: Vec<&str> = children.iter().filter_map(EntityRef::member_name).collect();
            json!(names)
        };

        let mut payload = Map::new();
        payload.insert(kind.segment().to_string(), items);
        Ok(Executed {
            entity: EntityRef::Collection(device, kind),
            payload,
            children,
        })
    }

    /// Write several attributes in name order. The first failure stops the
    /// request; earlier writes stay applied.
    async fn write_attributes(
        &self,
        request: &Request,
        device: DevicePath,
    ) -> Result<Executed, Failure> {
        let body: BulkBody<DataValue> = parse_body(&request.body)?;
        let writes = member_entries(body)?;

        let mut readings = Vec::with_capacity(writes.len());
        let mut children = Vec::with_capacity(writes.len());
        for (name, value) in writes {
            let reading = self.model.write_attribute(&device, &name, value).await?;
            tracing::info!(device = %device, attribute = %reading.name, "attribute written");
            let name = canonical(&reading.name, name);
            children.push(EntityRef::attribute(device.clone(), name));
            readings.push(Value::Object(ResponseAssembler::payload(&reading)?));
        }

        let mut payload = Map::new();
        payload.insert(ChildKind::Attributes.segment().to_string(), Value::Array(readings));
        Ok(Executed {
            entity: EntityRef::Collection(device, ChildKind::Attributes),
            payload,
            children,
        })
    }

    /// Replace several properties in name order, stopping at the first
    /// failure.
    async fn write_properties(
        &self,
        request: &Request,
        device: DevicePath,
    ) -> Result<Executed, Failure> {
        let body: BulkBody<Vec<String>> = parse_body(&request.body)?;
        let writes = member_entries(body)?;

        let mut properties = Vec::with_capacity(writes.len());
        let mut children = Vec::with_capacity(writes.len());
        for (name, values) in writes {
            let property = self.model.write_property(&device, &name, values).await?;
            tracing::info!(device = %device, property = %property.name, "property written");
            let name = canonical(&property.name, name);
            children.push(EntityRef::Property(device.clone(), name));
            properties.push(Value::Object(ResponseAssembler::payload(&property)?));
        }

        let mut payload = Map::new();
        payload.insert(ChildKind::Properties.segment().to_string(), Value::Array(properties));
        Ok(Executed {
            entity: EntityRef::Collection(device, ChildKind::Properties),
            payload,
            children,
        })
    }

    fn not_allowed(&self, method: Method, entity: &EntityRef) -> Failure {
        let allowed: Vec<&str> = allowed_methods(entity)
            .iter()
            .map(|method| method.as_str())
            .collect();
        Failure::new(
            FailureKind::MethodNotAllowed,
            format!(
                "{method} is not allowed on {} {}; allowed: {}",
                entity.kind(),
                self.locator.encode(entity),
                allowed.join(", ")
            ),
        )
    }
}

fn wildcard(request: &Request) -> &str {
    request
        .params
        .get(WILDCARD_PARAM)
        .map_or(DEFAULT_WILDCARD, String::as_str)
}

/// Validate the member names of a collection write.
fn member_entries<V>(body: BulkBody<V>) -> Result<Vec<(MemberName, V)>, Failure> {
    if body.is_empty() {
        return Err(Failure::new(
            FailureKind::MalformedRequestBody,
            "request body names no member to write",
        ));
    }
    body.into_iter()
        .map(|(name, value)| {
            MemberName::new(name).map(|name| (name, value)).map_err(|err| {
                Failure::new(
                    FailureKind::MalformedRequestBody,
                    format!("invalid member name in request body: {err}"),
                )
            })
        })
        .collect()
}

/// The name the control system reported, if it designates the same member.
fn canonical(reported: &str, requested: MemberName) -> MemberName {
    MemberName::new(reported)
        .ok()
        .filter(|name| name.matches(requested.as_str()))
        .unwrap_or(requested)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Failure> {
    serde_json::from_slice(body).map_err(|err| {
        Failure::new(
            FailureKind::MalformedRequestBody,
            format!("invalid request body: {err}"),
        )
    })
}
