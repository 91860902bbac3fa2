//! Action-log input types.
//!
//! Mirrors the document emitted by the simulation: nodes, parcel requests
//! and vehicles with sparse per-minute action and mode maps. Everything here
//! is immutable once parsed.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::LogError;

/// A position in GeoJSON order (longitude, latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// GeoJSON position `[lon, lat]`.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeCoordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Accepts both `0`/`1` and `false`/`true` for flag fields.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Bool(false)
    }
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(value) => value,
            Flag::Int(value) => value == 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: u32,
    pub coordinates: NodeCoordinates,
    /// Parcels stored per minute; minute "0" is the initial storage.
    #[serde(default)]
    pub storage: BTreeMap<String, Vec<u32>>,
    #[serde(default)]
    pub pickup: Flag,
}

impl Node {
    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.coordinates.longitude, self.coordinates.latitude)
    }

    pub fn initial_storage(&self) -> &[u32] {
        self.storage.get("0").map(Vec::as_slice).unwrap_or_default()
    }

    /// A node holding parcels at minute 0 is a depot.
    pub fn is_depot(&self) -> bool {
        !self.initial_storage().is_empty()
    }

    pub fn is_pickup_point(&self) -> bool {
        self.pickup.is_set()
    }
}

/// A parcel and the nodes it travels between.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: u32,
    pub origin: u32,
    pub destination: u32,
}

/// One action record as written by the simulation.
///
/// Any JSON value parses. Fields that are present but unusable are left
/// empty and named in `malformed`; normalization turns them into errors for
/// the owning vehicle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawAction {
    pub action_type: Option<String>,
    pub duration: u32,
    pub related_requests: Option<Vec<u32>>,
    pub from: Option<u32>,
    pub to: Option<u32>,
    pub malformed: Vec<&'static str>,
}

impl RawAction {
    pub fn is_malformed(&self, field: &str) -> bool {
        self.malformed.iter().any(|name| *name == field)
    }
}

impl From<Value> for RawAction {
    fn from(value: Value) -> Self {
        let mut action = RawAction::default();
        let Value::Object(fields) = value else {
            return action;
        };

        action.action_type = match fields.get("actionType") {
            None | Some(Value::Null) => None,
            Some(Value::String(action_type)) => Some(action_type.clone()),
            Some(_) => {
                action.malformed.push("actionType");
                None
            }
        };
        // Whole minutes; fractional durations are rounded.
        match fields.get("duration") {
            None | Some(Value::Null) => {}
            Some(value) => match value
                .as_f64()
                .filter(|minutes| (0.0..=u32::MAX as f64).contains(minutes))
            {
                Some(minutes) => action.duration = minutes.round() as u32,
                None => action.malformed.push("duration"),
            },
        }
        action.related_requests = lenient_field(&fields, "relatedRequests", &mut action.malformed);
        action.from = lenient_field(&fields, "from", &mut action.malformed);
        action.to = lenient_field(&fields, "to", &mut action.malformed);
        action
    }
}

fn lenient_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    name: &'static str,
    malformed: &mut Vec<&'static str>,
) -> Option<T> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                malformed.push(name);
                None
            }
        },
    }
}

/// A minute holds either a list of simultaneous actions or a single one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vehicle {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub actions: BTreeMap<String, OneOrMany<RawAction>>,
    #[serde(default)]
    pub mode: BTreeMap<String, String>,
}

/// The complete simulation output for one scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionLog {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub requests: Vec<Request>,
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub totalcost: f64,
}

impl ActionLog {
    pub fn from_json_str(input: &str) -> Result<Self, LogError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LogError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn request(&self, id: u32) -> Option<&Request> {
        self.requests.iter().find(|request| request.id == id)
    }

    /// Largest parcel, vehicle or node id mentioned anywhere in the log.
    pub fn max_domain_id(&self) -> u32 {
        let nodes = self.nodes.iter().map(|node| node.id);
        let requests = self.requests.iter().map(|request| request.id);
        let vehicles = self
            .vehicles
            .iter()
            .enumerate()
            .map(|(position, vehicle)| vehicle.id.unwrap_or(position as u32 + 1));
        let parcels = self.vehicles.iter().flat_map(|vehicle| {
            vehicle
                .actions
                .values()
                .flat_map(|entry| entry.as_slice())
                .flat_map(|action| action.related_requests.iter().flatten().copied())
        });

        nodes
            .chain(requests)
            .chain(vehicles)
            .chain(parcels)
            .max()
            .unwrap_or(0)
    }
}
