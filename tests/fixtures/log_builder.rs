//! Builders for action-log documents.
//!
//! Logs are assembled as JSON and parsed through the public entry point, so
//! every test also exercises the input format.

use std::collections::BTreeMap;

use route_trace::ActionLog;
use serde_json::{Value, json};

use super::monaco_locations::node_location;

#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    nodes: Vec<Value>,
    requests: Vec<Value>,
    vehicles: Vec<Value>,
    totalcost: f64,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain node at the Monaco location with the same id.
    pub fn node(self, id: u32) -> Self {
        self.node_with(id, &[], false)
    }

    /// Node holding `parcels` at minute 0.
    pub fn depot(self, id: u32, parcels: &[u32]) -> Self {
        self.node_with(id, parcels, false)
    }

    pub fn pickup_point(self, id: u32) -> Self {
        self.node_with(id, &[], true)
    }

    fn node_with(mut self, id: u32, storage: &[u32], pickup: bool) -> Self {
        let at = node_location(id);
        self.nodes.push(json!({
            "id": id,
            "coordinates": {"longitude": at.lon, "latitude": at.lat},
            "storage": {"0": storage},
            "pickup": if pickup { 1 } else { 0 },
        }));
        self
    }

    pub fn request(mut self, id: u32, origin: u32, destination: u32) -> Self {
        self.requests.push(json!({"id": id, "origin": origin, "destination": destination}));
        self
    }

    pub fn vehicle(mut self, vehicle: VehicleBuilder) -> Self {
        self.vehicles.push(vehicle.json());
        self
    }

    pub fn totalcost(mut self, totalcost: f64) -> Self {
        self.totalcost = totalcost;
        self
    }

    pub fn json(&self) -> Value {
        json!({
            "nodes": self.nodes,
            "requests": self.requests,
            "vehicles": self.vehicles,
            "totalcost": self.totalcost,
        })
    }

    pub fn build(&self) -> ActionLog {
        ActionLog::from_json_str(&self.json().to_string()).expect("fixture log parses")
    }
}

/// One vehicle's minute map. Minutes with a single action are written as a
/// bare object, busier minutes as a list.
#[derive(Debug, Clone, Default)]
pub struct VehicleBuilder {
    actions: BTreeMap<u32, Vec<Value>>,
    modes: BTreeMap<u32, String>,
}

impl VehicleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, minute: u32, action: Value) -> Self {
        self.actions.entry(minute).or_default().push(action);
        self
    }

    pub fn mode(mut self, minute: u32, mode: &str) -> Self {
        self.modes.insert(minute, mode.to_string());
        self
    }

    fn json(&self) -> Value {
        let actions: serde_json::Map<String, Value> = self
            .actions
            .iter()
            .map(|(minute, actions)| {
                let entry = match actions.as_slice() {
                    [single] => single.clone(),
                    many => Value::Array(many.to_vec()),
                };
                (minute.to_string(), entry)
            })
            .collect();
        let modes: serde_json::Map<String, Value> = if self.modes.is_empty() {
            [("0".to_string(), json!("Manual"))].into_iter().collect()
        } else {
            self.modes
                .iter()
                .map(|(minute, mode)| (minute.to_string(), json!(mode)))
                .collect()
        };
        json!({"actions": actions, "mode": modes})
    }
}

pub fn pickup(parcels: &[u32]) -> Value {
    json!({"actionType": "PICKUP", "duration": 1, "relatedRequests": parcels})
}

pub fn handover(parcels: &[u32]) -> Value {
    json!({"actionType": "HANDOVER", "duration": 1, "relatedRequests": parcels})
}

pub fn deliver(parcels: &[u32]) -> Value {
    json!({"actionType": "DELIVER", "duration": 1, "relatedRequests": parcels})
}

pub fn travel(from: u32, to: u32) -> Value {
    json!({"actionType": "TRAVELLING", "duration": 1, "from": from, "to": to})
}

pub fn delayed(from: u32, to: u32, duration: u32) -> Value {
    json!({"actionType": "DELAYED", "duration": duration, "from": from, "to": to})
}

pub fn mode_change() -> Value {
    json!({"actionType": "MODE_CHANGE", "duration": 1})
}

pub fn action(action_type: &str) -> Value {
    json!({"actionType": action_type, "duration": 1})
}
