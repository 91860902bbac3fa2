//! Typed map features.
//!
//! Each feature kind carries only the fields it needs. The loose GeoJSON
//! property bags the map frontend expects are produced at the boundary by
//! [`Feature::to_geojson`].

use geojson::JsonObject;
use serde_json::{Value, json};

use crate::model::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
}

impl Geometry {
    pub fn point(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(coordinate) => Some(*coordinate),
            Geometry::LineString(_) => None,
        }
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match self {
            Geometry::Point(coordinate) => geojson::Value::Point(coordinate.to_position()),
            Geometry::LineString(coordinates) => geojson::Value::LineString(
                coordinates.iter().map(|c| c.to_position()).collect(),
            ),
        };
        geojson::Geometry::new(value)
    }
}

/// Fields shared by every vehicle event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInfo {
    pub route_number: usize,
    pub minute: u32,
    pub duration: u32,
    /// Road distance covered by the vehicle when it reached this event.
    pub distance: f64,
    pub arrival_mode: String,
}

impl EventInfo {
    pub fn new(route_number: usize, minute: u32, duration: u32, arrival_mode: impl Into<String>) -> Self {
        Self {
            route_number,
            minute,
            duration,
            distance: 0.0,
            arrival_mode: arrival_mode.into(),
        }
    }

    fn arrival(&self) -> (u32, u32) {
        (self.minute / 60, self.minute % 60)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickupProps {
    pub event: EventInfo,
    pub parcels: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandoverProps {
    pub event: EventInfo,
    pub key: u64,
    pub node: u32,
    pub parcels: Vec<u32>,
    /// Route numbers taking part; starts with the recording vehicle.
    pub involved: Vec<usize>,
    /// Coordinates of the waypoints recorded before this handover.
    pub snapshot: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryProps {
    pub event: EventInfo,
    pub parcel: u32,
    /// Origin node of the parcel's request, if the request is known.
    pub origin: Option<u32>,
    /// Resolved path from the origin to this delivery.
    pub waypoints: Vec<Coordinate>,
    pub handovers: Vec<Coordinate>,
    pub to_depot: bool,
    /// Position of this delivery in its vehicle's waypoint log.
    pub log_index: usize,
    pub single_route: Option<Box<Feature>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeChangeProps {
    pub event: EventInfo,
    pub from_mode: String,
    pub to_mode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteProps {
    pub number: usize,
    pub distance: f64,
    /// Minutes covered by the vehicle's action log.
    pub minutes: u32,
    pub idle_time: u32,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleRouteProps {
    pub parcel: u32,
    pub distance: f64,
    /// Delivery minute, reported as the route's duration.
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepotProps {
    pub node: u32,
    pub route_numbers: Vec<usize>,
    pub parcels: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Start(EventInfo),
    End(EventInfo),
    Pickup(PickupProps),
    Handover(HandoverProps),
    Delivery(DeliveryProps),
    ModeChange(ModeChangeProps),
    Delayed(EventInfo),
    Route(RouteProps),
    SingleRoute(SingleRouteProps),
    Depot(DepotProps),
}

impl FeatureKind {
    /// Value of `properties.type` on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureKind::Start(_) => "start",
            FeatureKind::End(_) => "end",
            FeatureKind::Pickup(_) => "pickup",
            FeatureKind::Handover(_) => "handover",
            FeatureKind::Delivery(_) => "delivery",
            FeatureKind::ModeChange(_) => "mode_change",
            FeatureKind::Delayed(_) => "delayed",
            FeatureKind::Route(_) => "route",
            FeatureKind::SingleRoute(_) => "single_route",
            FeatureKind::Depot(_) => "depot",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn new(geometry: Geometry, kind: FeatureKind) -> Self {
        Self { geometry, kind }
    }

    pub fn point(at: Coordinate, kind: FeatureKind) -> Self {
        Self::new(Geometry::Point(at), kind)
    }

    pub fn event(&self) -> Option<&EventInfo> {
        match &self.kind {
            FeatureKind::Start(event) | FeatureKind::End(event) | FeatureKind::Delayed(event) => Some(event),
            FeatureKind::Pickup(props) => Some(&props.event),
            FeatureKind::Handover(props) => Some(&props.event),
            FeatureKind::Delivery(props) => Some(&props.event),
            FeatureKind::ModeChange(props) => Some(&props.event),
            FeatureKind::Route(_) | FeatureKind::SingleRoute(_) | FeatureKind::Depot(_) => None,
        }
    }

    pub fn event_mut(&mut self) -> Option<&mut EventInfo> {
        match &mut self.kind {
            FeatureKind::Start(event) | FeatureKind::End(event) | FeatureKind::Delayed(event) => Some(event),
            FeatureKind::Pickup(props) => Some(&mut props.event),
            FeatureKind::Handover(props) => Some(&mut props.event),
            FeatureKind::Delivery(props) => Some(&mut props.event),
            FeatureKind::ModeChange(props) => Some(&mut props.event),
            FeatureKind::Route(_) | FeatureKind::SingleRoute(_) | FeatureKind::Depot(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.to_geojson()),
            id: None,
            properties: Some(self.properties()),
            foreign_members: None,
        }
    }

    fn properties(&self) -> JsonObject {
        let kind = self.type_name();
        let value = match &self.kind {
            FeatureKind::Start(event) => json!({
                "type": kind,
                "name": "Start",
                "title": "Starting point",
                "number": 0,
                "arrival_h": 0,
                "arrival_m": 0,
                "distance": event.distance,
                "vehicle": event.route_number,
                "mode": event.arrival_mode,
            }),
            FeatureKind::End(event) => {
                let (h, m) = event.arrival();
                json!({
                    "type": kind,
                    "number": 0,
                    "arrival_h": h,
                    "arrival_m": m,
                    "distance": event.distance,
                    "duration": 0,
                    "arrival_mode": event.arrival_mode,
                    "vehicle": event.route_number,
                })
            }
            FeatureKind::Pickup(props) => {
                let mut value = event_properties(kind, "Pickup", &props.event);
                value["parcels"] = json!(props.parcels);
                value["title"] = json!(format!("Pickup of parcel(s) {}", parcel_list(&props.parcels)));
                value
            }
            FeatureKind::Handover(props) => {
                let mut value = event_properties(kind, "Handover", &props.event);
                value["title"] = json!(format!("Handover of parcel(s) {}", parcel_list(&props.parcels)));
                value["key"] = json!(props.key);
                value["total_parcels"] = json!(props.parcels);
                value["parcels"] = json!([]);
                value["involved"] = json!(props.involved);
                value["waypoints"] = positions(&props.snapshot);
                value
            }
            FeatureKind::Delivery(props) => {
                let mut value = event_properties(kind, "Delivery", &props.event);
                value["number"] = json!(props.parcel);
                value["title"] = json!(format!("Delivery {}", props.parcel));
                value["origin"] = json!(props.origin);
                value["handovers"] = Value::Array(
                    props
                        .handovers
                        .iter()
                        .map(|at| geometry_value(&Geometry::Point(*at)))
                        .collect(),
                );
                value["parcels"] = json!([]);
                value["waypoints"] = positions(&props.waypoints);
                value["to_depot"] = json!(props.to_depot);
                value["single_route"] = match &props.single_route {
                    Some(route) => serde_json::to_value(route.to_geojson()).unwrap_or_default(),
                    None => json!({"type": "Feature", "geometry": null, "properties": {}}),
                };
                value
            }
            FeatureKind::ModeChange(props) => {
                let mut value = event_properties(kind, "Mode change", &props.event);
                value["title"] = json!(format!("Change from {} to {}", props.from_mode, props.to_mode));
                value
            }
            FeatureKind::Delayed(event) => {
                let mut value = event_properties(kind, "Delay", event);
                value["title"] = json!(format!("Vehicle {} delayed", event.route_number));
                value
            }
            FeatureKind::Route(props) => json!({
                "type": kind,
                "name": "Route",
                "number": props.number,
                "title": format!("Route {}", props.number),
                "distance": props.distance,
                "duration_h": props.minutes / 60,
                "duration_m": props.minutes % 60,
                "idle_time": props.idle_time,
                "cost": props.cost,
            }),
            FeatureKind::SingleRoute(props) => json!({
                "type": kind,
                "name": "Route",
                "number": props.parcel,
                "title": format!("Route for delivery {}", props.parcel),
                "distance": props.distance,
                "duration_h": props.minute / 60,
                "duration_m": props.minute % 60,
            }),
            FeatureKind::Depot(props) => json!({
                "type": kind,
                "name": "Depot",
                "number": props.node,
                "title": format!("Depot {}", props.node),
                "route_numbers": props.route_numbers,
                "parcels": props.parcels,
            }),
        };

        match value {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }
}

fn event_properties(kind: &str, name: &str, event: &EventInfo) -> Value {
    let (h, m) = event.arrival();
    json!({
        "type": kind,
        "name": name,
        "route_number": event.route_number,
        "arrival_h": h,
        "arrival_m": m,
        "duration": event.duration,
        "distance": event.distance,
        "vehicle": event.route_number,
        "arrival_mode": event.arrival_mode,
    })
}

fn parcel_list(parcels: &[u32]) -> String {
    parcels
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn positions(coordinates: &[Coordinate]) -> Value {
    json!(coordinates.iter().map(|c| c.to_position()).collect::<Vec<_>>())
}

fn geometry_value(geometry: &Geometry) -> Value {
    serde_json::to_value(geometry.to_geojson()).unwrap_or_default()
}

/// The complete output graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features
            .iter()
            .filter(move |feature| feature.type_name() == type_name)
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson())
    }
}
