//! Per-vehicle route compilation.
//!
//! Replays one vehicle's normalized actions in minute order and emits the
//! typed features of its route, the raw coordinate trace the directions
//! service is asked about, and the waypoint log used to trace parcels.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Diagnostic, MalformedLogError};
use crate::feature::{
    DeliveryProps, EventInfo, Feature, FeatureKind, HandoverProps, ModeChangeProps, PickupProps,
};
use crate::keys::KeyRange;
use crate::model::{ActionLog, Coordinate, Node, Request};
use crate::normalize::{Action, ActionKind, Timeline};
use crate::waypoints::{Resolver, Waypoint, WaypointKind, WaypointLog};

/// Read-only lookups shared by every vehicle's compilation.
#[derive(Debug)]
pub struct CompileContext<'a> {
    nodes: HashMap<u32, &'a Node>,
    requests: HashMap<u32, &'a Request>,
}

impl<'a> CompileContext<'a> {
    pub fn new(log: &'a ActionLog) -> Self {
        Self {
            nodes: log.nodes.iter().map(|node| (node.id, node)).collect(),
            requests: log.requests.iter().map(|request| (request.id, request)).collect(),
        }
    }

    pub fn location(&self, node: u32, minute: u32) -> Result<Coordinate, MalformedLogError> {
        self.nodes
            .get(&node)
            .map(|node| node.location())
            .ok_or(MalformedLogError::UnknownNode { node, minute })
    }

    pub fn is_depot(&self, node: u32) -> bool {
        self.nodes.get(&node).is_some_and(|node| node.is_depot())
    }

    pub fn is_pickup_point(&self, node: u32) -> bool {
        self.nodes.get(&node).is_some_and(|node| node.is_pickup_point())
    }

    /// Origin node of a parcel's request.
    pub fn origin_of(&self, parcel: u32) -> Option<u32> {
        self.requests.get(&parcel).map(|request| request.origin)
    }

    /// Origin node and its location, when both are known.
    pub fn origin_location(&self, parcel: u32) -> Option<(u32, Coordinate)> {
        let origin = self.origin_of(parcel)?;
        let node = self.nodes.get(&origin)?;
        Some((origin, node.location()))
    }
}

/// Everything one vehicle contributes to the feature graph.
#[derive(Debug, Clone)]
pub struct CompiledVehicle {
    pub route_number: usize,
    /// `start`, the vehicle's events in minute order, then `end`.
    pub features: Vec<Feature>,
    pub log: WaypointLog,
    /// Node coordinates the vehicle travelled through, in order.
    pub trace: Vec<Coordinate>,
    pub idle_time: u32,
    pub last_minute: u32,
    /// Depot nodes where the vehicle picked parcels up.
    pub depot_visits: Vec<u32>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles a vehicle's timeline into features.
pub fn compile_vehicle(
    ctx: &CompileContext<'_>,
    route_number: usize,
    timeline: &Timeline,
    keys: KeyRange,
) -> Result<CompiledVehicle, MalformedLogError> {
    let mut compiler = RouteCompiler {
        ctx,
        timeline,
        route_number,
        keys,
        features: Vec::new(),
        log: WaypointLog::new(),
        trace: Vec::new(),
        idle_time: 0,
        last_travel: None,
        last_delay: None,
        depot_visits: Vec::new(),
        diagnostics: Vec::new(),
    };

    compiler.start()?;
    for action in timeline.actions() {
        compiler.apply(action)?;
    }
    compiler.end()?;

    debug!(
        route_number,
        features = compiler.features.len(),
        trace = compiler.trace.len(),
        "compiled vehicle route"
    );

    Ok(CompiledVehicle {
        route_number,
        features: compiler.features,
        log: compiler.log,
        trace: compiler.trace,
        idle_time: compiler.idle_time,
        last_minute: timeline.last_minute(),
        depot_visits: compiler.depot_visits,
        diagnostics: compiler.diagnostics,
    })
}

struct RouteCompiler<'c, 'a> {
    ctx: &'c CompileContext<'a>,
    timeline: &'c Timeline,
    route_number: usize,
    keys: KeyRange,
    features: Vec<Feature>,
    log: WaypointLog,
    trace: Vec<Coordinate>,
    idle_time: u32,
    last_travel: Option<(u32, u32)>,
    last_delay: Option<(u32, u32)>,
    depot_visits: Vec<u32>,
    diagnostics: Vec<Diagnostic>,
}

impl RouteCompiler<'_, '_> {
    fn event(&self, action: &Action) -> EventInfo {
        EventInfo::new(
            self.route_number,
            action.minute,
            action.duration,
            self.timeline.arrival_mode(action.minute),
        )
    }

    /// Node and coordinate of the vehicle at the given minute.
    fn position(&self, minute: u32) -> Result<(u32, Coordinate), MalformedLogError> {
        let node = self
            .timeline
            .position(minute)
            .ok_or(MalformedLogError::NoPosition { minute })?;
        Ok((node, self.ctx.location(node, minute)?))
    }

    fn start(&mut self) -> Result<(), MalformedLogError> {
        let node = self
            .timeline
            .start_node()
            .ok_or(MalformedLogError::NoPosition { minute: 0 })?;
        let at = self.ctx.location(node, 0)?;
        let event = EventInfo::new(self.route_number, 0, 0, self.timeline.initial_mode());
        self.features.push(Feature::point(at, FeatureKind::Start(event)));
        Ok(())
    }

    fn end(&mut self) -> Result<(), MalformedLogError> {
        let minute = self.timeline.last_minute();
        let node = match self.timeline.last_arrival(minute) {
            Some(node) => node,
            None => self.position(minute)?.0,
        };
        let at = self.ctx.location(node, minute)?;
        let event = EventInfo::new(self.route_number, minute, 0, self.timeline.arrival_mode(minute));
        self.features.push(Feature::point(at, FeatureKind::End(event)));
        Ok(())
    }

    fn apply(&mut self, action: &Action) -> Result<(), MalformedLogError> {
        match &action.kind {
            ActionKind::Pickup { parcels } => self.pickup(action, parcels),
            ActionKind::Handover { parcels } => self.handover(action, parcels),
            ActionKind::Deliver { parcels } => {
                for &parcel in parcels {
                    self.deliver(action, parcel)?;
                }
                Ok(())
            }
            &ActionKind::Delayed { from, to } => {
                if self.last_delay != Some((from, to)) {
                    self.last_delay = Some((from, to));
                    self.idle(action)?;
                }
                Ok(())
            }
            ActionKind::ModeChange => self.mode_change(action),
            &ActionKind::Travelling { from, to } => {
                if self.last_travel == Some((from, to)) {
                    return Ok(());
                }
                self.last_travel = Some((from, to));
                if from == to {
                    self.idle(action)
                } else {
                    self.travel(action.minute, from, to)
                }
            }
            ActionKind::Unrecognized(action_type) => {
                debug!(
                    route_number = self.route_number,
                    minute = action.minute,
                    action_type = %action_type,
                    "skipping unrecognized action"
                );
                self.diagnostics.push(Diagnostic::UnrecognizedAction {
                    route_number: self.route_number,
                    minute: action.minute,
                    action_type: action_type.clone(),
                });
                Ok(())
            }
        }
    }

    fn pickup(&mut self, action: &Action, parcels: &[u32]) -> Result<(), MalformedLogError> {
        let (node, at) = self.position(action.minute)?;
        if self.ctx.is_depot(node) {
            self.depot_visits.push(node);
        }

        let props = PickupProps {
            event: self.event(action),
            parcels: parcels.to_vec(),
        };
        self.features.push(Feature::point(at, FeatureKind::Pickup(props)));
        self.log.push(Waypoint {
            kind: WaypointKind::Pickup,
            coordinate: at,
            node,
            minute: action.minute,
            parcels: parcels.to_vec(),
        });
        Ok(())
    }

    fn handover(&mut self, action: &Action, parcels: &[u32]) -> Result<(), MalformedLogError> {
        let (node, at) = self.position(action.minute)?;
        let props = HandoverProps {
            event: self.event(action),
            key: self.keys.next_key(),
            node,
            parcels: parcels.to_vec(),
            involved: vec![self.route_number],
            snapshot: self.log.coordinates(self.log.len()),
        };
        self.features.push(Feature::point(at, FeatureKind::Handover(props)));
        self.log.push(Waypoint {
            kind: WaypointKind::Handover,
            coordinate: at,
            node,
            minute: action.minute,
            parcels: parcels.to_vec(),
        });
        Ok(())
    }

    fn deliver(&mut self, action: &Action, parcel: u32) -> Result<(), MalformedLogError> {
        let (node, at) = self.position(action.minute)?;
        let log_index = self.log.len();

        // Provisional path from this vehicle's own history; the assembler
        // re-resolves it across vehicles once every route is compiled.
        let waypoints = match self.ctx.origin_location(parcel) {
            Some((_, origin)) => Resolver::local(&self.log)
                .resolve(0, log_index, action.minute, parcel)
                .into_path(Some(origin), at),
            None => {
                self.diagnostics.push(Diagnostic::UnknownRequest {
                    parcel,
                    route_number: self.route_number,
                });
                Vec::new()
            }
        };

        let props = DeliveryProps {
            event: self.event(action),
            parcel,
            origin: self.ctx.origin_of(parcel),
            waypoints,
            handovers: Vec::new(),
            to_depot: self.ctx.is_pickup_point(node),
            log_index,
            single_route: None,
        };
        self.features.push(Feature::point(at, FeatureKind::Delivery(props)));
        self.log.push(Waypoint {
            kind: WaypointKind::Delivery,
            coordinate: at,
            node,
            minute: action.minute,
            parcels: vec![parcel],
        });
        Ok(())
    }

    fn mode_change(&mut self, action: &Action) -> Result<(), MalformedLogError> {
        let (_, at) = self.position(action.minute)?;
        let props = ModeChangeProps {
            event: self.event(action),
            from_mode: self.timeline.arrival_mode(action.minute).to_string(),
            to_mode: self.timeline.departure_mode(action.minute).to_string(),
        };
        self.features.push(Feature::point(at, FeatureKind::ModeChange(props)));
        Ok(())
    }

    /// Standing still counts as idle time and shows up as a delay.
    fn idle(&mut self, action: &Action) -> Result<(), MalformedLogError> {
        let (_, at) = self.position(action.minute)?;
        let event = self.event(action);
        self.idle_time = self.idle_time.saturating_add(action.duration);
        self.features.push(Feature::point(at, FeatureKind::Delayed(event)));
        Ok(())
    }

    fn travel(&mut self, minute: u32, from: u32, to: u32) -> Result<(), MalformedLogError> {
        let from = self.ctx.location(from, minute)?;
        let to = self.ctx.location(to, minute)?;
        if self.trace.last() != Some(&from) {
            self.trace.push(from);
        }
        self.trace.push(to);
        Ok(())
    }
}
