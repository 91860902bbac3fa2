//! Feature graph assembly.
//!
//! [`reconstruct`] is the engine's entry point. It compiles every vehicle,
//! asks the directions provider for road geometry, and then runs the
//! cross-vehicle passes that can only happen once all routes are known:
//! delivery history resolution, handover back-references and per-parcel
//! single routes.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::compiler::{CompileContext, CompiledVehicle, compile_vehicle};
use crate::enrich::stamp_distances;
use crate::error::{Diagnostic, DirectionsError, MalformedLogError, UnresolvedOriginWarning};
use crate::feature::{
    DepotProps, Feature, FeatureCollection, FeatureKind, Geometry, RouteProps, SingleRouteProps,
};
use crate::keys::{DEFAULT_KEY_FLOOR, DEFAULT_KEY_MARGIN, HandoverKeys};
use crate::model::{ActionLog, Coordinate};
use crate::normalize::Timeline;
use crate::traits::{Directions, DirectionsProvider};
use crate::waypoints::{HandoverIndex, Resolver, WaypointLog};

#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Compile vehicles and issue directions calls on the rayon pool.
    pub parallel: bool,
    /// Lowest handover key handed out.
    pub handover_key_floor: u64,
    /// Gap kept between the largest id in the log and the first handover key.
    pub handover_key_margin: u64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            handover_key_floor: DEFAULT_KEY_FLOOR,
            handover_key_margin: DEFAULT_KEY_MARGIN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceOutput {
    pub features: FeatureCollection,
    pub diagnostics: Vec<Diagnostic>,
    /// Key given to the first handover of the run.
    pub first_handover_key: u64,
}

struct Depot {
    location: Coordinate,
    props: DepotProps,
}

/// Rebuilds the feature graph of an action log.
pub fn reconstruct<D>(log: &ActionLog, directions: &D, options: &TraceOptions) -> TraceOutput
where
    D: DirectionsProvider + ?Sized,
{
    let mut diagnostics = Vec::new();
    let mut depots = depot_list(log);
    let ctx = CompileContext::new(log);

    let mut keys = HandoverKeys::seed(log, options.handover_key_floor, options.handover_key_margin);
    let first_handover_key = keys.first();
    let mut jobs = Vec::with_capacity(log.vehicles.len());
    for (position, vehicle) in log.vehicles.iter().enumerate() {
        let route_number = position + 1;
        match Timeline::new(vehicle) {
            Ok(timeline) => {
                let range = keys.allocate(timeline.handover_count());
                jobs.push((route_number, timeline, range));
            }
            Err(error) => skip_vehicle(&mut diagnostics, route_number, error),
        }
    }

    let results = fan_out(options.parallel, &jobs, |(route_number, timeline, range)| {
        compile_vehicle(&ctx, *route_number, timeline, range.clone())
    });
    let mut vehicles: Vec<CompiledVehicle> = Vec::with_capacity(results.len());
    for ((route_number, _, _), result) in jobs.iter().zip(results) {
        match result {
            Ok(vehicle) => vehicles.push(vehicle),
            Err(error) => skip_vehicle(&mut diagnostics, *route_number, error),
        }
    }
    for vehicle in &mut vehicles {
        diagnostics.append(&mut vehicle.diagnostics);
    }

    let traces = fan_out(options.parallel, &vehicles, |vehicle| {
        (vehicle.trace.len() >= 2).then(|| directions.directions(&vehicle.trace))
    });
    let cost = if log.vehicles.is_empty() {
        0.0
    } else {
        log.totalcost / log.vehicles.len() as f64
    };
    let routes: Vec<Option<Feature>> = vehicles
        .iter_mut()
        .zip(traces)
        .map(|(vehicle, trace)| route_feature(vehicle, trace, cost, &mut diagnostics))
        .collect();

    for vehicle in &vehicles {
        for node in &vehicle.depot_visits {
            let depot = depots.iter_mut().find(|depot| depot.props.node == *node);
            if let Some(depot) = depot {
                if !depot.props.route_numbers.contains(&vehicle.route_number) {
                    depot.props.route_numbers.push(vehicle.route_number);
                }
            }
        }
    }

    let logs: Vec<WaypointLog> = vehicles
        .iter_mut()
        .map(|vehicle| std::mem::take(&mut vehicle.log))
        .collect();
    let log_refs: Vec<&WaypointLog> = logs.iter().collect();
    let handovers = HandoverIndex::build(&log_refs);
    let resolver = Resolver::new(log_refs, &handovers);

    resolve_deliveries(&ctx, &resolver, &mut vehicles, &mut diagnostics);
    link_handovers(&handovers, &mut vehicles);
    attach_single_routes(directions, options.parallel, &mut vehicles, &mut diagnostics);

    let mut features = Vec::new();
    for (vehicle, route) in vehicles.into_iter().zip(routes) {
        features.extend(vehicle.features);
        features.extend(route);
    }
    features.extend(
        depots
            .into_iter()
            .map(|depot| Feature::point(depot.location, FeatureKind::Depot(depot.props))),
    );

    info!(
        vehicles = log.vehicles.len(),
        features = features.len(),
        diagnostics = diagnostics.len(),
        "reconstructed feature graph"
    );

    TraceOutput {
        features: FeatureCollection::new(features),
        diagnostics,
        first_handover_key,
    }
}

fn fan_out<T, R, F>(parallel: bool, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

fn skip_vehicle(diagnostics: &mut Vec<Diagnostic>, route_number: usize, error: MalformedLogError) {
    warn!(route_number, %error, "skipping vehicle with malformed log");
    diagnostics.push(Diagnostic::VehicleSkipped {
        route_number,
        error,
    });
}

/// Nodes holding parcels at minute 0, in node order.
fn depot_list(log: &ActionLog) -> Vec<Depot> {
    log.nodes
        .iter()
        .filter(|node| node.is_depot())
        .map(|node| Depot {
            location: node.location(),
            props: DepotProps {
                node: node.id,
                route_numbers: Vec::new(),
                parcels: node.initial_storage().to_vec(),
            },
        })
        .collect()
}

fn route_feature(
    vehicle: &mut CompiledVehicle,
    trace: Option<Result<Directions, DirectionsError>>,
    cost: f64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Feature> {
    let route_number = vehicle.route_number;
    let reason = match trace {
        Some(Ok(directions)) => {
            stamp_distances(&mut vehicle.features, &directions.segments);
            let props = RouteProps {
                number: route_number,
                distance: (directions.distance * 10.0).round() / 10.0,
                minutes: vehicle.last_minute + 1,
                idle_time: vehicle.idle_time,
                cost,
            };
            let geometry = Geometry::LineString(directions.geometry.into_points());
            debug!(route_number, distance = props.distance, "route enriched");
            return Some(Feature::new(geometry, FeatureKind::Route(props)));
        }
        Some(Err(error)) => error.to_string(),
        None => format!("trace has {} coordinate(s)", vehicle.trace.len()),
    };

    warn!(route_number, %reason, "route geometry unavailable");
    diagnostics.push(Diagnostic::RouteUnavailable {
        route_number,
        reason,
    });
    None
}

/// Replaces each delivery's provisional path with one traced across vehicles.
fn resolve_deliveries(
    ctx: &CompileContext<'_>,
    resolver: &Resolver<'_>,
    vehicles: &mut [CompiledVehicle],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (slot, vehicle) in vehicles.iter_mut().enumerate() {
        let route_number = vehicle.route_number;
        for feature in &mut vehicle.features {
            let Some(at) = feature.geometry.point() else {
                continue;
            };
            let FeatureKind::Delivery(delivery) = &mut feature.kind else {
                continue;
            };
            let Some((_, origin)) = ctx.origin_location(delivery.parcel) else {
                continue;
            };

            let resolution =
                resolver.resolve(slot, delivery.log_index, delivery.event.minute, delivery.parcel);
            if !resolution.origin_found {
                let warning = UnresolvedOriginWarning {
                    parcel: delivery.parcel,
                    route_number,
                    kept: resolution.scanned.len(),
                };
                warn!(%warning, "partial delivery history");
                diagnostics.push(warning.into());
            }
            delivery.waypoints = resolution.into_path(Some(origin), at);
        }
    }
}

/// Points deliveries at the handovers their parcel went through and lists
/// every vehicle taking part in each handover.
fn link_handovers(index: &HandoverIndex, vehicles: &mut [CompiledVehicle]) {
    let route_numbers: Vec<usize> = vehicles.iter().map(|vehicle| vehicle.route_number).collect();
    let mut by_parcel: HashMap<u32, Vec<Coordinate>> = HashMap::new();

    for (slot, vehicle) in vehicles.iter_mut().enumerate() {
        for feature in &mut vehicle.features {
            let Some(at) = feature.geometry.point() else {
                continue;
            };
            let FeatureKind::Handover(handover) = &mut feature.kind else {
                continue;
            };
            for &parcel in &handover.parcels {
                by_parcel.entry(parcel).or_default().push(at);
                let counterparts = index.counterparts(parcel, slot, handover.event.minute, handover.node);
                for edge in counterparts {
                    let route_number = route_numbers[edge.vehicle];
                    if !handover.involved.contains(&route_number) {
                        handover.involved.push(route_number);
                    }
                }
            }
        }
    }

    for feature in vehicles.iter_mut().flat_map(|vehicle| vehicle.features.iter_mut()) {
        if let FeatureKind::Delivery(delivery) = &mut feature.kind {
            delivery.handovers = by_parcel.get(&delivery.parcel).cloned().unwrap_or_default();
        }
    }
}

struct SingleRouteJob {
    slot: usize,
    feature: usize,
    parcel: u32,
    minute: u32,
    coordinates: Vec<Coordinate>,
}

fn attach_single_routes<D>(
    directions: &D,
    parallel: bool,
    vehicles: &mut [CompiledVehicle],
    diagnostics: &mut Vec<Diagnostic>,
) where
    D: DirectionsProvider + ?Sized,
{
    let mut jobs = Vec::new();
    for (slot, vehicle) in vehicles.iter().enumerate() {
        for (index, feature) in vehicle.features.iter().enumerate() {
            if let FeatureKind::Delivery(delivery) = &feature.kind {
                if !delivery.waypoints.is_empty() {
                    jobs.push(SingleRouteJob {
                        slot,
                        feature: index,
                        parcel: delivery.parcel,
                        minute: delivery.event.minute,
                        coordinates: delivery.waypoints.clone(),
                    });
                }
            }
        }
    }

    let results = fan_out(parallel, &jobs, |job| {
        if job.coordinates.len() < 2 {
            // Picked up and delivered in the same place.
            return Ok((job.coordinates.clone(), 0.0));
        }
        directions
            .directions(&job.coordinates)
            .map(|found| (found.geometry.into_points(), found.distance))
    });

    for (job, result) in jobs.iter().zip(results) {
        let vehicle = &mut vehicles[job.slot];
        match result {
            Ok((line, distance)) => {
                let single = Feature::new(
                    Geometry::LineString(line),
                    FeatureKind::SingleRoute(SingleRouteProps {
                        parcel: job.parcel,
                        distance,
                        minute: job.minute,
                    }),
                );
                if let FeatureKind::Delivery(delivery) = &mut vehicle.features[job.feature].kind {
                    delivery.single_route = Some(Box::new(single));
                }
            }
            Err(error) => {
                warn!(parcel = job.parcel, route_number = vehicle.route_number, %error, "single route unavailable");
                diagnostics.push(Diagnostic::SingleRouteUnavailable {
                    parcel: job.parcel,
                    route_number: vehicle.route_number,
                    reason: error.to_string(),
                });
            }
        }
    }
}
