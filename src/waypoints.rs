//! Waypoint logs and parcel history resolution.
//!
//! Every vehicle keeps an append-only log of the pickups, handovers and
//! deliveries it performed. A handover's recorded history is simply the
//! prefix of the log before it, so nothing is ever copied. Parcels that
//! change vehicles are followed through a [`HandoverIndex`] built once all
//! logs are complete.

use std::collections::{HashMap, HashSet};

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointKind {
    Pickup,
    Handover,
    Delivery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub kind: WaypointKind,
    pub coordinate: Coordinate,
    pub node: u32,
    pub minute: u32,
    pub parcels: Vec<u32>,
}

impl Waypoint {
    /// Whether the parcel changed custody here.
    pub fn transfers(&self, parcel: u32) -> bool {
        matches!(self.kind, WaypointKind::Pickup | WaypointKind::Handover) && self.parcels.contains(&parcel)
    }
}

/// Whether the vehicle holds `parcel` after `entries`.
///
/// Replays the entries in order: a pickup puts the parcel aboard, a delivery
/// takes it off, and every handover naming it flips custody.
pub fn holds(entries: &[Waypoint], parcel: u32) -> bool {
    entries
        .iter()
        .filter(|waypoint| waypoint.parcels.contains(&parcel))
        .fold(false, |held, waypoint| match waypoint.kind {
            WaypointKind::Pickup => true,
            WaypointKind::Handover => !held,
            WaypointKind::Delivery => false,
        })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointLog {
    entries: Vec<Waypoint>,
}

impl WaypointLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a waypoint and returns its index.
    pub fn push(&mut self, waypoint: Waypoint) -> usize {
        self.entries.push(waypoint);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.entries.get(index)
    }

    /// Entries recorded before `end`.
    pub fn snapshot(&self, end: usize) -> &[Waypoint] {
        &self.entries[..end.min(self.entries.len())]
    }

    pub fn coordinates(&self, end: usize) -> Vec<Coordinate> {
        self.snapshot(end).iter().map(|waypoint| waypoint.coordinate).collect()
    }
}

/// A handover of one parcel as recorded by one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoverEdge {
    pub vehicle: usize,
    pub index: usize,
    pub minute: u32,
    pub node: u32,
    /// The vehicle had custody of the parcel before this handover.
    pub held_before: bool,
}

/// Handover edges of every vehicle, keyed by parcel.
#[derive(Debug, Clone, Default)]
pub struct HandoverIndex {
    by_parcel: HashMap<u32, Vec<HandoverEdge>>,
}

impl HandoverIndex {
    /// Builds the index; `logs[i]` is the log of vehicle slot `i`.
    pub fn build(logs: &[&WaypointLog]) -> Self {
        let mut by_parcel: HashMap<u32, Vec<HandoverEdge>> = HashMap::new();
        for (vehicle, log) in logs.iter().enumerate() {
            for (index, waypoint) in log.entries.iter().enumerate() {
                if waypoint.kind != WaypointKind::Handover {
                    continue;
                }
                for &parcel in &waypoint.parcels {
                    let held_before = holds(log.snapshot(index), parcel);
                    by_parcel.entry(parcel).or_default().push(HandoverEdge {
                        vehicle,
                        index,
                        minute: waypoint.minute,
                        node: waypoint.node,
                        held_before,
                    });
                }
            }
        }
        Self { by_parcel }
    }

    pub fn edges(&self, parcel: u32) -> &[HandoverEdge] {
        self.by_parcel.get(&parcel).map(Vec::as_slice).unwrap_or_default()
    }

    /// The handover by another vehicle that most plausibly passed `parcel`
    /// to `receiver` no later than `minute`.
    pub fn giver(&self, parcel: u32, receiver: usize, minute: u32, node: Option<u32>) -> Option<HandoverEdge> {
        self.edges(parcel)
            .iter()
            .filter(|edge| edge.vehicle != receiver && edge.minute <= minute)
            .max_by_key(|edge| (edge.held_before, edge.minute, Some(edge.node) == node))
            .copied()
    }

    /// Handovers of `parcel` logged by other vehicles at the same node and minute.
    pub fn counterparts(
        &self,
        parcel: u32,
        vehicle: usize,
        minute: u32,
        node: u32,
    ) -> impl Iterator<Item = &HandoverEdge> + '_ {
        self.edges(parcel)
            .iter()
            .filter(move |edge| edge.vehicle != vehicle && edge.minute == minute && edge.node == node)
    }
}

/// Coordinates collected while walking a parcel's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Newest first, in the order they were scanned.
    pub scanned: Vec<Coordinate>,
    pub origin_found: bool,
}

impl Resolution {
    /// Orders the history origin-first and closes it at the destination.
    pub fn into_path(self, origin: Option<Coordinate>, destination: Coordinate) -> Vec<Coordinate> {
        let mut path = Vec::with_capacity(self.scanned.len() + 2);
        path.extend(origin);
        path.extend(self.scanned.into_iter().rev());
        path.push(destination);
        path.dedup();
        path
    }
}

/// Walks waypoint logs backward to reconstruct where a parcel has been.
pub struct Resolver<'a> {
    logs: Vec<&'a WaypointLog>,
    handovers: Option<&'a HandoverIndex>,
}

impl<'a> Resolver<'a> {
    /// Resolves within a single vehicle; cross-vehicle history is cut off.
    pub fn local(log: &'a WaypointLog) -> Self {
        Self {
            logs: vec![log],
            handovers: None,
        }
    }

    pub fn new(logs: Vec<&'a WaypointLog>, handovers: &'a HandoverIndex) -> Self {
        Self {
            logs,
            handovers: Some(handovers),
        }
    }

    /// History of `parcel` as seen from entry `end` (exclusive) of vehicle
    /// slot `vehicle`, at `minute`.
    pub fn resolve(&self, vehicle: usize, end: usize, minute: u32, parcel: u32) -> Resolution {
        let mut scanned = Vec::new();
        let mut visited = HashSet::new();
        let (mut vehicle, mut end, mut minute) = (vehicle, end, minute);

        while let Some(log) = self.logs.get(vehicle) {
            let entries = log.snapshot(end);
            let last = entries.iter().rposition(|waypoint| waypoint.transfers(parcel));
            let received = last.filter(|&position| {
                entries[position].kind == WaypointKind::Pickup || !holds(&entries[..position], parcel)
            });

            let Some(position) = received else {
                // Custody here was never logged; nothing up to the last
                // logged transfer belongs to this stretch.
                let entries = &entries[last.map_or(0, |position| position + 1)..];
                match self.giver(parcel, vehicle, minute, None, &mut visited) {
                    Some(edge) => {
                        scanned.extend(
                            entries
                                .iter()
                                .rev()
                                .take_while(|waypoint| waypoint.minute >= edge.minute)
                                .map(|waypoint| waypoint.coordinate),
                        );
                        scanned.extend(self.coordinate_of(&edge));
                        (vehicle, end, minute) = (edge.vehicle, edge.index, edge.minute);
                        continue;
                    }
                    None => {
                        scanned.extend(entries.iter().rev().map(|waypoint| waypoint.coordinate));
                        break;
                    }
                }
            };

            scanned.extend(entries[position..].iter().rev().map(|waypoint| waypoint.coordinate));
            let transfer = &entries[position];
            visited.insert((vehicle, position));

            if transfer.kind == WaypointKind::Pickup {
                return Resolution {
                    scanned,
                    origin_found: true,
                };
            }

            match self.giver(parcel, vehicle, transfer.minute, Some(transfer.node), &mut visited) {
                Some(edge) => {
                    scanned.extend(self.coordinate_of(&edge));
                    (vehicle, end, minute) = (edge.vehicle, edge.index, edge.minute);
                }
                None => break,
            }
        }

        Resolution {
            scanned,
            origin_found: false,
        }
    }

    fn giver(
        &self,
        parcel: u32,
        receiver: usize,
        minute: u32,
        node: Option<u32>,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Option<HandoverEdge> {
        let edge = self.handovers?.giver(parcel, receiver, minute, node)?;
        visited.insert((edge.vehicle, edge.index)).then_some(edge)
    }

    fn coordinate_of(&self, edge: &HandoverEdge) -> Option<Coordinate> {
        self.logs
            .get(edge.vehicle)
            .and_then(|log| log.get(edge.index))
            .map(|waypoint| waypoint.coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(n: u32) -> Coordinate {
        Coordinate::new(n as f64, n as f64 / 2.0)
    }

    fn wp(kind: WaypointKind, node: u32, minute: u32, parcels: &[u32]) -> Waypoint {
        Waypoint {
            kind,
            coordinate: c(node),
            node,
            minute,
            parcels: parcels.to_vec(),
        }
    }

    fn log(entries: Vec<Waypoint>) -> WaypointLog {
        let mut log = WaypointLog::new();
        for entry in entries {
            log.push(entry);
        }
        log
    }

    #[test]
    fn stops_at_own_pickup() {
        let log = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[1]),
            wp(WaypointKind::Pickup, 2, 3, &[2]),
        ]);
        let resolution = Resolver::local(&log).resolve(0, log.len(), 5, 1);
        assert!(resolution.origin_found);
        assert_eq!(resolution.scanned, vec![c(2), c(1)]);
        assert_eq!(resolution.into_path(Some(c(1)), c(9)), vec![c(1), c(2), c(9)]);
    }

    #[test]
    fn ignores_entries_after_end() {
        let log = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[1]),
            wp(WaypointKind::Delivery, 4, 6, &[1]),
        ]);
        let resolution = Resolver::local(&log).resolve(0, 1, 5, 1);
        assert_eq!(resolution.scanned, vec![c(1)]);
    }

    #[test]
    fn custody_flips_on_every_handover() {
        let entries = vec![
            wp(WaypointKind::Pickup, 1, 0, &[7]),
            wp(WaypointKind::Handover, 3, 2, &[7]),
            wp(WaypointKind::Pickup, 5, 4, &[9]),
            wp(WaypointKind::Handover, 6, 6, &[7]),
            wp(WaypointKind::Delivery, 7, 7, &[7]),
        ];
        assert!(holds(&entries[..1], 7));
        assert!(!holds(&entries[..3], 7));
        assert!(holds(&entries[..4], 7));
        assert!(!holds(&entries, 7));
        assert!(holds(&entries[..4], 9));
    }

    #[test]
    fn history_after_handing_the_parcel_away_stops_at_that_handover() {
        let log = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[1, 2]),
            wp(WaypointKind::Handover, 3, 4, &[1, 2]),
            wp(WaypointKind::Delivery, 5, 8, &[3]),
        ]);
        let resolution = Resolver::local(&log).resolve(0, log.len(), 9, 1);
        assert!(!resolution.origin_found);
        assert_eq!(resolution.scanned, vec![c(5)]);
    }

    #[test]
    fn parcel_handed_away_and_back_follows_the_other_vehicle() {
        let first = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[7]),
            wp(WaypointKind::Handover, 3, 2, &[7]),
            wp(WaypointKind::Pickup, 5, 4, &[9]),
            wp(WaypointKind::Handover, 6, 6, &[7]),
        ]);
        let second = log(vec![
            wp(WaypointKind::Handover, 3, 2, &[7]),
            wp(WaypointKind::Pickup, 4, 3, &[8]),
            wp(WaypointKind::Handover, 6, 6, &[7]),
        ]);
        let index = HandoverIndex::build(&[&first, &second]);
        let held: Vec<(usize, u32, bool)> = index
            .edges(7)
            .iter()
            .map(|edge| (edge.vehicle, edge.minute, edge.held_before))
            .collect();
        assert_eq!(
            held,
            vec![(0, 2, true), (0, 6, false), (1, 2, false), (1, 6, true)]
        );

        let resolver = Resolver::new(vec![&first, &second], &index);
        let resolution = resolver.resolve(0, first.len(), 7, 7);
        assert!(resolution.origin_found);
        assert!(!resolution.scanned.contains(&c(5)));
        assert_eq!(
            resolution.into_path(Some(c(1)), c(7)),
            vec![c(1), c(3), c(4), c(6), c(7)]
        );
    }

    #[test]
    fn receiving_handover_jumps_to_the_giver() {
        let giver = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[7]),
            wp(WaypointKind::Delivery, 2, 2, &[8]),
            wp(WaypointKind::Handover, 3, 4, &[7]),
        ]);
        let receiver = log(vec![
            wp(WaypointKind::Pickup, 10, 1, &[9]),
            wp(WaypointKind::Handover, 3, 4, &[7]),
        ]);
        let index = HandoverIndex::build(&[&giver, &receiver]);
        let resolver = Resolver::new(vec![&giver, &receiver], &index);

        let resolution = resolver.resolve(1, receiver.len(), 6, 7);
        assert!(resolution.origin_found);
        // The receiver's earlier pickup of parcel 9 predates custody of 7.
        assert!(!resolution.scanned.contains(&c(10)));
        assert_eq!(
            resolution.into_path(Some(c(1)), c(4)),
            vec![c(1), c(2), c(3), c(4)]
        );
    }

    #[test]
    fn unlogged_receipt_is_bounded_by_the_giving_handover() {
        let giver = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[7]),
            wp(WaypointKind::Handover, 3, 4, &[7]),
        ]);
        let receiver = log(vec![
            wp(WaypointKind::Pickup, 10, 1, &[9]),
            wp(WaypointKind::Delivery, 11, 6, &[9]),
        ]);
        let index = HandoverIndex::build(&[&giver, &receiver]);
        let resolver = Resolver::new(vec![&giver, &receiver], &index);

        let resolution = resolver.resolve(1, receiver.len(), 8, 7);
        assert!(resolution.origin_found);
        assert_eq!(resolution.scanned, vec![c(11), c(3), c(1)]);
    }

    #[test]
    fn missing_parcel_returns_partial_history() {
        let log = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[2]),
            wp(WaypointKind::Delivery, 2, 3, &[2]),
        ]);
        let resolution = Resolver::local(&log).resolve(0, log.len(), 4, 99);
        assert!(!resolution.origin_found);
        assert_eq!(resolution.scanned, vec![c(2), c(1)]);
    }

    #[test]
    fn local_resolution_stops_at_a_receiving_handover() {
        let log = log(vec![wp(WaypointKind::Handover, 3, 2, &[7])]);
        let resolution = Resolver::local(&log).resolve(0, log.len(), 5, 7);
        assert!(!resolution.origin_found);
        assert_eq!(resolution.scanned, vec![c(3)]);
    }

    #[test]
    fn handovers_without_a_pickup_do_not_loop() {
        let a = log(vec![wp(WaypointKind::Handover, 3, 4, &[7])]);
        let b = log(vec![wp(WaypointKind::Handover, 3, 4, &[7])]);
        let index = HandoverIndex::build(&[&a, &b]);
        let resolver = Resolver::new(vec![&a, &b], &index);

        let resolution = resolver.resolve(0, a.len(), 5, 7);
        assert!(!resolution.origin_found);
        assert!(resolution.scanned.len() <= 4);
    }

    #[test]
    fn giver_prefers_the_vehicle_that_held_the_parcel() {
        let holder = log(vec![
            wp(WaypointKind::Pickup, 1, 0, &[7]),
            wp(WaypointKind::Handover, 3, 4, &[7]),
        ]);
        let bystander = log(vec![wp(WaypointKind::Handover, 3, 4, &[7])]);
        let index = HandoverIndex::build(&[&holder, &bystander]);

        let edge = index.giver(7, 2, 5, Some(3)).unwrap();
        assert_eq!(edge.vehicle, 0);
        assert!(edge.held_before);
        assert_eq!(index.counterparts(7, 1, 4, 3).count(), 1);
    }
}
