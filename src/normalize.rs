//! Action normalization.
//!
//! Flattens a vehicle's sparse minute map into one ordered action sequence
//! and answers the positional questions the route compiler asks of it.

use std::collections::BTreeMap;

use crate::error::MalformedLogError;
use crate::model::{RawAction, Vehicle};

/// Mode label assumed when a vehicle's mode map is empty.
pub const MODE_MANUAL: &str = "Manual";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Pickup { parcels: Vec<u32> },
    Handover { parcels: Vec<u32> },
    Deliver { parcels: Vec<u32> },
    Delayed { from: u32, to: u32 },
    ModeChange,
    Travelling { from: u32, to: u32 },
    Unrecognized(String),
}

/// A single action tagged with the minute it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub minute: u32,
    pub duration: u32,
    pub kind: ActionKind,
}

/// Label used in errors for entries without a readable action type.
const UNTYPED: &str = "untyped action";

impl Action {
    fn from_raw(minute: u32, raw: &RawAction) -> Result<Self, MalformedLogError> {
        let Some(action_type) = raw.action_type.as_deref() else {
            return Err(field_error(minute, raw, "actionType"));
        };
        let parcels = || {
            raw.related_requests
                .clone()
                .ok_or_else(|| field_error(minute, raw, "relatedRequests"))
        };
        let endpoints = || -> Result<(u32, u32), MalformedLogError> {
            let from = raw.from.ok_or_else(|| field_error(minute, raw, "from"))?;
            let to = raw.to.ok_or_else(|| field_error(minute, raw, "to"))?;
            Ok((from, to))
        };

        let kind = match action_type {
            "PICKUP" => ActionKind::Pickup { parcels: parcels()? },
            "HANDOVER" => ActionKind::Handover { parcels: parcels()? },
            "DELIVER" => ActionKind::Deliver { parcels: parcels()? },
            "DELAYED" => {
                let (from, to) = endpoints()?;
                ActionKind::Delayed { from, to }
            }
            "TRAVELLING" => {
                let (from, to) = endpoints()?;
                ActionKind::Travelling { from, to }
            }
            "MODE_CHANGE" => ActionKind::ModeChange,
            other => ActionKind::Unrecognized(other.to_string()),
        };
        if raw.is_malformed("duration") && !matches!(kind, ActionKind::Unrecognized(_)) {
            return Err(field_error(minute, raw, "duration"));
        }

        Ok(Self {
            minute,
            duration: raw.duration,
            kind,
        })
    }
}

fn field_error(minute: u32, raw: &RawAction, field: &'static str) -> MalformedLogError {
    let action = raw.action_type.as_deref().unwrap_or(UNTYPED).to_string();
    if raw.is_malformed(field) {
        MalformedLogError::InvalidField {
            minute,
            action,
            field,
        }
    } else {
        MalformedLogError::MissingField {
            minute,
            action,
            field,
        }
    }
}

fn parse_minute(key: &str) -> Result<u32, MalformedLogError> {
    key.trim()
        .parse()
        .map_err(|_| MalformedLogError::InvalidMinute(key.to_string()))
}

/// Flattens the vehicle's minute map into actions ordered by minute.
///
/// Simultaneous actions keep the order they were listed in.
pub fn normalize(vehicle: &Vehicle) -> Result<Vec<Action>, MalformedLogError> {
    let mut by_minute: BTreeMap<u32, Vec<&RawAction>> = BTreeMap::new();
    for (key, entry) in &vehicle.actions {
        by_minute
            .entry(parse_minute(key)?)
            .or_default()
            .extend(entry.as_slice());
    }

    let mut actions = Vec::new();
    for (minute, raws) in by_minute {
        for raw in raws {
            actions.push(Action::from_raw(minute, raw)?);
        }
    }
    Ok(actions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Travel {
    minute: u32,
    from: u32,
    to: u32,
}

/// A vehicle's normalized actions plus its mode history.
#[derive(Debug, Clone)]
pub struct Timeline {
    actions: Vec<Action>,
    modes: BTreeMap<u32, String>,
    travels: Vec<Travel>,
}

impl Timeline {
    pub fn new(vehicle: &Vehicle) -> Result<Self, MalformedLogError> {
        let actions = normalize(vehicle)?;
        let modes = vehicle
            .mode
            .iter()
            .map(|(key, mode)| Ok((parse_minute(key)?, mode.clone())))
            .collect::<Result<BTreeMap<_, _>, MalformedLogError>>()?;
        let travels = actions
            .iter()
            .filter_map(|action| match action.kind {
                ActionKind::Travelling { from, to } => Some(Travel {
                    minute: action.minute,
                    from,
                    to,
                }),
                _ => None,
            })
            .collect();

        Ok(Self {
            actions,
            modes,
            travels,
        })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn last_minute(&self) -> u32 {
        self.actions.last().map(|action| action.minute).unwrap_or(0)
    }

    pub fn handover_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action.kind, ActionKind::Handover { .. }))
            .count()
    }

    /// Mode at minute 0 (or the earliest recorded one).
    pub fn initial_mode(&self) -> &str {
        self.modes
            .values()
            .next()
            .map(String::as_str)
            .unwrap_or(MODE_MANUAL)
    }

    fn mode_at(&self, minute: u32) -> &str {
        self.modes
            .range(..=minute)
            .next_back()
            .map(|(_, mode)| mode.as_str())
            .unwrap_or_else(|| self.initial_mode())
    }

    fn previous_travel(&self, minute: u32) -> Option<&Travel> {
        let end = self.travels.partition_point(|travel| travel.minute <= minute);
        self.travels[..end].last()
    }

    fn next_travel(&self, minute: u32) -> Option<&Travel> {
        let start = self.travels.partition_point(|travel| travel.minute < minute);
        self.travels.get(start)
    }

    /// Node the vehicle stands at during the given minute.
    pub fn position(&self, minute: u32) -> Option<u32> {
        self.next_travel(minute)
            .map(|travel| travel.from)
            .or_else(|| self.last_arrival(minute))
    }

    /// Destination of the last travel at or before the minute.
    pub fn last_arrival(&self, minute: u32) -> Option<u32> {
        self.previous_travel(minute).map(|travel| travel.to)
    }

    pub fn start_node(&self) -> Option<u32> {
        self.travels
            .first()
            .map(|travel| travel.from)
            .or_else(|| self.position(0))
    }

    /// Mode the vehicle arrived in, taken from the previous travelling minute.
    pub fn arrival_mode(&self, minute: u32) -> &str {
        match self.previous_travel(minute) {
            Some(travel) => self.mode_at(travel.minute),
            None => self.initial_mode(),
        }
    }

    /// Mode the vehicle leaves in, taken from the next travelling minute.
    pub fn departure_mode(&self, minute: u32) -> &str {
        match self.next_travel(minute) {
            Some(travel) => self.mode_at(travel.minute),
            None => self.mode_at(minute),
        }
    }
}
