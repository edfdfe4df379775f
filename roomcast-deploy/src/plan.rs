//! Pure planning of group changes
//!
//! Given the desired stream topology and a server status snapshot, decide
//! which group hosts each stream and which calls bring it in line. Nothing
//! here talks to the network.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use roomcast_compiler::{room_device_name, StreamTopology};
use roomcast_config::{RoomId, StreamId};
use snapcast_api::ServerStatus;

/// One stream and the rooms it finally claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub stream: StreamId,
    pub server_stream_id: String,
    pub rooms: BTreeSet<RoomId>,
}

impl Assignment {
    /// Client host ids of the assigned rooms, sorted
    pub fn client_ids(&self) -> Vec<String> {
        self.rooms.iter().map(room_device_name).collect()
    }
}

/// Something the plan had to work around
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// A room was targeted by several streams and went to a more specific one
    OverlappingTarget {
        room: RoomId,
        dropped_from: StreamId,
        claimed_by: StreamId,
    },
    /// No room is left for the stream
    EmptyTarget { stream: StreamId },
    /// The server has never seen the room's client
    UnknownClient { room: RoomId, client: String },
    /// No unclaimed group holds any of the stream's clients
    NoFreeGroup { stream: StreamId },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::OverlappingTarget {
                room,
                dropped_from,
                claimed_by,
            } => write!(
                f,
                "room {} is targeted by {} and {}; {} wins",
                room, dropped_from, claimed_by, claimed_by
            ),
            PlanWarning::EmptyTarget { stream } => {
                write!(f, "stream {} has no rooms to play in", stream)
            }
            PlanWarning::UnknownClient { room, client } => {
                write!(f, "room {}: server has no client {}", room, client)
            }
            PlanWarning::NoFreeGroup { stream } => {
                write!(f, "stream {}: no unclaimed group holds its clients", stream)
            }
        }
    }
}

/// Give every room to exactly one stream
///
/// Targets are ranked most specific first (fewest rooms, then stream id);
/// each takes the rooms not already claimed. The result is in that rank
/// order, which is also the order groups should be claimed in.
pub fn resolve_overlaps(topology: &[StreamTopology]) -> (Vec<Assignment>, Vec<PlanWarning>) {
    let mut ranked: Vec<&StreamTopology> = topology.iter().collect();
    ranked.sort_by(|a, b| {
        a.rooms
            .len()
            .cmp(&b.rooms.len())
            .then_with(|| a.stream.cmp(&b.stream))
    });

    let mut owner: BTreeMap<&RoomId, &StreamId> = BTreeMap::new();
    let mut assignments = Vec::with_capacity(ranked.len());
    let mut warnings = Vec::new();

    for target in ranked {
        let mut rooms = BTreeSet::new();
        for room in &target.rooms {
            match owner.get(room) {
                Some(claimed_by) => warnings.push(PlanWarning::OverlappingTarget {
                    room: room.clone(),
                    dropped_from: target.stream.clone(),
                    claimed_by: (*claimed_by).clone(),
                }),
                None => {
                    owner.insert(room, &target.stream);
                    rooms.insert(room.clone());
                }
            }
        }

        if rooms.is_empty() {
            warnings.push(PlanWarning::EmptyTarget {
                stream: target.stream.clone(),
            });
            continue;
        }

        assignments.push(Assignment {
            stream: target.stream.clone(),
            server_stream_id: target.server_stream_id.clone(),
            rooms,
        });
    }

    (assignments, warnings)
}

/// Calls needed to make one group host one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub group_id: String,
    /// Desired members: the assignment's clients the server knows
    pub clients: Vec<String>,
    pub current_clients: Vec<String>,
    pub current_stream: String,
    pub current_name: String,
    pub set_clients: bool,
    pub set_stream: bool,
}

impl GroupPlan {
    pub fn is_noop(&self) -> bool {
        !self.set_clients && !self.set_stream
    }
}

/// Choose the hosting group for an assignment and diff it
///
/// The host is the group not yet claimed by another assignment that holds
/// the most of this assignment's clients; ties go to the lowest group id.
/// A group holding none of them is never taken over. Returns `None` when no
/// client is known or no free group holds one.
pub fn plan_group(
    status: &ServerStatus,
    assignment: &Assignment,
    claimed: &BTreeSet<String>,
) -> (Option<GroupPlan>, Vec<PlanWarning>) {
    let mut warnings = Vec::new();
    let mut clients = Vec::new();

    for room in &assignment.rooms {
        let client = room_device_name(room);
        if status.find_client(&client).is_some() {
            clients.push(client);
        } else {
            warnings.push(PlanWarning::UnknownClient {
                room: room.clone(),
                client,
            });
        }
    }

    if clients.is_empty() {
        return (None, warnings);
    }

    let wanted: BTreeSet<String> = clients.iter().cloned().collect();
    let mut candidates: Vec<_> = status
        .groups
        .iter()
        .filter(|g| !claimed.contains(&g.id))
        .collect();
    candidates.sort_by(|a, b| a.id.cmp(&b.id));

    let mut best = None;
    let mut best_overlap = 0;
    for group in candidates {
        let overlap = group.clients.iter().filter(|c| wanted.contains(&c.id)).count();
        if overlap > best_overlap {
            best = Some(group);
            best_overlap = overlap;
        }
    }

    let Some(group) = best else {
        warnings.push(PlanWarning::NoFreeGroup {
            stream: assignment.stream.clone(),
        });
        return (None, warnings);
    };

    let current: BTreeSet<String> = group.client_ids();
    let plan = GroupPlan {
        group_id: group.id.clone(),
        set_clients: current != wanted,
        set_stream: group.stream_id != assignment.server_stream_id,
        current_clients: current.into_iter().collect(),
        current_stream: group.stream_id.clone(),
        current_name: group.name.clone(),
        clients,
    };

    (Some(plan), warnings)
}
