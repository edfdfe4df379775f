use std::collections::{BTreeMap, BTreeSet};

use roomcast_config::{Amplifier, AmplifierId, ConfigError, ConfigModel, Room, RoomId, SpeakerId};

use super::{
    mixer_device_name, room_device_name, speaker_device_name, Binding, DeviceDecl, DeviceKind,
    DeviceRole, MultiSlave, RoutingConfig, RoutingMatrix, Scope, Side, ALL_ROOMS_DEVICE,
    INTERNAL_PREFIX,
};
use crate::error::{CompileError, ConflictKind, Result};

/// First dmix IPC key; amplifier `n` in id order gets `IPC_KEY_BASE + n`
const IPC_KEY_BASE: u32 = 1024;

/// Effective gain of a speaker: its volume scaled by the global ceiling
pub fn gain(volume: u32, max_volume: f64) -> f64 {
    ((f64::from(volume) / 100.0) * max_volume).clamp(0.0, 1.0)
}

/// ALSA card name for every amplifier
///
/// Amplifiers sharing a base card identifier are enumerated by the kernel
/// as `CARD`, `CARD_1`, `CARD_2`, ...; they are bound in amplifier id order.
pub fn alsa_card_names(model: &ConfigModel) -> BTreeMap<AmplifierId, String> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    model
        .amplifiers
        .iter()
        .map(|(id, amp)| {
            let count = seen.entry(amp.card.as_str()).or_insert(0);
            let name = if *count == 0 {
                amp.card.clone()
            } else {
                format!("{}_{}", amp.card, count)
            };
            *count += 1;
            (id.clone(), name)
        })
        .collect()
}

/// Compile the model into an ordered device graph
///
/// Pure and deterministic: amplifiers first, then rooms, then the
/// aggregate, each in id order. The model is validated first, and every
/// generated name is checked before anything is returned.
pub fn compile(model: &ConfigModel) -> Result<RoutingConfig> {
    model.validate()?;

    let cards = alsa_card_names(model);
    let max_volume = model.max_volume();
    let mut devices = Vec::new();

    for (index, (id, amp)) in model.amplifiers.iter().enumerate() {
        let card = cards.get(id).cloned().unwrap_or_else(|| amp.card.clone());
        amplifier_devices(&mut devices, id, amp, &card, index, max_volume);
    }

    let mut placements = Vec::new();
    for (id, room) in &model.rooms {
        let room_placements = resolve_room(model, id, room)?;
        room_devices(&mut devices, id, &room_placements);
        placements.extend(room_placements);
    }

    if !placements.is_empty() {
        aggregate_devices(&mut devices, model, &placements);
    }

    check_names(&devices)?;

    tracing::debug!(
        devices = devices.len(),
        rooms = model.rooms.len(),
        "compiled routing config"
    );
    Ok(RoutingConfig::new(devices))
}

/// A speaker resolved to its amplifier column and gain
#[derive(Debug, Clone)]
struct Placement {
    amp: AmplifierId,
    channels: usize,
    /// 0-based column on the amplifier
    column: usize,
    gain: f64,
    side: Side,
}

fn resolve_room(model: &ConfigModel, id: &RoomId, room: &Room) -> Result<Vec<Placement>> {
    let mut placements = Vec::with_capacity(2);
    if let Some(left) = &room.left {
        placements.push(place(model, id, left, Side::Left)?);
    }
    if let Some(right) = &room.right {
        placements.push(place(model, id, right, Side::Right)?);
    }
    Ok(placements)
}

fn place(model: &ConfigModel, room: &RoomId, speaker_id: &SpeakerId, side: Side) -> Result<Placement> {
    let speaker = model.speaker(speaker_id).ok_or_else(|| {
        CompileError::Validation(ConfigError::UnresolvedReference {
            kind: "speaker",
            id: speaker_id.to_string(),
            referrer: format!("room '{}'", room),
        })
    })?;
    let amp = model.amplifier(&speaker.amplifier).ok_or_else(|| {
        CompileError::Validation(ConfigError::UnresolvedReference {
            kind: "amplifier",
            id: speaker.amplifier.to_string(),
            referrer: format!("speaker '{}'", speaker_id),
        })
    })?;

    Ok(Placement {
        amp: speaker.amplifier.clone(),
        channels: amp.channels as usize,
        column: speaker.channel as usize - 1,
        gain: gain(speaker.volume, model.max_volume()),
        side,
    })
}

fn amplifier_devices(
    devices: &mut Vec<DeviceDecl>,
    id: &AmplifierId,
    amp: &Amplifier,
    card: &str,
    index: usize,
    max_volume: f64,
) {
    let channels = amp.channels as usize;
    let mixer = mixer_device_name(id);

    devices.push(DeviceDecl {
        name: id.to_string(),
        role: DeviceRole::Hardware,
        scope: Scope::Amplifier,
        comment: Some(format!("{} - {} ({} channels)", id, card, channels)),
        kind: DeviceKind::Hardware {
            card: card.to_string(),
            device: 0,
        },
    });

    devices.push(DeviceDecl {
        name: mixer.clone(),
        role: DeviceRole::Mixer,
        scope: Scope::Amplifier,
        comment: None,
        kind: DeviceKind::Mixer {
            slave: id.to_string(),
            channels,
            ipc_key: IPC_KEY_BASE + index as u32,
        },
    });

    // Identification devices play one channel at full configured ceiling.
    let level = gain(100, max_volume);
    for channel in 1..=channels {
        let internal = format!("{}{}_ch{}", INTERNAL_PREFIX, id, channel);
        let mut matrix = RoutingMatrix::new(2, channels);
        matrix.set(0, channel - 1, level);
        matrix.set(1, channel - 1, level);

        devices.push(DeviceDecl {
            name: internal.clone(),
            role: DeviceRole::Internal,
            scope: Scope::Amplifier,
            comment: None,
            kind: DeviceKind::Route {
                slave: mixer.clone(),
                matrix,
            },
        });
        devices.push(DeviceDecl {
            name: format!("{}_ch{}", id, channel),
            role: DeviceRole::Diagnostic,
            scope: Scope::Amplifier,
            comment: None,
            kind: DeviceKind::Plug { slave: internal },
        });
    }
}

fn room_devices(devices: &mut Vec<DeviceDecl>, id: &RoomId, placements: &[Placement]) {
    let endpoint = room_device_name(id);
    let internal = format!("{}{}", INTERNAL_PREFIX, endpoint);

    match placements {
        [left, right] if left.amp == right.amp => {
            let mut matrix = RoutingMatrix::new(2, left.channels);
            matrix.set(0, left.column, left.gain);
            matrix.set(1, right.column, right.gain);

            devices.push(DeviceDecl {
                name: internal.clone(),
                role: DeviceRole::Internal,
                scope: Scope::Room,
                comment: Some(format!(
                    "{} - stereo on {} (ch{}, ch{})",
                    endpoint,
                    left.amp,
                    left.column + 1,
                    right.column + 1
                )),
                kind: DeviceKind::Route {
                    slave: mixer_device_name(&left.amp),
                    matrix,
                },
            });
        }
        [left, right] => {
            let mut slaves = Vec::with_capacity(2);
            for placement in [left, right] {
                let speaker = speaker_device_name(id, placement.side);
                let speaker_internal = format!("{}{}", INTERNAL_PREFIX, speaker);
                push_single_channel(devices, &speaker_internal, placement, None);
                devices.push(DeviceDecl {
                    name: speaker,
                    role: DeviceRole::Endpoint,
                    scope: Scope::Room,
                    comment: None,
                    kind: DeviceKind::Plug {
                        slave: speaker_internal.clone(),
                    },
                });
                slaves.push(MultiSlave {
                    pcm: speaker_internal,
                    channels: 1,
                });
            }

            devices.push(DeviceDecl {
                name: internal.clone(),
                role: DeviceRole::Internal,
                scope: Scope::Room,
                comment: Some(format!(
                    "{} - cross-amplifier stereo: {} ch{} + {} ch{}",
                    endpoint,
                    left.amp,
                    left.column + 1,
                    right.amp,
                    right.column + 1
                )),
                kind: DeviceKind::Multi {
                    slaves,
                    bindings: vec![
                        Binding { slave: 0, channel: 0 },
                        Binding { slave: 1, channel: 0 },
                    ],
                },
            });
        }
        [single] => {
            let comment = format!(
                "{} - mono ({} only on {} ch{})",
                endpoint,
                single.side.as_str(),
                single.amp,
                single.column + 1
            );
            push_single_channel(devices, &internal, single, Some(comment));
        }
        // Rejected by validation as an empty room.
        _ => return,
    }

    devices.push(DeviceDecl {
        name: endpoint,
        role: DeviceRole::Endpoint,
        scope: Scope::Room,
        comment: None,
        kind: DeviceKind::Plug { slave: internal },
    });
}

fn push_single_channel(
    devices: &mut Vec<DeviceDecl>,
    name: &str,
    placement: &Placement,
    comment: Option<String>,
) {
    let mut matrix = RoutingMatrix::new(1, placement.channels);
    matrix.set(0, placement.column, placement.gain);
    devices.push(DeviceDecl {
        name: name.to_string(),
        role: DeviceRole::Internal,
        scope: Scope::Room,
        comment,
        kind: DeviceKind::Route {
            slave: mixer_device_name(&placement.amp),
            matrix,
        },
    });
}

/// `all_rooms`: one input channel per room channel, routed over the
/// concatenated channel space of every amplifier that hosts a speaker
fn aggregate_devices(devices: &mut Vec<DeviceDecl>, model: &ConfigModel, placements: &[Placement]) {
    let amps: BTreeSet<&AmplifierId> = placements.iter().map(|p| &p.amp).collect();

    let mut offsets = BTreeMap::new();
    let mut slaves = Vec::with_capacity(amps.len());
    let mut bindings = Vec::new();
    let mut total = 0;

    for (slave, amp_id) in amps.into_iter().enumerate() {
        let channels = model
            .amplifier(amp_id)
            .map(|a| a.channels as usize)
            .unwrap_or_default();
        offsets.insert(amp_id.clone(), total);
        slaves.push(MultiSlave {
            pcm: mixer_device_name(amp_id),
            channels,
        });
        bindings.extend((0..channels).map(|channel| Binding { slave, channel }));
        total += channels;
    }

    let mut matrix = RoutingMatrix::new(placements.len(), total);
    for (row, placement) in placements.iter().enumerate() {
        let offset = offsets.get(&placement.amp).copied().unwrap_or_default();
        matrix.set(row, offset + placement.column, placement.gain);
    }

    let multi = format!("{}{}_multi", INTERNAL_PREFIX, ALL_ROOMS_DEVICE);
    let route = format!("{}{}", INTERNAL_PREFIX, ALL_ROOMS_DEVICE);

    devices.push(DeviceDecl {
        name: multi.clone(),
        role: DeviceRole::Internal,
        scope: Scope::Aggregate,
        comment: Some(format!(
            "{} - every room channel ({} channels over {} amplifier channels)",
            ALL_ROOMS_DEVICE,
            placements.len(),
            total
        )),
        kind: DeviceKind::Multi { slaves, bindings },
    });
    devices.push(DeviceDecl {
        name: route.clone(),
        role: DeviceRole::Internal,
        scope: Scope::Aggregate,
        comment: None,
        kind: DeviceKind::Route {
            slave: multi,
            matrix,
        },
    });
    devices.push(DeviceDecl {
        name: ALL_ROOMS_DEVICE.to_string(),
        role: DeviceRole::Endpoint,
        scope: Scope::Aggregate,
        comment: None,
        kind: DeviceKind::Plug { slave: route },
    });
}

/// Every name is unique, and no endpoint is a prefix of another name
fn check_names(devices: &[DeviceDecl]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for device in devices {
        if !seen.insert(device.name.as_str()) {
            return Err(CompileError::NamingConflict {
                name: device.name.clone(),
                conflicts_with: device.name.clone(),
                kind: ConflictKind::Collision,
            });
        }
    }

    for endpoint in devices.iter().filter(|d| d.role == DeviceRole::Endpoint) {
        if let Some(other) = devices
            .iter()
            .find(|d| d.name != endpoint.name && d.name.starts_with(&endpoint.name))
        {
            return Err(CompileError::NamingConflict {
                name: endpoint.name.clone(),
                conflicts_with: other.name.clone(),
                kind: ConflictKind::Prefix,
            });
        }
    }

    Ok(())
}
