use std::fmt::Write;

use super::{DeviceDecl, DeviceKind, RoutingConfig, Scope};

const HEADER: &str = "\
#########################################
# AUTO-GENERATED MULTIROOM AUDIO CONFIG
# Generated by roomcast - do not edit
#########################################
";

/// Mixer slave parameters shared by every amplifier
const MIXER_RATE: u32 = 48000;
const MIXER_PERIOD_SIZE: u32 = 2048;
const MIXER_BUFFER_SIZE: u32 = 16384;

/// Render the ALSA configuration text
///
/// A pure function of the declarations: rendering the same config twice
/// yields byte-identical text.
pub fn render_asound(config: &RoutingConfig) -> String {
    let mut out = String::from(HEADER);
    let mut current_scope = None;

    for device in config.devices() {
        if current_scope != Some(device.scope) {
            current_scope = Some(device.scope);
            out.push_str(&section_banner(device.scope));
        }
        render_device(&mut out, device);
    }

    out
}

fn section_banner(scope: Scope) -> String {
    let title = match scope {
        Scope::Amplifier => "AMPLIFIER DEFINITIONS",
        Scope::Room => "ROOM DEFINITIONS",
        Scope::Aggregate => "ALL ROOMS",
    };
    format!(
        "\n#########################################\n# {}\n#########################################\n",
        title
    )
}

// Writing to a String cannot fail, so the fmt::Results below are ignored.
fn render_device(out: &mut String, device: &DeviceDecl) {
    out.push('\n');
    if let Some(comment) = &device.comment {
        let _ = writeln!(out, "# {}", comment);
    }
    let _ = writeln!(out, "pcm.{} {{", device.name);
    let _ = writeln!(out, "    type {}", device.kind.type_name());

    match &device.kind {
        DeviceKind::Hardware { card, device } => {
            let _ = writeln!(out, "    card {}", card);
            let _ = writeln!(out, "    device {}", device);
        }
        DeviceKind::Mixer {
            slave,
            channels,
            ipc_key,
        } => {
            let _ = writeln!(out, "    ipc_key {}", ipc_key);
            let _ = writeln!(out, "    ipc_perm 0666");
            let _ = writeln!(out, "    slave {{");
            let _ = writeln!(out, "        pcm \"{}\"", slave);
            let _ = writeln!(out, "        channels {}", channels);
            let _ = writeln!(out, "        rate {}", MIXER_RATE);
            let _ = writeln!(out, "        period_size {}", MIXER_PERIOD_SIZE);
            let _ = writeln!(out, "        buffer_size {}", MIXER_BUFFER_SIZE);
            let _ = writeln!(out, "    }}");
        }
        DeviceKind::Route { slave, matrix } => {
            let _ = writeln!(out, "    slave.pcm \"{}\"", slave);
            let _ = writeln!(out, "    slave.channels {}", matrix.columns());
            for (row, column, gain) in matrix.cells() {
                let _ = writeln!(out, "    ttable.{}.{} {}", row, column, gain);
            }
        }
        DeviceKind::Multi { slaves, bindings } => {
            for (index, slave) in slaves.iter().enumerate() {
                let label = slave_label(index);
                let _ = writeln!(out, "    slaves.{}.pcm \"{}\"", label, slave.pcm);
                let _ = writeln!(out, "    slaves.{}.channels {}", label, slave.channels);
            }
            for (index, binding) in bindings.iter().enumerate() {
                let _ = writeln!(out, "    bindings.{}.slave {}", index, slave_label(binding.slave));
                let _ = writeln!(out, "    bindings.{}.channel {}", index, binding.channel);
            }
        }
        DeviceKind::Plug { slave } => {
            let _ = writeln!(out, "    slave.pcm \"{}\"", slave);
        }
    }

    out.push_str("}\n");
}

/// `a`..`z`, then `s26`, `s27`, ...
fn slave_label(index: usize) -> String {
    if index < 26 {
        char::from(b'a' + index as u8).to_string()
    } else {
        format!("s{}", index)
    }
}
