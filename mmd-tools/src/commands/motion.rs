//! VMD motion command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

use mmd_motion::{ChannelKind, MotionDocument};
use mmd_rig::{AssembleOptions, RetargetOptions, assemble, retarget};

use super::SceneArgs;
use super::model::load_model;
use crate::utils::{add_table_row, create_table, format_bytes, format_frame_range};

#[derive(Subcommand)]
pub enum MotionCommands {
    /// Display information about a VMD motion
    Info {
        /// Path to the VMD file
        file: PathBuf,

        /// List every bone and morph track
        #[arg(short, long)]
        detailed: bool,
    },

    /// Re-encode a motion, optionally keeping only some channel kinds
    Convert {
        /// Input VMD file
        input: PathBuf,

        /// Output VMD file
        output: PathBuf,

        /// Channel kinds to keep, by name or numeric tag (bone=0 .. ik=6)
        #[arg(long, value_delimiter = ',', value_parser = parse_channel_kind)]
        only: Vec<ChannelKind>,
    },

    /// Bind a motion to a model and report the curves a host would receive
    Retarget {
        /// Path to the VMD file
        motion: PathBuf,

        /// Model the motion is applied to
        model: PathBuf,

        #[command(flatten)]
        scene: SceneArgs,

        /// Frames added in front of the first key
        #[arg(long, default_value_t = 5)]
        margin: u32,

        /// Host playback rate in frames per second
        #[arg(long, default_value_t = 30.0)]
        frame_rate: f32,
    },
}

/// Parse a channel kind from its name or numeric tag
fn parse_channel_kind(value: &str) -> Result<ChannelKind, String> {
    if let Ok(tag) = value.parse::<u8>() {
        return ChannelKind::try_from(tag).map_err(|e| e.to_string());
    }
    ChannelKind::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = ChannelKind::ALL.iter().map(|k| k.name()).collect();
        format!(
            "unknown channel kind '{value}', expected one of {}",
            names.join(", ")
        )
    })
}

pub fn execute(cmd: MotionCommands) -> Result<()> {
    match cmd {
        MotionCommands::Info { file, detailed } => handle_info(&file, detailed),
        MotionCommands::Convert {
            input,
            output,
            only,
        } => handle_convert(&input, &output, &only),
        MotionCommands::Retarget {
            motion,
            model,
            scene,
            margin,
            frame_rate,
        } => {
            let options = RetargetOptions {
                scale: scene.scale,
                frame_margin: margin,
                convention: scene.convention.into(),
                frame_rate,
            };
            handle_retarget(&motion, &model, &options)
        }
    }
}

fn load_motion(path: &Path) -> Result<MotionDocument> {
    MotionDocument::load(path)
        .with_context(|| format!("Failed to load motion from {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    let motion = load_motion(path)?;

    println!("=== Motion Information ===");
    println!("File: {} ({})", path.display(), format_bytes(size));
    println!("Version: {}", motion.version);
    println!("Model: {}", motion.model_name);
    if motion.is_camera_motion() {
        println!("Camera/light motion");
    }
    println!("Frames: {}", format_frame_range(motion.frame_range()));

    println!();
    let mut table = create_table(vec!["Tag", "Channel", "Keys"]);
    for kind in ChannelKind::ALL {
        add_table_row(
            &mut table,
            vec![
                u8::from(kind).to_string(),
                kind.to_string(),
                motion.key_count(kind).to_string(),
            ],
        );
    }
    table.printstd();

    if detailed {
        println!("\n=== Bone Tracks ===");
        let mut bones = create_table(vec!["Bone", "Keys", "Frames"]);
        for (name, track) in motion.bones.iter() {
            add_table_row(
                &mut bones,
                vec![
                    name.to_string(),
                    track.len().to_string(),
                    format_frame_range(track.frame_range()),
                ],
            );
        }
        bones.printstd();

        println!("\n=== Morph Tracks ===");
        let mut morphs = create_table(vec!["Morph", "Keys", "Frames"]);
        for (name, track) in motion.morphs.iter() {
            add_table_row(
                &mut morphs,
                vec![
                    name.to_string(),
                    track.len().to_string(),
                    format_frame_range(track.frame_range()),
                ],
            );
        }
        morphs.printstd();

        let ik_names = motion.ik_names();
        if !ik_names.is_empty() {
            println!("\nIK switches: {}", ik_names.join(", "));
        }
    }

    Ok(())
}

fn handle_convert(input: &Path, output: &Path, only: &[ChannelKind]) -> Result<()> {
    let mut motion = load_motion(input)?;
    if !only.is_empty() {
        let dropped: Vec<String> = motion
            .channel_kinds()
            .into_iter()
            .filter(|kind| !only.contains(kind))
            .map(|kind| kind.to_string())
            .collect();
        motion.retain_kinds(only);
        if !dropped.is_empty() {
            println!("Dropped channels: {}", dropped.join(", "));
        }
    }

    let data = motion.to_bytes().context("Failed to encode motion")?;
    fs::write(output, &data)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} ({})", output.display(), format_bytes(data.len() as u64));
    Ok(())
}

fn handle_retarget(motion_path: &Path, model_path: &Path, options: &RetargetOptions) -> Result<()> {
    let motion = load_motion(motion_path)?;
    let model = load_model(model_path)?;

    let assemble_options = AssembleOptions {
        scale: options.scale,
        convention: options.convention,
        ..Default::default()
    };
    let assembly = assemble(&model, &assemble_options).context("Failed to assemble rig")?;
    let result = retarget(&motion, &assembly.graph, options).context("Failed to retarget motion")?;

    println!("=== Retarget: {} -> {} ===", motion.model_name, assembly.graph.name);
    let mut table = create_table(vec!["Curves", "Bound", "Keys"]);
    let bone_keys: usize = result.bones.iter().map(|c| c.rotation[0].len()).sum();
    add_table_row(
        &mut table,
        vec![
            "Bones".into(),
            result.bones.len().to_string(),
            bone_keys.to_string(),
        ],
    );
    let morph_keys: usize = result.morphs.iter().map(|c| c.weight.len()).sum();
    add_table_row(
        &mut table,
        vec![
            "Morphs".into(),
            result.morphs.len().to_string(),
            morph_keys.to_string(),
        ],
    );
    add_table_row(
        &mut table,
        vec![
            "IK switches".into(),
            result.ik.len().to_string(),
            result
                .ik
                .iter()
                .map(|c| c.enabled.keys.len())
                .sum::<usize>()
                .to_string(),
        ],
    );
    if let Some(camera) = &result.camera {
        add_table_row(
            &mut table,
            vec!["Camera".into(), "1".into(), camera.distance.len().to_string()],
        );
    }
    if let Some(light) = &result.light {
        add_table_row(
            &mut table,
            vec!["Light".into(), "1".into(), light.color[0].len().to_string()],
        );
    }
    table.printstd();

    println!("Frames: {}", format_frame_range(result.frame_range));
    if let Some(seconds) = result.duration() {
        println!("Duration: {seconds:.2}s at {} fps", result.frame_rate);
    }

    if !assembly.warnings.is_empty() {
        println!("\nRig: {}", assembly.warnings.format());
    }
    if !result.warnings.is_empty() {
        println!("\nMotion: {}", result.warnings.format());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_kind() {
        assert_eq!(parse_channel_kind("bone"), Ok(ChannelKind::Bone));
        assert_eq!(parse_channel_kind("IK"), Ok(ChannelKind::Ik));
        assert_eq!(parse_channel_kind("2"), Ok(ChannelKind::Camera));
        assert!(parse_channel_kind("7").is_err());
        assert!(
            parse_channel_kind("sound")
                .unwrap_err()
                .contains("expected one of bone, morph")
        );
    }
}
