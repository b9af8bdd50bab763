//! PMX / PMD model command implementations

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use mmd_model::{ModelDocument, ModelFormat, TextEncoding};
use mmd_rig::{AssembleOptions, Entity, ExportOptions, PairReason, assemble, export_rig};

use super::SceneArgs;
use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, detect_ref_type, format_bytes,
    format_names, format_vec3, render_tree,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Pmx,
    Pmd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Utf16,
    Utf8,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf16 => TextEncoding::Utf16Le,
            EncodingArg::Utf8 => TextEncoding::Utf8,
        }
    }
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Display information about a PMX or PMD model
    Info {
        /// Path to the model file
        file: PathBuf,

        /// List every bone, morph and rigid body
        #[arg(short, long)]
        detailed: bool,

        /// Dump the decoded document as JSON
        #[cfg(feature = "serde")]
        #[arg(long, conflicts_with = "detailed")]
        json: bool,
    },

    /// Display the bone hierarchy and model sections as a tree
    Tree {
        /// Path to the model file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colors
        #[arg(long)]
        no_color: bool,

        /// Show metadata inline
        #[arg(long)]
        compact: bool,

        /// Hide node metadata
        #[arg(long)]
        no_metadata: bool,
    },

    /// Re-encode a model, optionally switching container or text encoding
    Convert {
        /// Input model file
        input: PathBuf,

        /// Output model file
        output: PathBuf,

        /// Target container; defaults to the output extension
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Text encoding of PMX output; defaults to the input's
        #[arg(short, long, value_enum)]
        encoding: Option<EncodingArg>,
    },

    /// Assemble the rig graph and report what a host would receive
    Rig {
        /// Path to the model file
        file: PathBuf,

        #[command(flatten)]
        scene: SceneArgs,

        /// Keep 左/右 in bone names instead of a .L/.R suffix
        #[arg(long)]
        keep_bone_names: bool,

        /// Leave rigid bodies and joints visible
        #[arg(long)]
        show_rigids: bool,

        /// Keep only simulated bodies with positive mass
        #[arg(long)]
        only_collisions: bool,

        /// Exclude collisions between jointed bodies resting far apart
        #[arg(long)]
        ignore_non_collision_groups: bool,

        /// Rest distance in file units beyond which jointed bodies stop colliding
        #[arg(long, default_value_t = 1.5)]
        distance: f32,

        /// Write the rig back into a copy of the model
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn execute(cmd: ModelCommands) -> Result<()> {
    match cmd {
        ModelCommands::Info {
            file,
            detailed,
            #[cfg(feature = "serde")]
            json,
        } => {
            #[cfg(not(feature = "serde"))]
            let json = false;
            if json {
                handle_json(&file)
            } else {
                handle_info(&file, detailed)
            }
        }
        ModelCommands::Tree {
            file,
            depth,
            no_color,
            compact,
            no_metadata,
        } => {
            let options = TreeOptions {
                max_depth: depth,
                show_external_refs: true,
                no_color,
                show_metadata: !no_metadata,
                compact,
            };
            handle_tree(&file, &options)
        }
        ModelCommands::Convert {
            input,
            output,
            format,
            encoding,
        } => handle_convert(&input, &output, format, encoding),
        ModelCommands::Rig {
            file,
            scene,
            keep_bone_names,
            show_rigids,
            only_collisions,
            ignore_non_collision_groups,
            distance,
            output,
        } => {
            let options = AssembleOptions {
                scale: scene.scale,
                rename_bones: !keep_bone_names,
                hide_rigids: !show_rigids,
                only_collisions,
                ignore_non_collision_groups,
                distance_of_ignore_collisions: distance,
                convention: scene.convention.into(),
            };
            handle_rig(&file, &options, output.as_deref())
        }
    }
}

pub(crate) fn load_model(path: &Path) -> Result<ModelDocument> {
    ModelDocument::load(path)
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    let model = load_model(path)?;

    println!("=== Model Information ===");
    println!("File: {} ({})", path.display(), format_bytes(size));
    println!("Format: {}", model.format);
    println!("Name: {}", format_names(&model.info.name, &model.info.name_en));
    if !model.info.comment.is_empty() {
        println!("Comment: {}", model.info.comment.lines().next().unwrap_or_default());
    }

    println!();
    let mut table = create_table(vec!["Section", "Count"]);
    let counts = [
        ("Vertices", model.vertices.len()),
        ("Triangles", model.faces.len()),
        ("Textures", model.textures.len()),
        ("Materials", model.materials.len()),
        ("Bones", model.bones.len()),
        ("Morphs", model.morphs.len()),
        ("Display frames", model.display_frames.len()),
        ("Rigid bodies", model.rigid_bodies.len()),
        ("Joints", model.joints.len()),
    ];
    for (section, count) in counts {
        add_table_row(&mut table, vec![section.to_string(), count.to_string()]);
    }
    table.printstd();

    let ik_chains = model.bones.iter().filter(|b| b.ik.is_some()).count();
    if ik_chains > 0 {
        println!("IK chains: {ik_chains}");
    }

    if detailed {
        println!("\n=== Bones ===");
        let mut bones = create_table(vec!["#", "Name", "Parent", "Position", "Order", "Flags"]);
        for (index, bone) in model.bones.iter().enumerate() {
            let parent = bone
                .parent
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            add_table_row(
                &mut bones,
                vec![
                    index.to_string(),
                    format_names(&bone.name, &bone.name_en),
                    parent,
                    format_vec3(bone.position),
                    bone.transform_order.to_string(),
                    format!("{:?}", bone.flags),
                ],
            );
        }
        bones.printstd();

        println!("\n=== Morphs ===");
        let mut morphs = create_table(vec!["#", "Name", "Kind", "Offsets"]);
        for (index, morph) in model.morphs.iter().enumerate() {
            add_table_row(
                &mut morphs,
                vec![
                    index.to_string(),
                    format_names(&morph.name, &morph.name_en),
                    format!("{:?}", morph.kind()),
                    morph.offsets.len().to_string(),
                ],
            );
        }
        morphs.printstd();

        println!("\n=== Rigid Bodies ===");
        let mut bodies = create_table(vec!["#", "Name", "Bone", "Shape", "Mode", "Group"]);
        for (index, body) in model.rigid_bodies.iter().enumerate() {
            let bone = body
                .bone
                .and_then(|b| model.bones.get(b as usize))
                .map_or("-", |b| b.name.as_str());
            add_table_row(
                &mut bodies,
                vec![
                    index.to_string(),
                    body.name.clone(),
                    bone.to_string(),
                    format!("{:?}", body.shape),
                    format!("{:?}", body.mode),
                    body.group.to_string(),
                ],
            );
        }
        bodies.printstd();
    }

    Ok(())
}

#[cfg(feature = "serde")]
fn handle_json(path: &Path) -> Result<()> {
    let model = load_model(path)?;
    let json = serde_json::to_string_pretty(&model).context("Failed to serialize model")?;
    println!("{json}");
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn handle_json(_path: &Path) -> Result<()> {
    bail!("JSON output requires the serde feature")
}

fn bone_node(model: &ModelDocument, children: &[Vec<usize>], index: usize) -> TreeNode {
    let bone = &model.bones[index];
    let node_type = if bone.ik.is_some() {
        NodeType::IkBone
    } else {
        NodeType::Bone
    };
    let mut node = TreeNode::new(format_names(&bone.name, &bone.name_en), node_type)
        .with_metadata("index", index)
        .with_metadata("position", format_vec3(bone.position));
    if bone.transform_order != 0 {
        node = node.with_metadata("order", bone.transform_order);
    }
    if bone.transform_after_dynamics() {
        node = node.with_metadata("after physics", "yes");
    }
    if let Some(ik) = &bone.ik {
        let target = ik
            .target
            .and_then(|t| model.bones.get(t as usize))
            .map_or("-", |b| b.name.as_str());
        node = node
            .with_metadata("ik target", target)
            .with_metadata("ik links", ik.links.len());
    }
    for &child in &children[index] {
        node = node.add_child(bone_node(model, children, child));
    }
    node
}

fn handle_tree(path: &Path, options: &TreeOptions) -> Result<()> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    let model = load_model(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut root = TreeNode::new(file_name, NodeType::Root).with_size(size);

    root = root.add_child(
        TreeNode::new("Header", NodeType::Header)
            .with_metadata("format", model.format)
            .with_metadata("name", &model.info.name)
            .with_metadata("english name", &model.info.name_en),
    );

    let children = model.bone_children();
    let bone_count = model.bones.len();
    let roots: Vec<usize> = (0..bone_count)
        .filter(|&i| {
            model.bones[i]
                .parent
                .is_none_or(|p| p as usize >= bone_count)
        })
        .collect();
    let mut bones = TreeNode::new(format!("Bones ({bone_count})"), NodeType::Section);
    for index in roots {
        bones = bones.add_child(bone_node(&model, &children, index));
    }
    root = root.add_child(bones);

    let mut materials = TreeNode::new(
        format!("Materials ({})", model.materials.len()),
        NodeType::Section,
    );
    for material in &model.materials {
        let mut node = TreeNode::new(
            format_names(&material.name, &material.name_en),
            NodeType::Material,
        )
        .with_metadata("triangles", material.index_count / 3);
        for texture in [material.texture, material.sphere_texture]
            .into_iter()
            .flatten()
        {
            if let Some(texture) = model.textures.get(texture as usize) {
                let exists = base.join(texture.replace('\\', "/")).exists();
                node = node.with_external_ref(texture, detect_ref_type(texture), Some(exists));
            }
        }
        materials = materials.add_child(node);
    }
    root = root.add_child(materials);

    let mut morphs = TreeNode::new(format!("Morphs ({})", model.morphs.len()), NodeType::Section);
    for morph in &model.morphs {
        morphs = morphs.add_child(
            TreeNode::new(format_names(&morph.name, &morph.name_en), NodeType::Morph)
                .with_metadata("kind", format!("{:?}", morph.kind()))
                .with_metadata("offsets", morph.offsets.len()),
        );
    }
    root = root.add_child(morphs);

    let mut bodies = TreeNode::new(
        format!("Rigid bodies ({})", model.rigid_bodies.len()),
        NodeType::Section,
    );
    for body in &model.rigid_bodies {
        bodies = bodies.add_child(
            TreeNode::new(&body.name, NodeType::RigidBody)
                .with_metadata("shape", format!("{:?}", body.shape))
                .with_metadata("mode", format!("{:?}", body.mode))
                .with_metadata("group", body.group),
        );
    }
    root = root.add_child(bodies);

    let mut joints = TreeNode::new(format!("Joints ({})", model.joints.len()), NodeType::Section);
    for joint in &model.joints {
        let end = |body: Option<u32>| {
            body.and_then(|b| model.rigid_bodies.get(b as usize))
                .map_or("-", |b| b.name.as_str())
        };
        joints = joints.add_child(
            TreeNode::new(&joint.name, NodeType::Joint)
                .with_metadata("bodies", format!("{} - {}", end(joint.body_a), end(joint.body_b))),
        );
    }
    root = root.add_child(joints);

    print!("{}", render_tree(&root, options));
    Ok(())
}

fn target_format(
    model: &ModelDocument,
    output: &Path,
    format: Option<FormatArg>,
    encoding: Option<EncodingArg>,
) -> Result<ModelFormat> {
    let pmx = || ModelFormat::Pmx {
        encoding: encoding.map_or_else(|| model.pmx_encoding(), TextEncoding::from),
    };
    let format = match format {
        Some(FormatArg::Pmx) => pmx(),
        Some(FormatArg::Pmd) => ModelFormat::Pmd,
        None => match output
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ModelFormat::from_extension)
        {
            Some(ModelFormat::Pmx { .. }) => pmx(),
            Some(ModelFormat::Pmd) => ModelFormat::Pmd,
            None => bail!(
                "Cannot tell the target format from {}; pass --format",
                output.display()
            ),
        },
    };
    if format == ModelFormat::Pmd && encoding.is_some() {
        log::warn!("--encoding only applies to PMX output");
    }
    Ok(format)
}

fn handle_convert(
    input: &Path,
    output: &Path,
    format: Option<FormatArg>,
    encoding: Option<EncodingArg>,
) -> Result<()> {
    let model = load_model(input)?;
    let format = target_format(&model, output, format, encoding)?;
    println!("Converting {} ({}) to {format}", input.display(), model.format);

    let data = model
        .encode_as(format)
        .with_context(|| format!("Failed to encode model as {format}"))?;
    fs::write(output, &data)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} ({})", output.display(), format_bytes(data.len() as u64));
    Ok(())
}

fn handle_rig(path: &Path, options: &AssembleOptions, output: Option<&Path>) -> Result<()> {
    let model = load_model(path)?;
    let assembly = assemble(&model, options).context("Failed to assemble rig")?;
    let graph = &assembly.graph;

    println!("=== Rig: {} ===", graph.name);
    println!("Convention: {:?}, scale {}", graph.convention, graph.scale);

    let mut table = create_table(vec!["Entity", "Count", "Detail"]);
    add_table_row(
        &mut table,
        vec![
            "Bones".into(),
            graph.bones.len().to_string(),
            format!(
                "{} before physics, {} after",
                graph.evaluation_order.before_dynamics.len(),
                graph.evaluation_order.after_dynamics.len()
            ),
        ],
    );
    add_table_row(
        &mut table,
        vec![
            "IK bones".into(),
            graph.bones.iter().filter(|b| b.is_ik).count().to_string(),
            String::new(),
        ],
    );
    add_table_row(
        &mut table,
        vec![
            "Rigid bodies".into(),
            graph.rigid_bodies.len().to_string(),
            format!(
                "{} simulated",
                graph.rigid_bodies.iter().filter(|b| b.is_free()).count()
            ),
        ],
    );
    add_table_row(
        &mut table,
        vec![
            "Joints".into(),
            graph.joints.len().to_string(),
            format!(
                "{} with springs",
                graph.joints.iter().filter(|j| j.is_spring).count()
            ),
        ],
    );
    let by_distance = graph
        .non_collision_pairs
        .iter()
        .filter(|p| p.reason == PairReason::Distance)
        .count();
    add_table_row(
        &mut table,
        vec![
            "Non-colliding pairs".into(),
            graph.non_collision_pairs.len().to_string(),
            format!(
                "{} by mask, {by_distance} by distance",
                graph.non_collision_pairs.len() - by_distance
            ),
        ],
    );
    add_table_row(
        &mut table,
        vec![
            "Mesh".into(),
            graph.mesh.positions.len().to_string(),
            format!(
                "{} triangles, {} materials, {} vertex morphs",
                graph.mesh.faces.len(),
                graph.mesh.materials.len(),
                graph.mesh.morphs.len()
            ),
        ],
    );
    table.printstd();

    if !assembly.warnings.is_empty() {
        let dangling: usize = [
            Entity::Bone,
            Entity::Vertex,
            Entity::Face,
            Entity::Material,
            Entity::Morph,
            Entity::RigidBody,
            Entity::Joint,
        ]
        .into_iter()
        .map(|entity| assembly.warnings.dangling_references(entity))
        .sum();
        println!("\n{dangling} dangling reference(s) dropped");
        println!("{}", assembly.warnings.format());
    }

    if let Some(output) = output {
        let exported = export_rig(graph, &model, &ExportOptions::from(options))
            .context("Failed to export rig")?;
        exported
            .save(output)
            .with_context(|| format!("Failed to save model to {}", output.display()))?;
        println!("\nExported rig to {}", output.display());
    }

    Ok(())
}
