//! Tree rendering for model structure and bone hierarchies

use console::Style;

use super::format::format_bytes;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub size: Option<u64>,
    pub children: Vec<TreeNode>,
    /// Key/value pairs in insertion order
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Header,
    Section,
    Bone,
    IkBone,
    Material,
    Morph,
    RigidBody,
    Joint,
    Data,
}

/// File referenced by the model
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub ref_type: RefType,
    pub exists: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Texture,
    Sphere,
    Toon,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
    /// Metadata on the node line instead of below it
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            size: None,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_external_ref(mut self, path: &str, ref_type: RefType, exists: Option<bool>) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            ref_type,
            exists,
        });
        self
    }
}

impl ExternalRef {
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Texture => "🖼️",
            RefType::Sphere => "🔮",
            RefType::Toon => "🎨",
            RefType::Unknown => "📁",
        }
    }

    /// Green when the file exists next to the model, red when it is missing
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.exists {
                Some(true) => Style::new().green(),
                Some(false) => Style::new().red(),
                None => Style::new().yellow(),
            }
        }
    }
}

impl NodeType {
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Header => "📋",
            NodeType::Section => "📦",
            NodeType::Bone => "🦴",
            NodeType::IkBone => "🎯",
            NodeType::Material => "🎨",
            NodeType::Morph => "😊",
            NodeType::RigidBody => "🧱",
            NodeType::Joint => "🔗",
            NodeType::Data => "💾",
        }
    }

    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Header => Style::new().bold().yellow(),
                NodeType::Section => Style::new().blue(),
                NodeType::Bone => Style::new().green(),
                NodeType::IkBone => Style::new().yellow(),
                NodeType::Material => Style::new().magenta(),
                NodeType::Morph => Style::new().cyan(),
                NodeType::RigidBody | NodeType::Joint => Style::new().white(),
                NodeType::Data => Style::new().dim(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let icon = node.node_type.icon();
    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        connector,
        icon,
        style.apply_to(&node.name)
    );

    if let Some(size) = node.size {
        line.push_str(&format!(" ({})", format_bytes(size)));
    }

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        line.push_str(&format!(" [{}]", parts.join(", ")));
    }

    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        ""
    } else if is_last {
        "    "
    } else {
        "│   "
    };

    if options.show_metadata && !options.compact && !node.metadata.is_empty() {
        let meta_prefix = format!("{prefix}{child_prefix}    ");
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}🏷️  {}: {}\n",
                meta_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs && !node.external_refs.is_empty() {
        let ref_prefix = format!("{prefix}{child_prefix}    ");
        for ext_ref in &node.external_refs {
            output.push_str(&format!(
                "{}└─→ {} {}\n",
                ref_prefix,
                ext_ref.icon(),
                ext_ref.style(options.no_color).apply_to(&ext_ref.path)
            ));
        }
    }

    let new_prefix = format!("{prefix}{child_prefix}");
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &new_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

/// Guess what a texture path is used for from its extension
pub fn detect_ref_type(path: &str) -> RefType {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with(".sph") || path_lower.ends_with(".spa") {
        RefType::Sphere
    } else if path_lower.starts_with("toon") && path_lower.ends_with(".bmp") {
        RefType::Toon
    } else if [".png", ".bmp", ".jpg", ".jpeg", ".tga", ".dds", ".tif", ".gif"]
        .iter()
        .any(|ext| path_lower.ends_with(ext))
    {
        RefType::Texture
    } else {
        RefType::Unknown
    }
}
