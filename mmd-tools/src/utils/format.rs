//! Formatting utilities

use glam::Vec3;
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a vector with a fixed number of decimals
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// Format a first/last frame pair
pub fn format_frame_range(range: Option<(u32, u32)>) -> String {
    match range {
        Some((first, last)) => format!("{first}..={last}"),
        None => "empty".to_string(),
    }
}

/// Local name followed by the English name when one is set
pub fn format_names(name: &str, name_en: &str) -> String {
    if name_en.is_empty() || name_en == name {
        name.to_string()
    } else {
        format!("{name} ({name_en})")
    }
}
