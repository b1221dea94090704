use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::{Vec3, Vec4};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Fixed shading and camera constants used by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub light_position: Vec3,
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub clear_color: Vec4,
    /// How far the camera is pulled back along +Z.
    pub camera_distance: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Ambient spin around Y in radians per second.
    pub spin_rate: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            light_position: Vec3::new(5.0, 5.0, 5.0),
            base_color: Vec4::new(0.2, 0.6, 0.9, 1.0),
            metallic: 0.6,
            roughness: 0.35,
            clear_color: Vec4::new(0.05, 0.06, 0.08, 1.0),
            camera_distance: 5.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            spin_rate: 0.1,
        }
    }
}

impl ViewerConfig {
    /// Parses a `<viewer>` document. Missing elements keep their defaults.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid viewer XML")?;
        let root = document.root_element();
        if !root.has_tag_name("viewer") {
            bail!("expected <viewer> root, found <{}>", root.tag_name().name());
        }

        let defaults = Self::default();
        let config = Self {
            light_position: parse_vec3(&root, "light", defaults.light_position)?,
            base_color: parse_vec4(&root, "color", defaults.base_color)?,
            metallic: parse_f32(&root, "metallic", defaults.metallic)?,
            roughness: parse_f32(&root, "roughness", defaults.roughness)?,
            clear_color: parse_vec4(&root, "clear", defaults.clear_color)?,
            camera_distance: parse_f32(&root, "distance", defaults.camera_distance)?,
            fov_degrees: parse_f32(&root, "fov", defaults.fov_degrees)?,
            near: parse_f32(&root, "near", defaults.near)?,
            far: parse_f32(&root, "far", defaults.far)?,
            spin_rate: parse_f32(&root, "spin", defaults.spin_rate)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_xml(&xml).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Rejects projections the perspective matrix is undefined for.
    pub fn validate(&self) -> Result<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            bail!("fov must be between 0 and 180 degrees, got {}", self.fov_degrees);
        }
        if self.near <= 0.0 {
            bail!("near plane must be positive, got {}", self.near);
        }
        if self.far <= self.near {
            bail!("far plane ({}) must lie beyond near plane ({})", self.far, self.near);
        }
        Ok(())
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }
}

fn optional_text<'a>(node: &Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn parse_components<const N: usize>(node: &Node<'_, '_>, tag: &str) -> Result<Option<[f32; N]>> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(None);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .with_context(|| format!("<{tag}> has a malformed number `{component}`"))
        })
        .collect::<Result<Vec<_>>>()?;
    let components: [f32; N] = numbers
        .try_into()
        .map_err(|found: Vec<f32>| anyhow!("<{tag}> needs {N} numbers, found {}", found.len()))?;
    Ok(Some(components))
}

fn parse_vec3(node: &Node<'_, '_>, tag: &str, default: Vec3) -> Result<Vec3> {
    Ok(parse_components::<3>(node, tag)?.map_or(default, Vec3::from_array))
}

fn parse_vec4(node: &Node<'_, '_>, tag: &str, default: Vec4) -> Result<Vec4> {
    Ok(parse_components::<4>(node, tag)?.map_or(default, Vec4::from_array))
}

fn parse_f32(node: &Node<'_, '_>, tag: &str, default: f32) -> Result<f32> {
    Ok(parse_components::<1>(node, tag)?.map_or(default, |[value]| value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_elements_keep_defaults() {
        let config = ViewerConfig::from_xml(
            r#"
            <viewer>
                <light>1 2 3</light>
                <roughness>0.8</roughness>
            </viewer>
            "#,
        )
        .unwrap();
        assert_eq!(config.light_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.roughness, 0.8);
        assert_eq!(config.metallic, ViewerConfig::default().metallic);
        assert_eq!(config.base_color, ViewerConfig::default().base_color);
    }

    #[test]
    fn colors_take_four_components() {
        let config =
            ViewerConfig::from_xml("<viewer><color>1 0 0 0.5</color></viewer>").unwrap();
        assert_eq!(config.base_color, Vec4::new(1.0, 0.0, 0.0, 0.5));
        assert!(ViewerConfig::from_xml("<viewer><color>1 0 0</color></viewer>").is_err());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = ViewerConfig::from_xml("<viewer><metallic>shiny</metallic></viewer>")
            .unwrap_err();
        assert!(format!("{err:#}").contains("metallic"));
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        assert!(ViewerConfig::from_xml("<viewer><near>10</near><far>1</far></viewer>").is_err());
        assert!(ViewerConfig::from_xml("<viewer><fov>180</fov></viewer>").is_err());
    }

    #[test]
    fn rejects_other_roots() {
        assert!(ViewerConfig::from_xml("<scene/>").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<viewer><spin>0.5</spin></viewer>").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.spin_rate, 0.5);
    }
}
