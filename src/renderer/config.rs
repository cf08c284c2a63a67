use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::str::FromStr;

/// Which mesh and vertex layout the renderer builds. Chosen once at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GeometryVariant {
    /// Box with position and color interleaved in one stream
    Interleaved,
    /// Box with separate position and color streams
    #[default]
    Split,
    /// Pyramid with separate position and color streams
    Pyramid,
    /// Box and pyramid sharing one buffer pair
    Combined,
    /// Box with interleaved position and a packed 32-bit color
    PackedColor,
}

impl FromStr for GeometryVariant {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interleaved" => Ok(Self::Interleaved),
            "split" => Ok(Self::Split),
            "pyramid" => Ok(Self::Pyramid),
            "combined" => Ok(Self::Combined),
            "packed" | "packed-color" => Ok(Self::PackedColor),
            other => Err(eyre!("Unknown geometry variant: {other:?}")),
        }
    }
}

/// How the index buffer is assembled into primitives
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    LineStrip,
}

impl FromStr for Topology {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "triangle-list" | "triangles" => Ok(Self::TriangleList),
            "triangle-strip" => Ok(Self::TriangleStrip),
            "line-list" | "lines" => Ok(Self::LineList),
            "line-strip" => Ok(Self::LineStrip),
            other => Err(eyre!("Unknown topology: {other:?}")),
        }
    }
}

/// Contains configuration options for the renderer like vsync and the geometry variant
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub vsync: bool,
    pub geometry: GeometryVariant,
    pub msaa_4x: bool,
    pub wireframe: bool,
    pub cull_back: bool,
    pub topology: Topology,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            geometry: GeometryVariant::default(),
            msaa_4x: false,
            wireframe: false,
            cull_back: true,
            topology: Topology::default(),
        }
    }
}

impl RenderConfig {
    pub const GEOMETRY_VAR: &'static str = "BOXDRAW_GEOMETRY";
    pub const VSYNC_VAR: &'static str = "BOXDRAW_VSYNC";
    pub const MSAA_VAR: &'static str = "BOXDRAW_MSAA";
    pub const WIREFRAME_VAR: &'static str = "BOXDRAW_WIREFRAME";
    pub const CULL_VAR: &'static str = "BOXDRAW_CULL";
    pub const TOPOLOGY_VAR: &'static str = "BOXDRAW_TOPOLOGY";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source, falling back to defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::GEOMETRY_VAR) {
            config.geometry = value.parse()?;
        }
        if let Some(value) = lookup(Self::VSYNC_VAR) {
            config.vsync = parse_flag(Self::VSYNC_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::MSAA_VAR) {
            config.msaa_4x = parse_flag(Self::MSAA_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::WIREFRAME_VAR) {
            config.wireframe = parse_flag(Self::WIREFRAME_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::CULL_VAR) {
            config.cull_back = parse_flag(Self::CULL_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::TOPOLOGY_VAR) {
            config.topology = value.parse()?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(eyre!("{key} expects a boolean, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<RenderConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RenderConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.geometry, GeometryVariant::Split);
        assert!(config.cull_back);
        assert!(!config.msaa_4x);
        assert_eq!(config.topology, Topology::TriangleList);
    }

    #[test]
    fn reads_every_key() {
        let config = config_from(&[
            (RenderConfig::GEOMETRY_VAR, "Combined"),
            (RenderConfig::VSYNC_VAR, "off"),
            (RenderConfig::MSAA_VAR, "1"),
            (RenderConfig::WIREFRAME_VAR, "yes"),
            (RenderConfig::CULL_VAR, "false"),
            (RenderConfig::TOPOLOGY_VAR, "line-strip"),
        ])
        .unwrap();
        assert_eq!(config.geometry, GeometryVariant::Combined);
        assert!(!config.vsync);
        assert!(config.msaa_4x);
        assert!(config.wireframe);
        assert!(!config.cull_back);
        assert_eq!(config.topology, Topology::LineStrip);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(config_from(&[(RenderConfig::GEOMETRY_VAR, "teapot")]).is_err());
        assert!(config_from(&[(RenderConfig::MSAA_VAR, "maybe")]).is_err());
        assert!(config_from(&[(RenderConfig::TOPOLOGY_VAR, "points")]).is_err());
    }

    #[test]
    fn packed_variant_has_two_spellings() {
        assert_eq!("packed".parse::<GeometryVariant>().unwrap(), GeometryVariant::PackedColor);
        assert_eq!(" Packed-Color ".parse::<GeometryVariant>().unwrap(), GeometryVariant::PackedColor);
    }

    #[test]
    fn topology_spellings() {
        assert_eq!("TRIANGLE_STRIP".parse::<Topology>().unwrap(), Topology::TriangleStrip);
        assert_eq!("line-list".parse::<Topology>().unwrap(), Topology::LineList);
        assert_eq!(" lines ".parse::<Topology>().unwrap(), Topology::LineList);
    }
}
