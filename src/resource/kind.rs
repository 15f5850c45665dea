//! Resource kinds keyed by file extension.

use std::fmt;
use std::path::Path;

use crate::container::ContainerFamily;

/// Closed set of supported resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Terrain albedo atlas.
    Xtt,
    /// Terrain mesh, ambient occlusion and opacity.
    Xtd,
    /// Generic mesh.
    Ugx,
    /// Scenario.
    Scn,
    /// Scenario.
    Sc2,
    /// Scenario.
    Sc3,
    /// Scenario lighting.
    Gls,
    /// Visual representation manifest.
    Vis,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        Self::Xtt,
        Self::Xtd,
        Self::Ugx,
        Self::Scn,
        Self::Sc2,
        Self::Sc3,
        Self::Gls,
        Self::Vis,
    ];

    /// Kind for a file extension (without the dot), case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.extension().eq_ignore_ascii_case(ext))
    }

    /// Kind for a path, from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Lowercase extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xtt => "xtt",
            Self::Xtd => "xtd",
            Self::Ugx => "ugx",
            Self::Scn => "scn",
            Self::Sc2 => "sc2",
            Self::Sc3 => "sc3",
            Self::Gls => "gls",
            Self::Vis => "vis",
        }
    }

    /// Container family for binary kinds; `None` for XML kinds.
    pub fn container_family(self) -> Option<ContainerFamily> {
        match self {
            Self::Xtt => Some(ContainerFamily::TerrainTexture),
            Self::Xtd => Some(ContainerFamily::TerrainData),
            Self::Ugx => Some(ContainerFamily::Mesh),
            _ => None,
        }
    }

    /// Check if this kind is stored as XML.
    #[inline]
    pub fn is_xml(self) -> bool {
        self.container_family().is_none()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(ResourceKind::from_extension("XTD"), Some(ResourceKind::Xtd));
        assert_eq!(ResourceKind::from_extension("gls"), Some(ResourceKind::Gls));
        assert_eq!(ResourceKind::from_extension("png"), None);
        assert_eq!(ResourceKind::from_path("art/unit/tank.Ugx"), Some(ResourceKind::Ugx));
        assert_eq!(ResourceKind::from_path("art/unit/tank"), None);
    }

    #[test]
    fn test_families() {
        assert_eq!(ResourceKind::Xtt.container_family(), Some(ContainerFamily::TerrainTexture));
        assert!(ResourceKind::Scn.is_xml());
        assert!(!ResourceKind::Ugx.is_xml());
        assert_eq!(ResourceKind::Sc3.to_string(), "sc3");
    }
}
