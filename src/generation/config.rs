//! Hyper tree grid source configuration.

use std::path::Path;

use glam::{DVec3, UVec3};
use serde::{Deserialize, Serialize};

use crate::core::{Branching, Error, Result};

/// Everything needed to generate a hyper tree grid from a descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Number of refined axes (1..=3)
    pub dimension: u32,
    /// Children per refined axis
    pub branch_factor: u32,
    /// Upper bound on tree depth; values below 1 act as 1
    pub max_level: u32,
    /// Root cells per axis
    pub grid_size: UVec3,
    /// Spacing between root cell boundaries per axis
    pub grid_scale: DVec3,
    /// Level-by-level refinement descriptor
    pub descriptor: String,
    /// Material mask aligned with the descriptor, read only when
    /// `use_material_mask` is set
    pub material_mask: String,
    pub use_material_mask: bool,
    /// Expose the dual grid downstream
    pub dual: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dimension: 3,
            branch_factor: 2,
            max_level: 1,
            grid_size: UVec3::ONE,
            grid_scale: DVec3::ONE,
            descriptor: ".".to_string(),
            material_mask: "0".to_string(),
            use_material_mask: false,
            dual: false,
        }
    }
}

impl SourceConfig {
    pub fn branching(&self) -> Branching {
        Branching::new(self.dimension, self.branch_factor)
    }

    /// Number of root trees (product of the grid size).
    pub fn root_tree_count(&self) -> usize {
        self.grid_size.x as usize * self.grid_size.y as usize * self.grid_size.z as usize
    }

    /// Maximum depth as requested, clamped to at least one level.
    pub fn requested_depth(&self) -> usize {
        self.max_level.max(1) as usize
    }

    /// The material mask, if masking is enabled.
    pub fn material_mask(&self) -> Option<&str> {
        self.use_material_mask.then_some(self.material_mask.as_str())
    }

    /// Check the forest shape; the descriptor itself is validated when parsed.
    pub fn validate(&self) -> Result<()> {
        self.branching().validate()?;
        if !self.grid_scale.is_finite() {
            return Err(Error::Config(format!("grid scale {} is not finite", self.grid_scale)));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SourceConfig::default();
        assert_eq!(cfg.dimension, 3);
        assert_eq!(cfg.branch_factor, 2);
        assert_eq!(cfg.max_level, 1);
        assert_eq!(cfg.root_tree_count(), 1);
        assert_eq!(cfg.descriptor, ".");
        assert_eq!(cfg.material_mask(), None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_material_mask_follows_flag() {
        let cfg = SourceConfig { use_material_mask: true, ..Default::default() };
        assert_eq!(cfg.material_mask(), Some("0"));
    }

    #[test]
    fn test_requested_depth_clamped() {
        let cfg = SourceConfig { max_level: 0, ..Default::default() };
        assert_eq!(cfg.requested_depth(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_shape() {
        let cfg = SourceConfig { dimension: 4, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = SourceConfig { branch_factor: 1, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = SourceConfig { branch_factor: u32::MAX, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = SourceConfig { grid_scale: DVec3::new(1.0, f64::NAN, 1.0), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = SourceConfig::from_json(
            r#"{ "dimension": 2, "grid_size": [3, 2, 1], "descriptor": "R.....|...." }"#,
        )
        .unwrap();
        assert_eq!(cfg.dimension, 2);
        assert_eq!(cfg.grid_size, UVec3::new(3, 2, 1));
        assert_eq!(cfg.branch_factor, 2);
        assert_eq!(cfg.grid_scale, DVec3::ONE);
        assert!(!cfg.use_material_mask);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(SourceConfig::from_json("{ not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("source.json");
        let cfg = SourceConfig {
            grid_size: UVec3::new(2, 3, 1),
            grid_scale: DVec3::new(1.5, 1.0, 0.5),
            max_level: 4,
            descriptor: "R.....|........".to_string(),
            ..Default::default()
        };
        cfg.save(&path).unwrap();
        let loaded = SourceConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
