//! Material configuration loader.
//!
//! Loads restitution per surface kind, ball presets and solver settings from
//! YAML files, so bounce behaviour can be tuned without recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! materials/
//! ├── surfaces/
//! │   ├── floor.yaml
//! │   ├── wall.yaml
//! │   ├── edge.yaml
//! │   ├── rim.yaml
//! │   ├── hole_wall.yaml
//! │   └── hole_bottom.yaml
//! ├── balls/
//! │   └── standard.yaml
//! └── solver/
//!     └── default.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ColorId;

/// Error type for material loading operations.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Material not found: {0}")]
    NotFound(String),
    #[error("Invalid material {name}: {reason}")]
    Invalid { name: String, reason: String },
}

impl MaterialError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        MaterialError::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Surfaces
// =============================================================================

/// Every kind of surface the level builder emits. Each has its own
/// restitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Top of a floor or hole tile
    Floor,
    /// Raised walls between tiles
    Wall,
    /// Rounded rim and side of a floor edge over empty space
    Edge,
    /// Rounded rim around a hole
    Rim,
    /// Shaft of a hole
    HoleWall,
    /// Bottom of a goal hole
    HoleBottom,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 6] = [
        SurfaceKind::Floor,
        SurfaceKind::Wall,
        SurfaceKind::Edge,
        SurfaceKind::Rim,
        SurfaceKind::HoleWall,
        SurfaceKind::HoleBottom,
    ];

    /// File name (without extension) under `surfaces/`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            SurfaceKind::Floor => "floor",
            SurfaceKind::Wall => "wall",
            SurfaceKind::Edge => "edge",
            SurfaceKind::Rim => "rim",
            SurfaceKind::HoleWall => "hole_wall",
            SurfaceKind::HoleBottom => "hole_bottom",
        }
    }
}

/// Physical properties of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProperties {
    pub name: String,
    /// Fraction of normal speed kept after a bounce, in `[0, 1]`.
    pub restitution: f64,
}

impl SurfaceProperties {
    pub fn new(name: &str, restitution: f64) -> Self {
        Self {
            name: name.to_string(),
            restitution,
        }
    }

    pub fn validate(&self) -> Result<(), MaterialError> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(MaterialError::invalid(
                &self.name,
                format!("restitution {} outside [0, 1]", self.restitution),
            ));
        }
        Ok(())
    }
}

/// Restitution for every [`SurfaceKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTable {
    pub floor: SurfaceProperties,
    pub wall: SurfaceProperties,
    pub edge: SurfaceProperties,
    pub rim: SurfaceProperties,
    pub hole_wall: SurfaceProperties,
    pub hole_bottom: SurfaceProperties,
}

impl SurfaceTable {
    pub fn get(&self, kind: SurfaceKind) -> &SurfaceProperties {
        match kind {
            SurfaceKind::Floor => &self.floor,
            SurfaceKind::Wall => &self.wall,
            SurfaceKind::Edge => &self.edge,
            SurfaceKind::Rim => &self.rim,
            SurfaceKind::HoleWall => &self.hole_wall,
            SurfaceKind::HoleBottom => &self.hole_bottom,
        }
    }

    fn get_mut(&mut self, kind: SurfaceKind) -> &mut SurfaceProperties {
        match kind {
            SurfaceKind::Floor => &mut self.floor,
            SurfaceKind::Wall => &mut self.wall,
            SurfaceKind::Edge => &mut self.edge,
            SurfaceKind::Rim => &mut self.rim,
            SurfaceKind::HoleWall => &mut self.hole_wall,
            SurfaceKind::HoleBottom => &mut self.hole_bottom,
        }
    }

    pub fn restitution(&self, kind: SurfaceKind) -> f64 {
        self.get(kind).restitution
    }

    /// Same restitution everywhere; handy for tests.
    pub fn uniform(restitution: f64) -> Self {
        let mut table = Self::default();
        for kind in SurfaceKind::ALL {
            table.get_mut(kind).restitution = restitution;
        }
        table
    }
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self {
            floor: SurfaceProperties::new("floor", 0.5),
            wall: SurfaceProperties::new("wall", 0.5),
            edge: SurfaceProperties::new("edge", 0.5),
            rim: SurfaceProperties::new("rim", 0.5),
            hole_wall: SurfaceProperties::new("hole_wall", 0.3),
            hole_bottom: SurfaceProperties::new("hole_bottom", 0.2),
        }
    }
}

// =============================================================================
// Balls and solver
// =============================================================================

/// A ball preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallProperties {
    pub name: String,
    pub radius: f64,
    pub color: ColorId,
}

impl BallProperties {
    pub fn validate(&self) -> Result<(), MaterialError> {
        if !(self.radius >= 0.0 && self.radius.is_finite()) {
            return Err(MaterialError::invalid(
                &self.name,
                format!("radius {} must be finite and non-negative", self.radius),
            ));
        }
        Ok(())
    }
}

impl Default for BallProperties {
    fn default() -> Self {
        Self {
            name: "standard".to_string(),
            radius: 0.35,
            color: ColorId(0),
        }
    }
}

/// Tuning for the per-tick pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub name: String,
    /// Bounces resolved per ball per tick before the rest of the motion is
    /// dropped.
    pub max_iterations: usize,
    /// Downward acceleration, tiles per tick².
    pub gravity: f64,
    /// Largest horizontal acceleration the board tilt can produce.
    pub tilt_limit: f64,
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), MaterialError> {
        if self.max_iterations == 0 {
            return Err(MaterialError::invalid(&self.name, "max_iterations must be at least 1"));
        }
        if !(self.gravity.is_finite() && self.tilt_limit.is_finite() && self.tilt_limit >= 0.0) {
            return Err(MaterialError::invalid(
                &self.name,
                "gravity and tilt_limit must be finite, tilt_limit non-negative",
            ));
        }
        Ok(())
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_iterations: 10,
            gravity: 0.002,
            tilt_limit: 0.001,
        }
    }
}

/// Everything the simulation needs from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    pub surfaces: SurfaceTable,
    pub solver: SolverSettings,
}

impl Materials {
    /// Load the full surface table and the named solver settings.
    pub fn load(loader: &MaterialLoader, solver: &str) -> Result<Self, MaterialError> {
        Ok(Self {
            surfaces: loader.load_surface_table()?,
            solver: loader.load_solver(solver)?,
        })
    }

    pub fn validate(&self) -> Result<(), MaterialError> {
        for kind in SurfaceKind::ALL {
            self.surfaces.get(kind).validate()?;
        }
        self.solver.validate()
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Material loader with configurable base directory.
pub struct MaterialLoader {
    base_path: PathBuf,
}

impl MaterialLoader {
    /// Create a new loader with the given base path.
    ///
    /// The base path should contain `surfaces/`, `balls/` and `solver/`
    /// subdirectories.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a surface by kind.
    pub fn load_surface(&self, kind: SurfaceKind) -> Result<SurfaceProperties, MaterialError> {
        let props: SurfaceProperties = self.load_yaml("surfaces", kind.file_stem())?;
        props.validate()?;
        Ok(props)
    }

    /// Load every surface kind. All six files must exist.
    pub fn load_surface_table(&self) -> Result<SurfaceTable, MaterialError> {
        let mut table = SurfaceTable::default();
        for kind in SurfaceKind::ALL {
            *table.get_mut(kind) = self.load_surface(kind)?;
        }
        Ok(table)
    }

    /// Load a ball by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = MaterialLoader::new("materials");
    /// let ball = loader.load_ball("standard")?;
    /// ```
    pub fn load_ball(&self, name: &str) -> Result<BallProperties, MaterialError> {
        let props: BallProperties = self.load_yaml("balls", name)?;
        props.validate()?;
        Ok(props)
    }

    /// Load solver settings by name.
    pub fn load_solver(&self, name: &str) -> Result<SolverSettings, MaterialError> {
        let settings: SolverSettings = self.load_yaml("solver", name)?;
        settings.validate()?;
        Ok(settings)
    }

    /// List all available surfaces.
    pub fn list_surfaces(&self) -> Result<Vec<String>, MaterialError> {
        self.list_materials("surfaces")
    }

    /// List all available balls.
    pub fn list_balls(&self) -> Result<Vec<String>, MaterialError> {
        self.list_materials("balls")
    }

    fn load_yaml<T: DeserializeOwned>(&self, subdir: &str, name: &str) -> Result<T, MaterialError> {
        let path = self.base_path.join(subdir).join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(MaterialError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn list_materials(&self, subdir: &str) -> Result<Vec<String>, MaterialError> {
        let path = self.base_path.join(subdir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let file_name = entry?.file_name();
            if let Some(name) = file_name.to_string_lossy().strip_suffix(".yaml") {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn get_materials_path() -> PathBuf {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(manifest_dir).join("..").join("materials")
    }

    #[test]
    fn test_load_surface_table() {
        let loader = MaterialLoader::new(get_materials_path());
        let table = loader.load_surface_table();

        assert!(table.is_ok(), "Should load all surfaces: {:?}", table.err());
        let table = table.unwrap();
        for kind in SurfaceKind::ALL {
            let r = table.restitution(kind);
            assert!((0.0..=1.0).contains(&r), "{:?} restitution {}", kind, r);
        }
    }

    #[test]
    fn test_load_missing_ball() {
        let loader = MaterialLoader::new(get_materials_path());
        match loader.load_ball("nonexistent_ball_xyz") {
            Err(MaterialError::NotFound(name)) => assert_eq!(name, "nonexistent_ball_xyz"),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_ball() {
        let loader = MaterialLoader::new(get_materials_path());
        let ball = loader.load_ball("standard").expect("standard ball exists");
        assert!(ball.radius > 0.0);
    }

    #[test]
    fn test_load_solver() {
        let loader = MaterialLoader::new(get_materials_path());
        let solver = loader.load_solver("default").expect("default solver exists");
        assert_eq!(solver.max_iterations, 10);
        assert!(solver.gravity > 0.0);
    }

    #[test]
    fn test_list_balls() {
        let loader = MaterialLoader::new(get_materials_path());
        let balls = loader.list_balls().unwrap();
        assert!(balls.contains(&"standard".to_string()));
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let loader = MaterialLoader::new("/definitely/not/here");
        assert!(loader.list_surfaces().unwrap().is_empty());
    }

    #[test]
    fn test_materials_bundle() {
        let loader = MaterialLoader::new(get_materials_path());
        let materials = Materials::load(&loader, "default").expect("bundle loads");
        assert_eq!(materials.solver.name, "default");
    }

    #[test]
    fn test_invalid_restitution_rejected() {
        let bad = SurfaceProperties::new("trampoline", 1.5);
        assert!(matches!(bad.validate(), Err(MaterialError::Invalid { .. })));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let settings = SolverSettings {
            max_iterations: 0,
            ..SolverSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_surface_kind() {
        let yaml = serde_yaml::to_string(&SurfaceKind::HoleBottom).unwrap();
        assert_eq!(yaml.trim(), "hole_bottom");
    }

    #[test]
    fn test_uniform_table() {
        let table = SurfaceTable::uniform(0.9);
        assert!(SurfaceKind::ALL.iter().all(|k| table.restitution(*k) == 0.9));
    }

    #[test]
    fn test_bundle_validation() {
        assert!(Materials::default().validate().is_ok());
        let bouncy = Materials {
            surfaces: SurfaceTable::uniform(2.0),
            ..Materials::default()
        };
        assert!(bouncy.validate().is_err());
    }
}
