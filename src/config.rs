//! Swap options and their JSON representation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::DEFAULT_BLUR_FRACTION;
use crate::error::Result;

/// How the guidance field of the seamless clone is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneMode {
    /// Gradients of the pasted patch only.
    #[default]
    Normal,
    /// Per pixel edge, the stronger gradient of patch or destination.
    Mixed,
}

impl std::str::FromStr for CloneMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(CloneMode::Normal),
            "mixed" => Ok(CloneMode::Mixed),
            other => Err(format!("unknown clone mode '{other}' (expected normal or mixed)")),
        }
    }
}

/// Conjugate-gradient settings for the Poisson solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Stop once the residual norm drops below `tolerance * |b|`.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapOptions {
    /// Blur kernel size as a fraction of the interocular distance.
    pub blur_fraction: f64,
    pub color_correction: bool,
    pub clone_mode: CloneMode,
    pub solver: SolverOptions,
}

impl Default for SwapOptions {
    fn default() -> Self {
        Self {
            blur_fraction: DEFAULT_BLUR_FRACTION,
            color_correction: true,
            clone_mode: CloneMode::default(),
            solver: SolverOptions::default(),
        }
    }
}

/// Read options from a JSON file; missing fields take their defaults.
pub fn load_options(path: &Path) -> Result<SwapOptions> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let opts: SwapOptions =
            serde_json::from_str(r#"{"clone_mode":"mixed","solver":{"tolerance":1e-4}}"#).unwrap();
        assert_eq!(opts.clone_mode, CloneMode::Mixed);
        assert_eq!(opts.solver.tolerance, 1e-4);
        assert_eq!(opts.solver.max_iterations, 2000);
        assert_eq!(opts.blur_fraction, 0.4);
        assert!(opts.color_correction);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, r#"{"color_correction": false}"#).unwrap();

        let opts = load_options(&path).unwrap();
        assert!(!opts.color_correction);
        assert!(load_options(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn parse_clone_mode() {
        assert_eq!("Mixed".parse::<CloneMode>().unwrap(), CloneMode::Mixed);
        assert_eq!("normal".parse::<CloneMode>().unwrap(), CloneMode::Normal);
        assert!("feather".parse::<CloneMode>().is_err());
    }
}
