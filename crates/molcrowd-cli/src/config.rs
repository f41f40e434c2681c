use crate::error::{CliError, Result};
use molcrowd::engine::crowding::{CrowdingParams, GAS_CONSTANT_KJ_MOL_K};
use molcrowd::workflows::crowd::{CrowderSpec, CrowdingConfig, Subject};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A crowding scenario as described in a TOML file.
///
/// Subjects are synthesised as spherical vertex shells here; a production
/// caller would feed real mesh vertices to the workflow instead.
#[derive(Debug, Deserialize)]
pub struct RunSpec {
    pub arena: ArenaSpec,
    #[serde(default, rename = "subject")]
    pub subjects: Vec<SubjectSpec>,
    #[serde(default, rename = "crowder")]
    pub crowders: Vec<CrowderSpec>,
    #[serde(default)]
    pub mc: McSpec,
}

#[derive(Debug, Deserialize)]
pub struct ArenaSpec {
    pub radius: f64,
    #[serde(default)]
    pub centre: [f64; 3],
    pub grain_radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectSpec {
    /// Occupancy kind; defaults to `1 + subject index`.
    pub kind: Option<i32>,
    #[serde(default)]
    pub centre: [f64; 3],
    pub radius: f64,
    /// Number of shell vertices standing in for the body's surface mesh.
    #[serde(default = "default_vertex_count")]
    pub vertices: usize,
}

fn default_vertex_count() -> usize {
    64
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct McSpec {
    pub rt: f64,
    pub iterations: Option<usize>,
    pub warmup: Option<usize>,
    pub rotate: bool,
    pub seed: u64,
}

impl Default for McSpec {
    fn default() -> Self {
        Self {
            rt: GAS_CONSTANT_KJ_MOL_K * 300.0,
            iterations: None,
            warmup: None,
            rotate: true,
            seed: 1,
        }
    }
}

impl RunSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CliError::Scenario {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&text).map_err(|e| CliError::Scenario {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Splits the scenario into the core workflow inputs and the RNG seed.
    pub fn into_parts(self) -> (CrowdingConfig, Vec<Subject>, u64) {
        let subjects = self
            .subjects
            .iter()
            .enumerate()
            .map(|(i, spec)| Subject {
                id: i as u32,
                kind: spec.kind.unwrap_or(1 + i as i32),
                vertices: fibonacci_sphere(spec.centre.into(), spec.radius, spec.vertices),
            })
            .collect();

        let config = CrowdingConfig {
            arena_radius: self.arena.radius,
            centre: self.arena.centre.into(),
            grain_radius: self.arena.grain_radius,
            crowders: self.crowders,
            mc: CrowdingParams {
                rt: self.mc.rt,
                iterations: self.mc.iterations,
                warmup: self.mc.warmup,
                rotate_crowders: self.mc.rotate,
            },
        };
        (config, subjects, self.mc.seed)
    }
}

/// Evenly distributed points on a sphere by the golden-angle spiral.
pub fn fibonacci_sphere(centre: Point3<f64>, radius: f64, count: usize) -> Vec<Point3<f64>> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
            let ring = (1.0 - y * y).sqrt();
            let theta = golden_angle * i as f64;
            centre + Vector3::new(ring * theta.cos(), y, ring * theta.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use molcrowd::workflows::crowd::Population;

    const SAMPLE: &str = r#"
[arena]
radius = 10.0
centre = [1.0, 0.0, -1.0]

[[subject]]
centre = [0.0, 0.0, 0.0]
radius = 2.0
vertices = 32

[[subject]]
kind = 5
centre = [4.0, 0.0, 0.0]
radius = 1.5

[[crowder]]
proportion = 0.2
radius = 1.0

[[crowder]]
count = 3

[mc]
rt = 2.494
iterations = 100
rotate = false
seed = 7
"#;

    #[test]
    fn sample_scenario_parses_into_workflow_inputs() {
        let spec: RunSpec = toml::from_str(SAMPLE).unwrap();
        let (config, subjects, seed) = spec.into_parts();

        assert_eq!(seed, 7);
        assert_eq!(config.arena_radius, 10.0);
        assert_eq!(config.centre, Point3::new(1.0, 0.0, -1.0));
        assert!(config.grain_radius.is_none());
        assert_eq!(config.mc.iterations, Some(100));
        assert!(!config.mc.rotate_crowders);

        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].kind, 1);
        assert_eq!(subjects[0].vertices.len(), 32);
        assert_eq!(subjects[1].kind, 5);
        assert_eq!(subjects[1].vertices.len(), 64);

        assert_eq!(config.crowders.len(), 2);
        assert!(matches!(
            config.crowders[0].population,
            Population::Proportion { proportion } if proportion == 0.2
        ));
        assert!(matches!(
            config.crowders[1].population,
            Population::Count { count: 3 }
        ));
    }

    #[test]
    fn mc_section_is_optional_with_sane_defaults() {
        let spec: RunSpec = toml::from_str("[arena]\nradius = 5.0\n").unwrap();
        let (config, subjects, seed) = spec.into_parts();

        assert!(subjects.is_empty());
        assert_eq!(seed, 1);
        assert!((config.mc.rt - GAS_CONSTANT_KJ_MOL_K * 300.0).abs() < 1e-12);
        assert!(config.mc.rotate_crowders);
        assert_eq!(config.centre, Point3::origin());
    }

    #[test]
    fn fibonacci_shell_sits_on_the_requested_sphere() {
        let centre = Point3::new(1.0, 2.0, 3.0);
        let shell = fibonacci_sphere(centre, 2.5, 48);
        assert_eq!(shell.len(), 48);
        for p in &shell {
            assert!(((p - centre).norm() - 2.5).abs() < 1e-9);
        }
        // not degenerate: points spread over both hemispheres
        assert!(shell.iter().any(|p| p.y > centre.y + 1.0));
        assert!(shell.iter().any(|p| p.y < centre.y - 1.0));
    }
}
