use crate::engine::config::GridConfig;
use crate::engine::error::EngineError;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// An axis-aligned search volume for a docking engine.
///
/// Derived fresh for every docking call from the pocket center and, when
/// available, the ligand geometry; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBox {
    /// Box center, Angstroms.
    pub center: Point3<f64>,
    /// Edge lengths, Angstroms.
    pub size: Vector3<f64>,
}

impl GridBox {
    /// Renders the box as the `--center_* --size_*` argument vector the
    /// Vina-family engines expect.
    pub fn to_engine_args(&self) -> Vec<String> {
        vec![
            "--center_x".to_string(),
            self.center.x.to_string(),
            "--center_y".to_string(),
            self.center.y.to_string(),
            "--center_z".to_string(),
            self.center.z.to_string(),
            "--size_x".to_string(),
            self.size.x.to_string(),
            "--size_y".to_string(),
            self.size.y.to_string(),
            "--size_z".to_string(),
            self.size.z.to_string(),
        ]
    }
}

/// Computes the search volume around `center`.
///
/// With ligand geometry, each edge is the ligand extent along that axis plus
/// buffer on both sides; without it, the configured default edge is used. Every
/// edge is clamped into `[config.min_size, config.max_size]` afterward.
///
/// A non-finite center coordinate is an input error, never coerced.
pub fn compute_box(
    center: Point3<f64>,
    ligand: Option<&[Point3<f64>]>,
    config: &GridConfig,
) -> Result<GridBox, EngineError> {
    if !(center.x.is_finite() && center.y.is_finite() && center.z.is_finite()) {
        return Err(EngineError::InvalidGeometry(format!(
            "grid box center has non-finite coordinates: ({}, {}, {})",
            center.x, center.y, center.z
        )));
    }

    let size = match ligand {
        Some(points) if !points.is_empty() => {
            if points
                .iter()
                .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
            {
                return Err(EngineError::InvalidGeometry(
                    "ligand geometry contains non-finite coordinates".to_string(),
                ));
            }
            let extent = ligand_extent(points);
            Vector3::new(
                extent.x + 2.0 * config.buffer,
                extent.y + 2.0 * config.buffer,
                extent.z + 2.0 * config.buffer,
            )
        }
        _ => Vector3::new(config.default_size, config.default_size, config.default_size),
    };

    let clamped = size.map(|edge| edge.clamp(config.min_size, config.max_size));
    if clamped != size {
        debug!(
            "Grid box clamped from ({:.1}, {:.1}, {:.1}) to ({:.1}, {:.1}, {:.1}) A",
            size.x, size.y, size.z, clamped.x, clamped.y, clamped.z
        );
    }

    Ok(GridBox {
        center,
        size: clamped,
    })
}

/// Per-axis extent (max - min) of a non-empty point set.
fn ligand_extent(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut min = points[0];
    let mut max = points[0];
    for p in points.iter().skip(1) {
        min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{DEFAULT_BOX_SIZE, MAX_BOX_SIZE, MIN_BOX_SIZE};

    fn ligand_with_extent(x: f64, y: f64, z: f64) -> Vec<Point3<f64>> {
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(x, y, z)]
    }

    #[test]
    fn size_is_extent_plus_buffer_on_both_sides() {
        let config = GridConfig {
            buffer: 15.0,
            ..GridConfig::default()
        };
        let ligand = ligand_with_extent(8.0, 10.0, 12.0);
        let grid = compute_box(Point3::new(1.0, 2.0, 3.0), Some(&ligand), &config).unwrap();

        assert!((grid.size.x - 38.0).abs() < 1e-9);
        assert!((grid.size.y - 40.0).abs() < 1e-9);
        assert!((grid.size.z - 42.0).abs() < 1e-9);
        assert_eq!(grid.center, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn size_is_clamped_to_configured_bounds() {
        let config = GridConfig::default();

        // Tiny ligand with zero buffer would undershoot the minimum.
        let tight = GridConfig {
            buffer: 0.0,
            ..GridConfig::default()
        };
        let small = ligand_with_extent(2.0, 2.0, 2.0);
        let grid = compute_box(Point3::origin(), Some(&small), &tight).unwrap();
        assert_eq!(grid.size, nalgebra::Vector3::new(MIN_BOX_SIZE, MIN_BOX_SIZE, MIN_BOX_SIZE));

        // Long flexible ligand overshoots the maximum.
        let large = ligand_with_extent(80.0, 5.0, 5.0);
        let grid = compute_box(Point3::origin(), Some(&large), &config).unwrap();
        assert!((grid.size.x - MAX_BOX_SIZE).abs() < 1e-9);
        assert!((grid.size.y - 35.0).abs() < 1e-9);
    }

    #[test]
    fn missing_ligand_falls_back_to_default_size() {
        let config = GridConfig::default();
        let grid = compute_box(Point3::new(4.0, 5.0, 6.0), None, &config).unwrap();
        assert_eq!(
            grid.size,
            nalgebra::Vector3::new(DEFAULT_BOX_SIZE, DEFAULT_BOX_SIZE, DEFAULT_BOX_SIZE)
        );

        let grid = compute_box(Point3::origin(), Some(&[]), &config).unwrap();
        assert_eq!(grid.size.x, DEFAULT_BOX_SIZE);
    }

    #[test]
    fn non_finite_center_is_rejected() {
        let config = GridConfig::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = compute_box(Point3::new(bad, 0.0, 0.0), None, &config);
            assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
        }
    }

    #[test]
    fn non_finite_ligand_coordinates_are_rejected() {
        let config = GridConfig::default();
        let ligand = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(f64::NAN, 1.0, 1.0)];
        let result = compute_box(Point3::origin(), Some(&ligand), &config);
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn engine_args_cover_center_and_size() {
        let grid = GridBox {
            center: Point3::new(1.5, -2.0, 3.0),
            size: Vector3::new(20.0, 22.0, 24.0),
        };
        let args = grid.to_engine_args();
        assert_eq!(args.len(), 12);
        assert_eq!(args[0], "--center_x");
        assert_eq!(args[1], "1.5");
        assert_eq!(args[6], "--size_x");
        assert_eq!(args[7], "20");
    }
}
