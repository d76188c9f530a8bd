//! Core traits for orbitview

use crate::math::Point3f;
use crate::mesh::Asset;

/// Trait for objects with spatial extent that a camera can frame
pub trait Drawable {
    /// Get the axis-aligned bounding box as `(min, max)`
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }

    /// Radius of the sphere around [`Drawable::center`] enclosing the box
    fn bounding_radius(&self) -> f32 {
        let (min, max) = self.bounding_box();
        (max - min).norm() * 0.5
    }
}

impl Drawable for Asset {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let mut vertices = self.vertices().iter();
        let Some(first) = vertices.next() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = first.position;
        let mut max = first.position;
        for vertex in vertices {
            min = min.inf(&vertex.position);
            max = max.sup(&vertex.position);
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_asset_bounds() {
        let positions = vec![
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(3.0, -2.0, 0.0),
            Point3f::new(0.0, 4.0, 1.0),
        ];
        let asset = Asset::from_positions("tri", positions, vec![0, 1, 2]).unwrap();
        let (min, max) = asset.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));
        assert_relative_eq!(asset.center(), Point3f::new(1.0, 1.0, 1.0));
        assert!(asset.bounding_radius() > 3.0);
    }

    #[test]
    fn test_empty_asset_bounds() {
        let asset = Asset::new("empty", Vec::new(), Vec::new()).unwrap();
        assert_eq!(asset.bounding_box(), (Point3f::origin(), Point3f::origin()));
        assert_eq!(asset.bounding_radius(), 0.0);
    }
}
