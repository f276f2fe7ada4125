// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geometric primitives for culling.
//!
//! The renderer uses these to decide which render items are visible from a
//! camera and which ones fall inside a light's shadow volume.

use super::{Mat4, Vec3, Vec4};

/// An Axis-Aligned Bounding Box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box; merging anything into it yields that thing.
    pub const INVALID: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Creates a box from two corners, in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box from a center and half-extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The tightest box around `points`, or `None` when there are none.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::from_min_max(*first, *first), |aabb, p| {
            aabb.merged_with_point(*p)
        }))
    }

    /// The center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size on each axis.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// `min <= max` on all axes. Degenerate boxes are valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Whether the two boxes overlap. Touching boxes intersect.
    #[inline]
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Whether a sphere touches this box.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// A box enclosing this box and `point`.
    #[inline]
    pub fn merged_with_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// The box enclosing this box after an affine transformation.
    ///
    /// Projects the extents onto the transformed axes instead of transforming
    /// all eight corners.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center());
        let half = self.half_extents();
        let extent = matrix.x_axis.truncate().abs() * half.x
            + matrix.y_axis.truncate().abs() * half.y
            + matrix.z_axis.truncate().abs() * half.z;
        Self::from_center_half_extents(center, extent)
    }
}

impl Default for Aabb {
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

/// A plane `dot(normal, p) + d = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing to the inside half-space.
    pub normal: Vec3,
    /// Signed distance term.
    pub d: f32,
}

impl Plane {
    /// Builds a plane from raw coefficients and normalizes it.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.truncate();
        let length = normal.length();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::ZERO,
                d: coefficients.w,
            };
        }
        Self {
            normal: normal / length,
            d: coefficients.w / length,
        }
    }

    /// Signed distance from the plane; positive on the inside.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// The bounding planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes from a view-projection matrix with a `[0, 1]`
    /// depth range.
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Conservative box test: `false` only if the box lies fully outside one
    /// plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            plane.signed_distance(positive) >= 0.0
        })
    }

    /// Whether a point lies inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(0.5))
    }

    #[test]
    fn test_aabb_from_min_max_orders_corners() {
        let aabb = Aabb::from_min_max(Vec3::new(4.0, 5.0, 6.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 5.0, 6.0));
        assert!(aabb.is_valid());
        assert!(!Aabb::INVALID.is_valid());
    }

    #[test]
    fn test_aabb_from_points() {
        assert!(Aabb::from_points(&[]).is_none());
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, 5.0, -1.0),
            Vec3::new(0.0, 2.0, 3.0),
            Vec3::new(4.0, 8.0, 0.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(0.0, 2.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 8.0, 3.0));
    }

    #[test]
    fn test_aabb_transformed_by_translation_and_rotation() {
        let aabb = unit_box_at(Vec3::ZERO);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(moved.center().x, 10.0);

        let rotated =
            aabb.transformed(&Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let expected = 0.5 * std::f32::consts::SQRT_2;
        assert_relative_eq!(rotated.max.x, expected, epsilon = 1e-5);
        assert_relative_eq!(rotated.max.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_aabb_intersections() {
        let a = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(2.0));
        assert!(a.intersects_aabb(&Aabb::from_min_max(Vec3::splat(2.0), Vec3::splat(3.0))));
        assert!(!a.intersects_aabb(&Aabb::from_min_max(Vec3::splat(2.1), Vec3::splat(3.0))));
        assert!(a.intersects_sphere(Vec3::new(3.0, 1.0, 1.0), 1.0));
        assert!(!a.intersects_sphere(Vec3::new(3.5, 1.0, 1.0), 1.0));
        assert_eq!(a.corners().len(), 8);
    }

    #[test]
    fn test_frustum_culls_boxes_behind_camera() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(&(proj * view));

        assert!(frustum.intersects_aabb(&unit_box_at(Vec3::ZERO)));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(0.0, 0.0, 10.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(50.0, 0.0, 0.0))));
        assert!(frustum.contains_point(Vec3::ZERO));
    }

    #[test]
    fn test_orthographic_frustum() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 20.0);
        let frustum = Frustum::from_view_projection(&(proj * view));

        assert!(frustum.intersects_aabb(&unit_box_at(Vec3::new(4.0, 0.0, 4.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(8.0, 0.0, 0.0))));
    }
}
