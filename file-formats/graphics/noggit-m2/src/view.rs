//! Camera state, culling and picking

use glam::{Mat4, Vec3, Vec4};

use crate::animation::BillboardBasis;

/// Six clip planes, normals pointing inward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of a combined projection * view matrix
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let x = view_projection.row(0);
        let y = view_projection.row(1);
        let z = view_projection.row(2);
        let w = view_projection.row(3);

        let planes = [w + x, w - x, w + y, w - y, w + z, w - z].map(|plane| {
            let length = plane.truncate().length();
            if length > 0.0 { plane / length } else { plane }
        });
        Self { planes }
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

/// Per-frame camera inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub camera_position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub frustum: Frustum,
    pub cull_distance: f32,
    /// Monotonic frame counter
    pub frame: u64,
}

impl ViewState {
    pub fn new(
        camera_position: Vec3,
        view: Mat4,
        projection: Mat4,
        cull_distance: f32,
        frame: u64,
    ) -> Self {
        Self {
            camera_position,
            view,
            projection,
            frustum: Frustum::from_matrix(&(projection * view)),
            cull_distance,
            frame,
        }
    }

    /// Camera axes in world space
    pub fn billboard_basis(&self) -> BillboardBasis {
        BillboardBasis::from_view(&self.view)
    }

    /// Camera axes in the local space of `transform`
    pub fn billboard_basis_for(&self, transform: &Mat4) -> BillboardBasis {
        BillboardBasis::from_view(&(self.view * *transform))
    }

    /// Sphere inside the frustum and closer than the cull distance
    pub fn is_visible(&self, center: Vec3, radius: f32) -> bool {
        let distance = center.distance(self.camera_position) - radius;
        distance < self.cull_distance && self.frustum.intersects_sphere(center, radius)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY, f32::MAX, 0)
    }
}

/// Placement of a model in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    /// Key of the instance's pose when poses are kept per instance
    pub id: u32,
    pub transform: Mat4,
}

impl Instance {
    pub fn new(id: u32, transform: Mat4) -> Self {
        Self { id, transform }
    }
}

/// Picking ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Distance to a triangle hit in front of the origin (Möller-Trumbore)
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > f32::EPSILON).then_some(t)
    }
}
