//! Axis-aligned bounding box used to frame the camera.

use cgmath::Vector3;

/// Axis-aligned min/max extent of a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BoundingBox {
    /// Fraction of the largest axis extent used as the framing radius.
    pub const RADIUS_PADDING: f32 = 0.6;

    /// Box around a single point.
    pub fn from_point(p: [f32; 3]) -> Self {
        let p = Vector3::from(p);
        Self { min: p, max: p }
    }

    /// Single pass over `points`; the first point seeds both corners.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut points = points.into_iter();
        let mut bounds = Self::from_point(points.next()?);
        points.for_each(|p| bounds.extend(p));
        Some(bounds)
    }

    pub fn extend(&mut self, p: [f32; 3]) {
        self.min.x = self.min.x.min(p[0]);
        self.min.y = self.min.y.min(p[1]);
        self.min.z = self.min.z.min(p[2]);
        self.max.x = self.max.x.max(p[0]);
        self.max.y = self.max.y.max(p[1]);
        self.max.z = self.max.z.max(p[2]);
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Padded framing radius: 0.6 times the largest axis extent.
    pub fn radius(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z) * Self::RADIUS_PADDING
    }

    /// Point that should end up at the world origin: the horizontal center,
    /// `bias` of the way up the box vertically.
    pub fn anchor(&self, bias: f32) -> Vector3<f32> {
        let center = self.center();
        Vector3::new(center.x, self.min.y + self.extent().y * bias, center.z)
    }
}
