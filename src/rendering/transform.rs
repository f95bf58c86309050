use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, Euler rotation (degrees) and scale, plus the model matrix
/// derived from them.
///
/// Fields are only reachable through setters so the matrix is rebuilt on
/// every change and never observed stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            matrix: calc_matrix(position, rotation, scale),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO, Vec3::ONE)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalc();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.recalc();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.recalc();
    }

    pub fn set_position_rotation(&mut self, position: Vec3, rotation: Vec3) {
        self.position = position;
        self.rotation = rotation;
        self.recalc();
    }

    fn recalc(&mut self) {
        self.matrix = calc_matrix(self.position, self.rotation, self.scale);
    }
}

/// translate * yaw(y) pitch(x) roll(z) * scale
fn calc_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_euler(
        EulerRot::YXZ,
        rotation.y.to_radians(),
        rotation.x.to_radians(),
        rotation.z.to_radians(),
    );
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.matrix().w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(t.matrix(), Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).matrix());
    }

    #[test]
    fn setters_rebuild_the_matrix() {
        let mut t = Transform::default();
        t.set_position(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(t.matrix().w_axis.x, 4.0);

        t.set_scale(Vec3::splat(2.0));
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let t = Transform::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 90.0, 0.0),
            Vec3::new(2.0, 1.0, 1.0),
        );
        // x scaled to 2, yawed 90° onto -z, then moved by +5 z.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }
}
