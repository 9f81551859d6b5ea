//! Projection from particle space to the screen.
//!
//! Two projectors are provided:
//!
//! | Projector | Used by | Depth |
//! |-----------|---------|-------|
//! | [`Camera`] | 3D cloud | distance along the view axis after yaw/pitch rotation |
//! | [`FlatView`] | 2D shows | the particle's synthetic `z` plus a slow parallax offset |
//!
//! Both report a [`Projected`] screen position, a perspective scale factor and
//! a depth value. Larger depth means farther from the viewer.

use glam::{Vec2, Vec3};

/// Screen-space result of projecting one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    /// Size multiplier from perspective.
    pub scale: f32,
    pub depth: f32,
}

/// User or scripted change to the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraControl {
    /// Shift the image by a screen-space offset.
    Pan(Vec2),
    /// Multiply the zoom; values above 1 zoom in.
    Zoom(f32),
    /// Add to yaw and pitch, in radians.
    Rotate { yaw: f32, pitch: f32 },
}

/// `amplitude * sin(tick * omega)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    pub amplitude: f32,
    pub omega: f32,
}

impl Oscillator {
    pub const fn new(amplitude: f32, omega: f32) -> Self {
        Self { amplitude, omega }
    }

    #[inline]
    pub fn at(&self, tick: u64) -> f32 {
        self.amplitude * (tick as f32 * self.omega).sin()
    }
}

/// Perspective camera orbiting the world origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Rotation about the Y axis in radians.
    pub yaw: f32,
    /// Rotation about the X axis in radians.
    pub pitch: f32,
    /// Radians of yaw added per tick.
    pub yaw_rate: f32,
    /// Scripted pitch sway, added on top of `pitch`.
    pub sway: Option<Oscillator>,
    /// Current sway value, refreshed by [`Camera::advance`].
    sway_offset: f32,
    /// Distance from the camera to the world origin along the view axis.
    pub distance: f32,
    pub focal_length: f32,
    /// Particles at or closer than this depth are not drawn.
    pub near_clip: f32,
    /// Screen position of the view axis.
    pub center: Vec2,
    pub zoom: f32,
    /// Extra size multiplier applied to every sprite.
    pub sprite_scale: f32,
}

impl Camera {
    /// Camera looking at the origin from `distance`, centered on `center`.
    pub fn new(center: Vec2) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            yaw_rate: 0.0,
            sway: None,
            sway_offset: 0.0,
            distance: 600.0,
            focal_length: 450.0,
            near_clip: 10.0,
            center,
            zoom: 1.0,
            sprite_scale: 2.0,
        }
    }

    pub fn with_yaw_rate(mut self, rate: f32) -> Self {
        self.yaw_rate = rate;
        self
    }

    pub fn with_sway(mut self, sway: Oscillator) -> Self {
        self.sway = Some(sway);
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    /// Pitch including the current sway.
    #[inline]
    pub fn effective_pitch(&self) -> f32 {
        self.pitch + self.sway_offset
    }

    /// Apply the per-tick yaw drift and sway.
    pub fn advance(&mut self, tick: u64) {
        self.yaw += self.yaw_rate;
        if let Some(sway) = self.sway {
            self.sway_offset = sway.at(tick);
        }
    }

    /// Rotate a world position into camera space (before the distance offset).
    #[inline]
    fn rotate(&self, p: Vec3) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.effective_pitch().sin_cos();

        let x1 = p.x * cy + p.z * sy;
        let z1 = -p.x * sy + p.z * cy;

        let y1 = p.y * cp - z1 * sp;
        let z2 = p.y * sp + z1 * cp;

        Vec3::new(x1, y1, z2)
    }

    /// Project a world position, or `None` if it is at or behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<Projected> {
        let r = self.rotate(p);
        let depth = r.z + self.distance;
        if depth <= self.near_clip {
            return None;
        }
        let f = self.focal_length * self.zoom / depth;
        Some(Projected {
            screen: Vec2::new(r.x, r.y) * f + self.center,
            scale: f * self.sprite_scale,
            depth,
        })
    }

    /// World point on the plane through the origin facing the camera that
    /// projects to `screen`.
    pub fn unproject(&self, screen: Vec2) -> Vec3 {
        let f = self.focal_length * self.zoom / self.distance;
        let lateral = (screen - self.center) / f;

        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.effective_pitch().sin_cos();

        // Inverse pitch with camera-space depth 0, then inverse yaw.
        let y = lateral.y * cp;
        let z1 = -lateral.y * sp;
        let x = lateral.x * cy - z1 * sy;
        let z = lateral.x * sy + z1 * cy;

        Vec3::new(x, y, z)
    }

    pub fn apply(&mut self, control: CameraControl) {
        match control {
            CameraControl::Pan(delta) => self.center += delta,
            CameraControl::Zoom(factor) => {
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);
            }
            CameraControl::Rotate { yaw, pitch } => {
                self.yaw += yaw;
                self.pitch = (self.pitch + pitch).clamp(-1.5, 1.5);
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

/// Orthographic screen-space view with a synthetic depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatView {
    /// Depth offset sway over time, for parallax.
    pub parallax: Option<Oscillator>,
    depth_offset: f32,
    /// Shrink factor per unit of depth.
    pub depth_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub pan: Vec2,
    pub zoom: f32,
}

impl FlatView {
    pub fn new() -> Self {
        Self {
            parallax: None,
            depth_offset: 0.0,
            depth_scale: 0.0,
            min_scale: 0.3,
            max_scale: 4.0,
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    /// Perspective-like shrink: `scale = 1 / (1 + depth * k)`.
    pub fn with_depth_scale(mut self, k: f32) -> Self {
        self.depth_scale = k;
        self
    }

    pub fn with_parallax(mut self, parallax: Oscillator) -> Self {
        self.parallax = Some(parallax);
        self
    }

    /// Current depth offset.
    #[inline]
    pub fn depth_offset(&self) -> f32 {
        self.depth_offset
    }

    pub fn advance(&mut self, tick: u64) {
        if let Some(parallax) = self.parallax {
            self.depth_offset = parallax.at(tick);
        }
    }

    pub fn project(&self, p: Vec3) -> Projected {
        let depth = p.z + self.depth_offset;
        let denom = (1.0 + depth * self.depth_scale).max(f32::EPSILON);
        let scale = (1.0 / denom).clamp(self.min_scale, self.max_scale);
        Projected {
            screen: Vec2::new(p.x, p.y) * self.zoom + self.pan,
            scale: scale * self.zoom,
            depth,
        }
    }

    pub fn unproject(&self, screen: Vec2) -> Vec3 {
        ((screen - self.pan) / self.zoom).extend(0.0)
    }

    pub fn apply(&mut self, control: CameraControl) {
        match control {
            CameraControl::Pan(delta) => self.pan += delta,
            CameraControl::Zoom(factor) => {
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);
            }
            // No rotation in a flat view.
            CameraControl::Rotate { .. } => {}
        }
    }
}

impl Default for FlatView {
    fn default() -> Self {
        Self::new()
    }
}

/// The projector a show renders through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projector {
    Perspective(Camera),
    Flat(FlatView),
}

impl Projector {
    /// Project a particle position; `None` means not visible.
    #[inline]
    pub fn project(&self, p: Vec3) -> Option<Projected> {
        match self {
            Projector::Perspective(camera) => camera.project(p),
            Projector::Flat(view) => Some(view.project(p)),
        }
    }

    pub fn unproject(&self, screen: Vec2) -> Vec3 {
        match self {
            Projector::Perspective(camera) => camera.unproject(screen),
            Projector::Flat(view) => view.unproject(screen),
        }
    }

    /// Per-tick scripted motion.
    pub fn advance(&mut self, tick: u64) {
        match self {
            Projector::Perspective(camera) => camera.advance(tick),
            Projector::Flat(view) => view.advance(tick),
        }
    }

    pub fn apply(&mut self, control: CameraControl) {
        match self {
            Projector::Perspective(camera) => camera.apply(control),
            Projector::Flat(view) => view.apply(control),
        }
    }
}

impl Default for Projector {
    fn default() -> Self {
        Projector::Flat(FlatView::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(Vec2::new(512.0, 384.0));
        let p = camera.project(Vec3::ZERO).unwrap();
        assert_eq!(p.screen, Vec2::new(512.0, 384.0));
        assert_eq!(p.depth, 600.0);
        assert!((p.scale - 450.0 / 600.0 * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_near_clip_boundary() {
        let camera = Camera::new(Vec2::ZERO);
        // depth = z + 600; z = -590 puts the particle exactly on the clip plane.
        assert!(camera.project(Vec3::new(0.0, 0.0, -590.0)).is_none());
        let visible = camera.project(Vec3::new(0.0, 0.0, -589.0)).unwrap();
        assert_eq!(visible.depth, 11.0);
        assert!(visible.scale.is_finite());
        assert!(camera.project(Vec3::new(0.0, 0.0, -1000.0)).is_none());
    }

    #[test]
    fn test_yaw_rotation() {
        let mut camera = Camera::new(Vec2::ZERO);
        camera.yaw = std::f32::consts::FRAC_PI_2;
        // A point on +X rotates behind the origin plane, moving closer.
        let p = camera.project(Vec3::new(100.0, 0.0, 0.0)).unwrap();
        assert!((p.depth - 500.0).abs() < 1e-3);
        assert!(p.screen.x.abs() < 1e-3);
    }

    #[test]
    fn test_unproject_round_trip() {
        let mut camera = Camera::new(Vec2::new(400.0, 300.0));
        camera.yaw = 0.7;
        camera.pitch = -0.2;
        let screen = Vec2::new(520.0, 210.0);
        let world = camera.unproject(screen);
        let back = camera.project(world).unwrap();
        assert!(back.screen.abs_diff_eq(screen, 1e-2));
    }

    #[test]
    fn test_camera_advance() {
        let mut camera = Camera::new(Vec2::ZERO)
            .with_yaw_rate(0.004)
            .with_sway(Oscillator::new(0.15, 0.002));
        for tick in 1..=10 {
            camera.advance(tick);
        }
        assert!((camera.yaw - 0.04).abs() < 1e-5);
        assert!((camera.effective_pitch() - 0.15 * (0.02f32).sin()).abs() < 1e-6);
    }

    #[test]
    fn test_controls() {
        let mut camera = Camera::new(Vec2::ZERO);
        camera.apply(CameraControl::Rotate {
            yaw: 0.1,
            pitch: 5.0,
        });
        assert_eq!(camera.pitch, 1.5);
        camera.apply(CameraControl::Zoom(2.0));
        assert_eq!(camera.zoom, 2.0);
        camera.apply(CameraControl::Pan(Vec2::new(3.0, 4.0)));
        assert_eq!(camera.center, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_flat_scale_is_clamped() {
        let view = FlatView::new().with_depth_scale(0.6);
        assert_eq!(view.project(Vec3::new(0.0, 0.0, 0.0)).scale, 1.0);
        assert_eq!(view.project(Vec3::new(0.0, 0.0, 100.0)).scale, 0.3);
        // 1 + depth * k <= 0 must not produce a negative or infinite size.
        let s = view.project(Vec3::new(0.0, 0.0, -5.0)).scale;
        assert_eq!(s, 4.0);
    }

    #[test]
    fn test_flat_parallax() {
        let mut view = FlatView::new().with_parallax(Oscillator::new(0.18, 0.25 / 60.0));
        view.advance(60);
        let p = view.project(Vec3::new(10.0, 20.0, 0.5));
        assert!((p.depth - (0.5 + 0.18 * 0.25f32.sin())).abs() < 1e-5);
        assert_eq!(p.screen, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_flat_round_trip() {
        let mut view = FlatView::new();
        view.apply(CameraControl::Pan(Vec2::new(10.0, -5.0)));
        view.apply(CameraControl::Zoom(2.0));
        let world = view.unproject(Vec2::new(50.0, 50.0));
        assert_eq!(view.project(world).screen, Vec2::new(50.0, 50.0));
    }
}
