//! Individual particle representation

use glam::{Vec3, Vec4};

/// A single live particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub speed: Vec3,
    /// Gravity direction
    pub down: Vec3,
    /// Spawn position
    pub origin: Vec3,
    /// Emission direction, decelerated against
    pub direction: Vec3,
    /// Quad corners for emitter-oriented particles
    pub corners: [Vec3; 4],
    pub size: f32,
    /// Age in seconds
    pub life: f32,
    pub max_life: f32,
    pub tile: usize,
    pub color: Vec4,
}

impl Particle {
    pub fn new(position: Vec3, speed: Vec3, direction: Vec3, max_life: f32) -> Self {
        Self {
            position,
            speed,
            down: Vec3::NEG_Y,
            origin: position,
            direction,
            corners: [Vec3::ZERO; 4],
            size: 1.0,
            life: 0.0,
            max_life,
            tile: 0,
            color: Vec4::ONE,
        }
    }

    /// Age as a fraction of the lifespan; a zero lifespan counts as expired
    #[inline]
    pub fn relative_life(&self) -> f32 {
        if self.max_life > 0.0 {
            self.life / self.max_life
        } else {
            1.0
        }
    }

    /// Advance by `dt` seconds
    ///
    /// `slowdown` damps the speed exponentially with age.
    pub fn integrate(&mut self, dt: f32, gravity: f32, deceleration: f32, slowdown: f32) {
        self.speed += self.down * gravity * dt - self.direction * deceleration * dt;

        let damping = if slowdown > 0.0 {
            (-slowdown * self.life).exp()
        } else {
            1.0
        };
        self.position += self.speed * damping * dt;
        self.life += dt;
    }
}

/// Three-stop ramp over a particle's life
pub fn life_ramp<T>(life: f32, mid: f32, stops: &[T; 3]) -> T
where
    T: Copy + std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let mix = |a: T, b: T, t: f32| a * (1.0 - t) + b * t;
    if life <= mid {
        mix(stops[0], stops[1], life / mid)
    } else {
        mix(stops[1], stops[2], (life - mid) / (1.0 - mid))
    }
}
