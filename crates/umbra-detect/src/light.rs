//! Moving lights and the per-pair detection test.

use serde::{Deserialize, Serialize};
use umbra_types::PlayerId;
use umbra_world::{LightPath, Obstacle, Ray, Vec3};

use crate::LightConfig;

/// Which bound a light is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    /// Towards the path's `end`.
    Outbound,
    /// Back towards the path's `start`.
    Inbound,
}

impl Heading {
    fn reversed(self) -> Self {
        match self {
            Self::Outbound => Self::Inbound,
            Self::Inbound => Self::Outbound,
        }
    }
}

/// A light sweeping back and forth along a straight path.
///
/// Translation never changes the facing, and the height only changes if
/// the path itself is sloped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    position: Vec3,
    forward: Vec3,
    start: Vec3,
    end: Vec3,
    speed: f64,
    range: f64,
    half_angle: f64,
    fixture_radius: f64,
    heading: Heading,
}

impl Light {
    /// Spawns a light at the start of `path`. Returns `None` if the path's
    /// facing is a zero vector.
    pub fn spawn(path: &LightPath, config: &LightConfig) -> Option<Self> {
        let forward = path.forward.normalized()?;
        Some(Self {
            position: path.start,
            forward,
            start: path.start,
            end: path.end,
            speed: config.speed,
            range: config.range,
            half_angle: config.half_angle(),
            fixture_radius: config.fixture_radius,
            heading: Heading::Outbound,
        })
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit facing.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Which bound the light is moving towards.
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Moves the light `speed * dt` along its path, bouncing off the bounds.
    pub fn advance(&mut self, dt: f64) {
        let length = self.start.distance(self.end);
        if length <= f64::EPSILON || self.speed <= 0.0 || dt <= 0.0 {
            return;
        }

        // A full round trip brings the light back to the same state.
        let mut travel = (self.speed * dt) % (2.0 * length);
        while travel > 0.0 {
            let target = match self.heading {
                Heading::Outbound => self.end,
                Heading::Inbound => self.start,
            };
            let remaining = self.position.distance(target);
            if travel < remaining {
                let step = (target - self.position) * (travel / remaining);
                self.position = self.position + step;
                break;
            }
            self.position = target;
            self.heading = self.heading.reversed();
            travel -= remaining;
        }
    }

    /// Whether this light sees `player`, whose reference point is `target`.
    ///
    /// Range, cone and line of sight must all hold. The sight line runs from
    /// the player to the light fixture; anything in `obstacles` hit first
    /// blocks it, except the player's own body.
    pub fn detects(&self, player: PlayerId, target: Vec3, obstacles: &[Obstacle]) -> bool {
        let to_player = target - self.position;
        if to_player.length() > self.range {
            return false;
        }
        // Standing on the light's origin counts as inside the cone.
        if let Some(angle) = self.forward.angle_to(to_player) {
            if angle > self.half_angle {
                return false;
            }
        }
        self.has_line_of_sight(player, target, obstacles)
    }

    fn has_line_of_sight(&self, player: PlayerId, target: Vec3, obstacles: &[Obstacle]) -> bool {
        let Some(ray) = Ray::towards(target, self.position) else {
            return true;
        };
        // The ray is aimed at the fixture's centre, so it meets the fixture
        // surface at this distance.
        let light_t = target.distance(self.position) - self.fixture_radius;
        if light_t <= 0.0 {
            // Inside the fixture.
            return true;
        }
        !obstacles
            .iter()
            .filter(|obstacle| obstacle.owner != Some(player))
            .any(|obstacle| obstacle.bounds.ray_hit(&ray, light_t).is_some_and(|t| t < light_t))
    }
}

#[cfg(test)]
mod tests {
    use umbra_world::Aabb;

    use super::*;

    fn path(start: Vec3, end: Vec3) -> LightPath {
        LightPath {
            start,
            end,
            forward: Vec3::Z,
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_zero_forward_cannot_spawn() {
        let bad = LightPath {
            start: Vec3::ZERO,
            end: Vec3::X,
            forward: Vec3::ZERO,
        };
        assert!(Light::spawn(&bad, &LightConfig::default()).is_none());
    }

    #[test]
    fn test_advance_moves_towards_end() {
        let mut light = Light::spawn(&path(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)), &LightConfig::default()).unwrap();
        light.advance(0.5);
        assert!(approx(light.position(), Vec3::new(4.0, 0.0, 0.0)));
        assert_eq!(light.heading(), Heading::Outbound);
    }

    #[test]
    fn test_advance_bounces_off_bounds() {
        let mut light = Light::spawn(&path(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)), &LightConfig::default()).unwrap();
        // 8 units/s for 1.5s = 12 units: 10 out, 2 back.
        light.advance(1.5);
        assert!(approx(light.position(), Vec3::new(8.0, 0.0, 0.0)));
        assert_eq!(light.heading(), Heading::Inbound);

        // 16 more units: 8 back to start, 8 out again.
        light.advance(2.0);
        assert!(approx(light.position(), Vec3::new(8.0, 0.0, 0.0)));
        assert_eq!(light.heading(), Heading::Outbound);
    }

    #[test]
    fn test_advance_keeps_facing_and_height() {
        let mut light = Light::spawn(
            &LightPath {
                start: Vec3::new(0.0, 6.0, 0.0),
                end: Vec3::new(20.0, 6.0, 0.0),
                forward: Vec3::new(0.0, -1.0, 1.0),
            },
            &LightConfig::default(),
        )
        .unwrap();
        let forward = light.forward();
        for _ in 0..100 {
            light.advance(1.0 / 30.0);
            assert_eq!(light.position().y, 6.0);
            assert_eq!(light.forward(), forward);
        }
    }

    #[test]
    fn test_degenerate_path_stays_put() {
        let mut light = Light::spawn(&path(Vec3::Y, Vec3::Y), &LightConfig::default()).unwrap();
        light.advance(5.0);
        assert_eq!(light.position(), Vec3::Y);
    }

    #[test]
    fn test_detects_ignores_own_body() {
        let light = Light::spawn(&path(Vec3::ZERO, Vec3::ZERO), &LightConfig::default()).unwrap();
        let me = PlayerId(1);
        let target = Vec3::new(0.0, 0.0, 10.0);
        let body = Obstacle::body_of(me, Aabb::from_center(target, Vec3::new(1.0, 2.0, 1.0)));
        assert!(light.detects(me, target, &[body]));

        let someone_else = Obstacle::body_of(PlayerId(2), body.bounds);
        assert!(!light.detects(me, target, &[someone_else]));
    }

    #[test]
    fn test_player_at_light_origin_is_detected() {
        let light = Light::spawn(&path(Vec3::ZERO, Vec3::ZERO), &LightConfig::default()).unwrap();
        assert!(light.detects(PlayerId(1), Vec3::ZERO, &[]));
        assert!(light.detects(PlayerId(1), Vec3::new(0.0, 0.0, 0.2), &[]));
    }
}
