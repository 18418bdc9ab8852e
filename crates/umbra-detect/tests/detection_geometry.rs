//! Detection test cases for a single light: range, cone, line of sight.

use umbra_detect::{Light, LightConfig};
use umbra_types::PlayerId;
use umbra_world::{Aabb, LightPath, Obstacle, Vec3};

const ME: PlayerId = PlayerId(1);

/// Stationary light at the origin facing +Z; range 30, half-angle 30°.
fn light() -> Light {
    let path = LightPath {
        start: Vec3::ZERO,
        end: Vec3::ZERO,
        forward: Vec3::Z,
    };
    Light::spawn(&path, &LightConfig::default()).unwrap()
}

fn wall_at(z: f64) -> Obstacle {
    Obstacle::solid(Aabb::from_center(Vec3::new(0.0, 0.0, z), Vec3::new(2.0, 2.0, 0.2)))
}

#[test]
fn test_player_ahead_in_range_is_detected() {
    assert!(light().detects(ME, Vec3::new(0.0, 0.0, 10.0), &[]));
}

#[test]
fn test_player_45_degrees_off_axis_is_not_detected() {
    let off_axis = Vec3::new(45f64.to_radians().sin(), 0.0, 45f64.to_radians().cos()) * 10.0;
    assert!(!light().detects(ME, off_axis, &[]));
}

#[test]
fn test_player_just_inside_cone_edge_is_detected() {
    let inside = Vec3::new(29f64.to_radians().sin(), 0.0, 29f64.to_radians().cos()) * 10.0;
    assert!(light().detects(ME, inside, &[]));
}

#[test]
fn test_player_out_of_range_is_not_detected() {
    assert!(!light().detects(ME, Vec3::new(0.0, 0.0, 40.0), &[]));
    assert!(light().detects(ME, Vec3::new(0.0, 0.0, 29.9), &[]));
}

#[test]
fn test_player_behind_light_is_not_detected() {
    assert!(!light().detects(ME, Vec3::new(0.0, 0.0, -10.0), &[]));
}

#[test]
fn test_obstruction_between_light_and_player_blocks() {
    assert!(!light().detects(ME, Vec3::new(0.0, 0.0, 10.0), &[wall_at(5.0)]));
}

#[test]
fn test_obstruction_behind_player_does_not_block() {
    assert!(light().detects(ME, Vec3::new(0.0, 0.0, 10.0), &[wall_at(15.0)]));
}

#[test]
fn test_obstruction_to_the_side_does_not_block() {
    let side = Obstacle::solid(Aabb::from_center(Vec3::new(5.0, 0.0, 5.0), Vec3::new(2.0, 2.0, 2.0)));
    assert!(light().detects(ME, Vec3::new(0.0, 0.0, 10.0), &[side]));
}

#[test]
fn test_own_body_never_blocks() {
    let head = Vec3::new(0.0, 0.0, 10.0);
    let body = Obstacle::body_of(ME, Aabb::from_center(head - Vec3::Y, Vec3::new(1.0, 2.5, 1.0)));
    assert!(light().detects(ME, head, &[body]));
}

#[test]
fn test_other_players_body_blocks() {
    let head = Vec3::new(0.0, 0.0, 10.0);
    let blocker = Obstacle::body_of(PlayerId(2), Aabb::from_center(Vec3::new(0.0, 0.0, 6.0), Vec3::new(1.0, 2.5, 1.0)));
    assert!(!light().detects(ME, head, &[blocker]));
}

#[test]
fn test_sloped_light_sees_down_its_cone() {
    let path = LightPath {
        start: Vec3::new(0.0, 8.0, 0.0),
        end: Vec3::new(0.0, 8.0, 0.0),
        forward: Vec3::new(0.0, -1.0, 1.0),
    };
    let light = Light::spawn(&path, &LightConfig::default()).unwrap();
    assert!(light.detects(ME, Vec3::new(0.0, 2.0, 6.0), &[]));
    assert!(!light.detects(ME, Vec3::new(0.0, 8.0, 6.0), &[]));
}

#[test]
fn test_point_fixture_sees_every_unobstructed_point_in_cone() {
    let config = LightConfig {
        fixture_radius: 0.0,
        ..LightConfig::default()
    };
    let path = LightPath {
        start: Vec3::ZERO,
        end: Vec3::ZERO,
        forward: Vec3::Z,
    };
    let light = Light::spawn(&path, &config).unwrap();

    // A 41×41 grid at z = 10 spanning ±4 on x and y: at most 29.5° off axis.
    let mut missed = Vec::new();
    for i in -20..=20 {
        for j in -20..=20 {
            let point = Vec3::new(f64::from(i) * 0.2, f64::from(j) * 0.2, 10.0);
            if !light.detects(ME, point, &[]) {
                missed.push(point);
            }
        }
    }
    assert!(missed.is_empty(), "missed {} points, first {:?}", missed.len(), missed.first());

    assert!(!light.detects(ME, Vec3::new(1.3, -0.7, 10.0), &[wall_at(5.0)]));
}
