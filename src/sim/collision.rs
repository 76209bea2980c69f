//! Collision tests for the monkey, the bed and falling particles
//!
//! Everything is a circle except the bed, which is only ever tested along its
//! top edge.

use glam::Vec2;

use super::state::{Bed, Monkey, Particle};

/// How the monkey relates to the bed after integration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedContact {
    /// Lower edge still above the bed top
    Clear,
    /// Lower edge crossed the bed top inside its span
    Landed,
    /// Lower edge crossed the bed top outside its span
    Missed,
}

/// Two circles collide iff the distance between centres is strictly less
/// than the sum of their radii. Touching circles do not collide.
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Check whether a falling particle touches the monkey
#[inline]
pub fn monkey_hits(monkey: &Monkey, particle: &Particle) -> bool {
    circles_overlap(monkey.pos, monkey.radius, particle.pos, particle.radius())
}

/// Classify the monkey against the bed's top edge
pub fn bed_contact(monkey: &Monkey, bed: &Bed) -> BedContact {
    if monkey.bottom() <= bed.y {
        BedContact::Clear
    } else if bed.spans(monkey.pos.x) {
        BedContact::Landed
    } else {
        BedContact::Missed
    }
}

/// Keep the monkey between the side walls, reflecting horizontal drift.
/// Returns true if a wall was hit.
pub fn bounce_off_walls(monkey: &mut Monkey, field_width: f32) -> bool {
    let r = monkey.radius;
    if monkey.pos.x - r < 0.0 {
        monkey.pos.x = r;
        monkey.vel.x = monkey.vel.x.abs();
        true
    } else if monkey.pos.x + r > field_width {
        monkey.pos.x = field_width - r;
        monkey.vel.x = -monkey.vel.x.abs();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ParticleKind;
    use crate::tuning::Tuning;

    fn monkey_at(x: f32, y: f32) -> Monkey {
        let mut monkey = Monkey::launched(&Tuning::default());
        monkey.pos = Vec2::new(x, y);
        monkey
    }

    #[test]
    fn test_touching_is_not_colliding() {
        // 3-4-5 triangle: distance exactly 5
        assert!(!circles_overlap(Vec2::ZERO, 2.0, Vec2::new(3.0, 4.0), 3.0));
        assert!(circles_overlap(Vec2::ZERO, 2.0, Vec2::new(3.0, 4.0), 3.01));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(25.0, 18.0);
        assert_eq!(
            circles_overlap(a, 9.0, b, 8.0),
            circles_overlap(b, 8.0, a, 9.0)
        );
    }

    #[test]
    fn test_monkey_hits_uses_particle_radius() {
        let monkey = monkey_at(100.0, 100.0);
        let banana = Particle {
            id: 1,
            kind: ParticleKind::Collectible,
            pos: Vec2::new(100.0, 130.0), // 30 = 20 + 10, touching
            vy: 3.0,
            size: 20.0,
        };
        assert!(!monkey_hits(&monkey, &banana));

        let closer = Particle {
            pos: Vec2::new(100.0, 129.0),
            ..banana
        };
        assert!(monkey_hits(&monkey, &closer));
    }

    #[test]
    fn test_bed_contact() {
        let bed = Bed::new(&Tuning::default());

        assert_eq!(bed_contact(&monkey_at(400.0, 540.0), &bed), BedContact::Clear);
        assert_eq!(bed_contact(&monkey_at(400.0, 541.0), &bed), BedContact::Landed);
        assert_eq!(bed_contact(&monkey_at(200.0, 541.0), &bed), BedContact::Missed);
        // Exactly on the edge of the span is a miss
        assert_eq!(bed_contact(&monkey_at(460.0, 541.0), &bed), BedContact::Missed);
    }

    #[test]
    fn test_walls_reflect_drift() {
        let mut monkey = monkey_at(5.0, 100.0);
        monkey.vel.x = -2.0;
        assert!(bounce_off_walls(&mut monkey, 800.0));
        assert_eq!(monkey.pos.x, 20.0);
        assert_eq!(monkey.vel.x, 2.0);

        let mut monkey = monkey_at(795.0, 100.0);
        monkey.vel.x = 2.0;
        assert!(bounce_off_walls(&mut monkey, 800.0));
        assert_eq!(monkey.pos.x, 780.0);
        assert_eq!(monkey.vel.x, -2.0);

        let mut monkey = monkey_at(400.0, 100.0);
        assert!(!bounce_off_walls(&mut monkey, 800.0));
    }
}
