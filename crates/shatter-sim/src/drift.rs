use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shatter_engine::provider::GameState;
use shatter_engine::scene::InstanceTransform;

/// Number of boxes kept alive in the tube.
pub const BOX_COUNT: usize = 64;

/// Live debris particles never exceed this.
pub const MAX_PARTICLES: usize = 256;

/// Fixed simulation step, seconds.
pub const TIMESTEP: f32 = 1.0 / 60.0;

const BOX_HALF: f32 = 0.5;
const BOX_MASS: f32 = 1.0;
const DEBRIS_HALF: f32 = 0.1;
const DEBRIS_MASS: f32 = 0.1;
const DEBRIS_PER_BLAST: usize = 16;
const DEBRIS_LIFE: u32 = 60;
const DEBRIS_KICK: f32 = 100.0;

/// Drift and blast parameters.
#[derive(Debug, Clone)]
pub struct DriftConfig {
    /// Seed of the spawn / debris RNG.
    pub seed: u64,

    /// Inner radius of the tube around the x axis.
    pub tube_radius: f32,
    /// Tube extent along x; outside it boxes fall freely.
    pub tube_length: f32,
    /// Tube spin, radians per second.
    pub tube_spin: f32,

    pub gravity: f32,
    /// Constant force toward −x applied to every box each step.
    pub push: f32,
    /// Boxes that drift past this x are respawned.
    pub respawn_x: f32,

    pub blast_radius: f32,
    pub blast_strength: f32,

    /// Fraction of the slip around the tube wall removed per contact step.
    pub wall_friction: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tube_radius: 5.0,
            tube_length: 200.0,
            tube_spin: 1.2,
            gravity: 10.0,
            push: 7.0,
            respawn_x: -10.0,
            blast_radius: 15.0,
            blast_strength: 1000.0,
            wall_friction: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    position: Vec3,
    velocity: Vec3,
    rotation: Quat,
    spin: Vec3,
    half: f32,
    mass: f32,
    force: Vec3,
    life: u32,
}

impl Body {
    fn at_rest(position: Vec3, rotation: Quat, half: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation,
            spin: Vec3::ZERO,
            half,
            mass,
            force: Vec3::ZERO,
            life: 0,
        }
    }

    fn bone(&self) -> InstanceTransform {
        InstanceTransform {
            position: self.position.to_array(),
            rotation: self.rotation.to_array(),
            scale: [self.half * 2.0; 3],
        }
    }
}

/// Kinematic box field inside a spinning tube.
///
/// Boxes are pushed toward −x, fall under gravity and rest against the tube
/// wall; the wall's spin drags them around. There is no box–box collision.
/// `explode` blasts neighbours away and leaves short-lived debris behind.
pub struct DriftField {
    config: DriftConfig,
    rng: StdRng,
    now: f32,

    boxes: Vec<Body>,
    particles: Vec<Body>,

    bones: Vec<InstanceTransform>,
}

impl DriftField {
    pub fn new(config: DriftConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            now: 0.0,
            boxes: Vec::with_capacity(BOX_COUNT),
            particles: Vec::with_capacity(MAX_PARTICLES),
            bones: Vec::with_capacity(BOX_COUNT + MAX_PARTICLES),
        }
    }

    /// Simulated seconds since `init`.
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn spawn_box(&mut self) -> Body {
        let x = 100.0 + self.rng.gen_range(0.0..1.0f32) * 50.0 - 25.0;
        let y = 3.0 + self.rng.gen_range(0.0..1.0f32);
        let z = 1.0 + self.rng.gen_range(0.0..1.0f32);
        Body::at_rest(Vec3::new(x, y, z), Quat::IDENTITY, BOX_HALF, BOX_MASS)
    }

    fn rebuild_bones(&mut self) {
        self.bones.clear();
        self.bones.extend(self.boxes.iter().map(Body::bone));
        self.bones.extend(self.particles.iter().map(Body::bone));
    }

    fn integrate(&self, body: &mut Body) {
        let cfg = &self.config;

        body.velocity += body.force / body.mass * TIMESTEP;
        body.velocity.z -= cfg.gravity * TIMESTEP;
        body.force = Vec3::ZERO;

        body.position += body.velocity * TIMESTEP;
        if body.spin != Vec3::ZERO {
            let turn = Quat::from_scaled_axis(body.spin * TIMESTEP);
            body.rotation = (turn * body.rotation).normalize();
        }

        if !(0.0..=cfg.tube_length).contains(&body.position.x) {
            return;
        }

        // Rest against the inner wall.
        let radial = Vec3::new(0.0, body.position.y, body.position.z);
        let r = radial.length();
        let limit = cfg.tube_radius - body.half;
        if r <= limit || r == 0.0 {
            return;
        }

        let normal = radial / r;
        body.position.y = normal.y * limit;
        body.position.z = normal.z * limit;

        let outward = body.velocity.dot(normal);
        if outward > 0.0 {
            body.velocity -= normal * outward;
        }

        // The spinning wall drags the body around the axis; x is left free.
        let tangent = Vec3::X.cross(normal);
        let slip = cfg.tube_spin * limit - body.velocity.dot(tangent);
        body.velocity += tangent * (slip * cfg.wall_friction);
        body.spin = Vec3::X * cfg.tube_spin;
    }
}

impl Default for DriftField {
    fn default() -> Self {
        Self::new(DriftConfig::default())
    }
}

impl GameState for DriftField {
    fn init(&mut self) {
        self.now = 0.0;
        self.particles.clear();
        self.boxes.clear();
        for _ in 0..BOX_COUNT {
            let b = self.spawn_box();
            self.boxes.push(b);
        }
        self.rebuild_bones();
        log::debug!("drift field initialized with {BOX_COUNT} boxes");
    }

    fn update(&mut self) {
        self.now += TIMESTEP;

        for i in 0..self.boxes.len() {
            if self.boxes[i].position.x < self.config.respawn_x {
                self.boxes[i] = self.spawn_box();
            }
            self.boxes[i].force.x -= self.config.push;
        }

        self.particles.retain_mut(|p| {
            if p.life == 0 {
                return false;
            }
            p.life -= 1;
            true
        });

        let mut boxes = std::mem::take(&mut self.boxes);
        let mut particles = std::mem::take(&mut self.particles);
        for body in boxes.iter_mut().chain(particles.iter_mut()) {
            self.integrate(body);
        }
        self.boxes = boxes;
        self.particles = particles;

        self.rebuild_bones();
    }

    fn bones(&self) -> &[InstanceTransform] {
        &self.bones
    }

    fn explode(&mut self, id: u8) {
        let index = id as usize;
        if index >= self.boxes.len() {
            log::debug!("explode({id}) ignored: no such box");
            return;
        }

        let parent = self.boxes[index];

        for (i, other) in self.boxes.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            let direction = other.position - parent.position;
            let distance = direction.length();
            if distance > 0.0 && distance < self.config.blast_radius {
                other.force += direction / distance / distance * self.config.blast_strength;
            }
        }

        for _ in 0..DEBRIS_PER_BLAST {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let direction = Vec3::new(
                self.rng.gen_range(-0.5..0.5f32),
                self.rng.gen_range(-0.5..0.5f32),
                self.rng.gen_range(-0.5..0.5f32),
            );
            let mut debris = Body::at_rest(
                parent.position + parent.rotation * direction,
                parent.rotation,
                DEBRIS_HALF,
                DEBRIS_MASS,
            );
            debris.velocity = parent.velocity;
            debris.force = direction * DEBRIS_KICK;
            debris.life = DEBRIS_LIFE;
            self.particles.push(debris);
        }

        self.boxes[index] = self.spawn_box();
        self.rebuild_bones();
    }
}
