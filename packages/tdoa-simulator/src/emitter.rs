//! emitter.rs — synthetic emitter motion
//!
//! A single emitter circling the station grid. Enough motion to sweep the
//! solver across a range of geometries; anything fancier belongs to the
//! real world, not this stand-in.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EmitterConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    /// radians per second
    pub angular_rate: f64,
    #[serde(default)]
    pub start_angle: f64,
}

pub struct EmitterSim {
    config: EmitterConfig,
    angle: f64,
}

impl EmitterSim {
    pub fn new(config: EmitterConfig) -> Self {
        let angle = config.start_angle;
        Self { config, angle }
    }

    /// Advance the orbit by `dt` seconds and return the new position.
    pub fn tick(&mut self, dt: f64) -> [f64; 2] {
        self.angle += self.config.angular_rate * dt;
        self.position()
    }

    pub fn position(&self) -> [f64; 2] {
        [
            self.config.center_x + self.config.radius * self.angle.cos(),
            self.config.center_y + self.config.radius * self.angle.sin(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmitterConfig {
        EmitterConfig {
            center_x: 50_000.0,
            center_y: 50_000.0,
            radius: 20_000.0,
            angular_rate: std::f64::consts::FRAC_PI_2,
            start_angle: 0.0,
        }
    }

    #[test]
    fn starts_on_the_orbit() {
        let sim = EmitterSim::new(config());
        let [x, y] = sim.position();
        assert!((x - 70_000.0).abs() < 1e-9);
        assert!((y - 50_000.0).abs() < 1e-9);
    }

    #[test]
    fn quarter_turn_after_one_second() {
        let mut sim = EmitterSim::new(config());
        let [x, y] = sim.tick(1.0);
        assert!((x - 50_000.0).abs() < 1e-6);
        assert!((y - 70_000.0).abs() < 1e-6);
    }

    #[test]
    fn stays_at_orbit_radius() {
        let mut sim = EmitterSim::new(config());
        for _ in 0..17 {
            let [x, y] = sim.tick(0.3);
            let r = ((x - 50_000.0).powi(2) + (y - 50_000.0).powi(2)).sqrt();
            assert!((r - 20_000.0).abs() < 1e-6);
        }
    }
}
