//! Single-axis PID and the cascaded 3-axis position/velocity controller.

use skyroute_core::constants::{POSITION_GAINS, VELOCITY_GAINS};
use skyroute_core::types::Vec3;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub const fn position_default() -> Self {
        let (kp, ki, kd) = POSITION_GAINS;
        Self::new(kp, ki, kd)
    }

    pub const fn velocity_default() -> Self {
        let (kp, ki, kd) = VELOCITY_GAINS;
        Self::new(kp, ki, kd)
    }
}

/// One PID loop with output clamping.
///
/// Time is supplied by the caller in seconds. The first update after
/// construction or [`Pid::reset`] has no previous sample, so its integral and
/// derivative terms are zero.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    limits: (f64, f64),
    prev_error: f64,
    integral: f64,
    prev_time: Option<f64>,
}

impl Pid {
    pub fn new(gains: PidGains, limits: (f64, f64)) -> Self {
        Self {
            gains,
            limits,
            prev_error: 0.0,
            integral: 0.0,
            prev_time: None,
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.prev_error = 0.0;
        self.integral = 0.0;
        self.prev_time = None;
    }

    pub fn update(&mut self, error: f64, now: f64) -> f64 {
        let derivative = match self.prev_time {
            Some(prev) if now > prev => {
                let dt = now - prev;
                self.integral += error * dt;
                (error - self.prev_error) / dt
            }
            _ => 0.0,
        };

        let PidGains { kp, ki, kd } = self.gains;
        let output = kp * error + ki * self.integral + kd * derivative;

        self.prev_error = error;
        self.prev_time = Some(now);

        let (lo, hi) = self.limits;
        output.max(lo).min(hi)
    }
}

/// Outer position loop feeding an inner velocity loop, one pair per axis.
#[derive(Debug, Clone)]
pub struct CascadedPid {
    position: [Pid; 3],
    velocity: [Pid; 3],
}

impl CascadedPid {
    pub fn new(
        position_gains: PidGains,
        velocity_gains: PidGains,
        position_limits: (f64, f64),
        velocity_limits: (f64, f64),
    ) -> Self {
        Self {
            position: std::array::from_fn(|_| Pid::new(position_gains, position_limits)),
            velocity: std::array::from_fn(|_| Pid::new(velocity_gains, velocity_limits)),
        }
    }

    pub fn reset(&mut self) {
        for pid in self.position.iter_mut().chain(self.velocity.iter_mut()) {
            pid.reset();
        }
    }

    /// Acceleration command that moves `position` toward `target`.
    pub fn update(&mut self, position: Vec3, velocity: Vec3, target: Vec3, now: f64) -> Vec3 {
        let mut desired_velocity = Vec3::ZERO;
        for axis in 0..3 {
            desired_velocity[axis] = self.position[axis].update(target[axis] - position[axis], now);
        }

        let mut acceleration = Vec3::ZERO;
        for axis in 0..3 {
            acceleration[axis] =
                self.velocity[axis].update(desired_velocity[axis] - velocity[axis], now);
        }
        acceleration
    }
}
