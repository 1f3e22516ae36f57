//! Transient visual effects. Everything decays against frame timestamps and is dropped once its
//! lifetime has elapsed; none of it feeds back into narrative state.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use crate::config::Tunables;
use crate::starfield::seeded;

/// A 1 → 0 linear countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    lifetime: Duration,
    started: Option<Instant>,
}

impl Countdown {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            started: None,
        }
    }

    pub fn fire(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn clear(&mut self) {
        self.started = None;
    }

    pub fn level(&self, now: Instant) -> f32 {
        let Some(started) = self.started else {
            return 0.0;
        };
        if self.lifetime.is_zero() {
            return 0.0;
        }
        let t = now.saturating_duration_since(started).as_secs_f32() / self.lifetime.as_secs_f32();
        (1.0 - t).clamp(0.0, 1.0)
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.level(now) > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub y: f32,
    pub born: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub angle: f32,
    /// Logical px travelled over the burst lifetime.
    pub reach: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub x: f32,
    pub y: f32,
    pub born: Instant,
    pub particles: Vec<Particle>,
}

pub const BURST_PARTICLES: usize = 18;
pub const RIPPLE_START_RADIUS: f32 = 6.0;
pub const RIPPLE_END_RADIUS: f32 = 64.0;

#[derive(Debug)]
pub struct Effects {
    ripples: Vec<Ripple>,
    bursts: Vec<Burst>,
    pub wave: Countdown,
    pub shimmer: Countdown,
    pub beam: Countdown,
    ripple_lifetime: Duration,
    burst_lifetime: Duration,
    spawned: u64,
}

impl Effects {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            ripples: Vec::new(),
            bursts: Vec::new(),
            wave: Countdown::new(tunables.wave_lifetime),
            shimmer: Countdown::new(tunables.shimmer_lifetime),
            beam: Countdown::new(tunables.shimmer_lifetime),
            ripple_lifetime: tunables.ripple_lifetime,
            burst_lifetime: tunables.burst_lifetime,
            spawned: 0,
        }
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn spawn_ripple(&mut self, x: f32, y: f32, now: Instant) {
        self.ripples.push(Ripple { x, y, born: now });
    }

    pub fn spawn_burst(&mut self, x: f32, y: f32, now: Instant) {
        let seed = self.spawned as f64 * 17.13;
        self.spawned += 1;
        let particles = (0..BURST_PARTICLES)
            .map(|i| {
                let i = i as f64;
                Particle {
                    angle: (i as f32 / BURST_PARTICLES as f32) * TAU
                        + seeded(seed + i * 12.9) * 0.35,
                    reach: 36.0 + seeded(seed + i * 78.2) * 70.0,
                    size: 1.1 + seeded(seed + i * 37.7) * 1.6,
                }
            })
            .collect();
        self.bursts.push(Burst {
            x,
            y,
            born: now,
            particles,
        });
    }

    /// Hold completion: wave pulse, shimmer, beam flash and a burst at `(x, y)`.
    pub fn celebrate(&mut self, x: f32, y: f32, now: Instant) {
        self.wave.fire(now);
        self.shimmer.fire(now);
        self.beam.fire(now);
        self.spawn_burst(x, y, now);
    }

    /// Normalized age (0..1) of an effect born at `born` with `lifetime`.
    fn age(born: Instant, lifetime: Duration, now: Instant) -> f32 {
        if lifetime.is_zero() {
            return 1.0;
        }
        (now.saturating_duration_since(born).as_secs_f32() / lifetime.as_secs_f32()).min(1.0)
    }

    /// `(radius, alpha)` of a ripple at `now`.
    pub fn ripple_shape(&self, ripple: &Ripple, now: Instant) -> (f32, f32) {
        let t = Self::age(ripple.born, self.ripple_lifetime, now);
        let radius = RIPPLE_START_RADIUS + (RIPPLE_END_RADIUS - RIPPLE_START_RADIUS) * t;
        (radius, 0.45 * (1.0 - t))
    }

    /// Progress (0..1) of a burst at `now`.
    pub fn burst_progress(&self, burst: &Burst, now: Instant) -> f32 {
        Self::age(burst.born, self.burst_lifetime, now)
    }

    /// Drops effects whose lifetime has elapsed.
    pub fn prune(&mut self, now: Instant) {
        let ripple_life = self.ripple_lifetime;
        let burst_life = self.burst_lifetime;
        self.ripples
            .retain(|r| now.saturating_duration_since(r.born) < ripple_life);
        self.bursts
            .retain(|b| now.saturating_duration_since(b.born) < burst_life);
        for countdown in [&mut self.wave, &mut self.shimmer, &mut self.beam] {
            if !countdown.is_active(now) {
                countdown.clear();
            }
        }
    }

    pub fn clear(&mut self) {
        self.ripples.clear();
        self.bursts.clear();
        self.wave.clear();
        self.shimmer.clear();
        self.beam.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.ripples.is_empty()
            && self.bursts.is_empty()
            && self.wave.started.is_none()
            && self.shimmer.started.is_none()
            && self.beam.started.is_none()
    }
}
