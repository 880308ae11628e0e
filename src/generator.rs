use crate::location::{LocationEvent, DEFAULT_ROSTER, LATITUDE_RANGE, LONGITUDE_RANGE};
use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn fraction(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Adapts any `rand` generator.
#[derive(Debug)]
pub struct RngSource<R>(R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn fraction(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster must contain at least one user")]
    Empty,
}

/// Users eligible to appear in generated events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster(Vec<String>);

impl Roster {
    pub fn new<I, S>(users: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let users: Vec<String> = users.into_iter().map(Into::into).collect();
        if users.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self(users))
    }

    pub fn contains(&self, user: &str) -> bool {
        self.0.iter().any(|u| u == user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self(DEFAULT_ROSTER.iter().map(|u| u.to_string()).collect())
    }
}

pub struct EventGenerator<R, C> {
    roster: Roster,
    random: R,
    clock: C,
}

impl<R: RandomSource, C: Clock> EventGenerator<R, C> {
    pub fn new(roster: Roster, random: R, clock: C) -> Self {
        Self {
            roster,
            random,
            clock,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn generate(&mut self) -> LocationEvent {
        let latitude = sample(&mut self.random, &LATITUDE_RANGE);
        let longitude = sample(&mut self.random, &LONGITUDE_RANGE);
        let index = self.random.pick(self.roster.len());
        LocationEvent::new(
            latitude,
            longitude,
            self.roster.get(index),
            self.clock.now(),
        )
    }
}

fn sample<R: RandomSource>(random: &mut R, range: &RangeInclusive<f64>) -> f64 {
    let (low, high) = (*range.start(), *range.end());
    low + (high - low) * random.fraction()
}
