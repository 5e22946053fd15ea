//! Synthetic market data
//!
//! Each entity follows its own random walk: per tick the price moves by a normal draw
//! scaled by the entity's volatility and is floored at 1.0. Volumes are exponential
//! around the entity's average and message kinds are drawn 70/15/10/5 percent
//! Add/Execute/Cancel/Delete.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp1, StandardNormal};

use crate::error::HarnessError;
use crate::types::{entity_code, fixed_point, MarketEvent, MessageKind};

/// Standard deviation of the per-tick price step before volatility scaling
const STEP_STDDEV: f64 = 0.01;

const PRICE_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityProfile {
    pub symbol: String,
    pub code: u32,
    /// Current decimal price; advanced by every generated tick
    pub price: f64,
    pub volatility: f64,
    pub avg_volume: u32,
}

impl EntityProfile {
    pub fn new(symbol: &str, price: f64, volatility: f64, avg_volume: u32) -> Self {
        Self { symbol: symbol.to_string(), code: entity_code(symbol), price, volatility, avg_volume }
    }

    /// Starting profile for `symbol`. Unlisted symbols get a generic mid-cap profile.
    pub fn for_symbol(symbol: &str) -> Self {
        match symbol {
            "AAPL" => Self::new(symbol, 150.0, 0.02, 1000),
            "GOOGL" => Self::new(symbol, 2800.0, 0.025, 500),
            "MSFT" => Self::new(symbol, 300.0, 0.02, 800),
            "TSLA" => Self::new(symbol, 800.0, 0.04, 1200),
            "NVDA" => Self::new(symbol, 500.0, 0.035, 900),
            _ => Self::new(symbol, 100.0, 0.02, 1000),
        }
    }
}

pub struct MarketDataGenerator {
    rng: StdRng,
    profiles: Vec<EntityProfile>,
}

impl MarketDataGenerator {
    /// A fixed `seed` makes the price and volume sequence reproducible. Timestamps are
    /// always taken from the wall clock.
    pub fn new(profiles: Vec<EntityProfile>, seed: Option<u64>) -> Result<Self, HarnessError> {
        if profiles.is_empty() {
            return Err(HarnessError::Config("generator needs at least one entity".into()));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { rng, profiles })
    }

    pub fn from_symbols<S: AsRef<str>>(symbols: &[S], seed: Option<u64>) -> Result<Self, HarnessError> {
        let profiles = symbols.iter().map(|s| EntityProfile::for_symbol(s.as_ref())).collect();
        Self::new(profiles, seed)
    }

    pub fn profiles(&self) -> &[EntityProfile] {
        &self.profiles
    }

    /// Advance entity `index` (modulo the entity count) by one tick
    pub fn generate_event(&mut self, index: usize) -> MarketEvent {
        let idx = index % self.profiles.len();

        let step: f64 = self.rng.sample::<f64, _>(StandardNormal) * STEP_STDDEV;
        let volume_scale: f64 = self.rng.sample(Exp1);
        let kind = self.message_kind();

        let profile = &mut self.profiles[idx];
        profile.price = (profile.price + step * profile.volatility).max(PRICE_FLOOR);
        let volume = (f64::from(profile.avg_volume) * volume_scale).min(u32::MAX as f64) as u32;

        MarketEvent {
            entity_code: profile.code,
            price: fixed_point(profile.price),
            volume,
            kind,
            timestamp_micros: Utc::now().timestamp_micros().max(0) as u64,
        }
    }

    /// `n` ticks rotating across the entities in order
    pub fn generate_burst(&mut self, n: usize) -> Vec<MarketEvent> {
        (0..n).map(|i| self.generate_event(i)).collect()
    }

    fn message_kind(&mut self) -> MessageKind {
        match self.rng.gen::<f64>() {
            r if r < 0.70 => MessageKind::Add,
            r if r < 0.85 => MessageKind::Execute,
            r if r < 0.95 => MessageKind::Cancel,
            _ => MessageKind::Delete,
        }
    }
}
