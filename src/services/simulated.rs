use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::NewAnnotation;

use super::AnnotationSource;

const HIGHLIGHT_PROBABILITY: f64 = 0.2;
const MAX_AGE_MS: i64 = 10_000_000;

/// Demo source: decorates another source's annotations with highlight flags
/// and time labels drawn from a seeded generator.
pub struct SimulatedSource {
    inner: Box<dyn AnnotationSource>,
    seed: u64,
    anchor: DateTime<Local>,
}

impl SimulatedSource {
    pub fn new(inner: Box<dyn AnnotationSource>, seed: u64) -> Self {
        Self {
            inner,
            seed,
            anchor: Local::now(),
        }
    }

    /// Fix the time that simulated labels count back from.
    pub fn with_anchor(mut self, anchor: DateTime<Local>) -> Self {
        self.anchor = anchor;
        self
    }
}

#[async_trait]
impl AnnotationSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulate"
    }

    async fn fetch(&self) -> Vec<NewAnnotation> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.inner
            .fetch()
            .await
            .into_iter()
            .map(|mut annotation| {
                annotation.is_highlighted = rng.random_bool(HIGHLIGHT_PROBABILITY);
                let age = Duration::milliseconds(rng.random_range(0..MAX_AGE_MS));
                annotation.time_label = (self.anchor - age).format("%H:%M").to_string();
                annotation
            })
            .collect()
    }
}
