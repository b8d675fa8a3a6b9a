//! Demo data source: seeded, paginated, optionally slow and flaky.
//!
//! Pages are generated synchronously from a seeded RNG when requested, so a
//! given seed always yields the same feed; only delivery is asynchronous.
//! Each request spawns a task that sleeps for the configured latency and
//! then posts a `PageLoaded` event through the feed's sink.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use waterfall::core::error::FeedError;
use waterfall::core::item::{Item, Page};
use waterfall::core::observe::{EventSink, FeedEvent};
use waterfall::core::pagination::{PageLoader, PageRequest};

const WORDS: &[&str] = &[
    "amber", "harbor", "quiet", "morning", "ridge", "lantern", "copper", "meadow", "drift",
    "signal", "orchard", "granite", "velvet", "tide", "ember", "hollow", "canopy", "static",
    "marble", "sparrow", "glacier", "fern", "neon", "cobalt", "dune", "willow", "echo",
];

const AUTHORS: &[&str] = &[
    "mira", "oskar", "tamsin", "jun", "priya", "felix", "ines", "kofi", "lena", "ravi",
];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub seed: u64,
    pub page_size: usize,
    pub latency: Duration,
    /// Total pages before the source reports exhaustion.
    pub pages: u64,
    /// Probability in `[0, 1]` that a request fails.
    pub fail_rate: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            page_size: 24,
            latency: Duration::from_millis(400),
            pages: 12,
            fail_rate: 0.0,
        }
    }
}

pub struct DemoSource {
    sink: EventSink,
    config: DemoConfig,
    rng: StdRng,
}

impl DemoSource {
    pub fn new(sink: EventSink, config: DemoConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { sink, config, rng }
    }

    /// Build the result for one request.
    fn generate(&mut self, request: PageRequest) -> Result<Page, FeedError> {
        let fail_rate = self.config.fail_rate.clamp(0.0, 1.0);
        if fail_rate > 0.0 && self.rng.gen_bool(fail_rate) {
            return Err(FeedError::PageLoad {
                generation: request.generation,
                page: request.page,
                reason: "simulated network failure".into(),
            });
        }
        if request.page >= self.config.pages {
            return Ok(Page::default());
        }

        let first_id = request.page * self.config.page_size as u64;
        let items = (0..self.config.page_size as u64)
            .map(|i| self.item(first_id + i))
            .collect();
        Ok(Page {
            items,
            has_more: request.page + 1 < self.config.pages,
        })
    }

    fn item(&mut self, id: u64) -> Item {
        let width = f64::from(self.rng.gen_range(240u32..=480));
        // Portrait-heavy mix like a photo feed.
        let ratio = self.rng.gen_range(0.6..1.8);
        let height = (width * ratio).round();

        let word_count = self.rng.gen_range(2..=10);
        let title = (0..word_count)
            .filter_map(|_| WORDS.choose(&mut self.rng).copied())
            .collect::<Vec<_>>()
            .join(" ");

        let mut item = Item::new(id, width, height, title);
        if self.rng.gen_bool(0.15) {
            item = item.with_placeholder(format!("#{:06x}", self.rng.gen_range(0..0x1000000u32)));
        }
        if let Some(author) = AUTHORS.choose(&mut self.rng) {
            item = item.with_extra("author", *author);
        }
        item.with_extra("likes", self.rng.gen_range(0..5000u32).to_string())
    }
}

impl PageLoader for DemoSource {
    fn load_page(&mut self, request: PageRequest) {
        let outcome = self.generate(request);
        let sink = self.sink.clone();
        let latency = self.config.latency;
        tracing::debug!(
            "source: page {} (generation {}) scheduled in {latency:?}",
            request.page,
            request.generation
        );
        tokio::spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if sink.send(FeedEvent::PageLoaded { request, outcome }).is_err() {
                tracing::trace!("source: feed gone, dropping page {}", request.page);
            }
        });
    }
}
