use crate::llm::TextModel;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentTier {
    Affordable,
    Moderate,
    Expensive,
}

impl RentTier {
    pub fn score(self) -> f64 {
        match self {
            RentTier::Affordable => 0.8,
            RentTier::Moderate => 0.5,
            RentTier::Expensive => 0.2,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let word = label
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();
        match word.as_str() {
            "affordable" => Some(RentTier::Affordable),
            "moderate" => Some(RentTier::Moderate),
            "expensive" => Some(RentTier::Expensive),
            _ => None,
        }
    }
}

/// Score used whenever a classification cannot be obtained.
pub const DEFAULT_RENT_SCORE: f64 = 0.5;

fn classification_prompt(neighborhood: &str, city: &str) -> String {
    format!(
        "You are a commercial real estate analyst familiar with neighborhood-level \
         rent levels in U.S. cities.\n\
         Rate the commercial rent of the neighborhood below relative to the rest of its city.\n\
         For instance: 'SoHo', New York is expensive; 'South Bronx', New York is affordable; \
         'Oakland', San Francisco Bay Area is moderate.\n\n\
         Neighborhood: '{neighborhood}', {city}\n\n\
         Answer with exactly one word: affordable, moderate, or expensive."
    )
}

/// LLM rent-tier classifier memoized per `(neighborhood, city)`.
///
/// Memoized scores never expire; the memo is bounded and evicts the least
/// recently used pair.
pub struct RentClassifier {
    model: Arc<dyn TextModel>,
    memo: Mutex<LruCache<(String, String), Option<f64>>>,
}

impl RentClassifier {
    pub fn new(model: Arc<dyn TextModel>, capacity: NonZeroUsize) -> Self {
        Self {
            model,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn affordability(&self, neighborhood: &str, city: &str) -> f64 {
        self.classify(neighborhood, city)
            .await
            .unwrap_or(DEFAULT_RENT_SCORE)
    }

    /// Tier score, or `None` when the model is unreachable or answers with no known tier.
    ///
    /// Unrecognized answers are memoized; model errors are retried on the next call.
    pub async fn classify(&self, neighborhood: &str, city: &str) -> Option<f64> {
        let memo_key = (neighborhood.to_string(), city.to_string());
        if let Some(score) = self.memo.lock().await.get(&memo_key) {
            return *score;
        }

        let label = match self
            .model
            .classify(&classification_prompt(neighborhood, city))
            .await
        {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(neighborhood, city, metric = "rent_cost", "Rent classification failed: {}", e);
                return None;
            }
        };

        let score = RentTier::parse(&label).map(RentTier::score);
        if score.is_none() {
            tracing::warn!(
                neighborhood,
                city,
                metric = "rent_cost",
                label = %label,
                "Unrecognized rent tier"
            );
        }

        self.memo.lock().await.put(memo_key, score);
        score
    }

    pub async fn memo_len(&self) -> usize {
        self.memo.lock().await.len()
    }
}
