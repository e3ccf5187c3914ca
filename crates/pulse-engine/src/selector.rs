//! Response Selector
//!
//! Turns a classified mention into a [`ReplyCandidate`]:
//!
//! ```text
//! Negative / Grateful / Beginner  ──► static pool (uniform pick)
//! PriceRequest                    ──► price line ──► template pool
//! General                         ──► generative fallback (20 < len ≤ 200)
//!                                      └─ otherwise ──► static pool
//! ```

use std::sync::Arc;

use agent_core::PromptParams;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::generative::GenerativeFallback;
use crate::market::{price_line, PriceSource};
use crate::model::{char_len, Category, PriceSnapshot, ReplyCandidate, ReplySource};
use crate::policy::CEILING;
use crate::prompts::MENTION_REPLY;

pub const NEGATIVE_POOL: [&str; 5] = [
    "Lost because you ignored your stop-loss? Amateur hour.",
    "Your R:R is negative because your discipline is zero.",
    "Rekt? You traded without an edge. That’s gambling, not trading.",
    "Markets don’t care about your PnL. Neither do I.",
    "You got stopped out? Good. Now you’ll learn to respect liquidity grabs.",
];

pub const GRATEFUL_POOL: [&str; 5] = [
    "You’re welcome. Now go compound that PnL.",
    "Don’t thank me, thank your discipline for following the setup.",
    "Glad the R:R worked out. Now find the next A+ entry.",
    "Thanks? Nah. Show me your closed PnL screenshot.",
    "Appreciate the signal? Now appreciate your risk management.",
];

pub const BEGINNER_POOL: [&str; 5] = [
    "Step 1: Learn price action. Step 2: Master risk management. Step 3: Trade small.",
    "New? Good. Now learn: trading ≠ gambling. Start with 1% risk per trade.",
    "Best exchange? The one with deep liquidity and low slippage. BingX has it.",
    "Guide? 1. Study support/resistance 2. Define your R:R 3. Journal every trade.",
    "Still asking? Your edge is zero. Go study candlestick patterns.",
];

pub const GENERAL_POOL: [&str; 5] = [
    "You’re either here to trade or watch others get rich. Which one?",
    "Scrolling charts or executing setups? Choose fast.",
    "Free signals. Zero cost. All you need is discipline and 1% risk.",
    "95% of traders fail because they lack edge. You look like the 5%.",
    "AI doesn’t sleep. Markets don’t close. What’s your trading plan?",
];

/// Price replies; `{prices}` is replaced by the price line
pub const PRICE_TEMPLATES: [&str; 5] = [
    "{prices}. Price is at key support. Your entry plan ready?",
    "{prices}. Volume drying up, expect volatility expansion.",
    "{prices}. Open interest rising, smart money loading.",
    "{prices}. Daily RSI oversold. Accumulation zone or trap?",
    "{prices}. Liquidity pool below at $66.5K. Watch for sweep.",
];

/// Generated replies are accepted only in `(MIN, MAX]` chars
pub const GENERATED_MIN_CHARS: usize = 20;
pub const GENERATED_MAX_CHARS: usize = 200;

/// What the selector knows about the mention
#[derive(Clone, Debug, Default)]
pub struct ReplyContext<'a> {
    pub text: &'a str,
    pub username: &'a str,

    /// Already-fetched prices; fetched on demand when absent
    pub price_snapshot: Option<PriceSnapshot>,

    /// Call-to-action link offered to the generator
    pub cta: Option<&'a str>,
}

fn pick<R: Rng + ?Sized>(pool: &[&'static str], rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

pub fn accepts_generated(text: &str) -> bool {
    let len = char_len(text);
    len > GENERATED_MIN_CHARS && len <= GENERATED_MAX_CHARS
}

pub struct ResponseSelector {
    generator: Arc<GenerativeFallback>,
    prices: Arc<dyn PriceSource>,
    ceiling: usize,
}

impl ResponseSelector {
    pub fn new(generator: Arc<GenerativeFallback>, prices: Arc<dyn PriceSource>) -> Self {
        Self {
            generator,
            prices,
            ceiling: CEILING,
        }
    }

    pub const fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Choose a reply body for `category`. Never fails.
    pub async fn select_reply<R: Rng + Send + ?Sized>(
        &self,
        category: Category,
        ctx: &ReplyContext<'_>,
        rng: &mut R,
    ) -> ReplyCandidate {
        match category {
            Category::Negative => self.from_pool(&NEGATIVE_POOL, rng),
            Category::Grateful => self.from_pool(&GRATEFUL_POOL, rng),
            Category::Beginner => self.from_pool(&BEGINNER_POOL, rng),
            Category::PriceRequest => {
                let prices = match ctx.price_snapshot {
                    Some(snapshot) => snapshot.to_string(),
                    None => price_line(self.prices.as_ref()).await,
                };
                let body = pick(&PRICE_TEMPLATES, rng).replace("{prices}", &prices);
                ReplyCandidate::new(body, ReplySource::Template, self.ceiling)
            }
            Category::General => match self.generated_reply(ctx).await {
                Some(text) => ReplyCandidate::new(text, ReplySource::Generated, self.ceiling),
                None => self.from_pool(&GENERAL_POOL, rng),
            },
        }
    }

    fn from_pool<R: Rng + ?Sized>(&self, pool: &[&'static str], rng: &mut R) -> ReplyCandidate {
        ReplyCandidate::new(pick(pool, rng), ReplySource::Pool, self.ceiling)
    }

    async fn generated_reply(&self, ctx: &ReplyContext<'_>) -> Option<String> {
        if !self.generator.enabled() {
            return None;
        }

        let params = PromptParams::new()
            .set("username", ctx.username)
            .set("text", ctx.text)
            .set("cta", ctx.cta.unwrap_or_default());

        match self.generator.generate(&MENTION_REPLY, &params).await {
            Ok(text) if accepts_generated(&text) => Some(text),
            Ok(text) => {
                tracing::debug!(chars = char_len(&text), "Generated reply outside accepted length");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Generative reply unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::generative::testing::ScriptedProvider;
    use crate::market::{MockPriceSource, PRICES_UNAVAILABLE};
    use agent_core::SafetyPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn selector_with(provider: Option<ScriptedProvider>, prices: MockPriceSource) -> ResponseSelector {
        let generator = match provider {
            Some(p) => GenerativeFallback::new(Arc::new(p), SafetyPolicy::BlockNone, Duration::from_secs(5)),
            None => GenerativeFallback::disabled(),
        };
        ResponseSelector::new(Arc::new(generator), Arc::new(prices))
    }

    fn ctx(text: &str) -> ReplyContext<'_> {
        ReplyContext {
            text,
            username: "satoshi",
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_negative_mention_uses_negative_pool() {
        let selector = selector_with(None, MockPriceSource::new());
        let text = "I got rekt on this trade, total scam";
        let category = classify(text);
        assert_eq!(category, Category::Negative);

        let reply = selector.select_reply(category, &ctx(text), &mut StdRng::seed_from_u64(1)).await;
        assert!(NEGATIVE_POOL.contains(&reply.body.as_str()));
        assert!(reply.within_limit);
        assert_eq!(reply.source, ReplySource::Pool);
    }

    #[tokio::test]
    async fn test_price_request_includes_prices() {
        let selector = selector_with(None, MockPriceSource::new());
        let text = "what's the price of btc";
        let reply = selector
            .select_reply(classify(text), &ctx(text), &mut StdRng::seed_from_u64(2))
            .await;
        assert!(reply.body.starts_with("BTC: $97,500 | ETH: $3,450. "));
        assert_eq!(reply.source, ReplySource::Template);
    }

    #[tokio::test]
    async fn test_price_request_when_prices_unavailable() {
        let selector = selector_with(None, MockPriceSource::unavailable());
        let reply = selector
            .select_reply(Category::PriceRequest, &ctx("btc?"), &mut StdRng::seed_from_u64(3))
            .await;
        assert!(reply.body.starts_with(PRICES_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_snapshot_in_context_skips_fetch() {
        let prices = Arc::new(MockPriceSource::new());
        let selector = ResponseSelector::new(Arc::new(GenerativeFallback::disabled()), prices.clone());
        let context = ReplyContext {
            price_snapshot: Some(PriceSnapshot {
                btc_usd: dec!(60000),
                eth_usd: dec!(2500),
            }),
            ..ctx("eth price")
        };
        let reply = selector
            .select_reply(Category::PriceRequest, &context, &mut StdRng::seed_from_u64(4))
            .await;
        assert!(reply.body.contains("BTC: $60,000 | ETH: $2,500"));
        assert_eq!(prices.calls(), 0);
    }

    #[tokio::test]
    async fn test_general_accepts_generated_in_window() {
        let generated = "Liquidity sits above the range. Wait for the sweep, then execute.";
        let selector = selector_with(Some(ScriptedProvider::replying(generated)), MockPriceSource::new());
        let reply = selector
            .select_reply(Category::General, &ctx("gm"), &mut StdRng::seed_from_u64(5))
            .await;
        assert_eq!(reply.body, generated);
        assert_eq!(reply.source, ReplySource::Generated);
    }

    #[tokio::test]
    async fn test_general_rejects_out_of_window_output() {
        for output in ["too short".to_string(), "x".repeat(201)] {
            let selector = selector_with(Some(ScriptedProvider::replying(&output)), MockPriceSource::new());
            let reply = selector
                .select_reply(Category::General, &ctx("gm"), &mut StdRng::seed_from_u64(6))
                .await;
            assert!(GENERAL_POOL.contains(&reply.body.as_str()));
        }
    }

    #[tokio::test]
    async fn test_general_falls_back_on_error_or_disabled() {
        let failing = selector_with(Some(ScriptedProvider::failing()), MockPriceSource::new());
        let reply = failing
            .select_reply(Category::General, &ctx("gm"), &mut StdRng::seed_from_u64(7))
            .await;
        assert!(GENERAL_POOL.contains(&reply.body.as_str()));

        let disabled = selector_with(None, MockPriceSource::new());
        let reply = disabled
            .select_reply(Category::General, &ctx("gm"), &mut StdRng::seed_from_u64(7))
            .await;
        assert_eq!(reply.source, ReplySource::Pool);
    }

    #[test]
    fn test_acceptance_window_bounds() {
        assert!(!accepts_generated(&"a".repeat(20)));
        assert!(accepts_generated(&"a".repeat(21)));
        assert!(accepts_generated(&"a".repeat(200)));
        assert!(!accepts_generated(&"a".repeat(201)));
    }

    #[test]
    fn test_pools_fit_ceiling() {
        for body in NEGATIVE_POOL.iter().chain(&GRATEFUL_POOL).chain(&BEGINNER_POOL).chain(&GENERAL_POOL) {
            assert!(char_len(body) <= CEILING);
        }
    }
}
