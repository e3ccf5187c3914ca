//! Length & Referral Policy
//!
//! Last stage before anything is published: optional call-to-action suffix,
//! hard ceiling with ellipsis, optional "challenge" suffix for short generic
//! mentions. Pure apart from the injected random source.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::classifier::contains_any;
use crate::model::char_len;

/// Platform ceiling for a single post
pub const CEILING: usize = 280;

pub const ELLIPSIS: &str = "...";

/// Original inputs with any of these never get a challenge suffix
pub const CHALLENGE_EXEMPT_KEYWORDS: &[&str] = &["thank", "price", "btc", "eth", "signal", "bingx"];

pub const CHALLENGES: [&str; 2] = [
    "\n\nStill reading? Your PnL is bleeding. GO TRADE WITH EDGE.",
    "\n\nFollow me or stay a weak hand. Your choice.",
];

/// Cut `text` to `ceiling` chars, replacing the tail with `...` when it is cut.
pub fn truncate_to_ceiling(text: &str, ceiling: usize) -> String {
    if char_len(text) <= ceiling {
        return text.to_string();
    }
    let marker = char_len(ELLIPSIS);
    if ceiling <= marker {
        return text.chars().take(ceiling).collect();
    }
    let mut out: String = text.chars().take(ceiling - marker).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Tunables for [`ReplyPolicy::finalize`]
#[derive(Clone, Debug)]
pub struct ReplyPolicy {
    pub ceiling: usize,

    /// Chance of appending the referral suffix
    pub referral_probability: f64,

    /// Original inputs shorter than this (in chars) may be challenged
    pub challenge_input_limit: usize,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            ceiling: CEILING,
            referral_probability: 0.3,
            challenge_input_limit: 30,
        }
    }
}

impl ReplyPolicy {
    /// Decide once per reply whether the referral link is offered.
    ///
    /// A probability outside `0..=1` (or NaN) is clamped, NaN counting as 0.
    pub fn draw_referral<'a, R: Rng + ?Sized>(&self, link: &'a str, rng: &mut R) -> Option<&'a str> {
        let p = if self.referral_probability.is_nan() {
            0.0
        } else {
            self.referral_probability.clamp(0.0, 1.0)
        };
        (!link.is_empty() && rng.gen_bool(p)).then_some(link)
    }

    /// Append `" → <link>"` when a link was drawn
    pub fn with_referral(body: &str, ref_link: Option<&str>) -> String {
        match ref_link {
            Some(link) if !link.is_empty() => format!("{body} → {link}"),
            _ => body.to_string(),
        }
    }

    fn challenge_eligible(&self, original_input: &str) -> bool {
        char_len(original_input) < self.challenge_input_limit
            && !contains_any(&original_input.to_lowercase(), CHALLENGE_EXEMPT_KEYWORDS)
    }

    /// Produce the publishable reply text.
    ///
    /// `ref_link` is the outcome of [`ReplyPolicy::draw_referral`]. The
    /// challenge is only attempted when `allow_challenge` is set (general
    /// mention path) and is dropped silently if it would break the ceiling.
    pub fn finalize<R: Rng + ?Sized>(
        &self,
        candidate: &str,
        ref_link: Option<&str>,
        allow_challenge: bool,
        original_input: &str,
        rng: &mut R,
    ) -> String {
        let with_ref = Self::with_referral(candidate, ref_link);
        let mut out = truncate_to_ceiling(&with_ref, self.ceiling);

        if allow_challenge && self.challenge_eligible(original_input) {
            if let Some(extra) = CHALLENGES.choose(rng) {
                if char_len(&out) + char_len(extra) <= self.ceiling {
                    out.push_str(extra);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LINK: &str = "https://www.bingx.com";

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_truncate_exactly_at_ceiling() {
        let long = "a".repeat(400);
        let out = truncate_to_ceiling(&long, CEILING);
        assert_eq!(char_len(&out), 280);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..277], &long[..277]);
    }

    #[test]
    fn test_truncate_leaves_short_text() {
        assert_eq!(truncate_to_ceiling("gm", CEILING), "gm");
        let exact = "b".repeat(280);
        assert_eq!(truncate_to_ceiling(&exact, CEILING), exact);
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let long = "🟢".repeat(300);
        let out = truncate_to_ceiling(&long, CEILING);
        assert_eq!(char_len(&out), 280);
        assert!(out.starts_with("🟢"));
    }

    #[test]
    fn test_finalize_never_exceeds_ceiling() {
        let policy = ReplyPolicy::default();
        let mut rng = rng();
        for len in [0, 100, 250, 270, 279, 280, 281, 500] {
            let body = "x".repeat(len);
            for _ in 0..50 {
                let out = policy.finalize(&body, Some(LINK), true, "gm", &mut rng);
                assert!(char_len(&out) <= 280, "len {len} produced {}", char_len(&out));
            }
        }
    }

    #[test]
    fn test_overlong_candidate_ends_with_ellipsis() {
        let policy = ReplyPolicy::default();
        let out = policy.finalize(&"y".repeat(300), None, false, "", &mut rng());
        assert_eq!(char_len(&out), 280);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_referral_rate_is_about_thirty_percent() {
        let policy = ReplyPolicy::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 2000;
        let hits = (0..trials)
            .filter(|_| policy.draw_referral(LINK, &mut rng).is_some())
            .count();
        let rate = hits as f64 / f64::from(trials);
        assert!((rate - 0.3).abs() <= 0.05, "rate was {rate}");
    }

    #[test]
    fn test_no_link_means_no_suffix() {
        let always = ReplyPolicy {
            referral_probability: 1.0,
            ..Default::default()
        };
        assert_eq!(always.draw_referral("", &mut rng()), None);
        assert_eq!(always.draw_referral(LINK, &mut rng()), Some(LINK));
        assert_eq!(ReplyPolicy::with_referral("gm", None), "gm");
        assert_eq!(ReplyPolicy::with_referral("gm", Some("")), "gm");
        assert_eq!(ReplyPolicy::with_referral("gm", Some(LINK)), format!("gm → {LINK}"));
    }

    #[test]
    fn test_out_of_range_probability_never_panics() {
        let mut rng = rng();
        for p in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.5, 3.0] {
            let policy = ReplyPolicy {
                referral_probability: p,
                ..Default::default()
            };
            let drawn = policy.draw_referral(LINK, &mut rng);
            assert_eq!(drawn.is_some(), p >= 1.0, "probability {p}");
        }
    }

    #[test]
    fn test_challenge_for_short_generic_input() {
        let policy = ReplyPolicy {
            referral_probability: 0.0,
            ..Default::default()
        };
        let out = policy.finalize("Scrolling charts or executing setups?", None, true, "gm", &mut rng());
        assert!(CHALLENGES.iter().any(|c| out.ends_with(c)));
    }

    #[test]
    fn test_challenge_skipped_for_exempt_or_long_input() {
        let policy = ReplyPolicy {
            referral_probability: 0.0,
            ..Default::default()
        };
        let body = "Scrolling charts or executing setups?";
        let exempt = policy.finalize(body, None, true, "btc?", &mut rng());
        assert_eq!(exempt, body);
        let long_input = "this is a much longer mention than thirty chars";
        assert_eq!(policy.finalize(body, None, true, long_input, &mut rng()), body);
        assert_eq!(policy.finalize(body, None, false, "gm", &mut rng()), body);
    }

    #[test]
    fn test_challenge_dropped_when_it_would_overflow() {
        let policy = ReplyPolicy {
            referral_probability: 0.0,
            ..Default::default()
        };
        let body = "z".repeat(250);
        let out = policy.finalize(&body, None, true, "gm", &mut rng());
        assert_eq!(out, body);
    }
}
