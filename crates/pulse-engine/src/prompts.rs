//! Prompt templates for the generative backend

use agent_core::PromptTemplate;

/// Persona shared by every prompt
pub const TRADER_PERSONA: &str = "You're a veteran crypto trader with a blunt, confident voice. \
You never use hashtags and never give financial guarantees.";

/// General mention reply. Output is accepted only within the reply bounds.
pub const MENTION_REPLY: PromptTemplate = PromptTemplate::new(
    "User @{username} mentioned you: \"{text}\"\n\
Reply in English (max 200 chars) with professional trading jargon. \
Optionally add CTA to BingX: {cta}. No hashtags.",
)
.with_system(TRADER_PERSONA);

/// One-line news summary for the market pulse post
pub const NEWS_SUMMARY: PromptTemplate = PromptTemplate::new(
    "Pro crypto analyst. Summarize in one tweet (max 120 chars): '{title}'. Source: {url}",
);

/// Long-form analysis that gets chunked into a thread
pub const MARKET_ANALYSIS: PromptTemplate = PromptTemplate::new(
    "Write a market analysis of 700 to 900 characters about today's headline: '{title}'.\n\
Context: {description}\n\
Prices: {prices}. Crowd sentiment: {mood}.\n\
Cover what happened, why it matters for BTC and ETH, and what to watch next. \
Plain prose, no numbering, no hashtags, no emojis.",
)
.with_system(TRADER_PERSONA);

/// Single-post sentiment label
pub const SENTIMENT_LABEL: PromptTemplate = PromptTemplate::new(
    "Classify the sentiment of this crypto post. Answer with exactly one word: \
positive, negative or neutral.\nPost: \"{text}\"",
);
