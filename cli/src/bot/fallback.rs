//! # Fallback Responder
//!
//! File: cli/src/bot/fallback.rs
//!
//! ## Overview
//!
//! A tiny deterministic responder that keeps the relay useful when no model is
//! reachable. It checks the prompt for a handful of keywords, in a fixed order,
//! and returns one of five canned replies.
//!
//! Matching is plain substring containment on the trimmed, lower-cased prompt,
//! so `hi` also matches inside words like `this`. The order of the checks is
//! part of the behavior: a greeting match wins over everything else.
//!

/// Reply for an empty or whitespace-only prompt.
pub const EMPTY_PROMPT_REPLY: &str = "Please say something.";

/// Reply for prompts containing `hello` or `hi`.
pub const GREETING_REPLY: &str = "Hi! I'm StackAI (fallback). Ask me about stocks or trading.";

/// General, non-actionable guidance for AAPL investment questions.
pub const AAPL_ADVICE_REPLY: &str = "I can't provide personalized investment advice, but here are general factors to consider when evaluating AAPL:\n\
• Your time horizon (short vs long term) and risk tolerance.\n\
• Company fundamentals: revenue growth, margins, product pipeline.\n\
• Valuation: compare price-to-earnings with peers and historical levels.\n\
• Market conditions and diversification: avoid putting too much of your portfolio into one stock.\n\
If you want a quick data-driven check, use the 'Get Price' button on the site to fetch recent prices and charts, and consult a licensed financial advisor for tailored advice.";

/// Reply for prompts mentioning prices or stocks.
pub const PRICE_REPLY: &str = "I can fetch stock prices from the site. Use the Get Price button to view the latest chart and price for a symbol like AAPL.";

/// Reply when nothing else matched.
pub const GENERIC_REPLY: &str =
    "Sorry, the AI model isn't available. This is a lightweight fallback reply.";

const GREETING_KEYWORDS: [&str; 2] = ["hello", "hi"];
const INVESTMENT_KEYWORDS: [&str; 5] = [
    "invest",
    "investment",
    "when should i",
    "should i buy",
    "buy",
];
const PRICE_KEYWORDS: [&str; 2] = ["price", "stock"];

/// Picks the canned reply for `prompt`.
pub fn fallback_response(prompt: &str) -> &'static str {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return EMPTY_PROMPT_REPLY;
    }
    let p = trimmed.to_lowercase();

    if GREETING_KEYWORDS.iter().any(|k| p.contains(k)) {
        return GREETING_REPLY;
    }
    if INVESTMENT_KEYWORDS.iter().any(|k| p.contains(k)) && p.contains("aapl") {
        return AAPL_ADVICE_REPLY;
    }
    if PRICE_KEYWORDS.iter().any(|k| p.contains(k)) {
        return PRICE_REPLY;
    }
    GENERIC_REPLY
}
