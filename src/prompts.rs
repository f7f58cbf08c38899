//! Centralized prompt definitions for the generative extractor
//!
//! Keeping prompt text in one module makes it easier to maintain, test, and
//! version.

/// Instruction block for key point extraction.
///
/// The extractor appends the optional product context and the review text
/// when building the request.
pub const KEY_POINT_INSTRUCTIONS: &str = r#"Analyze the following product review and extract 3-5 brief, bulleted key points.
Focus on product features, quality, and user sentiment.
Return ONLY the bullet points, one per line, without asterisks or numbering.
If the review is gibberish or has no meaningful content, return "No clear key points found"."#;
