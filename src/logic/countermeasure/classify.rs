//! Detection classification from page content
//!
//! Ordered rule set; the first rule with a matching token wins.

use crate::logic::ledger::DetectionKind;

const RULES: &[(DetectionKind, &[&str])] = &[
    (DetectionKind::Captcha, &["captcha", "verify"]),
    (DetectionKind::Block, &["blocked", "403", "429"]),
];

/// Classify page content; anything unmatched is `Suspicious`
pub fn classify_content(content: &str) -> DetectionKind {
    let text = content.to_lowercase();
    RULES
        .iter()
        .find(|(_, tokens)| tokens.iter().any(|t| text.contains(t)))
        .map(|(kind, _)| *kind)
        .unwrap_or(DetectionKind::Suspicious)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captcha_tokens() {
        assert_eq!(classify_content("<div class='CAPTCHA-box'>"), DetectionKind::Captcha);
        assert_eq!(classify_content("Please verify you are human"), DetectionKind::Captcha);
    }

    #[test]
    fn test_block_tokens() {
        assert_eq!(classify_content("Your access has been Blocked"), DetectionKind::Block);
        assert_eq!(classify_content("<h1>403 Forbidden</h1>"), DetectionKind::Block);
        assert_eq!(classify_content("HTTP 429 Too Many Requests"), DetectionKind::Block);
    }

    #[test]
    fn test_captcha_rule_wins_over_block() {
        assert_eq!(classify_content("blocked - verify to continue"), DetectionKind::Captcha);
    }

    #[test]
    fn test_unmatched_is_suspicious() {
        assert_eq!(classify_content("unusual activity detected"), DetectionKind::Suspicious);
        assert_eq!(classify_content(""), DetectionKind::Suspicious);
    }
}
