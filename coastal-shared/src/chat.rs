/// Canned chat responder
///
/// Matches keywords in the visitor's message, case-insensitively, against an
/// ordered rule table. The first rule with any matching keyword answers;
/// nothing matches → the fallback prompt.

/// Financing questions
pub const FINANCING_REPLY: &str = "Great question! In South Carolina, most buyers use a conventional, \
FHA, or VA loan. I can help you estimate a monthly payment if you tell me your price range and down payment.";

/// Area questions
pub const NEIGHBORHOOD_REPLY: &str = "Those are all popular areas in South Carolina. Tell me your budget \
and what kind of lifestyle you're looking for (urban, suburban, coastal, etc.), and I can suggest specific \
neighborhoods.";

/// Tour scheduling
pub const TOUR_REPLY: &str = "I can help you get ready to book a tour. What days and times usually work \
best for you, and which area or specific property are you interested in?";

/// No rule matched
pub const FALLBACK_REPLY: &str = "I'm here to help with South Carolina real estate: neighborhoods, prices, \
mortgages, or booking tours. What would you like to know?";

const RULES: &[(&[&str], &str)] = &[
    (&["mortgage", "loan"], FINANCING_REPLY),
    (&["charleston", "myrtle", "greenville"], NEIGHBORHOOD_REPLY),
    (&["tour", "showing", "visit"], TOUR_REPLY),
];

/// Picks the reply for a visitor message
pub fn reply(message: &str) -> &'static str {
    let text = message.trim().to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financing() {
        assert_eq!(reply("What mortgage rates can I get?"), FINANCING_REPLY);
        assert_eq!(reply("  LOAN options  "), FINANCING_REPLY);
    }

    #[test]
    fn test_neighborhoods() {
        assert_eq!(reply("Tell me about Charleston"), NEIGHBORHOOD_REPLY);
        assert_eq!(reply("myrtle beach condos"), NEIGHBORHOOD_REPLY);
        assert_eq!(reply("GREENVILLE"), NEIGHBORHOOD_REPLY);
    }

    #[test]
    fn test_tours() {
        assert_eq!(reply("Can I book a showing?"), TOUR_REPLY);
        assert_eq!(reply("I'd like to visit on Saturday"), TOUR_REPLY);
    }

    #[test]
    fn test_first_rule_wins() {
        // Financing is checked before areas and tours
        assert_eq!(reply("loan for a house in Charleston, then a tour"), FINANCING_REPLY);
        assert_eq!(reply("tour homes in Greenville"), NEIGHBORHOOD_REPLY);
    }

    #[test]
    fn test_substring_matching() {
        // "tour" inside "detour" still matches
        assert_eq!(reply("took a detour"), TOUR_REPLY);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(reply("hello"), FALLBACK_REPLY);
        assert_eq!(reply(""), FALLBACK_REPLY);
    }
}
