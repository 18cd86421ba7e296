//! Automatic session naming from the first user message.

/// Prompt sent to the model to name a fresh session.
pub fn title_prompt(first_message: &str) -> String {
    format!(
        "Generate a concise, 3-5 word title for a chat session that starts with this message: \"{first_message}\""
    )
}

/// Turn a model-produced candidate into the final session title.
///
/// The candidate is trimmed and stripped of quote characters; if what is left
/// is implausibly short or long (or the request produced nothing), the title
/// falls back to an excerpt of the first message.
pub fn resolve_title(candidate: &str, first_message: &str) -> String {
    let cleaned: String = candidate
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    let len = cleaned.chars().count();
    if len > 2 && len < 50 {
        cleaned
    } else {
        fallback_title(first_message)
    }
}

pub fn fallback_title(first_message: &str) -> String {
    let excerpt: String = first_message.chars().take(20).collect();
    format!("Chat: {excerpt}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quotes_the_first_message() {
        assert_eq!(
            title_prompt("I can't sleep"),
            "Generate a concise, 3-5 word title for a chat session that starts with this message: \"I can't sleep\""
        );
    }

    #[test]
    fn plausible_candidates_pass_through() {
        assert_eq!(resolve_title("Sleep Help", "msg"), "Sleep Help");
        assert_eq!(resolve_title("  Sleep Help \n", "msg"), "Sleep Help");
    }

    #[test]
    fn quote_characters_are_stripped() {
        assert_eq!(
            resolve_title("\"My 'Great' Title\"", "msg"),
            "My Great Title"
        );
    }

    #[test]
    fn short_candidates_fall_back() {
        assert_eq!(resolve_title("Hi", "How do I relax?"), "Chat: How do I relax?...");
        assert_eq!(resolve_title("", "How do I relax?"), "Chat: How do I relax?...");
        assert_eq!(resolve_title("   ", "How do I relax?"), "Chat: How do I relax?...");
        // Three characters is the minimum that survives.
        assert_eq!(resolve_title("Zen", "msg"), "Zen");
    }

    #[test]
    fn long_candidates_fall_back() {
        let forty_nine = "a".repeat(49);
        let fifty = "a".repeat(50);
        assert_eq!(resolve_title(&forty_nine, "msg"), forty_nine);
        assert_eq!(resolve_title(&fifty, "msg"), "Chat: msg...");
    }

    #[test]
    fn length_is_checked_after_stripping_quotes() {
        // 51 raw characters shrink to 49 once the quotes go.
        let quoted = format!("\"{}\"", "a".repeat(49));
        assert_eq!(resolve_title(&quoted, "msg"), "a".repeat(49));
    }

    #[test]
    fn fallback_takes_the_first_twenty_characters() {
        assert_eq!(
            fallback_title("This message is definitely longer than twenty characters"),
            "Chat: This message is defi..."
        );
        assert_eq!(fallback_title("Short"), "Chat: Short...");
        // Counted in characters, not bytes.
        assert_eq!(
            fallback_title("こんにちは、今日は少し疲れています。どうすれば元気になりますか"),
            "Chat: こんにちは、今日は少し疲れています。どう..."
        );
    }
}
