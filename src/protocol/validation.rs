use crate::config::GameRules;
use crate::game::room::Player;

use super::error_codes::GameError;
use super::types::NO_ANSWER;

/// Validate a player name: non-blank after trimming, within the configured
/// length, no embedded control characters.
pub fn validate_player_name(name: &str, rules: &GameRules) -> Result<(), GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput("Name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > rules.max_player_name_length {
        return Err(GameError::InvalidInput(format!(
            "Name too long (max {} characters)",
            rules.max_player_name_length
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(GameError::InvalidInput(
            "Name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Names are unique within a room, compared case-insensitively.
pub fn validate_name_uniqueness(name: &str, players: &[Player]) -> Result<(), GameError> {
    let normalized = name.trim().to_lowercase();
    if players.iter().any(|p| p.name.to_lowercase() == normalized) {
        return Err(GameError::NameTaken(name.trim().to_string()));
    }
    Ok(())
}

pub fn validate_theme(theme: &str, rules: &GameRules) -> Result<(), GameError> {
    if theme.chars().count() > rules.max_theme_length {
        return Err(GameError::InvalidInput(format!(
            "Theme too long (max {} characters)",
            rules.max_theme_length
        )));
    }
    Ok(())
}

/// Room codes are four uppercase letters on the wire; inbound codes are
/// normalized before lookup.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Trim and clamp an answer; empty submissions become the no-answer sentinel.
pub fn sanitize_answer(text: &str, rules: &GameRules) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NO_ANSWER.to_string();
    }
    trimmed.chars().take(rules.max_answer_length).collect()
}

/// Sentinel answers (never written by a player) are exempt from the Jinx rule.
pub fn is_sentinel_answer(canonical: &str) -> bool {
    canonical.eq_ignore_ascii_case(NO_ANSWER) || canonical.eq_ignore_ascii_case(super::types::SKIPPED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameRules;

    #[test]
    fn test_player_name_limits() {
        let rules = GameRules::default();
        assert!(validate_player_name("Alice", &rules).is_ok());
        assert!(validate_player_name("  ", &rules).is_err());
        assert!(validate_player_name("", &rules).is_err());
        assert!(validate_player_name(&"x".repeat(16), &rules).is_err());
        assert!(validate_player_name(&"x".repeat(15), &rules).is_ok());
    }

    #[test]
    fn test_answer_sanitization() {
        let rules = GameRules::default();
        assert_eq!(sanitize_answer("  hi  ", &rules), "hi");
        assert_eq!(sanitize_answer("   ", &rules), NO_ANSWER);
        let long = "y".repeat(200);
        assert_eq!(sanitize_answer(&long, &rules).chars().count(), rules.max_answer_length);
    }

    #[test]
    fn test_room_code_normalization() {
        assert_eq!(normalize_room_code(" abcd "), "ABCD");
        assert_eq!(normalize_room_code("AbCd"), "ABCD");
    }

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel_answer("[no answer]"));
        assert!(is_sentinel_answer("[Skipped]"));
        assert!(!is_sentinel_answer("no answer"));
    }
}
