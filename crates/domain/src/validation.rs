use crate::error::{DomainError, Result};

/// Rejects `value` when it has more than `max` characters.
///
/// Limits are counted in characters, matching `varchar(n)` columns.
pub(crate) fn ensure_max_chars(field: &str, value: &str, max: usize) -> Result<()> {
    let chars = value.chars().count();
    if chars > max {
        return Err(DomainError::InvalidInput(format!(
            "{field} too long: {chars} chars (max {max})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_characters_not_bytes() {
        let umlauts = "ä".repeat(20);
        assert_eq!(umlauts.len(), 40);
        assert!(ensure_max_chars("unit", &umlauts, 20).is_ok());
        assert!(matches!(
            ensure_max_chars("unit", &"x".repeat(21), 20),
            Err(DomainError::InvalidInput(msg)) if msg.contains("unit too long: 21")
        ));
    }
}
