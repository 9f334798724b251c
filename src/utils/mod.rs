//! Project-specific utilities live here.

/// Capitalize a name: first character upper-case, the rest lower-case.
///
/// `"john"` becomes `"John"` and `"mcDONALD"` becomes `"Mcdonald"`.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("john"), "John");
        assert_eq!(capitalize("DOE"), "Doe");
        assert_eq!(capitalize("mcDONALD"), "Mcdonald");
        assert_eq!(capitalize("élodie"), "Élodie");
        assert_eq!(capitalize(""), "");
    }
}
