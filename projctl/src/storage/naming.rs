//! Storage name generation.

use uuid::Uuid;

use super::{FileCategory, extension_of};

/// A random UUID v4 followed by the original extension, e.g. `report.PDF` becomes
/// `1b4e28ba-2fa1-11d2-883f-0016d3cca427.PDF`. The original stem is never reused.
pub fn generate_unique_filename(original: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Whether `name` has the shape [`generate_unique_filename`] produces: a UUID stem and a
/// stored-category extension
pub fn is_generated_name(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    stem.len() == 36 && Uuid::try_parse(stem).is_ok() && FileCategory::from_extension(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keeps_extension_and_drops_stem() {
        let name = generate_unique_filename("../secret/deck.pdf");
        assert!(name.ends_with(".pdf"));
        assert!(!name.contains("deck"));
        assert!(!name.contains('/'));
        let stem = name.trim_end_matches(".pdf");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_without_extension() {
        let name = generate_unique_filename("README");
        assert!(Uuid::parse_str(&name).is_ok());
    }

    #[test]
    fn test_is_generated_name() {
        assert!(is_generated_name(&generate_unique_filename("deck.pdf")));
        assert!(is_generated_name(&generate_unique_filename("LOGO.PNG")));
        assert!(!is_generated_name(&generate_unique_filename("notes.txt")));
        assert!(!is_generated_name(&generate_unique_filename("README")));
        assert!(!is_generated_name("deck.pdf"));
        assert!(!is_generated_name("1b4e28ba2fa111d2883f0016d3cca427.pdf"));
        assert!(!is_generated_name("1b4e28ba-2fa1-11d2-883f-0016d3cca427\".pdf"));
    }

    #[test]
    fn test_same_original_gives_distinct_names() {
        let names: HashSet<_> = (0..100).map(|_| generate_unique_filename("logo.png")).collect();
        assert_eq!(names.len(), 100);
    }
}
