//! URL slug generation for property listings.

use std::collections::HashSet;

/// Fallback slug for titles without any alphanumeric characters.
const FALLBACK_SLUG: &str = "property";

/// Turn a title into a URL slug: lowercase ASCII, runs of other characters
/// collapsed to `-`, no leading or trailing `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Pick `base` if it is free, otherwise `base-N` with the smallest free `N >= 1`.
#[must_use]
pub fn resolve_unique_slug<I, S>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: HashSet<String> = taken.into_iter().map(|s| s.as_ref().to_string()).collect();

    if !taken.contains(base) {
        return base.to_string();
    }

    (1_u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sea View Flat"), "sea-view-flat");
        assert_eq!(slugify("  3BHK -- Villa, Goa!  "), "3bhk-villa-goa");
        assert_eq!(slugify("Café Royale"), "caf-royale");
        assert_eq!(slugify("!!!"), "property");
    }

    #[test]
    fn test_resolve_unique_slug_free_base() {
        assert_eq!(resolve_unique_slug("sea-view-flat", Vec::<String>::new()), "sea-view-flat");
        assert_eq!(
            resolve_unique_slug("sea-view-flat", ["sea-view-flat-1"]),
            "sea-view-flat"
        );
    }

    #[test]
    fn test_resolve_unique_slug_takes_smallest_free_suffix() {
        assert_eq!(resolve_unique_slug("sea-view-flat", ["sea-view-flat"]), "sea-view-flat-1");
        assert_eq!(
            resolve_unique_slug(
                "sea-view-flat",
                ["sea-view-flat", "sea-view-flat-1", "sea-view-flat-3"]
            ),
            "sea-view-flat-2"
        );
    }
}
