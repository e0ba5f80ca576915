//! URL token resolution.
//!
//! Turns the path segments after `/help/<product>/` into a concrete
//! `(product, version, page)` triple. Resolution only consults the product
//! registry; it never touches the filesystem.
//!
//! Tokens are classified front to back:
//!
//! - a version (`2024.1`) selects a historical version;
//! - a lone page (`guide.html`) selects a page at the current version;
//! - anything else is first tried as a nested product (`suite` + `module`
//!   → `suite/module`) and otherwise starts a literal page path.
//!
//! If the last token is a page, the remaining tokens joined with `/` form
//! the page path; otherwise the product's initial page is used.

use hd_registry::{Products, is_page, is_version};

/// Upper bound on nested product levels followed for one request.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Fully resolved document address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDocument {
    /// Product name, possibly nested (`suite/module`).
    pub product: String,
    /// Version to serve.
    pub version: String,
    /// Page path relative to the product root.
    pub page: String,
}

/// Resolve `tokens` under `product`.
///
/// Returns `None` if `product`, or the nested product the tokens lead to,
/// is unknown, or if nesting exceeds [`MAX_NESTING_DEPTH`].
#[must_use]
pub fn resolve(products: &Products, product: &str, tokens: &[&str]) -> Option<ResolvedDocument> {
    let mut product = product.to_owned();
    let mut tokens = tokens;

    for _ in 0..=MAX_NESTING_DEPTH {
        let entry = products.get(&product)?;
        let default_version = entry.default_version.as_str();
        let initial_page = entry.initial_page.as_str();

        let Some((&first, rest)) = tokens.split_first() else {
            return Some(ResolvedDocument {
                version: default_version.to_owned(),
                page: initial_page.to_owned(),
                product,
            });
        };

        let (version, remaining) = if is_version(first) {
            (first, rest)
        } else if is_page(first) && rest.is_empty() {
            return Some(ResolvedDocument {
                version: default_version.to_owned(),
                page: first.to_owned(),
                product,
            });
        } else {
            let candidate = format!("{product}/{first}");
            if products.exists(&candidate) {
                product = candidate;
                tokens = rest;
                continue;
            }
            // Literal page path starting at this token
            (default_version, tokens)
        };

        let page = match remaining.last() {
            Some(last) if is_page(last) => remaining.join("/"),
            _ => initial_page.to_owned(),
        };
        return Some(ResolvedDocument {
            version: version.to_owned(),
            page,
            product,
        });
    }

    tracing::debug!(%product, "Nested product depth exceeded");
    None
}

#[cfg(test)]
mod tests {
    use hd_registry::ProductEntry;
    use pretty_assertions::assert_eq;

    use super::*;

    fn doc(product: &str, version: &str, page: &str) -> Option<ResolvedDocument> {
        Some(ResolvedDocument {
            product: product.to_owned(),
            version: version.to_owned(),
            page: page.to_owned(),
        })
    }

    fn registry() -> Products {
        [
            ("acme", "2024.1", "index.html"),
            ("suite", "2023.4", "start.html"),
            ("suite/module", "2024.2", "overview.html"),
        ]
        .into_iter()
        .map(|(name, version, page)| (name.to_owned(), ProductEntry::new(version, page)))
        .collect()
    }

    #[test]
    fn test_no_tokens_yields_defaults() {
        assert_eq!(
            resolve(&registry(), "acme", &[]),
            doc("acme", "2024.1", "index.html")
        );
    }

    #[test]
    fn test_unknown_product() {
        assert_eq!(resolve(&registry(), "nope", &[]), None);
        assert_eq!(resolve(&registry(), "nope", &["2024.1", "a.html"]), None);
    }

    #[test]
    fn test_version_only() {
        assert_eq!(
            resolve(&registry(), "acme", &["2023.4"]),
            doc("acme", "2023.4", "index.html")
        );
    }

    #[test]
    fn test_page_only() {
        assert_eq!(
            resolve(&registry(), "acme", &["guide.html"]),
            doc("acme", "2024.1", "guide.html")
        );
    }

    #[test]
    fn test_version_and_page() {
        assert_eq!(
            resolve(&registry(), "acme", &["2023.4", "guide.html"]),
            doc("acme", "2023.4", "guide.html")
        );
    }

    #[test]
    fn test_version_and_nested_page_path() {
        assert_eq!(
            resolve(&registry(), "acme", &["2023.4", "api", "ref.html"]),
            doc("acme", "2023.4", "api/ref.html")
        );
    }

    #[test]
    fn test_version_with_non_page_suffix_keeps_initial_page() {
        assert_eq!(
            resolve(&registry(), "acme", &["2023.4", "api"]),
            doc("acme", "2023.4", "index.html")
        );
    }

    #[test]
    fn test_nested_product_takes_precedence() {
        assert_eq!(
            resolve(&registry(), "suite", &["module"]),
            doc("suite/module", "2024.2", "overview.html")
        );
        assert_eq!(
            resolve(&registry(), "suite", &["module", "2023.1", "a.html"]),
            doc("suite/module", "2023.1", "a.html")
        );
        assert_eq!(
            resolve(&registry(), "suite", &["module", "a.html"]),
            doc("suite/module", "2024.2", "a.html")
        );
    }

    #[test]
    fn test_nested_page_named_like_product() {
        // A lone page token is never tried as a nested product
        let products: Products = [
            ("p", ProductEntry::new("2024.1", "index.html")),
            ("p/x.html", ProductEntry::new("2020.1", "index.html")),
        ]
        .into_iter()
        .map(|(n, e)| (n.to_owned(), e))
        .collect();

        assert_eq!(
            resolve(&products, "p", &["x.html"]),
            doc("p", "2024.1", "x.html")
        );
    }

    #[test]
    fn test_literal_path_when_not_a_product() {
        assert_eq!(
            resolve(&registry(), "acme", &["api", "ref.html"]),
            doc("acme", "2024.1", "api/ref.html")
        );
    }

    #[test]
    fn test_literal_path_without_page_falls_back_to_initial_page() {
        assert_eq!(
            resolve(&registry(), "acme", &["api", "ref"]),
            doc("acme", "2024.1", "index.html")
        );
        assert_eq!(
            resolve(&registry(), "acme", &["api"]),
            doc("acme", "2024.1", "index.html")
        );
    }

    #[test]
    fn test_version_after_literal_segment_is_part_of_path() {
        assert_eq!(
            resolve(&registry(), "acme", &["api", "2023.4", "ref.html"]),
            doc("acme", "2024.1", "api/2023.4/ref.html")
        );
    }

    #[test]
    fn test_page_not_in_last_position_is_ignored() {
        assert_eq!(
            resolve(&registry(), "acme", &["2023.4", "guide.html", "extra"]),
            doc("acme", "2023.4", "index.html")
        );
    }

    #[test]
    fn test_bare_html_suffix_is_not_a_page() {
        assert_eq!(
            resolve(&registry(), "acme", &[".html"]),
            doc("acme", "2024.1", "index.html")
        );
    }

    #[test]
    fn test_depth_cap() {
        let mut name = "p".to_owned();
        let mut products = vec![(name.clone(), ProductEntry::new("2024.1", "index.html"))];
        for _ in 0..=MAX_NESTING_DEPTH {
            name.push_str("/x");
            products.push((name.clone(), ProductEntry::new("2024.1", "index.html")));
        }
        let products: Products = products.into_iter().collect();

        let within = vec!["x"; MAX_NESTING_DEPTH];
        let beyond = vec!["x"; MAX_NESTING_DEPTH + 1];

        assert!(resolve(&products, "p", &within).is_some());
        assert_eq!(resolve(&products, "p", &beyond), None);
    }
}
