//! Remote path, content and commit message derivation for drafts

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lower-case `title` and collapse every run of characters outside `[a-z0-9]`
/// into a single hyphen. Leading and trailing hyphens are kept.
pub fn slugify(title: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&title.to_lowercase(), "-")
        .into_owned()
}

/// Remote path of a draft: `slugify(title).md`
pub fn draft_path(title: &str) -> String {
    format!("{}.md", slugify(title))
}

/// Markdown document written for a draft
pub fn render_content(title: &str, body: &str) -> String {
    format!("# {}\n\n{}", title, body)
}

/// Commit message for writing a draft: "Add post" for a new path,
/// "Update post" when the path already exists
pub fn commit_message(title: &str, exists: bool) -> String {
    if exists {
        format!("Update post: {}", title)
    } else {
        format!("Add post: {}", title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
        assert_eq!(slugify("a   b"), "a-b");
    }

    #[test]
    fn test_slugify_keeps_edge_hyphens() {
        assert_eq!(slugify("  ---  "), "-");
        assert_eq!(slugify("!Launch!"), "-launch-");
    }

    #[test]
    fn test_slugify_non_ascii() {
        assert_eq!(slugify("Café Déjà vu"), "caf-d-j-vu");
    }

    #[test]
    fn test_draft_path() {
        assert_eq!(draft_path("Hello, World! 2024"), "hello-world-2024.md");
        assert_eq!(draft_path("  ---  "), "-.md");
    }

    #[test]
    fn test_render_content() {
        assert_eq!(render_content("Title", "Body text"), "# Title\n\nBody text");
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(commit_message("My Post", false), "Add post: My Post");
        assert_eq!(commit_message("My Post", true), "Update post: My Post");
    }
}
