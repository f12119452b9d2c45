//! Comment and title formatting for notifications

/// Placeholder replaced by the entity type's display name
pub const PLACEHOLDER: &str = "<<here>>";

/// Number of characters kept from free-text content.
///
/// "Hello World, this is long text" previews as "Hello World, this is ..."
/// (the 21st character is the space before the marker).
pub const CONTENT_PREVIEW_CHARS: usize = 21;

/// Marker appended to truncated content
pub const ELLIPSIS: &str = "...";

/// Substitute every `<<here>>` in `template` with `display_name`
pub fn format_template(template: &str, display_name: &str) -> String {
    template.replace(PLACEHOLDER, display_name)
}

/// Cap free text at 21 characters and append `...`.
///
/// The marker is appended even when the text is already short.
pub fn truncate_content(text: &str) -> String {
    let mut preview: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
    preview.push_str(ELLIPSIS);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_template() {
        assert_eq!(format_template("<<here>> was created", "Order"), "Order was created");
        assert_eq!(format_template("no placeholder", "Order"), "no placeholder");
        assert_eq!(
            format_template("<<here>> / <<here>>", "Order"),
            "Order / Order"
        );
    }

    #[test]
    fn test_truncate_long_content() {
        assert_eq!(
            truncate_content("Hello World, this is long text"),
            "Hello World, this is ..."
        );
    }

    #[test]
    fn test_truncate_short_content_still_gets_ellipsis() {
        assert_eq!(truncate_content("Hi"), "Hi...");
        assert_eq!(truncate_content(""), "...");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(30);
        let truncated = truncate_content(&text);
        assert_eq!(truncated.chars().count(), CONTENT_PREVIEW_CHARS + ELLIPSIS.len());
    }
}
