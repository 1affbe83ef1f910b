// src/utils/html.rs

/// Sanitizes rich text (course descriptions, FAQ answers) against a tag whitelist.
///
/// Formatting tags such as `<b>`, `<p>` and `<ul>` survive; `<script>` is
/// removed together with its content, as are event-handler attributes.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
