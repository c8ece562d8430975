use pulldown_cmark::{html, Options, Parser};

/// Converts release-note Markdown into an HTML fragment.
///
/// The output is embedded verbatim into a build's message, so implementations
/// must produce well-formed HTML.
pub trait MarkdownRenderer {
    fn to_html(&self, markdown: &str) -> String;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> String,
{
    fn to_html(&self, markdown: &str) -> String {
        self(markdown)
    }
}

/// GitHub-flavoured CommonMark renderer backed by `pulldown-cmark`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, parser);
        out
    }
}
