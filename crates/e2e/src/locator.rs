//! Playwright locator expressions
//!
//! A [`Locator`] is the JavaScript expression Playwright evaluates to find
//! elements, built up from `page` the same way the Playwright API chains.

use serde::{Deserialize, Serialize};

/// How text is matched: exact-ish string or a regular expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMatch {
    /// Playwright's default string match (substring, case-insensitive)
    Text(String),
    Pattern { source: String, ignore_case: bool },
}

impl TextMatch {
    /// Case-insensitive regular expression
    pub fn pattern(source: impl Into<String>) -> Self {
        TextMatch::Pattern {
            source: source.into(),
            ignore_case: true,
        }
    }

    pub fn pattern_case_sensitive(source: impl Into<String>) -> Self {
        TextMatch::Pattern {
            source: source.into(),
            ignore_case: false,
        }
    }

    pub fn to_js(&self) -> String {
        match self {
            TextMatch::Text(text) => js_string(text),
            TextMatch::Pattern {
                source,
                ignore_case,
            } => {
                let flags = if *ignore_case { "i" } else { "" };
                format!("/{}/{}", source.replace('/', "\\/"), flags)
            }
        }
    }
}

impl From<&str> for TextMatch {
    fn from(text: &str) -> Self {
        TextMatch::Text(text.to_string())
    }
}

impl From<String> for TextMatch {
    fn from(text: String) -> Self {
        TextMatch::Text(text)
    }
}

/// Quote a string as a JavaScript literal
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    expr: String,
}

impl Locator {
    /// The page itself; every other locator chains from here
    pub fn page() -> Self {
        Self {
            expr: "page".to_string(),
        }
    }

    pub fn js(&self) -> &str {
        &self.expr
    }

    fn chain(&self, call: String) -> Self {
        Self {
            expr: format!("{}.{}", self.expr, call),
        }
    }

    pub fn css(&self, selector: &str) -> Self {
        self.chain(format!("locator({})", js_string(selector)))
    }

    pub fn role(&self, role: &str) -> Self {
        self.chain(format!("getByRole({})", js_string(role)))
    }

    pub fn role_named(&self, role: &str, name: impl Into<TextMatch>) -> Self {
        self.chain(format!(
            "getByRole({}, {{ name: {} }})",
            js_string(role),
            name.into().to_js()
        ))
    }

    pub fn label(&self, text: impl Into<TextMatch>) -> Self {
        self.chain(format!("getByLabel({})", text.into().to_js()))
    }

    pub fn text(&self, text: impl Into<TextMatch>) -> Self {
        self.chain(format!("getByText({})", text.into().to_js()))
    }

    pub fn placeholder(&self, text: impl Into<TextMatch>) -> Self {
        self.chain(format!("getByPlaceholder({})", text.into().to_js()))
    }

    pub fn filter_has_text(&self, text: impl Into<TextMatch>) -> Self {
        self.chain(format!("filter({{ hasText: {} }})", text.into().to_js()))
    }

    pub fn first(&self) -> Self {
        self.chain("first()".to_string())
    }

    pub fn nth(&self, index: usize) -> Self {
        self.chain(format!("nth({})", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_chained_role_and_label() {
        let name = Locator::page().role("dialog").label(TextMatch::pattern("name"));
        assert_eq!(name.js(), r#"page.getByRole("dialog").getByLabel(/name/i)"#);
    }

    #[test]
    fn test_role_with_exact_name() {
        let link = Locator::page().role_named("link", "My \"Test\" Pipeline");
        assert_eq!(
            link.js(),
            r#"page.getByRole("link", { name: "My \"Test\" Pipeline" })"#
        );
    }

    #[test]
    fn test_card_filter() {
        let card = Locator::page().css("a").filter_has_text("Weekly Vlog").first();
        assert_eq!(
            card.js(),
            r#"page.locator("a").filter({ hasText: "Weekly Vlog" }).first()"#
        );
    }

    #[test_case(TextMatch::pattern("create series"), "/create series/i" ; "insensitive")]
    #[test_case(TextMatch::pattern_case_sensitive("bg-primary"), "/bg-primary/" ; "sensitive")]
    #[test_case(TextMatch::pattern(r".*/pipelines/\d+/series.*"), r"/.*\/pipelines\/\d+\/series.*/i" ; "slashes escaped")]
    fn test_pattern_literal(matcher: TextMatch, expected: &str) {
        assert_eq!(matcher.to_js(), expected);
    }
}
