use super::BasePage;
use crate::locator::{Locator, TextMatch};
use crate::playwright::Script;
use crate::step::CaptureKind;

/// Sidebar navigation (`<aside>`): views, pipelines, new-pipeline button
#[derive(Debug, Clone)]
pub struct SidebarNav {
    pub sidebar: Locator,
    pub calendar_link: Locator,
    pub board_link: Locator,
    pub new_pipeline_button: Locator,
}

impl Default for SidebarNav {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarNav {
    pub fn new() -> Self {
        let page = Locator::page();
        Self {
            sidebar: page.css("aside"),
            calendar_link: page.role_named("link", TextMatch::pattern("content calendar")),
            board_link: page.role_named("link", TextMatch::pattern("board view")),
            new_pipeline_button: page.css(r#"button:has-text("New Pipeline")"#),
        }
    }

    pub fn pipeline_link(&self, name: &str) -> Locator {
        Locator::page().role_named("link", name)
    }

    pub fn go_to_calendar(&self, script: &mut Script) {
        self.click_and_wait(script, &self.calendar_link);
        script.expect_url(TextMatch::pattern(".*calendar.*"));
    }

    pub fn go_to_board(&self, script: &mut Script) {
        self.click_and_wait(script, &self.board_link);
        script.expect_url(TextMatch::pattern(".*board.*"));
    }

    pub fn go_to_pipeline(&self, script: &mut Script, name: &str) {
        self.click_and_wait(script, &self.pipeline_link(name));
        script.expect_url(TextMatch::pattern(r".*/pipelines/\d+/series.*"));
    }

    pub fn click_new_pipeline(&self, script: &mut Script) {
        script.click(&self.new_pipeline_button);
    }

    /// Hover a pipeline link to reveal its pencil button, then click it
    pub fn open_pipeline_edit(&self, script: &mut Script, name: &str) {
        let link = self.pipeline_link(name);
        script.hover(&link);
        script.click(&link.role_named("button", TextMatch::pattern("edit")));
    }

    /// Capture the text of every sidebar link under `name`
    pub fn capture_nav_links(&self, script: &mut Script, name: &str) {
        script.capture(name, &self.sidebar.css("a"), CaptureKind::AllTextContents);
    }
}

impl BasePage for SidebarNav {
    fn route(&self) -> String {
        "/".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;

    #[test]
    fn test_open_pipeline_edit_hovers_first() {
        let mut script = Script::new();
        SidebarNav::new().open_pipeline_edit(&mut script, "Original Name");

        assert!(matches!(&script.steps()[0], Step::Hover { locator }
            if locator.js() == r#"page.getByRole("link", { name: "Original Name" })"#));
        assert_eq!(
            script.steps()[1].to_js(),
            r#"await page.getByRole("link", { name: "Original Name" }).getByRole("button", { name: /edit/i }).click();"#
        );
    }

    #[test]
    fn test_go_to_board_checks_url() {
        let mut script = Script::new();
        SidebarNav::new().go_to_board(&mut script);
        assert_eq!(script.len(), 3);
        assert_eq!(script.steps()[2].to_js(), "await expect(page).toHaveURL(/.*board.*/i);");
    }
}
