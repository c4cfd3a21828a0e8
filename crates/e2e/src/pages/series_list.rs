use super::BasePage;
use crate::api::PublishDay;
use crate::locator::{Locator, TextMatch};
use crate::playwright::Script;
use crate::step::{CaptureKind, Step};

/// Series grid at `/pipelines/:pipelineId/series`
#[derive(Debug, Clone)]
pub struct SeriesListPage {
    pub pipeline_id: i64,
    pub new_series_button: Locator,
    pub create_first_series_button: Locator,
    pub series_grid: Locator,
    pub empty_state: Locator,
}

impl SeriesListPage {
    pub fn new(pipeline_id: i64) -> Self {
        let page = Locator::page();
        Self {
            pipeline_id,
            new_series_button: page.role_named("button", TextMatch::pattern("new series")),
            create_first_series_button: page
                .role_named("button", TextMatch::pattern("create your first series")),
            series_grid: page.css(".grid"),
            empty_state: page.text(TextMatch::pattern("no series yet")),
        }
    }

    /// Open the create dialog from either the empty state or the toolbar
    pub fn click_new_series(&self, script: &mut Script) {
        script.push(Step::ClickEither {
            preferred: self.create_first_series_button.clone(),
            fallback: self.new_series_button.clone(),
        });
    }

    /// Cards are links wrapping the card body
    pub fn series_card(&self, name: &str) -> Locator {
        Locator::page().css("a").filter_has_text(name).first()
    }

    /// Every card link matching `name`, for absence checks
    pub fn series_cards(&self, name: &str) -> Locator {
        Locator::page().css("a").filter_has_text(name)
    }

    pub fn click_series(&self, script: &mut Script, name: &str) {
        self.click_and_wait(script, &self.series_card(name));
    }

    /// The edit button only shows while the card is hovered
    pub fn open_edit_dialog(&self, script: &mut Script, name: &str) {
        let card = self.series_card(name);
        script.hover(&card);
        script.click(&card.css(r#"button[title="Edit series"]"#));
    }

    /// Weekday toggle inside the series dialog
    pub fn day_toggle(&self, dialog: &Locator, day: PublishDay) -> Locator {
        dialog.css(&format!(r#"button[title="{}"]"#, day.title()))
    }

    pub fn toggle_day(&self, script: &mut Script, dialog: &Locator, day: PublishDay) {
        script.click(&self.day_toggle(dialog, day));
    }

    pub fn capture_publish_days(&self, script: &mut Script, name: &str, key: &str) {
        let badge = self
            .series_card(name)
            .css(r#".rounded-full, [class*="badge"]"#)
            .first();
        script.capture(key, &badge, CaptureKind::TextContent);
    }

    pub fn capture_episode_count(&self, script: &mut Script, name: &str, key: &str) {
        let count = self.series_card(name).text(TextMatch::pattern(r"\d+ episode"));
        script.capture(key, &count, CaptureKind::TextContent);
    }
}

impl BasePage for SeriesListPage {
    fn route(&self) -> String {
        format!("/pipelines/{}/series", self.pipeline_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_includes_pipeline() {
        assert_eq!(SeriesListPage::new(42).route(), "/pipelines/42/series");
    }

    #[test]
    fn test_open_edit_dialog_uses_hover_button() {
        let mut script = Script::new();
        SeriesListPage::new(1).open_edit_dialog(&mut script, "Original Series");
        assert_eq!(
            script.steps()[1].to_js(),
            r#"await page.locator("a").filter({ hasText: "Original Series" }).first().locator("button[title=\"Edit series\"]").click();"#
        );
    }

    #[test]
    fn test_day_toggle() {
        let dialog = Locator::page().role("dialog");
        let toggle = SeriesListPage::new(1).day_toggle(&dialog, PublishDay::Thursday);
        assert_eq!(
            toggle.js(),
            r#"page.getByRole("dialog").locator("button[title=\"Thursday\"]")"#
        );
    }
}
