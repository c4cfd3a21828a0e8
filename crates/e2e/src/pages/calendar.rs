use super::{css_text, BasePage};
use crate::locator::{Locator, TextMatch};
use crate::playwright::Script;
use crate::step::{CaptureKind, Step};

/// Content calendar with month navigation
#[derive(Debug, Clone)]
pub struct CalendarPage {
    pub calendar: Locator,
    pub prev_month_button: Locator,
    pub next_month_button: Locator,
    pub today_button: Locator,
    pub month_title: Locator,
    pub events: Locator,
}

impl Default for CalendarPage {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarPage {
    pub fn new() -> Self {
        let page = Locator::page();
        Self {
            calendar: page.css(r#"[data-testid="calendar"], .calendar, .fc"#),
            prev_month_button: page.role_named("button", TextMatch::pattern("prev|back|←")),
            next_month_button: page.role_named("button", TextMatch::pattern("next|forward|→")),
            today_button: page.role_named("button", TextMatch::pattern("today")),
            month_title: page.css(r#"[data-testid="calendar-title"], .fc-toolbar-title, .calendar-title"#),
            events: page.css(r#"[data-testid="calendar-event"], .fc-event, .calendar-event"#),
        }
    }

    pub fn previous_month(&self, script: &mut Script) {
        self.click_and_wait(script, &self.prev_month_button);
    }

    pub fn next_month(&self, script: &mut Script) {
        self.click_and_wait(script, &self.next_month_button);
    }

    pub fn go_to_today(&self, script: &mut Script) {
        self.click_and_wait(script, &self.today_button);
    }

    pub fn capture_month_title(&self, script: &mut Script, key: &str) {
        script.capture(key, &self.month_title, CaptureKind::TextContent);
    }

    pub fn event(&self, title: &str) -> Locator {
        let t = css_text(title);
        Locator::page().css(&format!(
            r#"[data-testid="calendar-event"]:has-text("{t}"), .fc-event:has-text("{t}"), .calendar-event:has-text("{t}")"#,
            t = t
        ))
    }

    /// Day cell for an ISO date (`YYYY-MM-DD`)
    pub fn date_cell(&self, date: &str) -> Locator {
        Locator::page().css(&format!(r#"[data-date="{d}"], td[data-date="{d}"]"#, d = css_text(date)))
    }

    pub fn click_event(&self, script: &mut Script, title: &str) {
        self.click_and_wait(script, &self.event(title));
    }

    pub fn click_date(&self, script: &mut Script, date: &str) {
        self.click_and_wait(script, &self.date_cell(date));
    }

    pub fn drag_event_to_date(&self, script: &mut Script, title: &str, date: &str) {
        script.push(Step::DragTo {
            source: self.event(title),
            target: self.date_cell(date),
        });
        self.wait_for_network_idle(script);
    }

    pub fn capture_event_titles(&self, script: &mut Script, key: &str) {
        script.capture(key, &self.events, CaptureKind::AllTextContents);
    }

    pub fn capture_event_count(&self, script: &mut Script, key: &str) {
        script.capture(key, &self.events, CaptureKind::Count);
    }
}

impl BasePage for CalendarPage {
    fn route(&self) -> String {
        "/calendar".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_month_clicks_and_waits() {
        let mut script = Script::new();
        CalendarPage::new().next_month(&mut script);
        assert_eq!(
            script.steps()[0].to_js(),
            r#"await page.getByRole("button", { name: /next|forward|→/i }).click();"#
        );
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_date_cell() {
        let cell = CalendarPage::new().date_cell("2024-05-14");
        assert_eq!(
            cell.js(),
            r#"page.locator("[data-date=\"2024-05-14\"], td[data-date=\"2024-05-14\"]")"#
        );
    }
}
