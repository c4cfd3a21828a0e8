use super::BasePage;
use crate::locator::{Locator, TextMatch};
use crate::playwright::Script;
use crate::step::CaptureKind;

/// Modal dialogs: create/edit forms and the delete confirmation
#[derive(Debug, Clone)]
pub struct DialogPage {
    pub dialog: Locator,
    pub alert_dialog: Locator,
    pub title: Locator,
    pub name_input: Locator,
    pub description_input: Locator,
    pub save_button: Locator,
    pub create_button: Locator,
    pub cancel_button: Locator,
    pub delete_button: Locator,
    pub confirm_delete_button: Locator,
    pub close_button: Locator,
}

impl Default for DialogPage {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogPage {
    pub fn new() -> Self {
        let dialog = Locator::page().role("dialog");
        let alert_dialog = Locator::page().role("alertdialog");
        Self {
            title: dialog.css(r#"h1, h2, h3, [class*="title"]"#).first(),
            name_input: dialog.label(TextMatch::pattern("name")),
            description_input: dialog.label(TextMatch::pattern("description")),
            save_button: dialog.role_named("button", TextMatch::pattern("save|submit")),
            create_button: dialog.role_named("button", TextMatch::pattern("create")),
            cancel_button: dialog.role_named("button", TextMatch::pattern("cancel")),
            delete_button: dialog.role_named("button", TextMatch::pattern("delete")),
            confirm_delete_button: alert_dialog.role_named("button", TextMatch::pattern("delete")),
            close_button: dialog.role_named("button", TextMatch::pattern("close")),
            dialog,
            alert_dialog,
        }
    }

    pub fn heading(&self, pattern: &str) -> Locator {
        self.dialog.role_named("heading", TextMatch::pattern(pattern))
    }

    pub fn expect_open(&self, script: &mut Script) {
        script.expect_visible(&self.dialog);
    }

    pub fn expect_open_with_heading(&self, script: &mut Script, pattern: &str) {
        script.expect_visible(&self.dialog);
        script.expect_visible(&self.heading(pattern));
    }

    pub fn expect_closed(&self, script: &mut Script) {
        script.expect_not_visible(&self.dialog);
    }

    pub fn fill_name(&self, script: &mut Script, name: &str) {
        self.fill_input(script, &self.name_input, name);
    }

    /// Clear the name field before typing the new value
    pub fn replace_name(&self, script: &mut Script, name: &str) {
        script.clear(&self.name_input);
        script.fill(&self.name_input, name);
    }

    pub fn fill_description(&self, script: &mut Script, description: &str) {
        self.fill_input(script, &self.description_input, description);
    }

    /// Submit a create form and wait for the dialog to go away
    pub fn create(&self, script: &mut Script) {
        script.click(&self.create_button);
        self.expect_closed(script);
        self.wait_for_network_idle(script);
    }

    /// Submit an edit form and wait for the dialog to go away
    pub fn save(&self, script: &mut Script) {
        script.click(&self.save_button);
        self.expect_closed(script);
        self.wait_for_network_idle(script);
    }

    pub fn cancel(&self, script: &mut Script) {
        script.click(&self.cancel_button);
        self.expect_closed(script);
    }

    /// Start the delete from the edit dialog and check the confirmation text
    pub fn request_delete(&self, script: &mut Script, warning: &str) {
        script.click(&self.delete_button);
        script.expect_visible(&self.alert_dialog);
        script.expect_visible(&self.alert_dialog.text(TextMatch::pattern(warning)));
    }

    pub fn confirm_delete(&self, script: &mut Script) {
        script.click(&self.confirm_delete_button);
        script.expect_not_visible(&self.alert_dialog);
        self.wait_for_network_idle(script);
    }

    pub fn capture_title(&self, script: &mut Script, key: &str) {
        script.capture(key, &self.title, CaptureKind::TextContent);
    }
}

impl BasePage for DialogPage {
    /// Dialogs overlay whatever page is open
    fn route(&self) -> String {
        "/".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{Assertion, Step};

    #[test]
    fn test_save_waits_for_close() {
        let mut script = Script::new();
        DialogPage::new().save(&mut script);
        assert_eq!(
            script.steps()[1],
            Step::Expect {
                locator: Locator::page().role("dialog"),
                assertion: Assertion::NotVisible
            }
        );
    }

    #[test]
    fn test_confirm_delete_targets_alert_dialog() {
        let dialog = DialogPage::new();
        assert_eq!(
            dialog.confirm_delete_button.js(),
            r#"page.getByRole("alertdialog").getByRole("button", { name: /delete/i })"#
        );
    }

    #[test]
    fn test_request_delete_checks_warning() {
        let mut script = Script::new();
        DialogPage::new().request_delete(&mut script, "series and episodes");
        assert_eq!(script.len(), 3);
        assert!(script.steps()[2].to_js().contains("getByText(/series and episodes/i)"));
    }
}
