//! Page objects over the UI regions
//!
//! Page objects don't drive the browser themselves. They append steps to a
//! [`Script`], which the driver runs as one browser session.

mod board;
mod calendar;
mod dialog;
mod series_list;
mod sidebar;

pub use board::BoardPage;
pub use calendar::CalendarPage;
pub use dialog::DialogPage;
pub use series_list::SeriesListPage;
pub use sidebar::SidebarNav;

use crate::locator::Locator;
use crate::playwright::Script;
use crate::step::{LoadState, Step, WaitState};

/// Timeout for the explicit waits page objects issue
pub const DEFAULT_WAIT_MS: u64 = 5000;

/// Capabilities shared by every region
pub trait BasePage {
    /// Path the region is reached at
    fn route(&self) -> String;

    fn goto(&self, script: &mut Script) {
        script.goto(&self.route());
        self.wait_for_network_idle(script);
    }

    fn wait_for_network_idle(&self, script: &mut Script) {
        script.push(Step::WaitForLoadState {
            state: LoadState::NetworkIdle,
            timeout_ms: Some(DEFAULT_WAIT_MS),
        });
    }

    fn wait_for_visible(&self, script: &mut Script, locator: &Locator) {
        script.wait_for(locator, WaitState::Visible, Some(DEFAULT_WAIT_MS));
    }

    fn wait_for_hidden(&self, script: &mut Script, locator: &Locator) {
        script.wait_for(locator, WaitState::Hidden, Some(DEFAULT_WAIT_MS));
    }

    fn click_and_wait(&self, script: &mut Script, locator: &Locator) {
        script.click(locator);
        self.wait_for_network_idle(script);
    }

    /// Fill then blur, so validation runs
    fn fill_input(&self, script: &mut Script, locator: &Locator, value: &str) {
        script.fill(locator, value);
        script.push(Step::Blur {
            locator: locator.clone(),
        });
    }
}

/// Quote text for use inside a CSS `:has-text("...")`
pub(crate) fn css_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
