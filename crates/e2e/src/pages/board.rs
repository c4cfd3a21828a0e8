use super::{css_text, BasePage};
use crate::locator::Locator;
use crate::playwright::Script;
use crate::step::{CaptureKind, Step};

const CARD: &str = r#"[data-testid="kanban-card"], .kanban-card, .episode-card"#;

/// Kanban board of episodes by status
#[derive(Debug, Clone)]
pub struct BoardPage {
    pub board: Locator,
    pub columns: Locator,
    pub cards: Locator,
}

impl Default for BoardPage {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardPage {
    pub fn new() -> Self {
        let page = Locator::page();
        Self {
            board: page.css(r#"[data-testid="kanban-board"], .kanban-board, .board"#),
            columns: page.css(r#"[data-testid="kanban-column"], .kanban-column, .board-column"#),
            cards: page.css(r#"[data-testid="kanban-card"], .kanban-card, .board-card, .episode-card"#),
        }
    }

    pub fn column(&self, status: &str) -> Locator {
        let text = css_text(status);
        Locator::page().css(&format!(
            r#"[data-testid="kanban-column-{lower}"], [data-status="{s}"], .kanban-column:has-text("{s}")"#,
            lower = text.to_lowercase(),
            s = text
        ))
    }

    pub fn card(&self, title: &str) -> Locator {
        let t = css_text(title);
        Locator::page().css(&format!(
            r#"[data-testid="kanban-card"]:has-text("{t}"), .kanban-card:has-text("{t}"), .episode-card:has-text("{t}")"#,
            t = t
        ))
    }

    pub fn cards_in_column(&self, status: &str) -> Locator {
        self.column(status).css(CARD)
    }

    pub fn drag_card_to_column(&self, script: &mut Script, title: &str, status: &str) {
        script.push(Step::DragTo {
            source: self.card(title),
            target: self.column(status),
        });
        self.wait_for_network_idle(script);
    }

    pub fn click_card(&self, script: &mut Script, title: &str) {
        self.click_and_wait(script, &self.card(title));
    }

    pub fn capture_column_names(&self, script: &mut Script, key: &str) {
        let headers = self.columns.css(r#"h2, h3, [class*="header"], [class*="title"]"#);
        script.capture(key, &headers, CaptureKind::AllTextContents);
    }

    pub fn capture_card_count(&self, script: &mut Script, status: &str, key: &str) {
        script.capture(key, &self.cards_in_column(status), CaptureKind::Count);
    }

    pub fn capture_card_exists(&self, script: &mut Script, title: &str, key: &str) {
        script.capture(key, &self.card(title), CaptureKind::IsVisible);
    }
}

impl BasePage for BoardPage {
    fn route(&self) -> String {
        "/board".to_string()
    }
}
