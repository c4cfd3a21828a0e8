use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{ensure, E2eResult};
use crate::locator::TextMatch;
use crate::pages::{BasePage, BoardPage, CalendarPage, SidebarNav};
use crate::runner::{Scenario, ScenarioContext, Suite};
use crate::step::Step;

pub(super) fn suite() -> Suite {
    Suite {
        name: "Smoke Tests",
        before_all: None,
        before_each: None,
        after_all: None,
        scenarios: vec![
            Scenario {
                title: "app loads without errors",
                run: app_loads,
            },
            Scenario {
                title: "sidebar renders with navigation items",
                run: sidebar_renders,
            },
            Scenario {
                title: "can navigate between views",
                run: navigate_between_views,
            },
            Scenario {
                title: "calendar moves between months",
                run: calendar_months,
            },
            Scenario {
                title: "board renders status columns",
                run: board_columns,
            },
            Scenario {
                title: "API health check",
                run: api_health,
            },
        ],
    }
}

/// Console errors that matter; missing favicons and 404s are noise
fn critical_errors(errors: &[String]) -> Vec<&String> {
    errors
        .iter()
        .filter(|e| !e.contains("favicon") && !e.contains("404"))
        .collect()
}

fn has_navigation(links: &[String]) -> bool {
    links.iter().map(|l| l.to_lowercase()).any(|l| {
        l.contains("pipeline") || l.contains("calendar") || l.contains("board")
    })
}

fn app_loads(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let sidebar = SidebarNav::new();
        let output = ctx
            .browse(|s| {
                sidebar.goto(s);
                s.push(Step::ExpectTitle {
                    pattern: TextMatch::pattern(".*"),
                });
            })
            .await?;

        let critical = critical_errors(&output.console_errors);
        ensure(critical.is_empty(), format!("console errors: {:?}", critical))
    })
}

fn sidebar_renders(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let sidebar = SidebarNav::new();
        let output = ctx
            .browse(|s| {
                sidebar.goto(s);
                s.expect_visible(&sidebar.sidebar);
                sidebar.capture_nav_links(s, "links");
            })
            .await?;

        let links = output.output_strings("links");
        ensure(!links.is_empty(), "sidebar has no links")?;
        ensure(
            has_navigation(&links),
            format!("no pipeline, calendar or board link in {:?}", links),
        )
    })
}

fn navigate_between_views(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let sidebar = SidebarNav::new();
        ctx.browse(|s| {
            sidebar.goto(s);
            sidebar.go_to_calendar(s);
            sidebar.go_to_board(s);
        })
        .await?;
        Ok(())
    })
}

fn calendar_months(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let calendar = CalendarPage::new();
        let output = ctx
            .browse(|s| {
                calendar.goto(s);
                calendar.wait_for_visible(s, &calendar.calendar);
                calendar.capture_month_title(s, "current");
                calendar.next_month(s);
                calendar.capture_month_title(s, "next");
                calendar.go_to_today(s);
                calendar.capture_month_title(s, "today");
            })
            .await?;

        let current = output.output_str("current");
        ensure(current.is_some(), "calendar has no month title")?;
        ensure(
            output.output_str("next") != current,
            format!("month title stayed {:?} after moving forward", current),
        )?;
        ensure(
            output.output_str("today") == current,
            "today did not return to the current month",
        )
    })
}

fn board_columns(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let board = BoardPage::new();
        let output = ctx
            .browse(|s| {
                board.goto(s);
                board.wait_for_visible(s, &board.board);
                board.capture_column_names(s, "columns");
            })
            .await?;

        let columns = output.output_strings("columns");
        ensure(!columns.is_empty(), "board has no status columns")
    })
}

fn api_health(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let url = ctx.config.api.health_url();
        let response = reqwest::get(&url).await?;
        ensure(
            response.status().is_success(),
            format!("{} returned {}", url, response.status()),
        )?;

        let health: Value = response.json().await?;
        ensure(
            health["status"] == "UP",
            format!("health status is {}", health["status"]),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_critical_errors_skip_noise() {
        let errors = vec![
            "Failed to load resource: favicon.ico".to_string(),
            "GET http://localhost:18080/api/v1/pipelines/9 404 (Not Found)".to_string(),
            "TypeError: cannot read properties of undefined".to_string(),
        ];
        let critical = critical_errors(&errors);
        assert_eq!(critical.len(), 1);
        assert!(critical[0].starts_with("TypeError"));
    }

    #[test_case(&["Content Calendar"], true ; "calendar")]
    #[test_case(&["Board View", "Settings"], true ; "board")]
    #[test_case(&["My PIPELINE"], true ; "case insensitive")]
    #[test_case(&["Settings", "Help"], false ; "none")]
    fn test_has_navigation(links: &[&str], expected: bool) {
        let links: Vec<String> = links.iter().map(|l| l.to_string()).collect();
        assert_eq!(has_navigation(&links), expected);
    }

    #[test]
    fn test_suite_order() {
        let suite = suite();
        assert_eq!(suite.scenarios.len(), 6);
        assert_eq!(suite.scenarios[0].title, "app loads without errors");
        assert!(suite.before_each.is_none());
    }
}
