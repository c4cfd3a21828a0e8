use futures::future::BoxFuture;

use super::{expect_gone, expect_untouched};
use crate::api::{PublishDay, Series};
use crate::error::{ensure, E2eError, E2eResult};
use crate::locator::TextMatch;
use crate::pages::{BasePage, DialogPage, SeriesListPage};
use crate::runner::{Scenario, ScenarioContext, Suite};
use crate::step::Assertion;

pub(super) fn suite() -> Suite {
    Suite {
        name: "Series CRUD",
        before_all: Some(seed_pipeline),
        before_each: None,
        after_all: Some(cleanup),
        scenarios: vec![
            Scenario {
                title: "create series via UI",
                run: create_via_ui,
            },
            Scenario {
                title: "create series with default Monday publish day",
                run: create_default_monday,
            },
            Scenario {
                title: "edit series name and publish days",
                run: edit_name_and_days,
            },
            Scenario {
                title: "delete series removes it from list",
                run: delete_series,
            },
            Scenario {
                title: "delete series cascades to episodes",
                run: delete_cascades,
            },
            Scenario {
                title: "cancel create series does not create",
                run: cancel_create,
            },
            Scenario {
                title: "cancel edit series does not save changes",
                run: cancel_edit,
            },
            Scenario {
                title: "cannot deselect all publish days",
                run: keeps_one_day,
            },
            Scenario {
                title: "series displays publish days badge correctly",
                run: weekdays_badge,
            },
            Scenario {
                title: "series card shows episode count",
                run: episode_count,
            },
        ],
    }
}

fn seed_pipeline(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        ctx.api.cleanup_all().await;
        let pipeline = ctx.api.create_pipeline("Test Pipeline", Some("For series tests")).await?;
        ctx.suite_pipeline = Some(pipeline);
        Ok(())
    })
}

fn cleanup(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        ctx.api.cleanup_all().await;
        Ok(())
    })
}

async fn series_named(ctx: &ScenarioContext, pipeline_id: i64, name: &str) -> E2eResult<Option<Series>> {
    Ok(ctx
        .api
        .list_series(pipeline_id)
        .await?
        .into_iter()
        .find(|s| s.name == name))
}

fn create_via_ui(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.click_new_series(s);
            dialog.expect_open_with_heading(s, "create series");
            dialog.fill_name(s, "Weekly Vlog");
            page.toggle_day(s, &dialog.dialog, PublishDay::Monday);
            page.toggle_day(s, &dialog.dialog, PublishDay::Tuesday);
            page.toggle_day(s, &dialog.dialog, PublishDay::Thursday);
            dialog.create(s);
            s.expect_visible(&page.series_card("Weekly Vlog"));
        })
        .await?;

        let created = series_named(ctx, pipeline_id, "Weekly Vlog")
            .await?
            .ok_or_else(|| E2eError::Assertion("'Weekly Vlog' was not created".to_string()))?;
        ensure(
            created.publish_days.contains(&PublishDay::Tuesday)
                && created.publish_days.contains(&PublishDay::Thursday),
            format!("publish days are {:?}", created.publish_days),
        )
    })
}

fn create_default_monday(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.click_new_series(s);
            dialog.expect_open(s);
            dialog.fill_name(s, "Monday Show");
            dialog.create(s);
        })
        .await?;

        let created = series_named(ctx, pipeline_id, "Monday Show")
            .await?
            .ok_or_else(|| E2eError::Assertion("'Monday Show' was not created".to_string()))?;
        ensure(
            created.publish_days == [PublishDay::Monday],
            format!("publish days are {:?}", created.publish_days),
        )
    })
}

fn edit_name_and_days(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let series = ctx
            .api
            .create_series(
                pipeline_id,
                "Original Series",
                &[PublishDay::Monday, PublishDay::Wednesday],
                None,
            )
            .await?;
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.open_edit_dialog(s, "Original Series");
            dialog.expect_open_with_heading(s, "edit series");
            dialog.replace_name(s, "Renamed Series");
            page.toggle_day(s, &dialog.dialog, PublishDay::Wednesday);
            page.toggle_day(s, &dialog.dialog, PublishDay::Friday);
            dialog.save(s);
            s.expect_visible(&page.series_card("Renamed Series"));
            s.expect_not_visible(&page.series_cards("Original Series"));
        })
        .await?;

        let updated = ctx.api.get_series(series.id).await?;
        ensure(
            updated.name == "Renamed Series",
            format!("series name is '{}'", updated.name),
        )?;
        let days = &updated.publish_days;
        ensure(
            days.contains(&PublishDay::Monday)
                && days.contains(&PublishDay::Friday)
                && !days.contains(&PublishDay::Wednesday),
            format!("publish days are {:?}", days),
        )
    })
}

fn delete_series(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        ctx.api
            .create_series(pipeline_id, "Delete Me Series", &[PublishDay::Friday], None)
            .await?;
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            s.expect_visible(&page.series_card("Delete Me Series"));
            page.open_edit_dialog(s, "Delete Me Series");
            dialog.expect_open(s);
            dialog.request_delete(s, "are you sure");
            dialog.confirm_delete(s);
            dialog.expect_closed(s);
            s.expect_not_visible(&page.series_cards("Delete Me Series"));
        })
        .await?;

        let remaining = series_named(ctx, pipeline_id, "Delete Me Series").await?;
        ensure(remaining.is_none(), "'Delete Me Series' is still listed")
    })
}

fn delete_cascades(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let series = ctx
            .api
            .create_series(pipeline_id, "Series With Episodes", &[PublishDay::Monday], None)
            .await?;
        let first = ctx
            .api
            .create_episode(series.id, "Episode 1", Some("First episode"), None)
            .await?;
        ctx.api
            .create_episode(series.id, "Episode 2", Some("Second episode"), None)
            .await?;

        let episodes = ctx.api.list_episodes(series.id).await?;
        ensure(
            episodes.len() == 2,
            format!("expected 2 episodes, found {}", episodes.len()),
        )?;

        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.open_edit_dialog(s, "Series With Episodes");
            dialog.request_delete(s, "episodes");
            dialog.confirm_delete(s);
            s.expect_not_visible(&page.series_cards("Series With Episodes"));
        })
        .await?;

        expect_gone(ctx.api.list_episodes(series.id).await, "episodes of deleted series")?;
        expect_gone(ctx.api.get_episode(first.id).await, "episode of deleted series")
    })
}

fn cancel_create(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let before = ctx.api.list_series(pipeline_id).await?.len();
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.click_new_series(s);
            dialog.expect_open(s);
            dialog.fill_name(s, "Cancelled Series");
            dialog.cancel(s);
        })
        .await?;

        let after = ctx.api.list_series(pipeline_id).await?;
        ensure(
            after.len() == before,
            format!("series count changed from {} to {}", before, after.len()),
        )?;
        ensure(
            after.iter().all(|s| s.name != "Cancelled Series"),
            "'Cancelled Series' was created",
        )
    })
}

fn cancel_edit(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let created = ctx
            .api
            .create_series(
                pipeline_id,
                "Unchanged Series",
                &[PublishDay::Saturday],
                Some("Weekend drop"),
            )
            .await?;
        let before = ctx.api.get_series(created.id).await?;
        let count_before = ctx.api.list_series(pipeline_id).await?.len();
        let page = SeriesListPage::new(pipeline_id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.open_edit_dialog(s, "Unchanged Series");
            dialog.expect_open(s);
            dialog.replace_name(s, "Should Not Change");
            page.toggle_day(s, &dialog.dialog, PublishDay::Sunday);
            dialog.cancel(s);
            s.expect_visible(&page.series_card("Unchanged Series"));
        })
        .await?;

        let after = ctx.api.get_series(created.id).await?;
        let count_after = ctx.api.list_series(pipeline_id).await?.len();
        expect_untouched("series", &before, &after, count_before, count_after)
    })
}

fn keeps_one_day(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let page = SeriesListPage::new(ctx.pipeline()?.id);
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            page.goto(s);
            page.click_new_series(s);
            dialog.expect_open(s);
            page.toggle_day(s, &dialog.dialog, PublishDay::Monday);
            s.expect(
                &page.day_toggle(&dialog.dialog, PublishDay::Monday),
                Assertion::HaveClass(TextMatch::pattern_case_sensitive("bg-primary")),
            );
            dialog.cancel(s);
        })
        .await?;
        Ok(())
    })
}

fn weekdays_badge(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        ctx.api
            .create_series(pipeline_id, "Weekday Series", &PublishDay::ALL[..5], None)
            .await?;
        let page = SeriesListPage::new(pipeline_id);

        ctx.browse(|s| {
            page.goto(s);
            let card = page.series_card("Weekday Series");
            s.expect_visible(&card);
            s.expect_visible(&card.text("Weekdays"));
        })
        .await?;
        Ok(())
    })
}

fn episode_count(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline_id = ctx.pipeline()?.id;
        let series = ctx
            .api
            .create_series(pipeline_id, "Counted Series", &[PublishDay::Sunday], None)
            .await?;
        for title in ["Pilot", "Follow Up"] {
            ctx.api.create_episode(series.id, title, None, None).await?;
        }
        let page = SeriesListPage::new(pipeline_id);

        let output = ctx
            .browse(|s| {
                page.goto(s);
                page.capture_episode_count(s, "Counted Series", "episodes");
            })
            .await?;

        let shown = output.output_str("episodes").unwrap_or_default();
        ensure(
            shown.contains("2 episode"),
            format!("card shows '{}' for 2 episodes", shown),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_seeds_once() {
        let suite = suite();
        assert!(suite.before_all.is_some());
        assert!(suite.before_each.is_none());
        assert!(suite.after_all.is_some());
        assert_eq!(suite.scenarios.len(), 10);
    }

    #[test]
    fn test_weekdays_are_first_five() {
        assert_eq!(
            &PublishDay::ALL[..5],
            &[
                PublishDay::Monday,
                PublishDay::Tuesday,
                PublishDay::Wednesday,
                PublishDay::Thursday,
                PublishDay::Friday
            ]
        );
    }
}
