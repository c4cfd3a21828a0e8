use futures::future::BoxFuture;

use super::{expect_gone, expect_untouched};
use crate::api::PublishDay;
use crate::error::{ensure, E2eResult};
use crate::locator::TextMatch;
use crate::pages::{BasePage, DialogPage, SeriesListPage, SidebarNav};
use crate::runner::{Scenario, ScenarioContext, Suite};

pub(super) fn suite() -> Suite {
    Suite {
        name: "Pipeline CRUD",
        before_all: None,
        before_each: Some(cleanup),
        after_all: Some(cleanup),
        scenarios: vec![
            Scenario {
                title: "create a new pipeline via sidebar",
                run: create_via_sidebar,
            },
            Scenario {
                title: "edit pipeline name",
                run: edit_name,
            },
            Scenario {
                title: "delete pipeline with no children",
                run: delete_without_children,
            },
            Scenario {
                title: "delete pipeline cascades to series and episodes",
                run: delete_cascades,
            },
            Scenario {
                title: "cancel create pipeline does not create",
                run: cancel_create,
            },
            Scenario {
                title: "cancel edit pipeline does not save changes",
                run: cancel_edit,
            },
            Scenario {
                title: "deleting current pipeline removes it from sidebar",
                run: delete_keeps_other,
            },
        ],
    }
}

fn cleanup(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        ctx.api.cleanup_all().await;
        Ok(())
    })
}

async fn pipeline_names(ctx: &ScenarioContext) -> E2eResult<Vec<String>> {
    Ok(ctx
        .api
        .list_pipelines()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect())
}

fn count_named(names: &[String], name: &str) -> usize {
    names.iter().filter(|n| n.as_str() == name).count()
}

fn create_via_sidebar(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let seed = ctx.api.create_pipeline("Seed Pipeline", Some("For navigation")).await?;
        let series = SeriesListPage::new(seed.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            sidebar.click_new_pipeline(s);
            dialog.expect_open_with_heading(s, "create pipeline");
            dialog.fill_name(s, "My Test Pipeline");
            dialog.create(s);
            s.expect_url(TextMatch::pattern(r".*/pipelines/\d+/series.*"));
            s.expect_visible(&sidebar.pipeline_link("My Test Pipeline"));
        })
        .await?;

        let names = pipeline_names(ctx).await?;
        ensure(
            count_named(&names, "My Test Pipeline") == 1,
            format!("expected 'My Test Pipeline' once in {:?}", names),
        )
    })
}

fn edit_name(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline = ctx.api.create_pipeline("Original Name", Some("Test description")).await?;
        let series = SeriesListPage::new(pipeline.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            sidebar.open_pipeline_edit(s, "Original Name");
            dialog.expect_open_with_heading(s, "edit pipeline");
            dialog.replace_name(s, "Updated Name");
            dialog.save(s);
            s.expect_visible(&sidebar.pipeline_link("Updated Name"));
            s.expect_not_visible(&sidebar.pipeline_link("Original Name"));
        })
        .await?;

        let updated = ctx.api.get_pipeline(pipeline.id).await?;
        ensure(
            updated.name == "Updated Name",
            format!("pipeline name is '{}'", updated.name),
        )
    })
}

fn delete_without_children(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let keep = ctx.api.create_pipeline("Keep This", Some("Will remain")).await?;
        ctx.api.create_pipeline("Delete Me", Some("Will be deleted")).await?;
        let series = SeriesListPage::new(keep.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            s.expect_visible(&sidebar.pipeline_link("Keep This"));
            s.expect_visible(&sidebar.pipeline_link("Delete Me"));
            sidebar.open_pipeline_edit(s, "Delete Me");
            dialog.expect_open(s);
            dialog.request_delete(s, "are you sure");
            dialog.confirm_delete(s);
            dialog.expect_closed(s);
            s.expect_not_visible(&sidebar.pipeline_link("Delete Me"));
            s.expect_visible(&sidebar.pipeline_link("Keep This"));
        })
        .await?;

        let names = pipeline_names(ctx).await?;
        ensure(count_named(&names, "Delete Me") == 0, "'Delete Me' is still listed")?;
        ensure(count_named(&names, "Keep This") == 1, "'Keep This' is gone")
    })
}

fn delete_cascades(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let pipeline = ctx.api.create_pipeline("Pipeline With Data", Some("Has children")).await?;
        let owned = ctx
            .api
            .create_series(pipeline.id, "Test Series", &[PublishDay::Monday], None)
            .await?;
        let episode = ctx
            .api
            .create_episode(owned.id, "Test Episode", Some("Description"), None)
            .await?;
        let keep = ctx.api.create_pipeline("Safe Pipeline", Some("Unaffected")).await?;

        let series = SeriesListPage::new(keep.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            sidebar.open_pipeline_edit(s, "Pipeline With Data");
            dialog.request_delete(s, "series and episodes");
            dialog.confirm_delete(s);
            s.expect_not_visible(&sidebar.pipeline_link("Pipeline With Data"));
        })
        .await?;

        let remaining = ctx.api.list_pipelines().await?;
        ensure(
            remaining.iter().all(|p| p.id != pipeline.id),
            format!("pipeline {} is still listed", pipeline.id),
        )?;
        expect_gone(ctx.api.get_pipeline(pipeline.id).await, "deleted pipeline")?;
        expect_gone(ctx.api.get_series(owned.id).await, "series of deleted pipeline")?;
        expect_gone(ctx.api.get_episode(episode.id).await, "episode of deleted pipeline")
    })
}

fn cancel_create(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let seed = ctx.api.create_pipeline("Seed", Some("Seed")).await?;
        let before = pipeline_names(ctx).await?;
        let series = SeriesListPage::new(seed.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            sidebar.click_new_pipeline(s);
            dialog.expect_open(s);
            dialog.fill_name(s, "Cancelled Pipeline");
            dialog.cancel(s);
        })
        .await?;

        let after = pipeline_names(ctx).await?;
        ensure(
            after.len() == before.len(),
            format!("pipeline count changed from {} to {}", before.len(), after.len()),
        )?;
        ensure(
            count_named(&after, "Cancelled Pipeline") == 0,
            "'Cancelled Pipeline' was created",
        )
    })
}

fn cancel_edit(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let created = ctx.api.create_pipeline("Original", Some("Description")).await?;
        let before = ctx.api.get_pipeline(created.id).await?;
        let count_before = ctx.api.list_pipelines().await?.len();
        let series = SeriesListPage::new(created.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            sidebar.open_pipeline_edit(s, "Original");
            dialog.expect_open(s);
            dialog.replace_name(s, "Changed Name");
            dialog.fill_description(s, "Changed description");
            dialog.cancel(s);
            s.expect_visible(&sidebar.pipeline_link("Original"));
        })
        .await?;

        let after = ctx.api.get_pipeline(created.id).await?;
        let count_after = ctx.api.list_pipelines().await?.len();
        expect_untouched("pipeline", &before, &after, count_before, count_after)
    })
}

fn delete_keeps_other(ctx: &mut ScenarioContext) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        ctx.api.create_pipeline("First Pipeline", Some("First")).await?;
        let second = ctx.api.create_pipeline("Second Pipeline", Some("Second")).await?;
        let series = SeriesListPage::new(second.id);
        let sidebar = SidebarNav::new();
        let dialog = DialogPage::new();

        ctx.browse(|s| {
            series.goto(s);
            s.expect_visible(&sidebar.pipeline_link("First Pipeline"));
            s.expect_visible(&sidebar.pipeline_link("Second Pipeline"));
            sidebar.open_pipeline_edit(s, "First Pipeline");
            s.click(&dialog.delete_button);
            s.expect_visible(&dialog.alert_dialog);
            dialog.confirm_delete(s);
            s.expect_not_visible(&sidebar.pipeline_link("First Pipeline"));
            s.expect_visible(&sidebar.pipeline_link("Second Pipeline"));
        })
        .await?;

        let names = pipeline_names(ctx).await?;
        ensure(count_named(&names, "First Pipeline") == 0, "'First Pipeline' is still listed")?;
        ensure(count_named(&names, "Second Pipeline") == 1, "'Second Pipeline' is gone")
    })
}
