mod support;

use creatorpipeline_e2e::api::{ApiClient, PublishDay, SeriesUpdate};
use creatorpipeline_e2e::E2eError;
use support::FakeApi;

async fn client() -> (FakeApi, ApiClient) {
    let api = FakeApi::start().await;
    let client = ApiClient::new(&api.api_config()).unwrap();
    (api, client)
}

/// A created pipeline is listed exactly once; once deleted it is gone and a
/// direct fetch answers 404.
#[tokio::test]
async fn create_list_delete_pipeline() {
    let (_api, client) = client().await;

    let pipeline = client
        .create_pipeline("My Test Pipeline", Some("created by test"))
        .await
        .unwrap();
    assert_eq!(pipeline.name, "My Test Pipeline");

    let listed = client.list_pipelines().await.unwrap();
    assert_eq!(listed.iter().filter(|p| p.id == pipeline.id).count(), 1);

    client.delete_pipeline(pipeline.id).await.unwrap();

    let listed = client.list_pipelines().await.unwrap();
    assert!(listed.iter().all(|p| p.id != pipeline.id));

    let err = client.get_pipeline(pipeline.id).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got {}", err);
}

/// Deleting a pipeline takes its series and episodes with it
#[tokio::test]
async fn delete_pipeline_cascades() {
    let (_api, client) = client().await;

    let pipeline = client.create_pipeline("Pipeline With Data", None).await.unwrap();
    let series = client
        .create_series(pipeline.id, "Test Series", &[PublishDay::Monday], None)
        .await
        .unwrap();
    let episode = client
        .create_episode(series.id, "Test Episode", Some("Description"), None)
        .await
        .unwrap();

    client.delete_pipeline(pipeline.id).await.unwrap();

    assert!(client.get_series(series.id).await.unwrap_err().is_not_found());
    assert!(client.get_episode(episode.id).await.unwrap_err().is_not_found());
    assert!(client.list_episodes(series.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn api_errors_carry_request_context() {
    let (_api, client) = client().await;

    match client.get_series(999).await {
        Err(E2eError::Api {
            method,
            path,
            status,
            body,
        }) => {
            assert_eq!(method, "GET");
            assert_eq!(path, "/series/999");
            assert_eq!(status, 404);
            assert!(body.contains("Series 999 not found"));
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn series_and_episode_updates() {
    let (_api, client) = client().await;

    let pipeline = client.create_pipeline("Test Pipeline", None).await.unwrap();
    let series = client
        .create_series(
            pipeline.id,
            "Original Series",
            &[PublishDay::Monday, PublishDay::Wednesday],
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        series.publish_days,
        vec![PublishDay::Monday, PublishDay::Wednesday]
    );

    let updated = client
        .update_series(
            series.id,
            &SeriesUpdate {
                name: Some("Renamed Series".to_string()),
                publish_days: Some(vec![PublishDay::Monday, PublishDay::Friday]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed Series");
    assert_eq!(updated.publish_days, vec![PublishDay::Monday, PublishDay::Friday]);

    let episode = client
        .create_episode(series.id, "Pilot", None, Some("2024-05-06"))
        .await
        .unwrap();
    assert_eq!(episode.scheduled_date.as_deref(), Some("2024-05-06"));

    let moved = client.update_episode_status(episode.id, "SCHEDULED").await.unwrap();
    assert_eq!(moved.status, "SCHEDULED");

    let date = client.suggested_date(series.id).await.unwrap();
    assert_eq!(date, "2024-05-06");

    assert_eq!(client.list_series(pipeline.id).await.unwrap().len(), 1);
    client.delete_series(series.id).await.unwrap();
    assert!(client.list_series(pipeline.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cleanup_all_removes_everything() {
    let (_api, client) = client().await;

    for name in ["First Pipeline", "Second Pipeline"] {
        let pipeline = client.create_pipeline(name, None).await.unwrap();
        client
            .create_series(pipeline.id, "Series", &[PublishDay::Friday], None)
            .await
            .unwrap();
    }

    client.cleanup_all().await;
    assert!(client.list_pipelines().await.unwrap().is_empty());

    // Nothing left to delete is not an error
    client.cleanup_all().await;
}

#[tokio::test]
async fn cleanup_all_tolerates_unreachable_api() {
    let config = creatorpipeline_e2e::config::ApiConfig {
        base_url: "http://127.0.0.1:9/api/v1".to_string(),
        request_timeout_ms: 500,
        ..Default::default()
    };
    let client = ApiClient::new(&config).unwrap();
    client.cleanup_all().await;
}
