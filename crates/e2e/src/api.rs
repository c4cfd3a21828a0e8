//! REST client for seeding, verifying and cleaning up test data
//!
//! Every call goes to the versioned API base. Successful bodies are wrapped
//! as `{"data": ...}`; any non-2xx response becomes [`E2eError::Api`]
//! carrying method, path, status and body text.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl PublishDay {
    pub const ALL: [PublishDay; 7] = [
        PublishDay::Monday,
        PublishDay::Tuesday,
        PublishDay::Wednesday,
        PublishDay::Thursday,
        PublishDay::Friday,
        PublishDay::Saturday,
        PublishDay::Sunday,
    ];

    /// Title of the toggle button in the series dialog
    pub fn title(&self) -> &'static str {
        match self {
            PublishDay::Monday => "Monday",
            PublishDay::Tuesday => "Tuesday",
            PublishDay::Wednesday => "Wednesday",
            PublishDay::Thursday => "Thursday",
            PublishDay::Friday => "Friday",
            PublishDay::Saturday => "Saturday",
            PublishDay::Sunday => "Sunday",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: i64,
    pub pipeline_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publish_days: Vec<PublishDay>,
    #[serde(default)]
    pub workflow_template_id: Option<i64>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub series_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update for a pipeline; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_days: Option<Vec<PublishDay>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPipeline<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewSeries<'a> {
    name: &'a str,
    publish_days: &'a [PublishDay],
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewEpisode<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_date: Option<&'a str>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct HealthBody {
    status: Option<String>,
}

/// Client for the versioned REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Send a request; returns the raw response for a 2xx status
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> E2eResult<reqwest::Response> {
        let url = format!("{}{}", self.base, path);
        debug!("API {} {}", method, path);

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(E2eError::Api {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> E2eResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, body).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> E2eResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn delete(&self, path: &str) -> E2eResult<()> {
        let response = self.send::<()>(Method::DELETE, path, None).await?;
        if response.status() != StatusCode::NO_CONTENT {
            debug!("DELETE {} answered {}", path, response.status());
        }
        Ok(())
    }

    // ============ Pipelines ============

    pub async fn create_pipeline(&self, name: &str, description: Option<&str>) -> E2eResult<Pipeline> {
        let body = NewPipeline { name, description };
        self.request(Method::POST, "/pipelines", Some(&body)).await
    }

    pub async fn get_pipeline(&self, id: i64) -> E2eResult<Pipeline> {
        self.get(&format!("/pipelines/{}", id)).await
    }

    pub async fn list_pipelines(&self) -> E2eResult<Vec<Pipeline>> {
        self.get("/pipelines").await
    }

    pub async fn update_pipeline(&self, id: i64, update: &PipelineUpdate) -> E2eResult<Pipeline> {
        self.request(Method::PUT, &format!("/pipelines/{}", id), Some(update))
            .await
    }

    pub async fn delete_pipeline(&self, id: i64) -> E2eResult<()> {
        self.delete(&format!("/pipelines/{}", id)).await
    }

    // ============ Series ============

    pub async fn create_series(
        &self,
        pipeline_id: i64,
        name: &str,
        publish_days: &[PublishDay],
        description: Option<&str>,
    ) -> E2eResult<Series> {
        let body = NewSeries {
            name,
            publish_days,
            description,
        };
        self.request(
            Method::POST,
            &format!("/pipelines/{}/series", pipeline_id),
            Some(&body),
        )
        .await
    }

    pub async fn get_series(&self, id: i64) -> E2eResult<Series> {
        self.get(&format!("/series/{}", id)).await
    }

    pub async fn list_series(&self, pipeline_id: i64) -> E2eResult<Vec<Series>> {
        self.get(&format!("/pipelines/{}/series", pipeline_id)).await
    }

    pub async fn update_series(&self, id: i64, update: &SeriesUpdate) -> E2eResult<Series> {
        self.request(Method::PUT, &format!("/series/{}", id), Some(update))
            .await
    }

    pub async fn delete_series(&self, id: i64) -> E2eResult<()> {
        self.delete(&format!("/series/{}", id)).await
    }

    // ============ Episodes ============

    pub async fn create_episode(
        &self,
        series_id: i64,
        title: &str,
        description: Option<&str>,
        scheduled_date: Option<&str>,
    ) -> E2eResult<Episode> {
        let body = NewEpisode {
            title,
            description,
            scheduled_date,
        };
        self.request(
            Method::POST,
            &format!("/series/{}/episodes", series_id),
            Some(&body),
        )
        .await
    }

    pub async fn get_episode(&self, id: i64) -> E2eResult<Episode> {
        self.get(&format!("/episodes/{}", id)).await
    }

    pub async fn list_episodes(&self, series_id: i64) -> E2eResult<Vec<Episode>> {
        self.get(&format!("/series/{}/episodes", series_id)).await
    }

    pub async fn update_episode(&self, id: i64, update: &EpisodeUpdate) -> E2eResult<Episode> {
        self.request(Method::PUT, &format!("/episodes/{}", id), Some(update))
            .await
    }

    pub async fn update_episode_status(&self, id: i64, status: &str) -> E2eResult<Episode> {
        let body = serde_json::json!({ "status": status });
        self.request(Method::PATCH, &format!("/episodes/{}/status", id), Some(&body))
            .await
    }

    pub async fn delete_episode(&self, id: i64) -> E2eResult<()> {
        self.delete(&format!("/episodes/{}", id)).await
    }

    /// Next free publish date for a series
    pub async fn suggested_date(&self, series_id: i64) -> E2eResult<String> {
        self.get(&format!("/series/{}/episodes/suggested-date", series_id))
            .await
    }

    // ============ Cleanup ============

    /// Delete every pipeline; series and episodes go with them.
    ///
    /// Errors are logged and swallowed: data that is already gone is fine.
    pub async fn cleanup_all(&self) {
        let pipelines = match self.list_pipelines().await {
            Ok(pipelines) => pipelines,
            Err(e) => {
                info!("Cleanup skipped, could not list pipelines: {}", e);
                return;
            }
        };

        for pipeline in pipelines {
            if let Err(e) = self.delete_pipeline(pipeline.id).await {
                info!("Cleanup of pipeline {} ignored: {}", pipeline.id, e);
            }
        }
    }
}

/// Poll `health_url` until it reports `status: "UP"`.
///
/// Returns `false` once `attempts` are used up; never errors.
pub async fn wait_for_api(health_url: &str, attempts: usize, interval: Duration) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build health check client: {}", e);
            return false;
        }
    };

    for attempt in 1..=attempts {
        match client.get(health_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<HealthBody>().await {
                Ok(HealthBody {
                    status: Some(status),
                }) if status == "UP" => {
                    debug!("API healthy after {} attempt(s)", attempt);
                    return true;
                }
                Ok(body) => debug!("Health status is {:?}", body.status),
                Err(e) => debug!("Unreadable health body: {}", e),
            },
            Ok(resp) => debug!("Health check returned {}", resp.status()),
            Err(e) => {
                if attempt == 1 {
                    info!("Waiting for API to start...");
                }
                if !e.is_connect() {
                    warn!("Health check error: {}", e);
                }
            }
        }

        if attempt < attempts {
            sleep(interval).await;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_days_wire_format() {
        let body = NewSeries {
            name: "Weekly Vlog",
            publish_days: &[PublishDay::Tuesday, PublishDay::Thursday],
            description: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Weekly Vlog", "publishDays": ["TUESDAY", "THURSDAY"]})
        );
    }

    #[test]
    fn test_series_tolerates_missing_optionals() {
        let series: Series = serde_json::from_str(
            r#"{"id": 4, "pipelineId": 1, "name": "Monday Show", "publishDays": ["MONDAY"]}"#,
        )
        .unwrap();
        assert_eq!(series.publish_days, vec![PublishDay::Monday]);
        assert_eq!(series.episode_count, None);
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = SeriesUpdate {
            name: Some("Renamed Series".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"name":"Renamed Series"}"#
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:18080/api/v1/".into(),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:18080/api/v1");
    }
}
