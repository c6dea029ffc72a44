//! PostgREST client for the `jobs` and `clips` tables.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use peakclip_models::{ClipRecord, Job, JobId, JobStatus};

use crate::error::{StoreError, StoreResult};

/// How many pending candidates to try before giving up a claim round.
const CLAIM_ATTEMPTS: usize = 5;

/// Store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the REST API (e.g. `https://xxxx.supabase.co`)
    pub base_url: String,
    /// Service-role key; bypasses row-level security, never expose
    /// client-side
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self {
            base_url: std::env::var("STORE_URL")
                .map_err(|_| StoreError::config_error("STORE_URL not set"))?,
            service_key: std::env::var("STORE_SERVICE_KEY")
                .map_err(|_| StoreError::config_error("STORE_SERVICE_KEY not set"))?,
            timeout: Duration::from_secs(30),
        })
    }
}

/// Client for the job queue and clip metadata tables.
#[derive(Clone)]
pub struct JobStoreClient {
    http: Client,
    base_url: String,
}

impl JobStoreClient {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| StoreError::config_error("service key is not a valid header value"))?;
        let apikey = HeaderValue::from_str(&config.service_key)
            .map_err(|_| StoreError::config_error("service key is not a valid header value"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("apikey", apikey);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("peakclip-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self {
            http,
            base_url: format!("{}/rest/v1", config.base_url.trim_end_matches('/')),
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    /// Insert a new pending job for a source URL.
    pub async fn insert_job(&self, url: &str) -> StoreResult<Job> {
        let resp = self
            .http
            .post(format!("{}/jobs", self.base_url))
            .header("Prefer", "return=representation")
            .json(&json!([{ "url": url, "status": "pending" }]))
            .send()
            .await?;

        let mut rows: Vec<Job> = Self::decode(resp).await?;
        rows.pop()
            .ok_or_else(|| StoreError::invalid_response("insert returned no job row"))
    }

    /// Claim the oldest pending job, transitioning it to `processing`.
    ///
    /// The transition is a conditional update keyed on
    /// `status = pending`: when another worker took the candidate
    /// first, the update matches no rows and the next candidate is
    /// tried. Returns `None` when nothing is pending.
    pub async fn claim_next(&self) -> StoreResult<Option<Job>> {
        for _ in 0..CLAIM_ATTEMPTS {
            let resp = self
                .http
                .get(format!("{}/jobs", self.base_url))
                .query(&[
                    ("status", "eq.pending"),
                    ("order", "created_at.asc"),
                    ("limit", "1"),
                ])
                .send()
                .await?;

            let mut candidates: Vec<Job> = Self::decode(resp).await?;
            let Some(candidate) = candidates.pop() else {
                return Ok(None);
            };

            let resp = self
                .http
                .patch(format!("{}/jobs", self.base_url))
                .query(&[
                    ("id", format!("eq.{}", candidate.id)),
                    ("status", "eq.pending".to_string()),
                ])
                .header("Prefer", "return=representation")
                .json(&json!({ "status": "processing" }))
                .send()
                .await?;

            let mut claimed: Vec<Job> = Self::decode(resp).await?;
            if let Some(job) = claimed.pop() {
                info!(job_id = %job.id, url = %job.url, "Claimed job");
                return Ok(Some(job));
            }

            debug!(job_id = %candidate.id, "Lost claim race, retrying");
        }

        Ok(None)
    }

    /// Finalize a job: set its terminal status and stamp `finished_at`.
    pub async fn finalize_job(&self, job_id: &JobId, status: JobStatus) -> StoreResult<()> {
        debug_assert!(status.is_terminal());

        let resp = self
            .http
            .patch(format!("{}/jobs", self.base_url))
            .query(&[("id", format!("eq.{}", job_id))])
            .json(&json!({
                "status": status.as_str(),
                "finished_at": Utc::now(),
            }))
            .send()
            .await?;

        Self::check(resp).await?;
        info!(job_id = %job_id, status = %status, "Finalized job");
        Ok(())
    }

    /// Append one clip metadata row.
    pub async fn insert_clip(&self, clip: &ClipRecord) -> StoreResult<()> {
        let resp = self
            .http
            .post(format!("{}/clips", self.base_url))
            .json(&json!([clip]))
            .send()
            .await?;

        Self::check(resp).await?;
        debug!(job_id = %clip.job_id, idx = clip.idx, "Recorded clip metadata");
        Ok(())
    }

    async fn check(resp: reqwest::Response) -> StoreResult<()> {
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(StoreError::request_failed(format!("{}: {}", status, body)))
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> StoreResult<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::request_failed(format!("{}: {}", status, body)));
        }
        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::invalid_response(format!("{}: {}", e, body)))
    }
}
