use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::BookingConfig,
    data_objects::{MatchDto, MatchSummaryDto},
    BookingApiError,
};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Upper bound on pages fetched per tenant, in case the platform keeps returning full pages.
const MAX_PAGES: usize = 50;

#[derive(Clone)]
pub struct BookingApi {
    config: BookingConfig,
    client: Arc<Client>,
}

impl BookingApi {
    pub fn new(config: BookingConfig) -> Result<Self, BookingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        if !config.api_token.is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.api_token.reveal()))
                .map_err(|e| BookingApiError::Initialization(e.to_string()))?;
            headers.insert(AUTHORIZATION, val);
        }
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BookingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BookingApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await.map_err(|e| BookingApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| BookingApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| BookingApiError::RestResponseError(e.to_string()))?;
            Err(BookingApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url)
    }

    /// Lists the matches for every configured tenant whose start time falls within the configured window around
    /// `now`.
    pub async fn fetch_match_summaries(&self, now: DateTime<Utc>) -> Result<Vec<MatchSummaryDto>, BookingApiError> {
        let from = (now - self.config.lookback).format(DATE_FORMAT).to_string();
        let to = (now + self.config.lookahead).format(DATE_FORMAT).to_string();
        let mut result = Vec::new();
        for tenant_id in &self.config.tenant_ids {
            let summaries = self.fetch_tenant_summaries(tenant_id, &from, &to).await?;
            debug!("Fetched {} match summaries for tenant {tenant_id}", summaries.len());
            result.extend(summaries);
        }
        info!("Fetched {} match summaries from {} tenants", result.len(), self.config.tenant_ids.len());
        Ok(result)
    }

    async fn fetch_tenant_summaries(
        &self,
        tenant_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<MatchSummaryDto>, BookingApiError> {
        let page_size = self.config.page_size.max(1);
        let mut summaries = Vec::new();
        for page in 0..MAX_PAGES {
            let params = [
                ("tenant_id", tenant_id.to_string()),
                ("from_start_date", from.to_string()),
                ("to_start_date", to.to_string()),
                ("size", page_size.to_string()),
                ("page", page.to_string()),
            ];
            let batch = self.rest_query::<Vec<MatchSummaryDto>>(Method::GET, "/matches", &params).await?;
            let last_page = batch.len() < page_size;
            summaries.extend(batch);
            if last_page {
                return Ok(summaries);
            }
        }
        warn!("Tenant {tenant_id} returned more than {MAX_PAGES} pages of matches. The remainder is ignored.");
        Ok(summaries)
    }

    pub async fn fetch_match(&self, match_id: &str) -> Result<MatchDto, BookingApiError> {
        let path = format!("/matches/{match_id}");
        debug!("Fetching match {match_id}");
        match self.rest_query::<MatchDto>(Method::GET, &path, &[]).await {
            Err(BookingApiError::QueryError { status: 404, .. }) => Err(BookingApiError::MatchNotFound(match_id.into())),
            other => other,
        }
    }
}
