use std::time::Duration;

use rand::Rng;
use reqwest::Client;

use super::PageFetcher;
use crate::model::FetchError;

pub struct PageFetcherImpl {
    client: Client,
}

impl PageFetcherImpl {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) SpecialsSniper/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for PageFetcherImpl {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        Ok(response.text().await?)
    }
}

/// Short randomized pause between requests to the same upstream.
pub async fn polite_pause() {
    let millis = rand::rng().random_range(150..=400);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
