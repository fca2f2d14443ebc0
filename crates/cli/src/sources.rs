use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use claimcheck_verdict::{Claim, EvidenceGroup, EvidenceMeta, SourceType};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const NEWSAPI_ENDPOINT: &str = "https://newsapi.org/v2/everything";
const TWITTER_ENDPOINT: &str = "https://api.twitter.com/2/tweets/search/recent";

/// Retrieves candidate evidence for a claim from one external service.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn source_type(&self) -> SourceType;

    async fn fetch(&self, claim: &Claim) -> Result<EvidenceGroup>;
}

/// Retrieval settings; a missing credential disables that source.
#[derive(Clone, Debug)]
pub struct SourcesConfig {
    pub newsapi_key: Option<String>,
    pub twitter_bearer: Option<String>,
    pub max_news: usize,
    pub max_tweets: usize,
    pub timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            newsapi_key: None,
            twitter_bearer: None,
            max_news: 5,
            max_tweets: 50,
            timeout: Duration::from_secs(10),
        }
    }
}

impl SourcesConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            newsapi_key: non_empty_var("NEWSAPI_KEY"),
            twitter_bearer: non_empty_var("TWITTER_BEARER"),
            max_news: parse_var("MAX_NEWS_RESULTS")?.unwrap_or(defaults.max_news),
            max_tweets: parse_var("MAX_TWEETS_RESULTS")?.unwrap_or(defaults.max_tweets),
            timeout: parse_var("CLAIMCHECK_FETCH_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        })
    }

    pub fn build(&self) -> Result<Vec<Arc<dyn EvidenceSource>>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build HTTP client")?;

        let mut sources: Vec<Arc<dyn EvidenceSource>> = Vec::new();
        match &self.newsapi_key {
            Some(key) => sources.push(Arc::new(NewsApiSource::new(
                client.clone(),
                key.clone(),
                self.max_news,
            ))),
            None => log::warn!("NEWSAPI_KEY not set; article search disabled"),
        }
        match &self.twitter_bearer {
            Some(token) => sources.push(Arc::new(TwitterSource::new(
                client,
                token.clone(),
                self.max_tweets,
            ))),
            None => log::warn!("TWITTER_BEARER not set; tweet search disabled"),
        }
        Ok(sources)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {name} '{raw}'")),
        None => Ok(None),
    }
}

/// Fetches every source concurrently. Failed sources are logged and skipped.
pub async fn gather_evidence(
    sources: &[Arc<dyn EvidenceSource>],
    claim: &Claim,
) -> Vec<EvidenceGroup> {
    let mut tasks = Vec::with_capacity(sources.len());
    for source in sources {
        let source = Arc::clone(source);
        let claim = claim.clone();
        let source_type = source.source_type();
        tasks.push((
            source_type,
            tokio::spawn(async move { source.fetch(&claim).await }),
        ));
    }

    let mut groups = Vec::with_capacity(tasks.len());
    for (source_type, task) in tasks {
        match task.await {
            Ok(Ok(group)) => {
                log::debug!("Fetched {} '{}' candidates", group.len(), source_type);
                groups.push(group);
            }
            Ok(Err(e)) => log::warn!("{source_type} fetch error: {e:#}"),
            Err(e) => log::warn!("{source_type} fetch task panicked: {e}"),
        }
    }
    groups
}

pub struct NewsApiSource {
    client: Client,
    api_key: String,
    max_results: usize,
    endpoint: String,
}

impl NewsApiSource {
    pub fn new(client: Client, api_key: String, max_results: usize) -> Self {
        Self {
            client,
            api_key,
            max_results,
            endpoint: NEWSAPI_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiArticle {
    source: Option<NewsApiOutlet>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiOutlet {
    name: Option<String>,
}

fn articles_to_group(articles: Vec<NewsApiArticle>, max_results: usize) -> Result<EvidenceGroup> {
    let mut texts = Vec::new();
    let mut metadata = Vec::new();
    for article in articles.into_iter().take(max_results) {
        let title = article.title.unwrap_or_default();
        let description = article.description.unwrap_or_default();
        texts.push(format!("{title} {description}"));
        metadata.push(EvidenceMeta {
            source: article.source.and_then(|s| s.name),
            title: Some(title).filter(|t| !t.is_empty()),
            url: article.url,
        });
    }
    EvidenceGroup::with_metadata(SourceType::article(), texts, metadata).map_err(Into::into)
}

#[async_trait]
impl EvidenceSource for NewsApiSource {
    fn source_type(&self) -> SourceType {
        SourceType::article()
    }

    async fn fetch(&self, claim: &Claim) -> Result<EvidenceGroup> {
        let page_size = self.max_results.to_string();
        let response: NewsApiResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", claim.as_str()),
                ("pageSize", page_size.as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("NewsAPI request failed")?
            .error_for_status()
            .context("NewsAPI returned an error status")?
            .json()
            .await
            .context("NewsAPI response was not valid JSON")?;

        articles_to_group(response.articles, self.max_results)
    }
}

pub struct TwitterSource {
    client: Client,
    bearer_token: String,
    max_results: usize,
    endpoint: String,
}

impl TwitterSource {
    pub fn new(client: Client, bearer_token: String, max_results: usize) -> Self {
        Self {
            client,
            bearer_token,
            max_results,
            endpoint: TWITTER_ENDPOINT.to_string(),
        }
    }

    fn query(claim: &Claim) -> String {
        format!("{} -is:retweet lang:en", claim.as_str())
    }

    // The recent-search API only accepts page sizes in 10..=100.
    fn page_size(&self) -> usize {
        self.max_results.clamp(10, 100)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TwitterResponse {
    #[serde(default)]
    data: Option<Vec<Tweet>>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
}

fn tweets_to_group(tweets: Option<Vec<Tweet>>, max_results: usize) -> EvidenceGroup {
    let texts = tweets
        .unwrap_or_default()
        .into_iter()
        .take(max_results)
        .map(|t| t.text)
        .collect();
    EvidenceGroup::new(SourceType::tweet(), texts)
}

#[async_trait]
impl EvidenceSource for TwitterSource {
    fn source_type(&self) -> SourceType {
        SourceType::tweet()
    }

    async fn fetch(&self, claim: &Claim) -> Result<EvidenceGroup> {
        let max_results = self.page_size().to_string();
        let query = Self::query(claim);
        let response: TwitterResponse = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query.as_str()), ("max_results", max_results.as_str())])
            .send()
            .await
            .context("Twitter request failed")?
            .error_for_status()
            .context("Twitter returned an error status")?
            .json()
            .await
            .context("Twitter response was not valid JSON")?;

        Ok(tweets_to_group(response.data, self.max_results))
    }
}
