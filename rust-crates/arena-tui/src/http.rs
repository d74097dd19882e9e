use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    future::Future,
    time::Duration,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The few HTTP calls the storage relay and the chain reader make. A failed
/// request is an `Err`; any response, whatever its status, is an `Ok`.
pub trait HttpTransport: Clone + Send + Sync + 'static {
    fn put(&self, url: &str, body: String)
    -> impl Future<Output = Result<HttpResponse>> + Send;

    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;

    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self { http })
    }

    async fn read(res: reqwest::Response) -> Result<HttpResponse> {
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .wrap_err("failed to read response body")?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn put(&self, url: &str, body: String) -> Result<HttpResponse> {
        let res = self
            .http
            .put(url)
            .body(body)
            .send()
            .await
            .wrap_err_with(|| format!("PUT {url} failed"))?;
        Self::read(res).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .wrap_err_with(|| format!("GET {url} failed"))?;
        Self::read(res).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .wrap_err_with(|| format!("POST {url} failed"))?;
        Self::read(res).await
    }
}
