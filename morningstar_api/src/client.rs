//! HTTP client for the Morningstar security-search, SAL, and x-ray endpoints.

use std::time::Duration;

use regex::Regex;

use crate::user_agent::get_user_agent;
use crate::Error;

/// Request timeout applied to every provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed query parameters sent with every SAL component request.
const COMPONENT_PARAMS: &[(&str, &str)] = &[
    ("premiumNum", "10"),
    ("freeNum", "10"),
    ("languageId", "de-DE"),
    ("locale", "en"),
    ("clientId", "MDC_intl"),
    ("benchmarkId", "category"),
    ("version", "3.60.0"),
];

/// Result of the identifier search for one public identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// The provider's internal security id.
    pub secid: String,
    /// The security kind reported by the provider, lowercased (e.g. `fund`, `etf`, `stock`).
    pub kind: String,
}

/// Bearer token for the SAL component endpoints, tied to a retrieval id.
///
/// The retrieval id can differ from the id the token exchange started with;
/// all subsequent component and x-ray requests must use `secid` from here.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub secid: String,
}

/// Outcome of a per-kind component request.
#[derive(Debug)]
pub enum ComponentOutcome {
    /// The decoded JSON payload for the requested component.
    Data(serde_json::Value),
    /// The JSON pipeline is unavailable for this id; the caller should fall
    /// back to the consolidated x-ray report.
    Fallback,
}

/// HTTP client for the Morningstar endpoints used by the classifier.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// The three endpoint families (market website, SAL API, x-ray report) can
/// all be redirected to a single base URL for testing with wiremock.
pub struct Client {
    http: reqwest::Client,
    /// Market website base, with a `{domain}` placeholder for the locale.
    web_base: String,
    api_base: String,
    xray_base: String,
}

impl Client {
    /// Creates a client pointing at the production endpoints.
    pub fn new() -> Result<Self, Error> {
        Self::build(
            "https://www.morningstar.{domain}".to_string(),
            "https://api-global.morningstar.com".to_string(),
            "https://lt.morningstar.com".to_string(),
        )
    }

    /// Creates a client with every endpoint family rooted at `base_url`.
    /// Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let base = base_url.trim_end_matches('/').to_string();
        Self::build(base.clone(), base.clone(), base)
    }

    fn build(web_base: String, api_base: String, xray_base: String) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            http,
            web_base,
            api_base,
            xray_base,
        })
    }

    fn web_url(&self, domain: &str, path: &str) -> String {
        format!("{}{}", self.web_base.replace("{domain}", domain), path)
    }

    /// Searches the market site for a public identifier.
    ///
    /// Returns `Ok(None)` when the provider answers with an empty body, which
    /// means the identifier is unknown on this domain. A non-empty body is
    /// expected to embed the internal id as `{"i":"..."` and the security
    /// kind as the third pipe-delimited field.
    pub async fn search_security(
        &self,
        public_id: &str,
        domain: &str,
    ) -> Result<Option<SearchHit>, Error> {
        let url = self.web_url(domain, "/en/util/SecuritySearch.ashx");
        let form = [
            ("q", public_id),
            ("preferedList", ""),
            ("source", "nav"),
            ("moduleId", "6"),
            ("ifIncludeAds", "False"),
            ("usrtType", "v"),
        ];
        let resp = self
            .http
            .post(&url)
            .header("accept", "*/*")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("security search failed for {}: {}", public_id, e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("failed to read search response body: {}", e);
            Error::RequestFailed
        })?;
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        if body.is_empty() {
            return Ok(None);
        }

        let re = Regex::new(r#"\{"i":"([^"]+)""#)
            .map_err(|e| Error::Payload(format!("secid regex: {}", e)))?;
        let secid = re
            .captures(&body)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Payload(format!("no internal id in search response: {}", truncate_body(&body))))?;
        let kind = body
            .split('|')
            .nth(2)
            .map(|field| field.to_lowercase())
            .ok_or_else(|| Error::Payload(format!("no security kind in search response: {}", truncate_body(&body))))?;

        Ok(Some(SearchHit { secid, kind }))
    }

    /// Performs the two-step bearer-token exchange for a security id.
    ///
    /// The snapshot page may name a different retrieval id (`var FC = '...'`);
    /// when present it replaces `secid` for the token request and for all
    /// later component and x-ray calls.
    pub async fn bearer_token(&self, secid: &str, domain: &str) -> Result<BearerToken, Error> {
        let snapshot_url = self.web_url(
            domain,
            &format!("/{}/funds/snapshot/snapshot.aspx", domain),
        );
        let page = self
            .fetch_text(self.http.get(&snapshot_url).query(&[("id", secid)]))
            .await?;
        let fc_re = Regex::new(r"var FC =  '(.*)';")
            .map_err(|e| Error::TokenExchange(format!("retrieval id regex: {}", e)))?;
        let retrieval_id = fc_re
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| secid.to_string());

        let sal_url = self.web_url(domain, "/Common/funds/snapshot/PortfolioSAL.aspx");
        let page = self
            .fetch_text(self.http.get(&sal_url).query(&[("FC", &retrieval_id)]))
            .await?;
        let token_re = Regex::new(r#"const maasToken =\s*"(.+)""#)
            .map_err(|e| Error::TokenExchange(format!("token regex: {}", e)))?;
        let token = token_re
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::TokenExchange(format!("no maas token on SAL page for {}", retrieval_id))
            })?;

        Ok(BearerToken {
            token,
            secid: retrieval_id,
        })
    }

    /// Fetches one taxonomy kind's component data from the SAL API.
    ///
    /// `endpoint` is the kind's path template with a `{type}` placeholder for
    /// the security kind (`fund` or `etf`). A 401 answer signals that this
    /// kind must be retrieved from the x-ray report instead.
    pub async fn component_data(
        &self,
        secid: &str,
        security_kind: &str,
        endpoint: &str,
        component: &str,
        token: &str,
    ) -> Result<ComponentOutcome, Error> {
        let url = format!(
            "{}{}{}/data",
            self.api_base,
            endpoint.replace("{type}", security_kind),
            secid
        );
        let resp = self
            .http
            .get(&url)
            .header("accept", "*/*")
            .header("accept-language", "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Authorization", format!("Bearer {}", token))
            .query(COMPONENT_PARAMS)
            .query(&[("component", component)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("component request failed for {}: {}", secid, e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(ComponentOutcome::Fallback);
        }
        let body = resp.text().await.map_err(|e| {
            tracing::error!("failed to read component body for {}: {}", secid, e);
            Error::RequestFailed
        })?;
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| Error::Payload(format!("component JSON: {} | body: {}", e, truncate_body(&body))))?;
        Ok(ComponentOutcome::Data(value))
    }

    /// Fetches the consolidated x-ray report page for a security id.
    pub async fn xray_page(&self, secid: &str) -> Result<String, Error> {
        let url = format!(
            "{}/j2uwuwirpv/xray/default.aspx?LanguageId=en-EN&PortfolioType=2&SecurityTokenList={}]2]0]FOESP%24%24ALL_1340&values=100",
            self.xray_base, secid
        );
        self.fetch_text(self.http.get(&url)).await
    }

    async fn fetch_text(&self, request: reqwest::RequestBuilder) -> Result<String, Error> {
        let resp = request.send().await.map_err(|e| {
            tracing::error!("request failed: {}", e);
            Error::RequestFailed
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("failed to read response body: {}", e);
            Error::RequestFailed
        })?;
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
