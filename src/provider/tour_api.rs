//! HTTP client for the public tourism open API.
//!
//! Three operations back the two provider query shapes:
//!
//! - `locationBasedList1` for location anchors (nearest first)
//! - `searchKeyword1` for keyword anchors with a keyword
//! - `areaBasedList1` for keyword anchors without one (category browse)
//!
//! Every response is a JSON envelope `{"response": {"header": ..., "body": ...}}`.
//! The gateway in front of the API answers authentication failures with an
//! XML document and HTTP 200, so both shapes are decoded here.
//!
//! Requests are never retried. The service key travels as a query parameter,
//! so request URLs are never logged.

use crate::config::{Config, MAX_RADIUS_METERS};
use crate::provider::{ProviderError, SiteSearchProvider};
use crate::site::{ContentType, Coordinate, SitePage, SiteSummary};
use crate::util::clean_field;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// `resultCode` of a successful response.
const RESULT_OK: &str = "0000";

#[derive(Debug, Error)]
pub enum TourApiBuildError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`SiteSearchProvider`] backed by the tourism open API.
pub struct TourApiClient {
    client: reqwest::Client,
    /// Always ends with `/`; operation names are appended to its path.
    base_url: Url,
    service_key: Option<SecretString>,
    mobile_os: String,
    mobile_app: String,
    timeout: Duration,
}

impl TourApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// - [`TourApiBuildError::InvalidBaseUrl`] if `base_url` does not parse
    /// - [`TourApiBuildError::InsecureBaseUrl`] for plain HTTP to anything but
    ///   localhost (the service key would travel in clear text)
    /// - [`TourApiBuildError::Client`] if the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self, TourApiBuildError> {
        let base_url = parse_base_url(&config.base_url)?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .user_agent(concat!("tripfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        if config.service_key.is_none() {
            tracing::warn!("No service key configured, upstream will likely reject requests");
        }

        Ok(Self {
            client,
            base_url,
            service_key: config.service_key.clone().map(SecretString::from),
            mobile_os: config.mobile_os.clone(),
            mobile_app: config.mobile_app.clone(),
            timeout,
        })
    }

    /// URL for `operation` with the parameters every call shares.
    fn endpoint(&self, operation: &str, page_no: u32, page_size: u32) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{}", self.base_url.path(), operation));
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(key) = &self.service_key {
                pairs.append_pair("serviceKey", key.expose_secret());
            }
            pairs.append_pair("MobileOS", &self.mobile_os);
            pairs.append_pair("MobileApp", &self.mobile_app);
            pairs.append_pair("_type", "json");
            pairs.append_pair("numOfRows", &page_size.to_string());
            pairs.append_pair("pageNo", &page_no.to_string());
        }
        url
    }

    async fn fetch(&self, operation: &str, url: Url) -> Result<SitePage, ProviderError> {
        let timeout_secs = self.timeout.as_secs();

        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| ProviderError::Timeout(timeout_secs))?
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(timeout_secs)
                } else {
                    ProviderError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(operation, status, "Tourism API returned non-success status");
            return Err(ProviderError::HttpStatus(status));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        let page = parse_page(&bytes)?;

        tracing::debug!(
            operation,
            page_no = page.page_no,
            rows = page.items.len(),
            total_count = page.total_count,
            "Tourism API page received"
        );
        Ok(page)
    }
}

impl SiteSearchProvider for TourApiClient {
    async fn fetch_by_location(
        &self,
        coordinate: Coordinate,
        radius_meters: u32,
        category: Option<ContentType>,
        page_no: u32,
        page_size: u32,
    ) -> Result<SitePage, ProviderError> {
        let operation = "locationBasedList1";
        let mut url = self.endpoint(operation, page_no, page_size);
        {
            let mut pairs = url.query_pairs_mut();
            // mapX is longitude, mapY is latitude
            pairs.append_pair("mapX", &coordinate.longitude.to_string());
            pairs.append_pair("mapY", &coordinate.latitude.to_string());
            pairs.append_pair("radius", &radius_meters.min(MAX_RADIUS_METERS).to_string());
            pairs.append_pair("arrange", "E");
            if let Some(category) = category {
                pairs.append_pair("contentTypeId", &category.code().to_string());
            }
        }
        self.fetch(operation, url).await
    }

    async fn fetch_by_keyword(
        &self,
        keyword: Option<&str>,
        category: Option<ContentType>,
        page_no: u32,
        page_size: u32,
    ) -> Result<SitePage, ProviderError> {
        let operation = if keyword.is_some() {
            "searchKeyword1"
        } else {
            "areaBasedList1"
        };
        let mut url = self.endpoint(operation, page_no, page_size);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(keyword) = keyword {
                pairs.append_pair("keyword", keyword);
            }
            if let Some(category) = category {
                pairs.append_pair("contentTypeId", &category.code().to_string());
            }
        }
        self.fetch(operation, url).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TourApiBuildError> {
    let url = Url::parse(&format!("{}/", raw.trim().trim_end_matches('/')))?;

    match url.scheme() {
        "https" => {}
        "http" if matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) => {
            tracing::warn!(base_url = %url, "Using non-HTTPS tourism API base URL (localhost only)");
        }
        _ => {
            tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL");
            return Err(TourApiBuildError::InsecureBaseUrl);
        }
    }

    Ok(url)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ProviderError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

// ============================================================================
// Response Decoding
// ============================================================================

#[derive(Deserialize)]
struct Envelope {
    response: ApiResponse,
}

#[derive(Deserialize)]
struct ApiResponse {
    header: ApiHeader,
    #[serde(default)]
    body: Option<ApiBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHeader {
    result_code: Loose,
    #[serde(default)]
    result_msg: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBody {
    #[serde(default)]
    items: Option<ItemsField>,
    page_no: Loose,
    total_count: Loose,
}

/// `items` is an object holding `item` when there are rows, and an empty
/// string when there are none.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsField {
    Rows {
        #[serde(default)]
        item: OneOrMany,
    },
    Blank(String),
}

/// A single row sometimes arrives as a bare object instead of a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawItem>),
    One(Box<RawItem>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Scalar that may be sent either as a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
}

impl Loose {
    fn text(&self) -> String {
        match self {
            Loose::Text(s) => s.trim().to_string(),
            Loose::Number(n) => n.to_string(),
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Loose::Text(s) => s.trim().parse().ok(),
            Loose::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Loose::Text(s) => s.trim().parse::<f64>().ok()?,
            Loose::Number(n) => n.as_f64()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    title: Option<Loose>,
    #[serde(default)]
    addr1: Option<Loose>,
    #[serde(default)]
    addr2: Option<Loose>,
    #[serde(default)]
    mapx: Option<Loose>,
    #[serde(default)]
    mapy: Option<Loose>,
    #[serde(default)]
    contentid: Option<Loose>,
    #[serde(default)]
    contenttypeid: Option<Loose>,
    #[serde(default)]
    firstimage: Option<Loose>,
    #[serde(default)]
    dist: Option<Loose>,
}

fn non_empty(field: Option<&Loose>) -> Option<String> {
    field.map(Loose::text).filter(|s| !s.is_empty())
}

impl RawItem {
    /// Returns `None` for rows without a usable title.
    fn into_summary(self) -> Option<SiteSummary> {
        let title = clean_field(&non_empty(self.title.as_ref())?);
        if title.is_empty() {
            return None;
        }

        let address = [self.addr1.as_ref(), self.addr2.as_ref()]
            .into_iter()
            .filter_map(non_empty)
            .map(|part| clean_field(&part))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let latitude = self.mapy.as_ref().and_then(Loose::as_f64);
        let longitude = self.mapx.as_ref().and_then(Loose::as_f64);
        // Rows without a position are sent as 0/0
        let coordinate = match (latitude, longitude) {
            (Some(lat), Some(lon))
                if !(lat == 0.0 && lon == 0.0)
                    && (-90.0..=90.0).contains(&lat)
                    && (-180.0..=180.0).contains(&lon) =>
            {
                Some(Coordinate::new(lat, lon))
            }
            _ => None,
        };

        let mut summary = SiteSummary::new(title, address, coordinate);
        summary.content_id = non_empty(self.contentid.as_ref());
        summary.content_type = self
            .contenttypeid
            .as_ref()
            .and_then(Loose::as_u32)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(ContentType::from_code);
        summary.thumbnail_url = non_empty(self.firstimage.as_ref());
        summary.distance_meters = self.dist.as_ref().and_then(Loose::as_f64);
        Some(summary)
    }
}

/// Decode a response body into a page.
fn parse_page(bytes: &[u8]) -> Result<SitePage, ProviderError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ProviderError::Decode("response is not valid UTF-8".to_string()))?;

    if text.trim_start().starts_with('<') {
        return Err(parse_gateway_error(text));
    }

    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let ApiResponse { header, body } = envelope.response;

    let code = header.result_code.text();
    if code != RESULT_OK {
        return Err(ProviderError::Api {
            code,
            message: header.result_msg,
        });
    }

    let body = body.ok_or_else(|| ProviderError::Decode("response has no body".to_string()))?;
    let page_no = body
        .page_no
        .as_u32()
        .ok_or_else(|| ProviderError::Decode(format!("invalid pageNo: {}", body.page_no.text())))?;
    let total_count = body.total_count.as_u32().ok_or_else(|| {
        ProviderError::Decode(format!("invalid totalCount: {}", body.total_count.text()))
    })?;

    let rows = match body.items {
        Some(ItemsField::Rows {
            item: OneOrMany::Many(rows),
        }) => rows,
        Some(ItemsField::Rows {
            item: OneOrMany::One(row),
        }) => vec![*row],
        Some(ItemsField::Blank(_)) | None => Vec::new(),
    };

    let received = rows.len();
    let items: Vec<SiteSummary> = rows.into_iter().filter_map(RawItem::into_summary).collect();
    if items.len() < received {
        tracing::warn!(
            skipped = received - items.len(),
            page_no,
            "Rows without a title skipped"
        );
    }

    Ok(SitePage {
        items,
        page_no,
        total_count,
    })
}

/// Decode the gateway's XML error document.
///
/// ```text
/// <OpenAPI_ServiceResponse><cmmMsgHeader>
///   <errMsg>SERVICE ERROR</errMsg>
///   <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>
///   <returnReasonCode>30</returnReasonCode>
/// </cmmMsgHeader></OpenAPI_ServiceResponse>
/// ```
fn parse_gateway_error(text: &str) -> ProviderError {
    let code = xml_element(text, "returnReasonCode");
    let message = xml_element(text, "returnAuthMsg").or_else(|| xml_element(text, "errMsg"));

    match (code, message) {
        (Some(code), message) => ProviderError::Api {
            code: code.to_string(),
            message: message.unwrap_or("unknown gateway error").to_string(),
        },
        (None, _) => ProviderError::Decode("unexpected XML response".to_string()),
    }
}

fn xml_element<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = text.find(&open)? + open.len();
    let end = start + text[start..].find(&close)?;
    let value = text[start..end].trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TWO_ROWS: &str = r#"{"response":{"header":{"resultCode":"0000","resultMsg":"OK"},
        "body":{"items":{"item":[
            {"addr1":"서울특별시 종로구 사직로 161","addr2":"(세종로)","contentid":"126508",
             "contenttypeid":"12","dist":"412.7","firstimage":"http://tong.visitkorea.or.kr/a.jpg",
             "mapx":"126.9769930325","mapy":"37.5788222356","title":"경복궁"},
            {"addr1":"서울특별시 종로구","addr2":"","contentid":"2733967","contenttypeid":"39",
             "dist":"980.1","firstimage":"","mapx":"","mapy":"","title":"토속촌 삼계탕"}
        ]},"numOfRows":10,"pageNo":1,"totalCount":2}}}"#;

    fn config_for(server: &MockServer) -> Config {
        Config {
            base_url: format!("{}/KorService1", server.uri()),
            service_key: Some("test-key".to_string()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_location_search_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/KorService1/locationBasedList1"))
            .and(query_param("serviceKey", "test-key"))
            .and(query_param("_type", "json"))
            .and(query_param("mapX", "126.977"))
            .and(query_param("mapY", "37.5796"))
            .and(query_param("radius", "2000"))
            .and(query_param("arrange", "E"))
            .and(query_param("numOfRows", "10"))
            .and(query_param("pageNo", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_ROWS))
            .expect(1)
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let page = client
            .fetch_by_location(Coordinate::new(37.5796, 126.977), 2000, None, 1, 10)
            .await
            .unwrap();

        assert_eq!(page.page_no, 1);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items.len(), 2);

        let palace = &page.items[0];
        assert_eq!(palace.title, "경복궁");
        assert_eq!(palace.address, "서울특별시 종로구 사직로 161 (세종로)");
        assert_eq!(
            palace.coordinate,
            Some(Coordinate::new(37.5788222356, 126.9769930325))
        );
        assert_eq!(palace.content_id.as_deref(), Some("126508"));
        assert_eq!(palace.content_type, Some(ContentType::TouristSpot));
        assert_eq!(palace.distance_meters, Some(412.7));

        let restaurant = &page.items[1];
        assert_eq!(restaurant.coordinate, None);
        assert_eq!(restaurant.thumbnail_url, None);
        assert_eq!(restaurant.content_type, Some(ContentType::Restaurant));
    }

    #[tokio::test]
    async fn test_radius_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/KorService1/locationBasedList1"))
            .and(query_param("radius", "20000"))
            .and(query_param("contentTypeId", "32"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_ROWS))
            .expect(1)
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let result = client
            .fetch_by_location(
                Coordinate::new(33.45, 126.57),
                50_000,
                Some(ContentType::Lodging),
                1,
                10,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_keyword_search_uses_search_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/KorService1/searchKeyword1"))
            .and(query_param("keyword", "궁"))
            .and(query_param("pageNo", "3"))
            .and(query_param("numOfRows", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_ROWS))
            .expect(1)
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let result = client.fetch_by_keyword(Some("궁"), None, 3, 20).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_category_browse_uses_area_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/KorService1/areaBasedList1"))
            .and(query_param("contentTypeId", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_ROWS))
            .expect(1)
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let result = client
            .fetch_by_keyword(None, Some(ContentType::Festival), 1, 10)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_http_500_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_by_keyword(Some("x"), None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::HttpStatus(500));
    }

    #[tokio::test]
    async fn test_api_error_code() {
        let body = r#"{"response":{"header":{"resultCode":"22","resultMsg":"LIMITED_NUMBER_OF_SERVICE_REQUESTS_EXCEEDS_ERROR"}}}"#;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_by_keyword(Some("x"), None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                code: "22".to_string(),
                message: "LIMITED_NUMBER_OF_SERVICE_REQUESTS_EXCEEDS_ERROR".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_gateway_xml_error() {
        let body = "<OpenAPI_ServiceResponse><cmmMsgHeader><errMsg>SERVICE ERROR</errMsg>\
            <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>\
            <returnReasonCode>30</returnReasonCode></cmmMsgHeader></OpenAPI_ServiceResponse>";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_by_location(Coordinate::new(37.0, 127.0), 1000, None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                code: "30".to_string(),
                message: "SERVICE_KEY_IS_NOT_REGISTERED_ERROR".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":"))
            .mount(&server)
            .await;

        let client = TourApiClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_by_keyword(Some("x"), None, 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(TWO_ROWS)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = Config {
            request_timeout_secs: 1,
            ..config_for(&server)
        };
        let client = TourApiClient::new(&config).unwrap();
        let err = client
            .fetch_by_keyword(Some("x"), None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Timeout(1));
    }

    #[test]
    fn test_parse_empty_items_string() {
        let body = br#"{"response":{"header":{"resultCode":"0000","resultMsg":"OK"},
            "body":{"items":"","numOfRows":10,"pageNo":4,"totalCount":31}}}"#;
        let page = parse_page(body).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page_no, 4);
        assert_eq!(page.total_count, 31);
    }

    #[test]
    fn test_parse_single_item_object_and_string_numbers() {
        let body = br#"{"response":{"header":{"resultCode":"0000","resultMsg":"OK"},
            "body":{"items":{"item":{"title":"Seongsan Ilchulbong","addr1":"Jeju",
            "mapx":126.9425,"mapy":33.4581,"contenttypeid":12}},
            "numOfRows":"10","pageNo":"1","totalCount":"1"}}}"#;
        let page = parse_page(body).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.items[0].coordinate,
            Some(Coordinate::new(33.4581, 126.9425))
        );
        assert_eq!(page.items[0].content_type, Some(ContentType::TouristSpot));
    }

    #[test]
    fn test_parse_skips_untitled_rows_and_zero_coordinates() {
        let body = br#"{"response":{"header":{"resultCode":"0000","resultMsg":"OK"},
            "body":{"items":{"item":[
                {"title":"  ","addr1":"nowhere"},
                {"title":"Haeundae\u001b[31m Beach","addr1":"Busan","mapx":"0","mapy":"0"}
            ]},"numOfRows":10,"pageNo":1,"totalCount":2}}}"#;
        let page = parse_page(body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Haeundae Beach");
        assert_eq!(page.items[0].coordinate, None);
        // totalCount is passed through untouched
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_parse_invalid_total_count() {
        let body = br#"{"response":{"header":{"resultCode":"0000"},
            "body":{"items":"","pageNo":1,"totalCount":"many"}}}"#;
        assert!(matches!(parse_page(body), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_unknown_xml_is_decode_error() {
        assert!(matches!(
            parse_page(b"<html><body>Bad Gateway</body></html>"),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_http_base_url_rejected() {
        let config = Config {
            base_url: "http://apis.example.org/KorService1".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            TourApiClient::new(&config),
            Err(TourApiBuildError::InsecureBaseUrl)
        ));
    }

    #[test]
    fn test_localhost_base_url_allowed() {
        let config = Config {
            base_url: "http://127.0.0.1:8080/KorService1/".to_string(),
            ..Config::default()
        };
        let client = TourApiClient::new(&config).unwrap();
        let url = client.endpoint("areaBasedList1", 2, 10);
        assert_eq!(url.path(), "/KorService1/areaBasedList1");
        assert!(url.query().unwrap_or_default().contains("pageNo=2"));
        // No key configured, none sent
        assert!(!url.query().unwrap_or_default().contains("serviceKey"));
    }
}
