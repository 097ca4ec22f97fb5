//! Measurement sources.
//!
//! The `MeasurementSource` trait abstracts over where growth and feeding data
//! come from (local JSON/CSV exports, the dashboard backend) so reports can be
//! built the same way from either, and sources can be mocked in tests.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use growthlab_core::domain::parse_iso_date;
use growthlab_core::nutrition::NutritionFeed;
use growthlab_core::Measurement;

/// Structured errors for source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no {0} data configured for this source")]
    NotConfigured(&'static str),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format: {0} (expected .json or .csv)")]
    UnsupportedFormat(PathBuf),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("network unreachable: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("cannot decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Where growth and feeding data come from.
pub trait MeasurementSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// All growth measurements, in whatever order the source holds them.
    fn fetch_growth(&self) -> Result<Vec<Measurement>, SourceError>;

    /// The feeding log.
    fn fetch_nutrition(&self) -> Result<NutritionFeed, SourceError>;
}

// ─── Parsing ────────────────────────────────────────────────────────

/// Parse a JSON array of `{date, weight?, height?, head?}` objects.
pub fn parse_growth_json(text: &str) -> Result<Vec<Measurement>, SourceError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    head: Option<f64>,
}

/// Parse CSV with a `date,weight,height,head` header. Empty cells are absent
/// values; the metric columns themselves may be omitted.
pub fn parse_growth_csv(text: &str) -> Result<Vec<Measurement>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let invalid = |e: csv::Error| SourceError::InvalidRecord {
        line: e.position().map_or(0, |p| p.line()),
        reason: e.to_string(),
    };
    let headers = reader.headers().map_err(invalid)?.clone();

    let mut out = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record).map_err(invalid)? {
        let line = record.position().map_or(0, |p| p.line());
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| SourceError::InvalidRecord {
                line,
                reason: e.to_string(),
            })?;
        let date = parse_iso_date(&row.date).ok_or_else(|| SourceError::InvalidRecord {
            line,
            reason: format!("invalid date '{}'", row.date),
        })?;
        out.push(Measurement {
            date,
            weight: row.weight,
            height: row.height,
            head: row.head,
        });
    }
    Ok(out)
}

/// Parse a `{entries: [...], weekly_average?}` feeding payload.
pub fn parse_nutrition_json(text: &str) -> Result<NutritionFeed, SourceError> {
    Ok(serde_json::from_str(text)?)
}

// ─── File source ────────────────────────────────────────────────────

/// Reads exported files from disk. Growth data may be JSON or CSV.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    growth: Option<PathBuf>,
    nutrition: Option<PathBuf>,
}

impl FileSource {
    pub fn new(growth: Option<PathBuf>, nutrition: Option<PathBuf>) -> Self {
        Self { growth, nutrition }
    }

    fn read(path: &Path) -> Result<String, SourceError> {
        std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

impl MeasurementSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch_growth(&self) -> Result<Vec<Measurement>, SourceError> {
        let path = self.growth.as_deref().ok_or(SourceError::NotConfigured("growth"))?;
        let rows = match extension(path).as_deref() {
            Some("json") => parse_growth_json(&Self::read(path)?)?,
            Some("csv") => parse_growth_csv(&Self::read(path)?)?,
            _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        };
        log::info!("read {} measurements from {}", rows.len(), path.display());
        Ok(rows)
    }

    fn fetch_nutrition(&self) -> Result<NutritionFeed, SourceError> {
        let path = self
            .nutrition
            .as_deref()
            .ok_or(SourceError::NotConfigured("nutrition"))?;
        if extension(path).as_deref() != Some("json") {
            return Err(SourceError::UnsupportedFormat(path.to_path_buf()));
        }
        let feed = parse_nutrition_json(&Self::read(path)?)?;
        log::info!("read {} feeding entries from {}", feed.entries.len(), path.display());
        Ok(feed)
    }
}

// ─── HTTP source ────────────────────────────────────────────────────

/// The dashboard backend: `GET {base}/growth` and `GET {base}/nutrition`.
///
/// Transport failures and 5xx answers are retried with exponential backoff;
/// 4xx answers are returned immediately.
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("growthlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = self.endpoint(path);
        let mut attempt = 0u32;
        loop {
            let failure = match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        log::debug!("GET {url} -> {status}");
                        return resp.json::<T>().map_err(|e| SourceError::Decode {
                            url: url.clone(),
                            reason: e.to_string(),
                        });
                    }
                    let err = SourceError::HttpStatus {
                        url: url.clone(),
                        status: status.as_u16(),
                    };
                    if !status.is_server_error() {
                        return Err(err);
                    }
                    err
                }
                Err(e) => SourceError::Network {
                    url: url.clone(),
                    reason: e.to_string(),
                },
            };

            if attempt >= self.max_retries {
                return Err(failure);
            }
            let delay = self.base_delay * 2u32.saturating_pow(attempt);
            attempt += 1;
            log::warn!(
                "{failure}; retry {attempt}/{} in {}ms",
                self.max_retries,
                delay.as_millis()
            );
            std::thread::sleep(delay);
        }
    }
}

impl MeasurementSource for HttpSource {
    fn name(&self) -> &str {
        "backend"
    }

    fn fetch_growth(&self) -> Result<Vec<Measurement>, SourceError> {
        let rows: Vec<Measurement> = self.get_json("growth")?;
        log::info!("fetched {} measurements from {}", rows.len(), self.base_url);
        Ok(rows)
    }

    fn fetch_nutrition(&self) -> Result<NutritionFeed, SourceError> {
        let feed: NutritionFeed = self.get_json("nutrition")?;
        log::info!(
            "fetched {} feeding entries from {}",
            feed.entries.len(),
            self.base_url
        );
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn csv_with_blank_cells() {
        let text = "date,weight,height,head\n\
                    2025-05-14,3.6,51,36\n\
                    2025-05-17,3.4,,\n\
                    2025-06-01, , 54.5 ,\n";
        let rows = parse_growth_csv(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].head, Some(36.0));
        assert_eq!(rows[1].date, d(2025, 5, 17));
        assert_eq!(rows[1].height, None);
        assert_eq!(rows[2].weight, None);
        assert_eq!(rows[2].height, Some(54.5));
    }

    #[test]
    fn csv_may_omit_metric_columns() {
        let rows = parse_growth_csv("date,weight\n2025-05-14,3.6\n").unwrap();
        assert_eq!(rows[0].weight, Some(3.6));
        assert_eq!(rows[0].head, None);
    }

    #[test]
    fn csv_bad_date_reports_line() {
        let err = parse_growth_csv("date,weight\n2025-05-14,3.6\n14/05/2025,3.7\n").unwrap_err();
        match err {
            SourceError::InvalidRecord { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("14/05/2025"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_line_numbers_count_blank_and_multiline_rows() {
        let text = "date,weight\n\n2025-05-14,3.6\n\n14/05/2025,3.7\n";
        match parse_growth_csv(text).unwrap_err() {
            SourceError::InvalidRecord { line, .. } => assert_eq!(line, 5),
            other => panic!("unexpected error: {other}"),
        }

        let text = "date,note,weight\n2025-05-14,\"first\nsecond\",3.6\nyesterday,,3.7\n";
        match parse_growth_csv(text).unwrap_err() {
            SourceError::InvalidRecord { line, reason } => {
                assert_eq!(line, 4);
                assert!(reason.contains("yesterday"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_bad_number_is_invalid_record() {
        let err = parse_growth_csv("date,weight\n2025-05-14,heavy\n").unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord { .. }), "{err}");
    }

    #[test]
    fn json_growth_rows() {
        let rows = parse_growth_json(r#"[{"date":"2025-05-14","weight":3.6}]"#).unwrap();
        assert_eq!(rows[0].weight, Some(3.6));
        assert!(matches!(parse_growth_json("{"), Err(SourceError::Json(_))));
    }

    #[test]
    fn file_source_without_paths_is_not_configured() {
        let source = FileSource::default();
        assert!(matches!(
            source.fetch_growth(),
            Err(SourceError::NotConfigured("growth"))
        ));
        assert!(matches!(
            source.fetch_nutrition(),
            Err(SourceError::NotConfigured("nutrition"))
        ));
    }

    #[test]
    fn file_source_rejects_unknown_extension() {
        let source = FileSource::new(Some(PathBuf::from("growth.xlsx")), None);
        assert!(matches!(
            source.fetch_growth(),
            Err(SourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let source = HttpSource::new("https://growth.example.org/").unwrap();
        assert_eq!(
            source.endpoint("/growth"),
            "https://growth.example.org/growth"
        );
        assert_eq!(
            source.endpoint("nutrition"),
            "https://growth.example.org/nutrition"
        );
    }

    #[test]
    fn unreachable_backend_is_network_error() {
        // Port 9 (discard) is not expected to be listening locally.
        let source = HttpSource::new("http://127.0.0.1:9")
            .unwrap()
            .with_retries(0, Duration::ZERO);
        let err = source.fetch_growth().unwrap_err();
        assert!(matches!(err, SourceError::Network { .. }), "{err}");
    }

    /// Serve `status` with `body` to every request on a local port; returns
    /// the base URL and a hit counter.
    fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        (format!("http://{addr}"), hits)
    }

    #[test]
    fn server_errors_are_retried() {
        let (url, hits) = serve("503 Service Unavailable", "{}");
        let source = HttpSource::new(&url)
            .unwrap()
            .with_retries(2, Duration::ZERO);
        let err = source.fetch_growth().unwrap_err();
        assert!(
            matches!(err, SourceError::HttpStatus { status: 503, .. }),
            "{err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let (url, hits) = serve("404 Not Found", "{}");
        let source = HttpSource::new(&url)
            .unwrap()
            .with_retries(2, Duration::ZERO);
        let err = source.fetch_nutrition().unwrap_err();
        assert!(
            matches!(err, SourceError::HttpStatus { status: 404, .. }),
            "{err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn successful_response_is_decoded() {
        let (url, hits) = serve(
            "200 OK",
            r#"[{"date":"2025-05-14","weight":3.6},{"date":"2025-06-14","height":54.5}]"#,
        );
        let source = HttpSource::new(&url).unwrap();
        let rows = source.fetch_growth().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].date, d(2025, 6, 14));
        assert_eq!(rows[1].height, Some(54.5));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let (url, _hits) = serve("200 OK", "not json");
        let source = HttpSource::new(&url).unwrap();
        let err = source.fetch_growth().unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }), "{err}");
    }
}
