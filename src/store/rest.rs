use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use super::RowSink;
use crate::config::StoreConfig;
use crate::model::IncidentRow;

/// PostgREST insert endpoint of a hosted Supabase project.
#[derive(Debug)]
pub struct RestSink {
    client: Client,
    base_url: String,
}

impl RestSink {
    pub fn new(config: &StoreConfig, timeout: Option<Duration>) -> Result<Self> {
        Self::from_builder(client_builder(config, timeout)?, config)
    }

    fn from_builder(builder: ClientBuilder, config: &StoreConfig) -> Result<Self> {
        let client = builder.build().context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn client_builder(config: &StoreConfig, timeout: Option<Duration>) -> Result<ClientBuilder> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "apikey",
        HeaderValue::from_str(&config.api_key).context("api key is not a valid header value")?,
    );
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .context("api key is not a valid header value")?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("prefer", HeaderValue::from_static("return=representation"));

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true))
}

impl RowSink for RestSink {
    fn insert_rows(&mut self, table: &str, rows: &[IncidentRow]) -> Result<Vec<Value>> {
        let url = self.table_url(table);
        debug!(url = %url, rows = rows.len(), "posting insert batch");

        let response = self
            .client
            .post(&url)
            .json(rows)
            .send()
            .with_context(|| format!("insert request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
            bail!("insert into {table} rejected with HTTP {status}: {body}");
        }

        let inserted = response
            .json::<Vec<Value>>()
            .with_context(|| format!("failed to decode insert response from {url}"))?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves exactly one HTTP response and hands back the raw request.
    fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<String>) {
        one_shot_raw(format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
    }

    /// Writes `response` verbatim after reading one request.
    fn one_shot_raw(response: String) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
            }

            let mut request_body = vec![0_u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            format!("{head}\r\n{}", String::from_utf8(request_body).unwrap())
        });

        (format!("http://{addr}"), handle)
    }

    fn config_for(base_url: String) -> StoreConfig {
        StoreConfig {
            base_url,
            api_key: "anon-key".to_string(),
        }
    }

    fn local_sink(base_url: String) -> RestSink {
        let config = config_for(base_url);
        let builder = client_builder(&config, Some(Duration::from_secs(5)))
            .unwrap()
            .no_proxy();
        RestSink::from_builder(builder, &config).unwrap()
    }

    fn sample_rows() -> Vec<IncidentRow> {
        vec![
            IncidentRow {
                countries: vec!["Peru".to_string()],
                ..IncidentRow::default()
            },
            IncidentRow {
                themes: vec!["Right to health".to_string()],
                ..IncidentRow::default()
            },
        ]
    }

    #[test]
    fn table_url_targets_postgrest_path() {
        let sink =
            RestSink::new(&config_for("https://example.supabase.co".to_string()), None).unwrap();
        assert_eq!(
            sink.table_url("uhri_incidents"),
            "https://example.supabase.co/rest/v1/uhri_incidents"
        );
    }

    #[test]
    fn insert_rows_posts_json_array_with_auth_headers() {
        let (base_url, server) = one_shot_server("HTTP/1.1 201 Created", r#"[{"id":1},{"id":2}]"#);
        let mut sink = local_sink(base_url);

        let inserted = sink.insert_rows("uhri_incidents", &sample_rows()).unwrap();
        assert_eq!(inserted.len(), 2);

        let request = server.join().unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /rest/v1/uhri_incidents "));
        assert!(lower.contains("apikey: anon-key"));
        assert!(lower.contains("authorization: bearer anon-key"));
        assert!(lower.contains("prefer: return=representation"));
        assert!(request.contains(r#""countries":["Peru"]"#));
        assert!(request.contains(r#""affected_persons":[]"#));
    }

    #[test]
    fn insert_rows_surfaces_http_rejection_with_body() {
        let (base_url, server) = one_shot_server(
            "HTTP/1.1 400 Bad Request",
            r#"{"message":"column does not exist"}"#,
        );
        let mut sink = local_sink(base_url);

        let err = sink.insert_rows("uhri_incidents", &sample_rows()).unwrap_err();
        server.join().unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("400"));
        assert!(message.contains("column does not exist"));
    }

    #[test]
    fn insert_rows_rejects_success_without_row_array() {
        for body in ["", r#"{"status":"ok"}"#] {
            let (base_url, server) = one_shot_server("HTTP/1.1 201 Created", body);
            let mut sink = local_sink(base_url);

            let err = sink.insert_rows("uhri_incidents", &sample_rows()).unwrap_err();
            server.join().unwrap();

            assert!(format!("{err:#}").contains("failed to decode insert response"));
        }
    }

    #[test]
    fn insert_rows_reports_truncated_rejection_body() {
        let (base_url, server) = one_shot_raw(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 64\r\nConnection: close\r\n\r\npartial"
                .to_string(),
        );
        let mut sink = local_sink(base_url);

        let err = sink.insert_rows("uhri_incidents", &sample_rows()).unwrap_err();
        server.join().unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("500"));
        assert!(message.contains("<unreadable body:"));
    }
}
