//! Wikimedia Commons `globalusage` client
//!
//! Counts how many pages across Wikimedia projects embed each file.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::http::ApiClient;
use crate::error::GalleryResult;

const RATE_LIMIT_PER_SEC: u32 = 10;

/// The MediaWiki API caps `titles` at 50 per request
const TITLES_PER_REQUEST: usize = 50;

const FILE_PREFIX: &str = "File:";

pub struct CommonsClient {
    api: ApiClient,
    api_url: String,
}

impl CommonsClient {
    pub fn new(api_url: impl Into<String>) -> GalleryResult<Self> {
        Ok(Self {
            api: ApiClient::new("commons", RATE_LIMIT_PER_SEC)?,
            api_url: api_url.into(),
        })
    }

    /// File name (without `File:`) → number of global usages
    ///
    /// Files the API does not know are absent from the map. Follows
    /// `continue` tokens so usage rows past `gulimit` are still counted.
    pub async fn global_usage(&self, file_names: &[String]) -> GalleryResult<HashMap<String, usize>> {
        let mut usage = HashMap::new();
        let mut requests = 0usize;
        for chunk in file_names.chunks(TITLES_PER_REQUEST) {
            let titles = chunk
                .iter()
                .map(|f| format!("{}{}", FILE_PREFIX, f))
                .collect::<Vec<_>>()
                .join("|");
            let mut continuation: Vec<(String, String)> = Vec::new();
            loop {
                let body = {
                    let mut params: Vec<(&str, String)> = vec![
                        ("action", "query".to_string()),
                        ("prop", "globalusage".to_string()),
                        ("titles", titles.clone()),
                        ("gulimit", "max".to_string()),
                        ("format", "json".to_string()),
                        ("formatversion", "2".to_string()),
                    ];
                    params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.clone())));
                    self.api.get_json(&self.api_url, &params).await?
                };
                requests += 1;
                merge_usage(&mut usage, parse_global_usage(&body));

                match continuation_params(&body) {
                    // a repeated token would never terminate
                    Some(next) if next != continuation => continuation = next,
                    Some(_) => {
                        warn!("Commons returned the same continue token twice; stopping");
                        break;
                    }
                    None => break,
                }
            }
        }
        debug!(files = file_names.len(), found = usage.len(), requests, "Global usage fetched");
        Ok(usage)
    }
}

/// Key/value pairs of the response's `continue` object, to be sent back
/// verbatim on the next request. `None` once the result set is complete.
pub fn continuation_params(body: &Value) -> Option<Vec<(String, String)>> {
    let object = body.get("continue")?.as_object()?;
    let params: Vec<(String, String)> = object
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect();
    (!params.is_empty()).then_some(params)
}

/// Adds one response's counts to the running totals
///
/// A title whose usage rows span several continued responses appears in
/// each of them, so counts are summed rather than replaced.
pub fn merge_usage(totals: &mut HashMap<String, usize>, part: HashMap<String, usize>) {
    for (name, count) in part {
        *totals.entry(name).or_insert(0) += count;
    }
}

/// Usage counts from a `formatversion=2` query response
pub fn parse_global_usage(body: &Value) -> HashMap<String, usize> {
    let pages = body
        .pointer("/query/pages")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    pages
        .iter()
        .filter(|p| p.get("missing").is_none())
        .filter_map(|p| {
            let title = p.get("title").and_then(Value::as_str)?;
            let name = title.strip_prefix(FILE_PREFIX).unwrap_or(title);
            let count = p
                .get("globalusage")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Some((name.to_string(), count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_global_usage() {
        let body = json!({
            "query": {"pages": [
                {"title": "File:Panthera leo.jpg", "globalusage": [
                    {"title": "Lion", "wiki": "en.wikipedia.org"},
                    {"title": "Leão", "wiki": "pt.wikipedia.org"}
                ]},
                {"title": "File:Unused plate.png", "globalusage": []},
                {"title": "File:Gone.jpg", "missing": true}
            ]}
        });
        let usage = parse_global_usage(&body);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage["Panthera leo.jpg"], 2);
        assert_eq!(usage["Unused plate.png"], 0);
    }

    #[test]
    fn test_continued_response_counts_are_summed() {
        let first = json!({
            "continue": {"gucontinue": "A.jpg|enwiki|2", "continue": "||"},
            "query": {"pages": [
                {"title": "File:A.jpg", "globalusage": [
                    {"title": "Lion", "wiki": "en.wikipedia.org"},
                    {"title": "Leão", "wiki": "pt.wikipedia.org"}
                ]},
                {"title": "File:B.jpg", "globalusage": []}
            ]}
        });
        let second = json!({
            "batchcomplete": true,
            "query": {"pages": [
                {"title": "File:A.jpg", "globalusage": [
                    {"title": "León", "wiki": "es.wikipedia.org"}
                ]},
                {"title": "File:B.jpg"}
            ]}
        });

        let next = continuation_params(&first).unwrap();
        assert_eq!(next.len(), 2);
        assert!(next.contains(&("gucontinue".to_string(), "A.jpg|enwiki|2".to_string())));
        assert!(next.contains(&("continue".to_string(), "||".to_string())));
        assert!(continuation_params(&second).is_none());

        let mut usage = HashMap::new();
        merge_usage(&mut usage, parse_global_usage(&first));
        merge_usage(&mut usage, parse_global_usage(&second));
        assert_eq!(usage["A.jpg"], 3);
        assert_eq!(usage["B.jpg"], 0);
    }

    /// Serves `first` until a request carries `gucontinue`, then `second`
    async fn serve_two_part_usage(first: Value, second: Value) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/w/api.php", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                }
                seen.fetch_add(1, Ordering::SeqCst);
                let request = String::from_utf8_lossy(&raw);
                let body = if request.contains("gucontinue=") { &second } else { &first };
                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (url, requests)
    }

    #[tokio::test]
    async fn test_global_usage_follows_continue_token() {
        let first = json!({
            "continue": {"gucontinue": "A.jpg|enwiki|2", "continue": "||"},
            "query": {"pages": [
                {"title": "File:A.jpg", "globalusage": [{"title": "x"}, {"title": "y"}]}
            ]}
        });
        let second = json!({
            "batchcomplete": true,
            "query": {"pages": [
                {"title": "File:A.jpg", "globalusage": [{"title": "z"}]}
            ]}
        });
        let (url, requests) = serve_two_part_usage(first, second).await;

        let client = CommonsClient::new(url).unwrap();
        let usage = client.global_usage(&["A.jpg".to_string()]).await.unwrap();

        assert_eq!(usage.get("A.jpg"), Some(&3));
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_continuation_params_keeps_numeric_values() {
        let body = json!({"continue": {"gucontinue": "X.jpg|dewiki|7", "guoffset": 500}});
        let next = continuation_params(&body).unwrap();
        assert!(next.contains(&("guoffset".to_string(), "500".to_string())));
        assert!(continuation_params(&json!({"continue": {}})).is_none());
    }

    #[test]
    fn test_parse_global_usage_unexpected_shape() {
        assert!(parse_global_usage(&json!({"batchcomplete": true})).is_empty());
    }
}
