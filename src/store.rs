// Destination store boundary and its Supabase (PostgREST) implementation.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{collection}: HTTP {status}: {body}")]
    Status {
        collection: String,
        status: u16,
        body: String,
    },

    #[error("{collection}: cannot decode response: {source}")]
    Decode {
        collection: String,
        source: serde_json::Error,
    },

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

// What the loader needs from the destination: bulk insert and a wipe used
// before a fresh import. With `return_ids` the new ids come back in request
// order; without it the result is empty.
pub trait DataStore {
    fn insert_batch(
        &mut self,
        collection: &str,
        records: &[Value],
        return_ids: bool,
    ) -> Result<Vec<i64>, StoreError>;

    fn delete_all(&mut self, collection: &str) -> Result<(), StoreError>;
}

#[derive(Deserialize)]
struct InsertedId {
    id: i64,
}

pub struct PostgrestStore {
    client: Client,
    rest_url: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(service_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.rest_url, collection)
    }
}

impl DataStore for PostgrestStore {
    fn insert_batch(
        &mut self,
        collection: &str,
        records: &[Value],
        return_ids: bool,
    ) -> Result<Vec<i64>, StoreError> {
        debug!(
            "insert_batch: {} records into {} (ids: {})",
            records.len(),
            collection,
            return_ids
        );
        let req = self.client.post(self.collection_url(collection));
        let req = if return_ids {
            req.query(&[("select", "id")])
                .header("Prefer", "return=representation")
        } else {
            req.header("Prefer", "return=minimal")
        };
        let res = check_status(collection, req.json(records).send()?)?;
        if !return_ids {
            return Ok(Vec::new());
        }

        let body = res.text()?;
        let ids: Vec<InsertedId> =
            serde_json::from_str(&body).map_err(|source| StoreError::Decode {
                collection: collection.to_string(),
                source,
            })?;
        Ok(ids.into_iter().map(|r| r.id).collect())
    }

    fn delete_all(&mut self, collection: &str) -> Result<(), StoreError> {
        debug!("delete_all: {}", collection);
        // PostgREST refuses an unfiltered DELETE; every issued id is positive.
        let res = self
            .client
            .delete(self.collection_url(collection))
            .query(&[("id", "neq.0")])
            .send()?;
        check_status(collection, res)?;
        Ok(())
    }
}

fn check_status(collection: &str, res: Response) -> Result<Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    Err(StoreError::Status {
        collection: collection.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
pub mod memory {
    // In-memory store for loader tests: hands out sequential ids and can be
    // told to reject specific calls.

    use super::{DataStore, StoreError};
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    pub struct MemoryStore {
        pub collections: HashMap<String, Vec<(i64, Value)>>,
        pub calls: Vec<(String, usize)>,
        // `return_ids` of each call, in call order.
        pub id_requests: Vec<bool>,
        pub fail_calls: HashSet<usize>,
        next_id: i64,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                next_id: 1000,
                ..Self::default()
            }
        }

        pub fn failing_on(calls: &[usize]) -> Self {
            Self {
                fail_calls: calls.iter().copied().collect(),
                ..Self::new()
            }
        }

        pub fn rows(&self, collection: &str) -> &[(i64, Value)] {
            self.collections
                .get(collection)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        }
    }

    impl DataStore for MemoryStore {
        fn insert_batch(
            &mut self,
            collection: &str,
            records: &[Value],
            return_ids: bool,
        ) -> Result<Vec<i64>, StoreError> {
            let call = self.calls.len();
            self.calls.push((collection.to_string(), records.len()));
            self.id_requests.push(return_ids);
            if self.fail_calls.contains(&call) {
                return Err(StoreError::Status {
                    collection: collection.to_string(),
                    status: 500,
                    body: format!("call {} rejected", call),
                });
            }
            let rows = self.collections.entry(collection.to_string()).or_default();
            let mut ids = Vec::with_capacity(records.len());
            for record in records {
                self.next_id += 1;
                rows.push((self.next_id, record.clone()));
                if return_ids {
                    ids.push(self.next_id);
                }
            }
            Ok(ids)
        }

        fn delete_all(&mut self, collection: &str) -> Result<(), StoreError> {
            self.collections.remove(collection);
            Ok(())
        }
    }
}
