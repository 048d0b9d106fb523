use std::collections::HashSet;

use serde::Serialize;

use crate::error::GroupQueryError;

/// Maximum number of SCAN iterations as a safety valve
const MAX_SCAN_ITERATIONS: usize = 1000;

/// Patterns searched when none are given on the command line, in the order
/// they are searched.
pub const DEFAULT_PATTERNS: [&str; 4] = ["group:*", "groups:*", "*:group*", "*:groups*"];

/// Value of a single key, tagged with the storage type it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    String(String),
    /// Field/value pairs in the order the server returned them.
    Hash(Vec<(String, String)>),
    List(Vec<String>),
    Set(Vec<String>),
    /// Members with scores, in ascending score order.
    SortedSet(Vec<(String, f64)>),
    /// A storage type this tool does not fetch (stream, module types, ...).
    /// Carries the type name the server reported.
    Unknown(String),
    /// The fetch failed; carries the error message.
    Error(String),
}

impl KeyValue {
    /// Tag shown on the `Type:` line of the report. Matches what the server
    /// calls the type, so sorted sets show up as `zset`.
    pub fn type_name(&self) -> &str {
        match self {
            KeyValue::String(_) => "string",
            KeyValue::Hash(_) => "hash",
            KeyValue::List(_) => "list",
            KeyValue::Set(_) => "set",
            KeyValue::SortedSet(_) => "zset",
            KeyValue::Unknown(reported) => reported,
            KeyValue::Error(_) => "error",
        }
    }

    /// JSON rendition used by `--json` output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            KeyValue::String(v) => serde_json::Value::String(v.clone()),
            KeyValue::Hash(pairs) => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(f, v)| (f.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                serde_json::Value::Object(map)
            }
            KeyValue::List(items) | KeyValue::Set(items) => serde_json::json!(items),
            KeyValue::SortedSet(members) => serde_json::json!(members
                .iter()
                .map(|(m, s)| serde_json::json!({"member": m, "score": s}))
                .collect::<Vec<_>>()),
            KeyValue::Unknown(reported) => {
                serde_json::json!({"type": reported, "note": "Unsupported type"})
            }
            KeyValue::Error(msg) => serde_json::json!({"error": msg}),
        }
    }
}

/// Outcome of scanning one pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PatternScan {
    pub pattern: String,
    pub found: usize,
    /// Set when the scan itself failed; the pattern then counts as matching
    /// zero keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One key and its fetched value.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub key: String,
    pub value: KeyValue,
}

/// Everything collected in one run: per-pattern scan summaries plus one entry
/// per distinct matching key, in scan order.
#[derive(Debug, Clone, Default)]
pub struct GroupReport {
    pub patterns: Vec<PatternScan>,
    pub entries: Vec<GroupEntry>,
}

impl GroupReport {
    pub fn to_json(&self) -> serde_json::Value {
        let entries: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.key.clone(),
                    serde_json::json!({
                        "type": e.value.type_name(),
                        "value": e.value.to_json(),
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "patterns": self.patterns,
            "entries": entries,
            "count": self.entries.len(),
        })
    }
}

/// Patterns to search: the command-line ones if any were given, otherwise
/// [`DEFAULT_PATTERNS`].
pub fn resolve_patterns(cli_patterns: &[String]) -> Vec<String> {
    if cli_patterns.is_empty() {
        DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
    } else {
        cli_patterns.to_vec()
    }
}

/// Read-only query handle over a single Redis connection.
#[derive(Clone)]
pub struct GroupQuery {
    conn: redis::aio::ConnectionManager,
    scan_count: u32,
}

impl GroupQuery {
    pub fn new(conn: redis::aio::ConnectionManager, scan_count: u32) -> Self {
        Self { conn, scan_count }
    }

    /// Validate that a pattern doesn't contain null bytes.
    fn validate_pattern(pattern: &str) -> Result<(), GroupQueryError> {
        if pattern.contains('\0') {
            return Err(GroupQueryError::InvalidPattern(
                pattern.replace('\0', "\\0"),
            ));
        }
        Ok(())
    }

    /// List every key matching `pattern` using a cursor SCAN loop.
    pub async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, GroupQueryError> {
        Self::validate_pattern(pattern)?;
        let mut conn = self.conn.clone();

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        let mut iterations = 0;

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            cursor = next_cursor;
            iterations += 1;

            if cursor == 0 {
                break;
            }
            if iterations >= MAX_SCAN_ITERATIONS {
                tracing::warn!(pattern, iterations, "SCAN stopped early, listing may be incomplete");
                break;
            }
        }

        Ok(keys)
    }

    /// Fetch the value of `key` according to its storage type. Fetch failures
    /// are folded into [`KeyValue::Error`] so one bad key cannot abort a run.
    pub async fn fetch_key(&self, key: &str) -> KeyValue {
        match self.fetch_typed(key).await {
            Ok(value) => value,
            Err(e) => KeyValue::Error(e.to_string()),
        }
    }

    async fn fetch_typed(&self, key: &str) -> Result<KeyValue, GroupQueryError> {
        let mut conn = self.conn.clone();

        // Get key type first
        let key_type: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;

        let value = match key_type.as_str() {
            "string" => {
                let v: String = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
                KeyValue::String(v)
            }
            "hash" => {
                let v: Vec<(String, String)> = redis::cmd("HGETALL")
                    .arg(key)
                    .query_async(&mut conn)
                    .await?;
                KeyValue::Hash(v)
            }
            "list" => {
                let v: Vec<String> = redis::cmd("LRANGE")
                    .arg(key)
                    .arg(0)
                    .arg(-1)
                    .query_async(&mut conn)
                    .await?;
                KeyValue::List(v)
            }
            "set" => {
                let v: Vec<String> = redis::cmd("SMEMBERS")
                    .arg(key)
                    .query_async(&mut conn)
                    .await?;
                KeyValue::Set(v)
            }
            "zset" => {
                let v: Vec<(String, f64)> = redis::cmd("ZRANGE")
                    .arg(key)
                    .arg(0)
                    .arg(-1)
                    .arg("WITHSCORES")
                    .query_async(&mut conn)
                    .await?;
                KeyValue::SortedSet(v)
            }
            // Listed by SCAN but gone by the time we fetch it
            "none" => KeyValue::Error("key does not exist".to_string()),
            other => KeyValue::Unknown(other.to_string()),
        };

        Ok(value)
    }

    /// Scan every pattern and fetch every matching key. Scan failures are
    /// recorded on the pattern summary, fetch failures on the entry; neither
    /// stops the run.
    pub async fn collect(&self, patterns: &[String]) -> GroupReport {
        let mut report = GroupReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for pattern in patterns {
            let (keys, error) = match self.scan_keys(pattern).await {
                Ok(keys) => (keys, None),
                Err(e) => (Vec::new(), Some(e.to_string())),
            };

            report.patterns.push(PatternScan {
                pattern: pattern.clone(),
                found: keys.len(),
                error,
            });

            for key in keys {
                // A key can match several patterns; fetch it once
                if !seen.insert(key.clone()) {
                    continue;
                }
                let value = self.fetch_key(&key).await;
                report.entries.push(GroupEntry { key, value });
            }
        }

        report
    }
}
