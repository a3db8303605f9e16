use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Append-only writer for the per-run `events.jsonl` trail.
///
/// Every emitted event carries `type`, `run_id` and `ts` defaults; the caller
/// payload is merged last and may override them. One compact JSON object per
/// line, so the trail can be tailed or replayed with line-oriented tools.
#[derive(Debug, Clone)]
pub struct EventWriter {
    path: Arc<PathBuf>,
    run_id: Arc<str>,
    lock: Arc<Mutex<()>>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            path: Arc::new(path.into()),
            run_id: Arc::from(run_id.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert("run_id".to_string(), Value::String(self.run_id.to_string()));
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        event.extend(payload);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&event)?;
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(event))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;
    use serde_json::json;

    use super::*;

    #[test]
    fn emit_writes_one_compact_object_per_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "plan-001");

        let mut payload = EventPayload::new();
        payload.insert("request_chars".to_string(), json!(42));
        let emitted = writer.emit("plan_requested", payload)?;
        writer.emit("plan_generated", EventPayload::new())?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0])?;
        assert_eq!(first, emitted);
        assert_eq!(first["type"], json!("plan_requested"));
        assert_eq!(first["run_id"], json!("plan-001"));
        assert_eq!(first["request_chars"], json!(42));
        DateTime::parse_from_rfc3339(first["ts"].as_str().unwrap_or(""))?;

        let second: Value = serde_json::from_str(lines[1])?;
        assert_eq!(second["type"], json!("plan_generated"));
        Ok(())
    }

    #[test]
    fn payload_overrides_default_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "plan-001");

        let mut payload = EventPayload::new();
        payload.insert("run_id".to_string(), json!("other-run"));
        let emitted = writer.emit("plan_requested", payload)?;

        assert_eq!(emitted["run_id"], json!("other-run"));
        Ok(())
    }

    #[test]
    fn emit_creates_missing_parent_directories() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested/run/events.jsonl");
        let writer = EventWriter::new(&path, "plan-001");
        writer.emit("run_started", EventPayload::new())?;
        assert!(path.exists());
        Ok(())
    }
}
