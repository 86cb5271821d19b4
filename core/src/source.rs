//! Reading fragment records produced by the documentation generator.
//!
//! Accepted shapes:
//! - `var documenterSearchIndex = {"docs": [...]}` (the generated `search_index.js`)
//! - a JSON object with a `docs` array, or a single record object
//! - a bare JSON array of records
//! - JSON Lines, one record per line

use crate::fragment::{FragmentRecord, FragmentStore};
use crate::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const JS_VARIABLE: &str = "documenterSearchIndex";

pub fn parse_records(input: &str) -> Result<Vec<FragmentRecord>> {
    let body = strip_js_wrapper(input);
    match serde_json::from_str::<Value>(body) {
        Ok(json) => records_from_value(json),
        Err(err) if body.starts_with('{') && body.contains('\n') => {
            parse_json_lines(body).map_err(|_| err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn strip_js_wrapper(input: &str) -> &str {
    let trimmed = input.trim_start_matches('\u{feff}').trim();
    let start = match trimmed.find(|c: char| c == '{' || c == '[') {
        Some(i) => i,
        None => return trimmed,
    };
    trimmed[start..].trim_end().trim_end_matches(';').trim_end()
}

fn records_from_value(json: Value) -> Result<Vec<FragmentRecord>> {
    match json {
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value::<FragmentRecord>(v).map_err(Into::into))
            .collect(),
        Value::Object(mut obj) => match obj.remove("docs") {
            Some(docs) => records_from_value(docs),
            None => Ok(vec![serde_json::from_value(Value::Object(obj))?]),
        },
        other => Err(Error::Input(format!("expected an array or object of fragments, found {}", json_kind(&other)))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_json_lines(input: &str) -> Result<Vec<FragmentRecord>> {
    let mut out = Vec::new();
    for line in input.lines() {
        if line.trim().is_empty() { continue; }
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}

/// Load records from a file, or from every `.js`/`.json`/`.jsonl` file under
/// a directory in path order. An unreadable directory entry is an error:
/// skipping it would shift the ids of every later fragment.
pub fn load_records(path: &Path) -> Result<Vec<FragmentRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                tracing::warn!(%err, "cannot walk fragment directory");
                std::io::Error::from(err)
            })?;
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "js" | "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        let text = fs::read_to_string(&file)?;
        let parsed = parse_records(&text)?;
        tracing::debug!(file = %file.display(), records = parsed.len(), "loaded fragment records");
        records.extend(parsed);
    }
    Ok(records)
}

/// Render a store back into the generator's `search_index.js` form.
pub fn write_documenter_js(store: &FragmentStore) -> Result<String> {
    let records: Vec<FragmentRecord> = store.iter().map(FragmentRecord::from).collect();
    let docs = serde_json::to_string(&serde_json::json!({ "docs": records }))?;
    Ok(format!("var {JS_VARIABLE} = {docs};\n"))
}
