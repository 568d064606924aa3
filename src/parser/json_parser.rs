// Field-path driven parsing for JSON job APIs
use crate::config::JsonFieldPaths;
use crate::model::{ParseError, ParsedPage, RawPayload, ScrapeError, Vacancy};
use crate::parser::{structure_mismatch, SourceParser};
use crate::utils::{clean_text, parse_date, resolve_url};
use serde_json::Value;
use tracing::debug;

pub struct JsonParser {
    source_id: String,
    base_url: String,
    fields: JsonFieldPaths,
}

impl JsonParser {
    pub fn new(source_id: &str, base_url: &str, fields: &JsonFieldPaths) -> Result<Self, ScrapeError> {
        let paths = [
            Some(&fields.listings),
            Some(&fields.title),
            Some(&fields.url),
            fields.location.as_ref(),
            fields.description.as_ref(),
            fields.company.as_ref(),
            fields.posted_at.as_ref(),
            fields.total_pages.as_ref(),
        ];
        // JSON Pointer: empty (whole document) or starting with '/'
        if let Some(bad) = paths.into_iter().flatten().find(|p| !p.is_empty() && !p.starts_with('/')) {
            return Err(ScrapeError::InvalidSource {
                source_id: source_id.to_string(),
                reason: format!("field path `{}` is not a JSON pointer", bad),
            });
        }

        Ok(Self {
            source_id: source_id.to_string(),
            base_url: base_url.to_string(),
            fields: fields.clone(),
        })
    }

    fn parse_listing(&self, listing: &Value) -> Option<Vacancy> {
        let title = text_at(listing, &self.fields.title).filter(|t| !t.is_empty())?;
        let href = text_at(listing, &self.fields.url)?;
        let url = resolve_url(&self.base_url, &href)?;

        let optional = |path: &Option<String>| {
            path.as_deref()
                .and_then(|p| text_at(listing, p))
                .unwrap_or_default()
        };

        let mut vacancy = Vacancy::new(title, url, &self.source_id);
        vacancy.location = optional(&self.fields.location);
        vacancy.description = optional(&self.fields.description);
        vacancy.company = optional(&self.fields.company);
        vacancy.posted_at = self
            .fields
            .posted_at
            .as_deref()
            .and_then(|p| text_at(listing, p))
            .and_then(|d| parse_date(&d));
        Some(vacancy)
    }

    fn declared_pages(&self, root: &Value) -> Option<u32> {
        let value = root.pointer(self.fields.total_pages.as_deref()?)?;
        match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Scalar at `path` as cleaned text; objects, arrays and null give `None`.
fn text_at(value: &Value, path: &str) -> Option<String> {
    match value.pointer(path)? {
        Value::String(s) => Some(clean_text(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl SourceParser for JsonParser {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn parse(&self, payload: &RawPayload) -> Result<ParsedPage, ParseError> {
        let root: Value = serde_json::from_str(&payload.body).map_err(|e| {
            structure_mismatch(&self.source_id, "JSON document".to_string(), &e.to_string())
        })?;

        let listings: &[Value] = match root.pointer(&self.fields.listings) {
            Some(Value::Array(items)) => items.as_slice(),
            // A null listings field means "nothing published", not a layout change.
            Some(Value::Null) => &[],
            Some(other) => {
                return Err(structure_mismatch(
                    &self.source_id,
                    format!("listings array at `{}`", self.fields.listings),
                    &format!("found {} in {}", json_kind(other), payload.url),
                ));
            }
            None => {
                return Err(structure_mismatch(
                    &self.source_id,
                    format!("listings array at `{}`", self.fields.listings),
                    &format!("field absent in {}", payload.url),
                ));
            }
        };

        let mut page = ParsedPage {
            total_pages: self.declared_pages(&root),
            ..Default::default()
        };

        for listing in listings {
            page.fragments += 1;
            match self.parse_listing(listing) {
                Some(vacancy) => page.vacancies.push(vacancy),
                None => {
                    page.skipped += 1;
                    debug!("[{}] skipped listing without title or link", self.source_id);
                }
            }
        }

        Ok(page)
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
