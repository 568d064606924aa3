// Source adapters: one parser per wire format, configured per source.

pub mod html_parser;
pub mod json_parser;

pub use html_parser::HtmlParser;
pub use json_parser::JsonParser;

use crate::config::{SourceConfig, SourceFormat};
use crate::model::{ParseError, ParsedPage, RawPayload, ScrapeError};

/// Turns one fetched page into vacancies. Owns every source-specific quirk.
pub trait SourceParser: Send + Sync {
    fn source_id(&self) -> &str;

    /// A missing listings skeleton is a `StructureMismatch`; a fragment without
    /// title or link is only counted in `ParsedPage::skipped`.
    fn parse(&self, payload: &RawPayload) -> Result<ParsedPage, ParseError>;

    /// Description text from a vacancy's own page, for sources that publish one.
    fn parse_detail(&self, _payload: &RawPayload) -> Option<String> {
        None
    }

    fn has_detail_pages(&self) -> bool {
        false
    }
}

pub fn build_parser(config: &SourceConfig) -> Result<Box<dyn SourceParser>, ScrapeError> {
    if crate::utils::canonical_url(&config.base_url).is_none() {
        return Err(ScrapeError::InvalidSource {
            source_id: config.id.clone(),
            reason: format!("base_url `{}` is not an absolute http(s) URL", config.base_url),
        });
    }

    match &config.format {
        SourceFormat::Html { selectors } => {
            let parser = HtmlParser::new(&config.id, &config.base_url, selectors)?;
            Ok(Box::new(parser))
        }
        SourceFormat::Json { fields } => {
            let parser = JsonParser::new(&config.id, &config.base_url, fields)?;
            Ok(Box::new(parser))
        }
    }
}

pub(crate) fn structure_mismatch(source_id: &str, expected: String, detail: &str) -> ParseError {
    ParseError::StructureMismatch {
        source_id: source_id.to_string(),
        expected,
        detail: detail.to_string(),
    }
}
