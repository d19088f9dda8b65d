//! XML response export reading.
//!
//! The document is a root collection of `<Response>` elements. Each child of
//! a response is either one of the fixed fields below or an answer keyed by
//! its tag name. Answers go through [`Response::add_answer`], which
//! normalizes the key and refuses to overwrite data.

use std::io::Read;

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info, warn};

use qsf_model::{Response, Survey, TIMESTAMP_FORMAT};

use crate::error::{IngestError, Result};

const RECORD_ID: &str = "_recordId";
const PROGRESS: &str = "progress";
const DURATION: &str = "duration";
const FINISHED: &str = "finished";
const RECORDED_DATE: &str = "recordedDate";

const FIXED_FIELDS: [&str; 5] = [RECORD_ID, PROGRESS, DURATION, FINISHED, RECORDED_DATE];

/// Read every response from a reader, in document order.
pub fn read_responses<R: Read>(mut reader: R) -> Result<Vec<Response>> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| IngestError::Read {
            document: "response export",
            source,
        })?;
    read_responses_slice(&bytes)
}

/// Read every response from an in-memory document, in document order.
pub fn read_responses_slice(bytes: &[u8]) -> Result<Vec<Response>> {
    let mut reader = Reader::from_reader(bytes);
    let mut responses = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<ResponseBuilder> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;
                let name = tag_name(start.local_name().as_ref())?;
                match depth {
                    2 => current = Some(ResponseBuilder::new(responses.len())),
                    3 => field = Some((name, String::new())),
                    _ => {}
                }
            }
            Event::Empty(start) => {
                let name = tag_name(start.local_name().as_ref())?;
                match depth + 1 {
                    2 => responses.push(ResponseBuilder::new(responses.len()).finish()),
                    3 => {
                        if let Some(builder) = current.as_mut() {
                            builder.set_field(&name, String::new())?;
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some((tag, value)) = field.as_mut() {
                    let raw = decode_utf8(tag, &text)?;
                    let unescaped = quick_xml::escape::unescape(raw).map_err(|err| {
                        IngestError::XmlText {
                            tag: tag.clone(),
                            reason: err.to_string(),
                        }
                    })?;
                    value.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some((tag, value)) = field.as_mut() {
                    value.push_str(decode_utf8(tag, &data)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some((tag, value)) = field.as_mut() {
                    let name = decode_utf8(tag, &reference)?;
                    let entity = format!("&{name};");
                    let resolved = quick_xml::escape::unescape(&entity).map_err(|err| {
                        IngestError::XmlText {
                            tag: tag.clone(),
                            reason: err.to_string(),
                        }
                    })?;
                    value.push_str(&resolved);
                }
            }
            Event::End(_) => {
                match depth {
                    3 => {
                        if let (Some(builder), Some((tag, value))) = (current.as_mut(), field.take())
                        {
                            builder.set_field(&tag, value)?;
                        }
                    }
                    2 => {
                        if let Some(builder) = current.take() {
                            responses.push(builder.finish());
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    info!(responses = responses.len(), "read response export");
    Ok(responses)
}

/// Read responses and attach them to `survey`, replacing any already present.
pub fn attach_responses<R: Read>(survey: &mut Survey, reader: R) -> Result<usize> {
    let responses = read_responses(reader)?;
    let count = responses.len();
    survey.set_responses(responses);
    Ok(count)
}

fn tag_name(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| IngestError::XmlText {
            tag: String::from_utf8_lossy(bytes).into_owned(),
            reason: err.to_string(),
        })
}

fn decode_utf8<'a>(tag: &str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|err| IngestError::XmlText {
        tag: tag.to_string(),
        reason: err.to_string(),
    })
}

/// Accumulates one `<Response>` element.
struct ResponseBuilder {
    /// Position in the document, used to name responses without an ID.
    position: usize,
    response: Response,
    seen: [bool; FIXED_FIELDS.len()],
}

impl ResponseBuilder {
    fn new(position: usize) -> Self {
        Self {
            position,
            response: Response::default(),
            seen: [false; FIXED_FIELDS.len()],
        }
    }

    fn set_field(&mut self, tag: &str, text: String) -> Result<()> {
        if let Some(slot) = FIXED_FIELDS.iter().position(|name| *name == tag) {
            self.seen[slot] = true;
            let value = text.trim();
            match tag {
                RECORD_ID => self.response.id = value.to_string(),
                PROGRESS => self.response.progress = self.convert(tag, value, |v| v.parse().ok()),
                DURATION => self.response.duration = self.convert(tag, value, |v| v.parse().ok()),
                FINISHED => self.response.finished = self.convert(tag, value, parse_bool),
                _ => {
                    self.response.recorded_on = self.convert(tag, value, |v| {
                        NaiveDateTime::parse_from_str(v, TIMESTAMP_FORMAT)
                            .ok()
                            .map(Some)
                    });
                }
            }
            return Ok(());
        }

        self.response
            .add_answer(tag, text)
            .map_err(|source| IngestError::DuplicateAnswer {
                response_id: self.label(),
                source,
            })
    }

    /// Convert a fixed field, falling back to the zero value with a warning.
    fn convert<T: Default>(&self, tag: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> T {
        match parse(value) {
            Some(converted) => converted,
            None => {
                warn!(
                    response = %self.label(),
                    field = tag,
                    value,
                    "unreadable response field, using zero value"
                );
                T::default()
            }
        }
    }

    fn label(&self) -> String {
        if self.response.id.is_empty() {
            format!("#{}", self.position + 1)
        } else {
            self.response.id.clone()
        }
    }

    fn finish(self) -> Response {
        for (name, seen) in FIXED_FIELDS.iter().zip(self.seen) {
            if !seen {
                debug!(response = %self.label(), field = *name, "response field missing, using zero value");
            }
        }
        self.response
    }
}

/// Boolean spellings accepted for the `finished` flag.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
