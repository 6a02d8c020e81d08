use super::error::SearchError;
use super::types::Search;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Upper bound on an encoded search parameter, in bytes
pub const MAX_SEARCH_PARAM_LEN: usize = 16 * 1024;

const PADDING_OPTIONAL: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_OPTIONAL);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_OPTIONAL);

/// Decode the `search` query parameter.
///
/// Accepts the JSON document directly or wrapped in base64 (standard or
/// URL-safe alphabet, padding optional).
pub fn decode_search_param<T>(raw: &str) -> Result<Search<T>, SearchError> {
    let raw = raw.trim();
    if raw.len() > MAX_SEARCH_PARAM_LEN {
        return Err(SearchError::MalformedPayload(format!(
            "search parameter is too long ({} bytes, max {})",
            raw.len(),
            MAX_SEARCH_PARAM_LEN
        )));
    }
    if raw.starts_with('{') {
        return decode_search_json(raw.as_bytes());
    }

    // '+' arrives as a space when the parameter was not percent-encoded
    let standard = raw.replace(' ', "+");
    let bytes = STANDARD_LENIENT
        .decode(&standard)
        .or_else(|_| URL_SAFE_LENIENT.decode(raw))
        .map_err(|e| SearchError::MalformedPayload(format!("search is neither JSON nor base64: {}", e)))?;
    decode_search_json(&bytes)
}

pub fn decode_search_json<T>(bytes: &[u8]) -> Result<Search<T>, SearchError> {
    serde_json::from_slice(bytes).map_err(|e| SearchError::MalformedPayload(e.to_string()))
}

pub fn decode_search_value<T>(value: serde_json::Value) -> Result<Search<T>, SearchError> {
    serde_json::from_value(value).map_err(|e| SearchError::MalformedPayload(e.to_string()))
}

/// Base64 form of a search, as accepted by [`decode_search_param`]
pub fn encode_search_param<T>(search: &Search<T>) -> Result<String, SearchError> {
    let json =
        serde_json::to_vec(search).map_err(|e| SearchError::MalformedPayload(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}
