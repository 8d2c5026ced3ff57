use crate::errors::CompressError;
use base64::{Engine as _, engine::general_purpose};

/// Borrowed view over a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, CompressError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CompressError::UnreadableFile("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CompressError::UnreadableFile("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| CompressError::UnreadableFile("payload is not base64".to_string()))?;

        Ok(Self { mime, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, CompressError> {
        general_purpose::STANDARD
            .decode(self.payload.trim())
            .map_err(|err| CompressError::UnreadableFile(format!("invalid base64: {err}")))
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let prefix = format!("data:{mime};base64,");
    let mut uri = String::with_capacity(prefix.len() + bytes.len().div_ceil(3) * 4);
    uri.push_str(&prefix);
    general_purpose::STANDARD.encode_string(bytes, &mut uri);
    uri
}

/// Decoded byte size of a base64 data URI, computed from the payload length
/// alone. Strings without a `,` are treated as a bare payload.
pub fn estimate_size(uri: &str) -> u64 {
    let payload = uri.split_once(',').map_or(uri, |(_, payload)| payload).trim_end();
    let padding = payload.bytes().rev().take_while(|&b| b == b'=').count() as u64;
    (payload.len() as u64 * 3 / 4).saturating_sub(padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_mime_and_payload() {
        let uri = DataUri::parse("data:image/png;base64,iVBORw0K").unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(uri.payload, "iVBORw0K");
    }

    #[test]
    fn parse_rejects_plain_strings() {
        assert!(matches!(
            DataUri::parse("https://example.com/a.jpg"),
            Err(CompressError::UnreadableFile(_))
        ));
        assert!(DataUri::parse("data:text/plain,hello").is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        let uri = DataUri::parse("data:image/jpeg;base64,***not base64***").unwrap();
        assert!(matches!(uri.decode(), Err(CompressError::UnreadableFile(_))));
    }

    #[test]
    fn estimate_is_exact_for_padded_payloads() {
        for len in [1usize, 2, 3, 10, 1023, 1024, 4096, 70_001] {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
            let uri = encode_data_uri("image/jpeg", &bytes);
            assert_eq!(estimate_size(&uri), len as u64, "len {len}");
        }
    }

    #[test]
    fn estimate_within_five_percent_above_one_kb() {
        for len in [1025usize, 5000, 60_000] {
            let bytes = vec![0xABu8; len];
            let uri = encode_data_uri("image/png", &bytes);
            let estimate = estimate_size(&uri) as f64;
            assert!((estimate - len as f64).abs() / len as f64 <= 0.05);
        }
    }
}
