use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Where the charset used for a body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    ByteOrderMark,
    ContentType,
    Detected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub text: String,
    pub encoding: &'static str,
    pub source: CharsetSource,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("body is not valid {encoding}")]
    Malformed { encoding: &'static str },
}

/// Decode a response body to UTF-8: BOM first, then the Content-Type charset, then
/// statistical detection.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedBody, DecodeError> {
    let (encoding, source) = if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        (encoding, CharsetSource::ByteOrderMark)
    } else if let Some(encoding) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        (encoding, CharsetSource::ContentType)
    } else {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        (detector.guess(None, true), CharsetSource::Detected)
    };

    // `decode` strips a matching BOM itself.
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name(),
        });
    }
    Ok(DecodedBody {
        text: text.into_owned(),
        encoding: encoding.name(),
        source,
    })
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(['"', '\''].as_ref()))
        } else {
            None
        }
    })
}
