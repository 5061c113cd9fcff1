use encoding_rs::{Encoding, WINDOWS_1252};

/// Decode uploaded text. A BOM decides the encoding when present; otherwise
/// valid UTF-8 is taken as-is and anything else is read as Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}
