use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("credential is not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded credential is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Reverses the symmetric obfuscation applied to `--encode` credentials.
pub fn decode_credentials(value: &str) -> Result<String, DecodeError> {
    let bytes = STANDARD.decode(value.trim())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_round() {
        assert_eq!(decode_credentials("YWRtaW4=").unwrap(), "admin");
    }

    #[test]
    fn test_decode_tolerates_whitespace() {
        assert_eq!(decode_credentials(" YWRtaW4=\n").unwrap(), "admin");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_credentials("!!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        // 0xff 0xfe is valid base64 content but not a utf-8 string
        assert!(matches!(
            decode_credentials("//4="),
            Err(DecodeError::Utf8(_))
        ));
    }
}
