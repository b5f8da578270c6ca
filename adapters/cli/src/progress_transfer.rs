use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use maze_chase_core::Progress;
use serde::{Deserialize, Serialize};

const CODE_DOMAIN: &str = "chase";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the level and the encoded payload.
pub(crate) const CODE_HEADER: &str = "chase:v1";
/// Delimiter used to separate the prefix, level and payload.
const FIELD_DELIMITER: char = ':';

/// Session progress packed into a single line that `--resume` accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ProgressCode {
    /// Progress captured by the code.
    pub(crate) progress: Progress,
}

impl ProgressCode {
    /// Encodes the progress as `chase:v1:<level>:<payload>`.
    pub(crate) fn encode(&self) -> Result<String, ProgressTransferError> {
        let payload = SerializablePayload {
            score: self.progress.score,
            bombs: self.progress.bombs,
        };
        let json = serde_json::to_vec(&payload).map_err(ProgressTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{CODE_HEADER}:{}:{encoded}", self.progress.level))
    }

    /// Decodes a code produced by [`ProgressCode::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, ProgressTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ProgressTransferError::EmptyCode);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ProgressTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ProgressTransferError::MissingVersion)?;
        let level = parts.next().ok_or(ProgressTransferError::MissingLevel)?;
        let payload = parts.next().ok_or(ProgressTransferError::MissingPayload)?;

        if domain != CODE_DOMAIN {
            return Err(ProgressTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != CODE_VERSION {
            return Err(ProgressTransferError::UnsupportedVersion(version.to_owned()));
        }

        let level = parse_level(level)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ProgressTransferError::InvalidEncoding)?;
        let decoded: SerializablePayload =
            serde_json::from_slice(&bytes).map_err(ProgressTransferError::InvalidPayload)?;

        Ok(Self {
            progress: Progress {
                level,
                score: decoded.score,
                bombs: decoded.bombs,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    score: u32,
    bombs: u32,
}

/// Errors that can occur while handling progress codes.
#[derive(Debug)]
pub(crate) enum ProgressTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyCode,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The version segment was missing.
    MissingVersion,
    /// The level segment was missing.
    MissingLevel,
    /// The payload segment was missing.
    MissingPayload,
    /// The code used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The level could not be parsed or was zero.
    InvalidLevel(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for ProgressTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "progress code was empty"),
            Self::MissingPrefix => write!(f, "progress code is missing the prefix"),
            Self::MissingVersion => write!(f, "progress code is missing the version"),
            Self::MissingLevel => write!(f, "progress code is missing the level"),
            Self::MissingPayload => write!(f, "progress code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "progress prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "progress version '{version}' is not supported")
            }
            Self::InvalidLevel(level) => write!(f, "could not parse level '{level}'"),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode progress payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not handle progress payload: {error}")
            }
        }
    }
}

impl Error for ProgressTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_level(level: &str) -> Result<u32, ProgressTransferError> {
    match level.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ProgressTransferError::InvalidLevel(level.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_carries_every_progress_field() {
        let code = ProgressCode {
            progress: Progress {
                level: 6,
                score: 415,
                bombs: 3,
            },
        };

        let encoded = code.encode().expect("code encodes");
        assert!(encoded.starts_with(&format!("{CODE_HEADER}:6:")));

        let decoded = ProgressCode::decode(&encoded).expect("code decodes");
        assert_eq!(code, decoded);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let code = ProgressCode {
            progress: Progress::default(),
        };
        let encoded = code.encode().expect("code encodes");
        let decoded = ProgressCode::decode(&format!("  {encoded}\n")).expect("code decodes");
        assert_eq!(decoded.progress, Progress::default());
    }

    #[test]
    fn rejects_foreign_prefix() {
        let error = ProgressCode::decode("maze:v1:12x8:e30").expect_err("prefix rejected");
        assert!(matches!(error, ProgressTransferError::InvalidPrefix(prefix) if prefix == "maze"));
    }

    #[test]
    fn rejects_unknown_version() {
        let error = ProgressCode::decode("chase:v9:1:e30").expect_err("version rejected");
        assert!(matches!(error, ProgressTransferError::UnsupportedVersion(_)));
    }

    #[test]
    fn rejects_level_zero() {
        let error = ProgressCode::decode("chase:v1:0:e30").expect_err("level rejected");
        assert!(matches!(error, ProgressTransferError::InvalidLevel(_)));
    }

    #[test]
    fn rejects_truncated_codes() {
        assert!(matches!(
            ProgressCode::decode("   "),
            Err(ProgressTransferError::EmptyCode)
        ));
        assert!(matches!(
            ProgressCode::decode("chase:v1:3"),
            Err(ProgressTransferError::MissingPayload)
        ));
    }

    #[test]
    fn reports_payload_source() {
        let error = ProgressCode::decode("chase:v1:2:e30").expect_err("payload rejected");
        assert!(matches!(error, ProgressTransferError::InvalidPayload(_)));
        assert!(error.source().is_some());
    }
}
