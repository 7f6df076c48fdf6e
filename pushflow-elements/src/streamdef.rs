// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! JSON stream descriptor types.
//!
//! A [`StreamDef`] describes one elementary stream offered by a
//! [`crate::reader::PacketReader`]: its identity, the time base of its packet
//! timestamps, and format-specific details.

use std::fmt;

use pushflow::{PayloadKind, PinInfo, Rational, Result};
use serde::{Deserialize, Serialize};

/// Complete stream descriptor.
///
/// # Examples
///
/// ```
/// use pushflow::PayloadKind;
/// use pushflow_elements::streamdef::StreamDef;
///
/// let json = r#"{
///     "id": "5fbec3b1-1b0f-417d-9059-8b94a47197ed",
///     "label": "main video",
///     "time_base": {"numerator": 1, "denominator": 90000},
///     "format": "video",
///     "frame_rate": {"numerator": 30000, "denominator": 1001}
/// }"#;
///
/// let stream = StreamDef::from_json(json).unwrap();
/// assert_eq!(stream.kind(), PayloadKind::Video);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StreamDef {
    /// Unique identifier for this stream (UUID).
    pub id: uuid::Uuid,
    /// Short human-readable label.
    #[serde(default)]
    pub label: String,
    /// Time base of packet timestamps.
    #[serde(default)]
    pub time_base: Rational,
    /// Format-specific details (flattened into this struct via serde).
    #[serde(flatten)]
    pub details: StreamDetails,
}

/// Format-specific stream details, selected by the `format` field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum StreamDetails {
    /// Video stream.
    Video(VideoDetails),
    /// Audio stream.
    Audio(AudioDetails),
    /// Subtitle or caption stream.
    Subtitle,
    /// Opaque data stream.
    Data,
}

/// Video stream details.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VideoDetails {
    /// Average frame rate (e.g., 30000/1001 for 29.97 fps).
    pub frame_rate: Rate,
}

/// Audio stream details.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AudioDetails {
    /// Sample rate (typically 48000/1 Hz).
    pub sample_rate: Rate,
    /// Number of audio channels.
    pub channel_count: u32,
}

/// Rational number representation for rates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Rate {
    /// Numerator of the rate.
    pub numerator: i32,
    /// Denominator of the rate (defaults to 1 if omitted in JSON).
    #[serde(default = "default_denominator")]
    pub denominator: i32,
}

fn default_denominator() -> i32 {
    1
}

impl Rate {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// The rate in Hz, or `None` if the denominator is zero.
    pub fn to_f64(self) -> Option<f64> {
        Rational::new(self.numerator, self.denominator).to_f64()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl StreamDetails {
    /// Payload kind carried by streams of this format.
    pub fn kind(&self) -> PayloadKind {
        match self {
            StreamDetails::Video(_) => PayloadKind::Video,
            StreamDetails::Audio(_) => PayloadKind::Audio,
            StreamDetails::Subtitle => PayloadKind::Subtitle,
            StreamDetails::Data => PayloadKind::Data,
        }
    }
}

impl StreamDef {
    /// A stream with a fresh id and the given details.
    pub fn new(label: impl Into<String>, time_base: Rational, details: StreamDetails) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            label: label.into(),
            time_base,
            details,
        }
    }

    /// Parses a descriptor from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn kind(&self) -> PayloadKind {
        self.details.kind()
    }

    /// Description of an output pin carrying this stream.
    pub fn pin_info(&self) -> PinInfo {
        PinInfo::new(self.kind()).with_time_base(self.time_base)
    }
}

impl fmt::Display for StreamDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' time_base={}", self.kind(), self.label, self.time_base)?;
        match &self.details {
            StreamDetails::Video(video) => write!(f, " fps={}", video.frame_rate),
            StreamDetails::Audio(audio) => write!(
                f,
                " rate={} channels={}",
                audio.sample_rate, audio.channel_count
            ),
            StreamDetails::Subtitle | StreamDetails::Data => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_descriptor_parses() {
        let json = r#"{
            "id": "b3bb5be7-9fe9-4324-a5bb-4c70e1084449",
            "time_base": {"numerator": 1, "denominator": 48000},
            "format": "audio",
            "sample_rate": {"numerator": 48000},
            "channel_count": 2
        }"#;
        let stream = StreamDef::from_json(json).unwrap();
        assert_eq!(stream.kind(), PayloadKind::Audio);
        assert_eq!(stream.label, "");
        let StreamDetails::Audio(audio) = &stream.details else {
            panic!("expected audio details");
        };
        assert_eq!(audio.sample_rate, Rate::new(48000, 1));
        assert_eq!(audio.channel_count, 2);
        assert_eq!(
            stream.pin_info().time_base,
            Some(Rational::new(1, 48000))
        );
    }

    #[test]
    fn unit_formats_parse_without_details() {
        let json = r#"{ "id": "0b1f9f0e-8d4e-4b43-9c39-8b8f1f0f6a10", "format": "subtitle" }"#;
        let stream = StreamDef::from_json(json).unwrap();
        assert_eq!(stream.kind(), PayloadKind::Subtitle);
        assert_eq!(stream.time_base, Rational::default());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let json = r#"{ "id": "0b1f9f0e-8d4e-4b43-9c39-8b8f1f0f6a10", "format": "hologram" }"#;
        assert!(matches!(
            StreamDef::from_json(json),
            Err(pushflow::Error::Json(_))
        ));
    }

    #[test]
    fn display_includes_format_details() {
        let stream = StreamDef::new(
            "main",
            Rational::new(1, 90000),
            StreamDetails::Video(VideoDetails {
                frame_rate: Rate::new(25, 1),
            }),
        );
        assert_eq!(stream.to_string(), "video 'main' time_base=1/90000 fps=25/1");
    }
}
