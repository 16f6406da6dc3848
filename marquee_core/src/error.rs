// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types shared across the crate.
//!
//! Capability probes never fail (an unsupported feature is just `false`), so
//! the only errors here describe invalid configuration and unparsable
//! declarative input. Export failures live in
//! [`snapshot::ExportError`](crate::snapshot::ExportError) because they carry
//! the host's own error type.

use alloc::string::String;

/// A configuration value is out of its valid range.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A count, rate, or duration that must be positive was zero.
    #[error("`{field}` must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A floating-point field was NaN or infinite.
    #[error("`{field}` must be a finite number")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Two thresholds are in the wrong order.
    #[error("`{lower}` must not exceed `{upper}`")]
    Ordering {
        /// Field expected to be the smaller value.
        lower: &'static str,
        /// Field expected to be the larger value.
        upper: &'static str,
    },
    /// A ratio field is outside `[0, 1]`.
    #[error("`{field}` must lie within [0, 1]")]
    OutOfUnitRange {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Declarative input (trigger positions, margins, section ids) did not parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A scroll-trigger position such as `"top 80%"` was malformed.
    #[error("invalid trigger position `{0}`")]
    Position(String),
    /// A CSS length such as `"-50px"` or `"20%"` was malformed.
    #[error("invalid length `{0}`")]
    Length(String),
    /// A root margin did not contain one to four lengths.
    #[error("invalid root margin `{0}`")]
    RootMargin(String),
    /// A section id does not name a known scene.
    #[error("unknown scene `{0}`")]
    UnknownScene(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::Zero {
            field: "sample_size",
        };
        assert_eq!(err.to_string(), "`sample_size` must be greater than zero");

        let err = ConfigError::Ordering {
            lower: "critical_fps",
            upper: "low_fps",
        };
        assert_eq!(
            err.to_string(),
            "`critical_fps` must not exceed `low_fps`"
        );
    }

    #[test]
    fn parse_errors_quote_input() {
        let err = ParseError::Position("middle nowhere".into());
        assert_eq!(err.to_string(), "invalid trigger position `middle nowhere`");
    }
}
