// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad slug validation.
//!
//! A slug is the short lowercase identifier of a dyad. It doubles as a
//! container-label value and a network-alias fragment, so the charset is
//! deliberately narrow: `[a-z0-9][a-z0-9._-]*`.

use thiserror::Error;

/// Errors from slug validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("slug must start with a lowercase letter or digit: {0:?}")]
    BadStart(char),
    #[error("slug contains invalid character {1:?}: {0}")]
    BadChar(String, char),
}

/// Validate a dyad slug against `[a-z0-9][a-z0-9._-]*`.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    let mut chars = slug.chars();
    let first = chars.next().ok_or(SlugError::Empty)?;
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(SlugError::BadStart(first));
    }
    for c in chars {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && !matches!(c, '.' | '_' | '-') {
            return Err(SlugError::BadChar(slug.to_string(), c));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
