// ABOUTME: PKCE (RFC 7636) format validation and S256 proof verification
// ABOUTME: Pure functions used for both code_challenge and code_verifier handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use crate::constants::limits;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Check that a value is a well-formed PKCE string per RFC 7636 section 4.1:
/// 43–128 characters over `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`.
///
/// Used identically for both `code_challenge` and `code_verifier`.
#[must_use]
pub fn validate_format(value: &str) -> bool {
    if value.len() < limits::PKCE_MIN_LEN || value.len() > limits::PKCE_MAX_LEN {
        return false;
    }

    value
        .chars()
        .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~'))
}

/// Compute the S256 challenge for a verifier:
/// `base64url(sha256(ascii(code_verifier)))` without padding.
#[must_use]
pub fn compute_challenge(code_verifier: &str) -> String {
    let digest = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Verify a PKCE proof: the S256 hash of `code_verifier` must equal
/// `code_challenge`. Returns false if either input is empty.
///
/// The comparison is constant-time so the check cannot leak how many
/// leading characters of the challenge matched.
#[must_use]
pub fn verify(code_verifier: &str, code_challenge: &str) -> bool {
    if code_verifier.is_empty() || code_challenge.is_empty() {
        return false;
    }

    let computed = compute_challenge(code_verifier);
    if computed.len() != code_challenge.len() {
        return false;
    }

    computed.as_bytes().ct_eq(code_challenge.as_bytes()).into()
}
