// ABOUTME: PKCE format and verification property tests
// ABOUTME: Exercises length boundaries, charset rules, and single-bit mutation rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use gatehouse_mcp_server::oauth2_server::pkce;

/// A valid 43-character verifier over the PKCE charset
fn sample_verifier() -> String {
    "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_owned()
}

#[test]
fn test_verify_roundtrip_for_generated_pairs() {
    // challenge = base64url(sha256(verifier)) must always verify
    for seed in 0..16u8 {
        let verifier: String = (0..64)
            .map(|i| {
                const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
                CHARSET[(usize::from(seed) * 31 + i * 7) % CHARSET.len()] as char
            })
            .collect();
        let challenge = pkce::compute_challenge(&verifier);
        assert!(pkce::verify(&verifier, &challenge), "verifier {verifier}");
    }
}

#[test]
fn test_verify_rejects_mutated_verifier() {
    let verifier = sample_verifier();
    let challenge = pkce::compute_challenge(&verifier);

    // Flip one character of the verifier
    let mut mutated = verifier.clone().into_bytes();
    mutated[0] = if mutated[0] == b'd' { b'e' } else { b'd' };
    let mutated = String::from_utf8(mutated).unwrap();

    assert!(pkce::verify(&verifier, &challenge));
    assert!(!pkce::verify(&mutated, &challenge));
}

#[test]
fn test_verify_rejects_mutated_challenge() {
    let verifier = sample_verifier();
    let challenge = pkce::compute_challenge(&verifier);

    let mut mutated = challenge.clone().into_bytes();
    mutated[10] = if mutated[10] == b'A' { b'B' } else { b'A' };
    let mutated = String::from_utf8(mutated).unwrap();

    assert!(!pkce::verify(&verifier, &mutated));
}

#[test]
fn test_verify_rejects_empty_inputs() {
    let challenge = pkce::compute_challenge(&sample_verifier());
    assert!(!pkce::verify("", &challenge));
    assert!(!pkce::verify(&sample_verifier(), ""));
}

#[test]
fn test_format_length_boundaries() {
    // 42/43/128/129 are the interesting edges
    assert!(!pkce::validate_format(&"a".repeat(42)));
    assert!(pkce::validate_format(&"a".repeat(43)));
    assert!(pkce::validate_format(&"a".repeat(128)));
    assert!(!pkce::validate_format(&"a".repeat(129)));
}

#[test]
fn test_format_charset() {
    assert!(pkce::validate_format(
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~"
    ));

    for bad in ['+', '/', '=', ' ', '#', '%', '\n'] {
        let candidate = format!("{}{bad}", "a".repeat(43));
        assert!(
            !pkce::validate_format(&candidate),
            "charset must reject {bad:?}"
        );
    }
}

#[test]
fn test_format_rejects_empty() {
    assert!(!pkce::validate_format(""));
}

#[test]
fn test_challenge_is_43_chars_unpadded() {
    // SHA-256 output is 32 bytes: 43 base64url characters, no padding
    let challenge = pkce::compute_challenge(&sample_verifier());
    assert_eq!(challenge.len(), 43);
    assert!(!challenge.contains('='));
    assert!(pkce::validate_format(&challenge));
}
