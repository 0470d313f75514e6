//! Bearer token reconstruction from request cookies.
//!
//! Older logins stored the Spotify access token directly in the browser,
//! either as a single `sp_token` cookie or split over `sp_token.<i>` cookies
//! with an `sp_token_chunks` count, base64 encoded. Even older ones used a
//! plain `access_token` cookie. New logins use a server-side session (see
//! [`crate::management::SessionManager`]); this module keeps the cookie formats
//! readable.

use std::collections::HashMap;

use axum::http::{HeaderMap, header::COOKIE};
use base64::{Engine, engine::general_purpose::STANDARD};

pub const SESSION_COOKIE: &str = "sp_session";
pub const TOKEN_COOKIE: &str = "sp_token";
pub const CHUNK_COUNT_COOKIE: &str = "sp_token_chunks";
pub const LEGACY_TOKEN_COOKIE: &str = "access_token";

pub fn chunk_cookie_name(index: usize) -> String {
    format!("{}.{}", TOKEN_COOKIE, index)
}

fn cookie<'a>(cookies: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    cookies
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Reconstructs the bearer token from the request's cookies.
///
/// Returns `None` when the request is not authenticated. A declared chunk
/// count with a missing chunk, or a count that is not a number, fails closed.
pub fn resolve_token(cookies: &HashMap<String, String>) -> Option<String> {
    let raw = match cookie(cookies, CHUNK_COUNT_COOKIE) {
        Some(count) => {
            let count = count.trim().parse::<usize>().ok()?;
            let mut assembled = String::new();
            for index in 0..count {
                assembled.push_str(cookie(cookies, &chunk_cookie_name(index))?);
            }
            assembled
        }
        None => match cookie(cookies, TOKEN_COOKIE) {
            Some(single) => single.to_string(),
            None => walk_chunks(cookies),
        },
    };

    if !raw.is_empty() {
        return Some(decode_token(raw));
    }

    cookie(cookies, LEGACY_TOKEN_COOKIE).map(str::to_string)
}

// No count cookie: take chunks from index 0 until the first gap.
fn walk_chunks(cookies: &HashMap<String, String>) -> String {
    let mut assembled = String::new();
    let mut index = 0;
    while let Some(chunk) = cookie(cookies, &chunk_cookie_name(index)) {
        assembled.push_str(chunk);
        index += 1;
    }
    assembled
}

/// Decodes a base64 token, falling back to the raw value when it was stored
/// unencoded.
pub fn decode_token(raw: String) -> String {
    match STANDARD.decode(raw.as_bytes()) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or(raw),
        Err(_) => raw,
    }
}

/// Encodes a token into the cookie pairs [`resolve_token`] reads back.
///
/// Tokens that fit into one chunk are stored as a single `sp_token` cookie,
/// larger ones as `sp_token.<i>` chunks plus the `sp_token_chunks` count.
pub fn encode_token_chunks(token: &str, chunk_size: usize) -> Vec<(String, String)> {
    let encoded = STANDARD.encode(token.as_bytes());
    let chunk_size = chunk_size.max(1);

    if encoded.len() <= chunk_size {
        return vec![(TOKEN_COOKIE.to_string(), encoded)];
    }

    // base64 output is ASCII, so byte chunks never split a character
    let mut cookies: Vec<(String, String)> = encoded
        .as_bytes()
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            (
                chunk_cookie_name(index),
                String::from_utf8_lossy(chunk).into_owned(),
            )
        })
        .collect();
    cookies.push((CHUNK_COUNT_COOKIE.to_string(), cookies.len().to_string()));
    cookies
}

/// Collects every cookie sent with the request.
///
/// Later duplicates of a name are ignored, matching how browsers order the
/// most specific cookie first.
pub fn parse_cookie_header(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, val)) = pair.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| val.trim().trim_matches('"').to_string());
            }
        }
    }
    cookies
}
