//! Wire message decoder
//!
//! The instrument controller sends compact UTF-8 text payloads, one logical
//! message per socket read. The leading character selects the variant:
//!
//! | Tag | Message | Body |
//! |-----|---------|------|
//! | `C` | Conductivity batch | groups split on `\|`, tokens split on `;` |
//! | `R` | Raw batch | same as `C` |
//! | `P` | Grid sample | `[x;y;value]` |
//! | `A` | Trail sample | `[x;y]` |
//!
//! Batch bodies are ambiguous by design of the sender: square brackets are
//! decorative, tokens may be paired values `(a,b)` of which only `a` is
//! meaningful, and a trailing sentinel starting at the letter `C` must be
//! dropped. [`decode`] reproduces those rules exactly; see the notes on
//! [`decode`] for the known hazard in the sentinel rule.
//!
//! Decoding is pure: the same payload always yields the same [`Message`] or
//! the same [`ProtocolError`] kind.

use crate::error::ProtocolError;
use crate::types::Channel;

/// A decoded wire message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A batch of sampling groups for one channel
    ///
    /// Each group is one sampling instant; inner values are indexed by
    /// frequency-bin position.
    ChannelBatch {
        channel: Channel,
        groups: Vec<Vec<f64>>,
    },
    /// A sparse update to one cell of the prediction grid
    GridSample { x: i32, y: i32, value: f64 },
    /// One point of the active-search position trail
    TrailSample { x: f64, y: f64 },
}

/// Decode a raw payload into a typed [`Message`]
///
/// The batch variants strip everything from the last occurrence of `C` in
/// the body onward. The sender appends sentinel/stacked data there, but the
/// rule can also truncate a payload whose numeric tokens legitimately
/// contain a `C` (e.g. hex-ish garbage). That behavior is part of the
/// integration contract and is preserved as-is; do not "fix" it here.
pub fn decode(payload: &str) -> Result<Message, ProtocolError> {
    let tag = payload.chars().next().ok_or(ProtocolError::EmptyPayload)?;
    let body = &payload[tag.len_utf8()..];

    match tag {
        'C' => Ok(Message::ChannelBatch {
            channel: Channel::Conductivity,
            groups: parse_batch(body)?,
        }),
        'R' => Ok(Message::ChannelBatch {
            channel: Channel::Raw,
            groups: parse_batch(body)?,
        }),
        'P' => parse_grid(body),
        'A' => parse_trail(body),
        other => Err(ProtocolError::UnknownTag(other)),
    }
}

/// Parse a batch body into sampling groups
fn parse_batch(body: &str) -> Result<Vec<Vec<f64>>, ProtocolError> {
    // Drop the trailing sentinel: everything from the last 'C' onward.
    let body = match body.rfind('C') {
        Some(idx) => &body[..idx],
        None => body,
    };
    let clean: String = body.chars().filter(|c| !matches!(c, '[' | ']')).collect();

    let mut groups = Vec::new();
    for group in clean.split('|') {
        let tokens: Vec<&str> = group.split(';').collect();
        // The paired-value shape is decided per group, uniformly: only when
        // every token closes a pair is the second component discarded.
        let paired = tokens.iter().all(|t| t.contains(')'));

        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            let value = if paired {
                let first = match token.rfind(',') {
                    Some(idx) => &token[..idx],
                    None => token,
                };
                parse_f64(&first.replace('(', ""))?
            } else {
                parse_f64(token)?
            };
            values.push(value);
        }
        groups.push(values);
    }
    Ok(groups)
}

/// Parse a grid body: exactly `x;y;value`
fn parse_grid(body: &str) -> Result<Message, ProtocolError> {
    let fields = split_fields(body);
    if fields.len() != 3 {
        return Err(ProtocolError::FieldCount {
            expected: 3,
            found: fields.len(),
        });
    }
    Ok(Message::GridSample {
        x: parse_i32(&fields[0])?,
        y: parse_i32(&fields[1])?,
        value: parse_f64(&fields[2])?,
    })
}

/// Parse a trail body: exactly `x;y`
fn parse_trail(body: &str) -> Result<Message, ProtocolError> {
    let fields = split_fields(body);
    if fields.len() != 2 {
        return Err(ProtocolError::FieldCount {
            expected: 2,
            found: fields.len(),
        });
    }
    Ok(Message::TrailSample {
        x: parse_f64(&fields[0])?,
        y: parse_f64(&fields[1])?,
    })
}

fn split_fields(body: &str) -> Vec<String> {
    let clean: String = body.chars().filter(|c| !matches!(c, '[' | ']')).collect();
    clean.split(';').map(|s| s.to_string()).collect()
}

fn parse_f64(token: &str) -> Result<f64, ProtocolError> {
    let trimmed = token.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| ProtocolError::NumberFormat {
            token: trimmed.to_string(),
        })
}

fn parse_i32(token: &str) -> Result<i32, ProtocolError> {
    let trimmed = token.trim();
    trimmed
        .parse::<i32>()
        .map_err(|_| ProtocolError::NumberFormat {
            token: trimmed.to_string(),
        })
}
