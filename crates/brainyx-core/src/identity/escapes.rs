//! Decoding of the DNS-SD name escaping scheme.
//!
//! Service names advertised over local-segment discovery may contain
//! arbitrary bytes.  The records escape them as `\DDD` — a backslash
//! followed by exactly three decimal digits holding the byte value.  A
//! space becomes `\032`; multi-byte UTF-8 characters appear as runs of
//! escapes (`\226\128\153` is the three-byte encoding of `’`).
//!
//! Decoding is total: malformed or out-of-range escape sequences pass
//! through verbatim instead of failing.  Malformed records occasionally
//! embed control characters (stray newlines in particular); those are
//! mapped to plain spaces so decoded names are always printable.

/// Decodes `\DDD` escape sequences in `raw` and maps control characters
/// to spaces.
///
/// Escaped bytes are collected first and then interpreted as UTF-8, so
/// runs of escapes decode into multi-byte characters.  Invalid UTF-8 is
/// replaced rather than rejected.
pub fn decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(u8::is_ascii_digit) {
                // Three decimal digits can exceed a byte (`\999`); those
                // sequences are not valid escapes and pass through.
                let value = (digits[0] - b'0') as u16 * 100
                    + (digits[1] - b'0') as u16 * 10
                    + (digits[2] - b'0') as u16;
                if value <= 255 {
                    out.push(value as u8);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out)
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Decodes a service name and normalizes its whitespace: runs of spaces
/// (including spaces produced from control characters) collapse to a
/// single space, and leading/trailing whitespace is trimmed.
///
/// This is the form used for stable identity keys, where
/// `"Brainyx\032Gateway   \032  Node\n"` and `"Brainyx Gateway Node"`
/// must compare equal.
pub fn normalize_name(raw: &str) -> String {
    decode(raw).split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
