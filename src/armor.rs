//! Labelled ASCII armor.
//!
//! Blocks look like:
//!
//! ```text
//! -----BEGIN <LABEL>-----
//!
//! <base64 body, 64 columns>
//! =<base64 CRC-24>
//! -----END <LABEL>-----
//! ```
//!
//! The label is free text so the same codec serves the standard OpenPGP
//! key blocks and the raw `RSA ... KEY BLOCK` envelopes of `.pem` files.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const PUBLIC_KEY_BLOCK: &str = "PGP PUBLIC KEY BLOCK";
pub const PRIVATE_KEY_BLOCK: &str = "PGP PRIVATE KEY BLOCK";
pub const RSA_PRIVATE_KEY_BLOCK: &str = "RSA PRIVATE KEY BLOCK";
pub const RSA_PUBLIC_KEY_BLOCK: &str = "RSA PUBLIC KEY BLOCK";

const LINE_WIDTH: usize = 64;
const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";

/// Armor decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum ArmorError {
    #[error("no armor header found")]
    MissingHeader,
    #[error("armor block '{0}' has no matching footer")]
    MissingFooter(String),
    #[error("invalid base64 in armor block '{label}': {source}")]
    Base64 {
        label: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("checksum mismatch in armor block '{label}': expected {expected:06x}, got {actual:06x}")]
    Checksum {
        label: String,
        expected: u32,
        actual: u32,
    },
}

/// A decoded armor block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmoredBlock {
    pub label: String,
    pub data: Vec<u8>,
}

/// Wraps `data` in an armor block with the given label.
///
/// The result always ends with a newline after the footer.
pub fn encode(label: &str, data: &[u8]) -> String {
    let body = STANDARD.encode(data);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 2 * label.len() + 48);

    out.push_str(BEGIN);
    out.push_str(label);
    out.push_str(DASHES);
    out.push_str("\n\n");

    // base64 output is ASCII, so byte chunks are char boundaries
    let mut rest = body.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(LINE_WIDTH));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }

    out.push('=');
    out.push_str(&STANDARD.encode(&checksum(data).to_be_bytes()[1..]));
    out.push('\n');

    out.push_str(END);
    out.push_str(label);
    out.push_str(DASHES);
    out.push('\n');
    out
}

/// Splits text into the raw armor blocks it contains, header to footer
/// inclusive. Anything between blocks is ignored.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(BEGIN) {
        let block = &rest[start..];
        let Some(label) = header_label(block) else {
            rest = &block[BEGIN.len()..];
            continue;
        };
        let footer = format!("{END}{label}{DASHES}");
        match block.find(&footer) {
            Some(end) => {
                let end = end + footer.len();
                blocks.push(&block[..end]);
                rest = &block[end..];
            }
            None => break,
        }
    }

    blocks
}

/// Decodes the first armor block found in `text`.
pub fn decode(text: &str) -> Result<ArmoredBlock, ArmorError> {
    let start = text.find(BEGIN).ok_or(ArmorError::MissingHeader)?;
    let block = &text[start..];
    let label = header_label(block).ok_or(ArmorError::MissingHeader)?;
    let footer = format!("{END}{label}{DASHES}");

    let mut body = String::new();
    let mut crc = None;
    let mut closed = false;

    for line in block.lines().skip(1) {
        let line = line.trim();
        if line == footer {
            closed = true;
            break;
        }
        if line.is_empty() || line.contains(": ") {
            // armor headers and the blank separator
            continue;
        }
        match line.strip_prefix('=') {
            Some(sum) => crc = Some(sum.to_string()),
            None => body.push_str(line),
        }
    }

    if !closed {
        return Err(ArmorError::MissingFooter(label.to_string()));
    }

    let base64_err = |source| ArmorError::Base64 {
        label: label.to_string(),
        source,
    };
    let data = STANDARD.decode(body.as_bytes()).map_err(base64_err)?;

    if let Some(crc) = crc {
        let bytes = STANDARD.decode(crc.as_bytes()).map_err(base64_err)?;
        let expected = bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        let actual = checksum(&data);
        if expected != actual {
            return Err(ArmorError::Checksum {
                label: label.to_string(),
                expected,
                actual,
            });
        }
    }

    Ok(ArmoredBlock {
        label: label.to_string(),
        data,
    })
}

/// Returns the first block with the given label.
pub fn find_block(text: &str, label: &str) -> Option<Result<ArmoredBlock, ArmorError>> {
    let header = format!("{BEGIN}{label}{DASHES}");
    split_blocks(text)
        .into_iter()
        .find(|block| block.starts_with(&header))
        .map(decode)
}

fn header_label(block: &str) -> Option<&str> {
    let line = block.lines().next()?.trim_end();
    line.strip_prefix(BEGIN)?.strip_suffix(DASHES)
}

/// OpenPGP CRC-24.
fn checksum(data: &[u8]) -> u32 {
    crc24::hash_raw(data) & 0x00ff_ffff
}
