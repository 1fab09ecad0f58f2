use core::fmt::{Display, Write as _};

use heapless::String;

use crate::{bus::Ch376Transport, fat::format_size};

use super::{Ch376Msc, Ch376Result, ReadChunk, WriteChunk};

/// Longest numeric token accepted by the `read_*` parsers.
const NUMBER_TOKEN_MAX: usize = 14;
/// Beyond this magnitude two-decimal output stops being exact.
const FLOAT_LIMIT: f64 = 4_100_000.0;

type NumberText = String<48>;

impl<T: Ch376Transport> Ch376Msc<T> {
    /// Reads byte by byte until `terminator` (kept in `dst`), the end of the
    /// file, or a full `dst`. `more` is `false` once the file is exhausted.
    pub fn read_until(&mut self, terminator: u8, dst: &mut [u8]) -> Ch376Result<ReadChunk, T> {
        let mut len = 0;
        while len < dst.len() {
            let mut byte = [0u8; 1];
            let chunk = self.read_bytes(&mut byte)?;
            if chunk.len == 0 {
                return Ok(ReadChunk { len, more: false });
            }
            dst[len] = byte[0];
            len += 1;
            if byte[0] == terminator {
                break;
            }
        }
        Ok(ReadChunk {
            len,
            more: !self.eof(),
        })
    }

    /// Parses the next `terminator`-delimited token; unparsable input is 0.
    pub fn read_i32(&mut self, terminator: u8) -> Ch376Result<i32, T> {
        let mut token = [0u8; NUMBER_TOKEN_MAX];
        let len = self.read_until(terminator, &mut token)?.len;
        Ok(parse_int(trim_token(&token[..len], terminator)))
    }

    pub fn read_u32(&mut self, terminator: u8) -> Ch376Result<u32, T> {
        let mut token = [0u8; NUMBER_TOKEN_MAX];
        let len = self.read_until(terminator, &mut token)?.len;
        Ok(parse_int(trim_token(&token[..len], terminator)))
    }

    pub fn read_f64(&mut self, terminator: u8) -> Ch376Result<f64, T> {
        let mut token = [0u8; NUMBER_TOKEN_MAX];
        let len = self.read_until(terminator, &mut token)?.len;
        Ok(trim_token(&token[..len], terminator).parse().unwrap_or(0.0))
    }

    pub fn write_num<N: Display>(&mut self, value: N) -> Ch376Result<WriteChunk, T> {
        let mut text = NumberText::new();
        let _ = write!(text, "{}", value);
        self.write_bytes(text.as_bytes())
    }

    pub fn write_num_ln<N: Display>(&mut self, value: N) -> Ch376Result<WriteChunk, T> {
        let mut text = NumberText::new();
        let _ = write!(text, "{}\r\n", value);
        self.write_bytes(text.as_bytes())
    }

    /// Two decimals, or `ovf` outside +-4 100 000.
    pub fn write_float(&mut self, value: f64) -> Ch376Result<WriteChunk, T> {
        let text = float_text(value, "");
        self.write_bytes(text.as_bytes())
    }

    pub fn write_float_ln(&mut self, value: f64) -> Ch376Result<WriteChunk, T> {
        let text = float_text(value, "\r\n");
        self.write_bytes(text.as_bytes())
    }

    /// Size of the open entry as `N byte`, `x.y Kb` or `x.y Mb`; empty when
    /// no medium is attached.
    pub fn file_size_str(&self) -> String<16> {
        if self.attached {
            format_size(self.entry.size)
        } else {
            String::new()
        }
    }
}

fn float_text(value: f64, suffix: &str) -> NumberText {
    let mut text = NumberText::new();
    let _ = if value > FLOAT_LIMIT || value < -FLOAT_LIMIT {
        write!(text, "ovf{}", suffix)
    } else {
        write!(text, "{:.2}{}", value, suffix)
    };
    text
}

fn trim_token(raw: &[u8], terminator: u8) -> &str {
    let text = core::str::from_utf8(raw).unwrap_or("");
    text.trim_matches(|c: char| c == terminator as char || c.is_ascii_whitespace() || c == '\0')
}

/// Parses the leading sign and digits, like C `atol`.
fn parse_int<N: core::str::FromStr + Default>(text: &str) -> N {
    let digits_end = text
        .char_indices()
        .find(|&(idx, c)| !(c.is_ascii_digit() || (idx == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(idx, _)| idx);
    text[..digits_end].parse().unwrap_or_default()
}
