//! Line-level reading and writing for the object format.

use std::io::{BufRead, Write};
use std::str::FromStr;

use num_bigint::BigInt;

use crate::error::{FvError, Result};
use crate::ring::poly::Poly;

/// Banner line that opens every object.
pub const HEADER: &str = "=> FHE package object <=";

/// Reads significant lines, counting every physical line for error messages.
pub struct LineReader<R> {
    inner: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of the last line consumed (1-based).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn error(&self, message: impl Into<String>) -> FvError {
        FvError::Format {
            line: self.line,
            message: message.into(),
        }
    }

    /// Next non-blank line with its line ending removed.
    pub fn next_line(&mut self) -> Result<&str> {
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                return Err(FvError::Format {
                    line: self.line + 1,
                    message: "truncated object: unexpected end of input".into(),
                });
            }
            self.line += 1;
            if !self.buf.trim().is_empty() {
                return Ok(self.buf.trim_end_matches(['\n', '\r']));
            }
        }
    }

    pub fn expect_line(&mut self, expected: &str) -> Result<()> {
        let got = self.next_line()?;
        if got == expected {
            Ok(())
        } else {
            let message = format!("expected `{expected}`, found `{got}`");
            Err(self.error(message))
        }
    }

    /// Header banner followed by the object tag.
    pub fn expect_object(&mut self, tag: &str) -> Result<()> {
        self.expect_line(HEADER)?;
        self.expect_line(tag)
    }

    /// Value of a `key=value` line.
    pub fn read_field<T: FromStr>(&mut self, key: &str) -> Result<T> {
        let got = self.next_line()?;
        let parsed = got
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.trim().parse::<T>());
        match parsed {
            Some(Ok(value)) => Ok(value),
            Some(Err(_)) => {
                let message = format!("invalid value for `{key}` in `{got}`");
                Err(self.error(message))
            }
            None => {
                let message = format!("expected `{key}=<value>`, found `{got}`");
                Err(self.error(message))
            }
        }
    }

    /// A polynomial line `<len>  c0 c1 ...`.
    pub fn read_poly(&mut self) -> Result<Poly> {
        let got = self.next_line()?;
        match parse_poly(got) {
            Ok(poly) => Ok(poly),
            Err(message) => Err(self.error(message)),
        }
    }
}

fn parse_poly(line: &str) -> std::result::Result<Poly, String> {
    let mut tokens = line.split_whitespace();
    let len: usize = tokens
        .next()
        .ok_or("empty polynomial line")?
        .parse()
        .map_err(|_| format!("invalid polynomial length in `{line}`"))?;
    let coeffs = tokens
        .map(|tok| {
            tok.parse::<BigInt>()
                .map_err(|_| format!("invalid coefficient `{tok}`"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if coeffs.len() != len {
        return Err(format!(
            "polynomial declares {len} coefficients but has {}",
            coeffs.len()
        ));
    }
    Ok(Poly::from_coeffs(coeffs))
}

/// Write `<len>  c0 c1 ...` with trailing zeros dropped; the zero polynomial is `0`.
pub fn write_poly<W: Write + ?Sized>(w: &mut W, poly: &Poly) -> Result<()> {
    let len = poly.degree().map_or(0, |d| d + 1);
    write!(w, "{len}")?;
    for (i, c) in poly.coeffs[..len].iter().enumerate() {
        let sep = if i == 0 { "  " } else { " " };
        write!(w, "{sep}{c}")?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn write_object_start<W: Write + ?Sized>(w: &mut W, tag: &str) -> Result<()> {
    writeln!(w, "{HEADER}")?;
    writeln!(w, "{tag}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> LineReader<Cursor<&[u8]>> {
        LineReader::new(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn test_poly_layout() {
        let mut out = Vec::new();
        write_poly(&mut out, &Poly::from_i64(&[5, 0, -3, 0, 0])).unwrap();
        write_poly(&mut out, &Poly::zero(4)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3  5 0 -3\n0\n");
    }

    #[test]
    fn test_read_poly_and_fields() {
        let mut r = reader("3  5 0 -3\n\nd=8\nsigma=3.2\n0\n");
        assert_eq!(r.read_poly().unwrap(), Poly::from_i64(&[5, 0, -3]));
        assert_eq!(r.read_field::<usize>("d").unwrap(), 8);
        assert_eq!(r.line(), 3);
        assert_eq!(r.read_field::<f64>("sigma").unwrap(), 3.2);
        assert!(r.read_poly().unwrap().is_empty());
    }

    #[test]
    fn test_errors_carry_line() {
        let mut r = reader("=> FHE package object <=\nRcpp_FandV_pk\n");
        let err = r.expect_object("Rcpp_FandV_ct").unwrap_err();
        assert!(matches!(err, FvError::Format { line: 2, .. }), "{err}");

        let mut r = reader("4  1 2 3\n");
        assert!(matches!(r.read_poly(), Err(FvError::Format { line: 1, .. })));

        let mut r = reader("n=x\n");
        assert!(r.read_field::<usize>("n").is_err());

        let mut r = reader("m=3\n");
        assert!(r.read_field::<usize>("n").is_err());
    }

    #[test]
    fn test_truncated() {
        let mut r = reader("=> FHE package object <=\n");
        let err = r.expect_object("Rcpp_FandV_ct").unwrap_err();
        match err {
            FvError::Format { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("truncated"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
