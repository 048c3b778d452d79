//! YQL literal rendering and parsing.
//!
//! Literal mode embeds every value directly in the command text, so the
//! rendering must be lossless: [`parse`] applied to the output of [`render`]
//! yields the same [`Value`] and storage type. Quoted strings use backslash
//! escapes; `'...'` is a `String` (bytes) literal and `'...'u` a `Utf8` one.
//! Every other typed value uses the `Type('text'[, args])` constructor form.

use chrono::Datelike;
use thiserror::Error;
use uuid::Uuid;

use crate::mapping::temporal::{date_from_days, days_since_epoch};
use crate::types::StorageType;
use crate::value::{DecimalValue, Value, MICROS_PER_DAY, MICROS_PER_SECOND, SECONDS_PER_DAY};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("{kind} value cannot be written as a {storage} literal")]
    Mismatch {
        kind: &'static str,
        storage: StorageType,
    },

    #[error("malformed literal at offset {offset}: {reason}")]
    Syntax { offset: usize, reason: String },

    #[error("unknown literal type '{0}'")]
    UnknownType(String),

    #[error("invalid {storage} literal '{text}': {reason}")]
    InvalidValue {
        storage: String,
        text: String,
        reason: String,
    },
}

/// A parsed literal: the value and, for typed literals, its declared storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    /// `None` for `NULL`.
    pub storage: Option<StorageType>,
}

/// Render `value` as a literal for a column of `storage`.
pub fn render(value: &Value, storage: StorageType) -> Result<String, LiteralError> {
    if !value.conforms_to(storage) {
        return Err(LiteralError::Mismatch {
            kind: value.kind(),
            storage,
        });
    }

    let name = storage.name();
    let mismatch = || LiteralError::Mismatch {
        kind: value.kind(),
        storage,
    };

    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Int8(v) => constructor(name, &v.to_string()),
        Value::Uint8(v) => constructor(name, &v.to_string()),
        Value::Int16(v) => constructor(name, &v.to_string()),
        Value::Uint16(v) => constructor(name, &v.to_string()),
        Value::Int32(v) => constructor(name, &v.to_string()),
        Value::Uint32(v) => constructor(name, &v.to_string()),
        Value::Int64(v) => constructor(name, &v.to_string()),
        Value::Uint64(v) => constructor(name, &v.to_string()),
        Value::Float(v) => constructor(name, &format!("{:?}", v)),
        Value::Double(v) => constructor(name, &format!("{:?}", v)),
        Value::Decimal(v) => match storage {
            StorageType::Decimal { precision, scale } => {
                format!("Decimal({}, {}, {})", quote_text(&v.to_string()), precision, scale)
            }
            _ => return Err(mismatch()),
        },
        Value::Bytes(bytes) => quote_bytes(bytes),
        Value::Utf8(text) => format!("{}u", quote_text(text)),
        Value::Json(text) | Value::JsonDocument(text) => constructor(name, text),
        Value::Uuid(uuid) => constructor(name, &uuid.to_string()),
        Value::Date(days) => constructor(name, &format_date(*days).ok_or_else(mismatch)?),
        Value::Datetime(seconds) => {
            constructor(name, &format_datetime(*seconds).ok_or_else(mismatch)?)
        }
        Value::Timestamp(micros) => {
            constructor(name, &format_timestamp(*micros).ok_or_else(mismatch)?)
        }
        Value::Interval(micros) => constructor(name, &format_interval(*micros)),
    })
}

fn constructor(name: &str, text: &str) -> String {
    format!("{}({})", name, quote_text(text))
}

/// Quote text for a `Utf8`-compatible string literal.
pub fn quote_text(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Quote arbitrary bytes for a `String` literal; non-printable bytes use `\xHH`.
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut quoted = String::with_capacity(bytes.len() + 2);
    quoted.push('\'');
    for &b in bytes {
        match b {
            b'\\' => quoted.push_str("\\\\"),
            b'\'' => quoted.push_str("\\'"),
            b'\n' => quoted.push_str("\\n"),
            b'\r' => quoted.push_str("\\r"),
            b'\t' => quoted.push_str("\\t"),
            0x20..=0x7e => quoted.push(char::from(b)),
            _ => quoted.push_str(&format!("\\x{:02x}", b)),
        }
    }
    quoted.push('\'');
    quoted
}

fn format_date(days: i32) -> Option<String> {
    let date = date_from_days(days)?;
    let year = date.year();
    let sign = if year < 0 { "-" } else { "" };
    Some(format!(
        "{}{:04}-{:02}-{:02}",
        sign,
        year.unsigned_abs(),
        date.month(),
        date.day()
    ))
}

fn split_day(value: i64, per_day: i64) -> Option<(String, i64)> {
    let days = i32::try_from(value.div_euclid(per_day)).ok()?;
    Some((format_date(days)?, value.rem_euclid(per_day)))
}

fn format_datetime(seconds: i64) -> Option<String> {
    let (date, second_of_day) = split_day(seconds, SECONDS_PER_DAY)?;
    Some(format!(
        "{}T{:02}:{:02}:{:02}Z",
        date,
        second_of_day / 3600,
        second_of_day / 60 % 60,
        second_of_day % 60
    ))
}

fn format_timestamp(micros: i64) -> Option<String> {
    let (date, micro_of_day) = split_day(micros, MICROS_PER_DAY)?;
    let second_of_day = micro_of_day / MICROS_PER_SECOND;
    Some(format!(
        "{}T{:02}:{:02}:{:02}.{:06}Z",
        date,
        second_of_day / 3600,
        second_of_day / 60 % 60,
        second_of_day % 60,
        micro_of_day % MICROS_PER_SECOND
    ))
}

fn format_interval(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let micros_per_second = MICROS_PER_SECOND as u64;
    let seconds = abs / micros_per_second;
    let fraction = abs % micros_per_second;

    let mut text = format!(
        "{}P{}DT{}H{}M{}",
        sign,
        seconds / SECONDS_PER_DAY as u64,
        seconds / 3600 % 24,
        seconds / 60 % 60,
        seconds % 60
    );
    if fraction != 0 {
        text.push_str(&format!(".{:06}", fraction));
    }
    text.push('S');
    text
}

/// Parse a literal produced by [`render`].
pub fn parse(text: &str) -> Result<Literal, LiteralError> {
    let mut scanner = Scanner::new(text);
    scanner.skip_whitespace();

    let literal = match scanner.peek() {
        Some(b'\'') => {
            let bytes = scanner.quoted()?;
            if scanner.eat(b'u') {
                let text = utf8(bytes, StorageType::Utf8)?;
                Literal {
                    value: Value::Utf8(text),
                    storage: Some(StorageType::Utf8),
                }
            } else {
                Literal {
                    value: Value::Bytes(bytes),
                    storage: Some(StorageType::String),
                }
            }
        }
        Some(b) if b.is_ascii_alphabetic() => {
            let ident = scanner.ident();
            match ident.to_ascii_lowercase().as_str() {
                "null" => Literal {
                    value: Value::Null,
                    storage: None,
                },
                "true" | "false" => Literal {
                    value: Value::Bool(ident.eq_ignore_ascii_case("true")),
                    storage: Some(StorageType::Bool),
                },
                _ => typed(&mut scanner, ident)?,
            }
        }
        _ => return Err(scanner.error("expected a literal")),
    };

    scanner.skip_whitespace();
    if !scanner.at_end() {
        return Err(scanner.error("unexpected trailing input"));
    }
    Ok(literal)
}

fn typed(scanner: &mut Scanner<'_>, ident: &str) -> Result<Literal, LiteralError> {
    let named =
        StorageType::from_name(ident).ok_or_else(|| LiteralError::UnknownType(ident.to_string()))?;

    scanner.skip_whitespace();
    scanner.expect(b'(')?;
    scanner.skip_whitespace();
    let bytes = scanner.quoted()?;

    let storage = match named {
        StorageType::Decimal { .. } => {
            scanner.skip_whitespace();
            scanner.expect(b',')?;
            let precision = scanner.integer()?;
            scanner.skip_whitespace();
            scanner.expect(b',')?;
            let scale = scanner.integer()?;
            StorageType::Decimal { precision, scale }
        }
        other => other,
    };

    scanner.skip_whitespace();
    scanner.expect(b')')?;

    let value = if storage == StorageType::String {
        Value::Bytes(bytes)
    } else {
        typed_value(&utf8(bytes, storage)?, storage)?
    };

    Ok(Literal {
        value,
        storage: Some(storage),
    })
}

fn typed_value(text: &str, storage: StorageType) -> Result<Value, LiteralError> {
    fn parsed<T: std::str::FromStr>(text: &str, storage: StorageType) -> Result<T, LiteralError>
    where
        T::Err: std::fmt::Display,
    {
        text.parse::<T>().map_err(|e| invalid(text, storage, e))
    }

    Ok(match storage {
        StorageType::Bool => Value::Bool(parsed(text, storage)?),
        StorageType::Int8 => Value::Int8(parsed(text, storage)?),
        StorageType::Uint8 => Value::Uint8(parsed(text, storage)?),
        StorageType::Int16 => Value::Int16(parsed(text, storage)?),
        StorageType::Uint16 => Value::Uint16(parsed(text, storage)?),
        StorageType::Int32 => Value::Int32(parsed(text, storage)?),
        StorageType::Uint32 => Value::Uint32(parsed(text, storage)?),
        StorageType::Int64 => Value::Int64(parsed(text, storage)?),
        StorageType::Uint64 => Value::Uint64(parsed(text, storage)?),
        StorageType::Float => Value::Float(parsed(text, storage)?),
        StorageType::Double => Value::Double(parsed(text, storage)?),
        StorageType::Decimal { scale, .. } => {
            let decimal: DecimalValue = parsed(text, storage)?;
            let decimal = decimal
                .rescale_exact(scale)
                .ok_or_else(|| invalid(text, storage, "too many fractional digits"))?;
            Value::Decimal(decimal)
        }
        StorageType::String => Value::Bytes(text.as_bytes().to_vec()),
        StorageType::Utf8 => Value::Utf8(text.to_string()),
        StorageType::Json => Value::Json(text.to_string()),
        StorageType::JsonDocument => Value::JsonDocument(text.to_string()),
        StorageType::Uuid => Value::Uuid(Uuid::parse_str(text).map_err(|e| invalid(text, storage, e))?),
        StorageType::Date | StorageType::Date32 => Value::Date(parse_date(text, storage)?),
        StorageType::Datetime | StorageType::Datetime64 => {
            let (days, micro_of_day) = parse_instant(text, storage)?;
            if micro_of_day % MICROS_PER_SECOND != 0 {
                return Err(invalid(text, storage, "fractional seconds are not allowed"));
            }
            Value::Datetime(i64::from(days) * SECONDS_PER_DAY + micro_of_day / MICROS_PER_SECOND)
        }
        StorageType::Timestamp | StorageType::Timestamp64 => {
            let (days, micro_of_day) = parse_instant(text, storage)?;
            let micros = i64::from(days)
                .checked_mul(MICROS_PER_DAY)
                .and_then(|v| v.checked_add(micro_of_day))
                .ok_or_else(|| invalid(text, storage, "out of range"))?;
            Value::Timestamp(micros)
        }
        StorageType::Interval | StorageType::Interval64 => {
            Value::Interval(parse_interval(text, storage)?)
        }
    })
}

fn invalid(text: &str, storage: StorageType, reason: impl std::fmt::Display) -> LiteralError {
    LiteralError::InvalidValue {
        storage: storage.to_string(),
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

fn utf8(bytes: Vec<u8>, storage: StorageType) -> Result<String, LiteralError> {
    String::from_utf8(bytes).map_err(|e| {
        let text = String::from_utf8_lossy(e.as_bytes()).into_owned();
        invalid(&text, storage, "invalid UTF-8")
    })
}

fn parse_date(text: &str, storage: StorageType) -> Result<i32, LiteralError> {
    let bad = |reason: &str| invalid(text, storage, reason);

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts = body.splitn(3, '-');
    let mut next = |name: &str| -> Result<u32, LiteralError> {
        parts
            .next()
            .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| bad(name))
    };

    let year = i32::try_from(next("bad year")?).map_err(|_| bad("bad year"))?;
    let month = next("bad month")?;
    let day = next("bad day")?;
    let year = if negative { -year } else { year };

    let date = chrono::NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| bad("no such date"))?;
    Ok(days_since_epoch(date))
}

/// Parse `date 'T' hh:mm:ss[.ffffff] 'Z'` into days and microsecond of day.
fn parse_instant(text: &str, storage: StorageType) -> Result<(i32, i64), LiteralError> {
    let bad = |reason: &str| invalid(text, storage, reason);

    let body = text.strip_suffix('Z').ok_or_else(|| bad("missing 'Z'"))?;
    let (date, time) = body.rsplit_once('T').ok_or_else(|| bad("missing 'T'"))?;
    let days = parse_date(date, storage)?;

    let (clock, fraction) = match time.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (time, None),
    };

    let fields: Vec<i64> = clock
        .split(':')
        .map(|f| {
            if f.len() == 2 && f.bytes().all(|b| b.is_ascii_digit()) {
                f.parse().map_err(|_| bad("bad time"))
            } else {
                Err(bad("bad time"))
            }
        })
        .collect::<Result<_, _>>()?;

    let [hours, minutes, seconds] = fields[..] else {
        return Err(bad("bad time"));
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(bad("bad time"));
    }

    let micros = match fraction {
        Some(f) if f.len() == 6 && f.bytes().all(|b| b.is_ascii_digit()) => {
            f.parse::<i64>().map_err(|_| bad("bad fraction"))?
        }
        Some(_) => return Err(bad("bad fraction")),
        None => 0,
    };

    Ok((
        days,
        (hours * 3600 + minutes * 60 + seconds) * MICROS_PER_SECOND + micros,
    ))
}

/// Parse `[-]P{d}DT{h}H{m}M{s}[.ffffff]S` into signed microseconds.
fn parse_interval(text: &str, storage: StorageType) -> Result<i64, LiteralError> {
    let bad = || invalid(text, storage, "expected [-]PnDTnHnMn[.ffffff]S");

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut rest = body.strip_prefix('P').ok_or_else(bad)?;

    let days = interval_number(take_until(&mut rest, 'D')).ok_or_else(bad)?;
    rest = rest.strip_prefix('T').ok_or_else(bad)?;
    let hours = interval_number(take_until(&mut rest, 'H')).ok_or_else(bad)?;
    let minutes = interval_number(take_until(&mut rest, 'M')).ok_or_else(bad)?;
    let seconds_text = take_until(&mut rest, 'S').ok_or_else(bad)?;
    if !rest.is_empty() {
        return Err(bad());
    }

    let (seconds, fraction) = match seconds_text.split_once('.') {
        Some((seconds, fraction)) if fraction.len() == 6 => {
            (interval_number(Some(seconds)), interval_number(Some(fraction)))
        }
        Some(_) => (None, None),
        None => (interval_number(Some(seconds_text)), Some(0)),
    };
    let (seconds, fraction) = seconds.zip(fraction).ok_or_else(bad)?;

    let total = days
        .checked_mul(SECONDS_PER_DAY as u64)
        .and_then(|v| v.checked_add(hours.checked_mul(3600)?))
        .and_then(|v| v.checked_add(minutes.checked_mul(60)?))
        .and_then(|v| v.checked_add(seconds))
        .and_then(|v| v.checked_mul(MICROS_PER_SECOND as u64))
        .and_then(|v| v.checked_add(fraction))
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(bad)?;

    Ok(if negative { -total } else { total })
}

/// Split `rest` at the first `unit`, returning the part before it.
fn take_until<'t>(rest: &mut &'t str, unit: char) -> Option<&'t str> {
    let (head, tail) = rest.split_once(unit)?;
    *rest = tail;
    Some(head)
}

fn interval_number(digits: Option<&str>) -> Option<u64> {
    digits
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|d| d.parse().ok())
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn error(&self, reason: &str) -> LiteralError {
        LiteralError::Syntax {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), LiteralError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn integer(&mut self) -> Result<u8, LiteralError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.text[start..self.pos]
            .parse()
            .map_err(|_| self.error("expected a small integer"))
    }

    /// Read a single-quoted string, resolving escapes into raw bytes.
    fn quoted(&mut self) -> Result<Vec<u8>, LiteralError> {
        self.expect(b'\'')?;
        let mut out = Vec::new();

        loop {
            let b = self.peek().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;

            match b {
                b'\'' => return Ok(out),
                b'\\' => {
                    let escape = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    self.pos += 1;
                    match escape {
                        b'\\' | b'\'' | b'"' => out.push(escape),
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'x' => out.push(self.hex(2)? as u8),
                        b'u' => {
                            let code = self.hex(4)?;
                            let c = char::from_u32(code)
                                .ok_or_else(|| self.error("invalid code point"))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        }
                        _ => return Err(self.error("unknown escape")),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn hex(&mut self, digits: usize) -> Result<u32, LiteralError> {
        let end = self.pos + digits;
        let chunk = self
            .text
            .get(self.pos..end)
            .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("bad hex escape"))?;
        let value = u32::from_str_radix(chunk, 16).map_err(|_| self.error("bad hex escape"))?;
        self.pos = end;
        Ok(value)
    }
}
