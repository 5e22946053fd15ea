//! CSV sink and source for recorded market events
//!
//! Columns are `timestamp,symbol_code,price,volume,msg_type` with the symbol code and
//! message kind written as `0x` hex. On read, columns are located by header name, so
//! files carrying extra columns (such as bid/ask) replay unchanged.

use std::io::{BufRead, Write};

use crate::error::HarnessError;
use crate::types::{MarketEvent, MessageKind};

pub const CSV_HEADER: &str = "timestamp,symbol_code,price,volume,msg_type";

const COLUMNS: [&str; 5] = ["timestamp", "symbol_code", "price", "volume", "msg_type"];

pub fn write_events<W: Write>(mut writer: W, events: &[MarketEvent]) -> Result<(), HarnessError> {
    writeln!(writer, "{CSV_HEADER}")?;
    for e in events {
        writeln!(
            writer,
            "{},{:#010x},{},{},{:#04x}",
            e.timestamp_micros,
            e.entity_code,
            e.price,
            e.volume,
            e.kind.code()
        )?;
    }
    writer.flush()?;
    tracing::debug!(events = events.len(), "Wrote market events");
    Ok(())
}

pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<MarketEvent>, HarnessError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Ok(Vec::new()),
    };
    let names: Vec<&str> = header.trim().split(',').map(str::trim).collect();
    let mut index = [0usize; 5];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = names.iter().position(|n| *n == column).ok_or_else(|| HarnessError::Csv {
            line: 1,
            reason: format!("missing column {column:?}"),
        })?;
    }
    let [ts_col, code_col, price_col, volume_col, kind_col] = index;

    let mut events = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        let field = |col: usize| {
            fields.get(col).copied().ok_or_else(|| HarnessError::Csv {
                line: line_no,
                reason: format!("expected at least {} fields, found {}", col + 1, fields.len()),
            })
        };

        let kind_code = parse_hex(field(kind_col)?, line_no)?;
        let kind = u8::try_from(kind_code)
            .ok()
            .and_then(MessageKind::from_code)
            .ok_or_else(|| HarnessError::Csv {
                line: line_no,
                reason: format!("unknown message kind {kind_code:#x}"),
            })?;

        events.push(MarketEvent {
            timestamp_micros: parse_dec(field(ts_col)?, line_no)?,
            entity_code: narrow(parse_hex(field(code_col)?, line_no)?, line_no)?,
            price: narrow(parse_dec(field(price_col)?, line_no)?, line_no)?,
            volume: narrow(parse_dec(field(volume_col)?, line_no)?, line_no)?,
            kind,
        });
    }

    tracing::debug!(events = events.len(), "Read market events");
    Ok(events)
}

fn parse_hex(text: &str, line: usize) -> Result<u64, HarnessError> {
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map_err(|e| HarnessError::Csv { line, reason: format!("bad hex value {text:?}: {e}") })
}

fn parse_dec(text: &str, line: usize) -> Result<u64, HarnessError> {
    text.parse()
        .map_err(|e| HarnessError::Csv { line, reason: format!("bad number {text:?}: {e}") })
}

fn narrow(value: u64, line: usize) -> Result<u32, HarnessError> {
    u32::try_from(value)
        .map_err(|_| HarnessError::Csv { line, reason: format!("{value} does not fit in 32 bits") })
}
