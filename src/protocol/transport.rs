use std::io::{BufRead, Write};

use anyhow::Context;

use crate::foundation::clock::Clock;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::protocol::dispatch::Dispatcher;
use crate::protocol::message::Ack;

/// Counters for one transport session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub messages: u64,
    pub acks: u64,
    pub errors: u64,
}

/// Run the JSON-lines protocol until `reader` reaches end of input.
///
/// The page is initialized first; if that fails one `error` ack is written and every later
/// command answers with an error too. Messages are handled strictly one at a time. Blank lines
/// are skipped. A line that is not valid UTF-8 gets an `error` ack and the session goes on.
pub fn serve<C, R, W>(
    dispatcher: &mut Dispatcher<C>,
    mut reader: R,
    mut writer: W,
) -> ReviewResult<ServeStats>
where
    C: Clock,
    R: BufRead,
    W: Write,
{
    let mut stats = ServeStats::default();
    if let Some(ack) = dispatcher.start() {
        write_ack(&mut writer, &ack, &mut stats)?;
    }

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .context("read protocol line")?;
        if n == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            stats.messages += 1;
            tracing::warn!(bytes = n, "protocol line is not valid UTF-8");
            let ack = Ack::error(&ReviewError::protocol("message is not valid UTF-8"));
            write_ack(&mut writer, &ack, &mut stats)?;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.messages += 1;
        if let Some(ack) = dispatcher.handle_line(line) {
            write_ack(&mut writer, &ack, &mut stats)?;
        }
    }

    tracing::debug!(?stats, "transport closed");
    Ok(stats)
}

fn write_ack<W: Write>(writer: &mut W, ack: &Ack, stats: &mut ServeStats) -> ReviewResult<()> {
    let line = ack.to_line()?;
    writeln!(writer, "{line}").context("write ack")?;
    writer.flush().context("flush ack")?;
    stats.acks += 1;
    if ack.is_error() {
        stats.errors += 1;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/transport.rs"]
mod tests;
