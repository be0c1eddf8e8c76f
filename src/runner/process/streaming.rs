//! Forwarding of child output streams.

use std::io::{self, Read, Write};

/// Forwarding statistics for a child output stream.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub(super) struct ForwardStats {
    pub(super) bytes_read: usize,
    pub(super) bytes_written: usize,
    /// Kind of the first write or flush failure, if any.
    pub(super) failure: Option<io::ErrorKind>,
}

impl ForwardStats {
    pub(super) const fn write_failed(&self) -> bool {
        self.failure.is_some()
    }
}

struct CountingReader<'a, R> {
    inner: &'a mut R,
    read: u64,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        self.read = self.read.saturating_add(count as u64);
        Ok(count)
    }
}

struct CountingWriter<'a, W> {
    inner: &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let count = self.inner.write(buf)?;
        self.written = self.written.saturating_add(count as u64);
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn clamp_u64_to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Copy `reader` into `writer` until end of stream.
///
/// A failing writer does not stop the child: the rest of the stream is read
/// and discarded so the child never blocks on a full pipe.
pub(super) fn forward_child_output<R, W>(
    mut reader: R,
    mut writer: W,
    stream_name: &'static str,
) -> ForwardStats
where
    R: Read,
    W: Write,
{
    let mut counting_reader = CountingReader {
        inner: &mut reader,
        read: 0,
    };
    let mut counting_writer = CountingWriter {
        inner: &mut writer,
        written: 0,
    };

    let copied = io::copy(&mut counting_reader, &mut counting_writer)
        .and_then(|_| counting_writer.flush());
    let failure = match copied {
        Ok(()) => None,
        Err(err) => {
            tracing::debug!(
                "Failed to forward child {stream_name} output: {err}; discarding remaining bytes"
            );
            if let Err(drain_err) = io::copy(&mut counting_reader, &mut io::sink()) {
                tracing::debug!(
                    "Failed to drain child {stream_name} output after writer closed: {drain_err}"
                );
            }
            Some(err.kind())
        }
    };
    ForwardStats {
        bytes_read: clamp_u64_to_usize(counting_reader.read),
        bytes_written: clamp_u64_to_usize(counting_writer.written),
        failure,
    }
}
