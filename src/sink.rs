use std::io::{self, BufWriter, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

const BUFFER_SIZE: usize = 64 * 1024;

enum Layer<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Write for Layer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(inner) => inner.write(buf),
            Self::Gzip(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(inner) => inner.flush(),
            Self::Gzip(inner) => inner.flush(),
        }
    }
}

/// Buffered, optionally gzip-compressed output.
///
/// Must be closed with [`Sink::finish`]: the buffer is flushed first, then
/// the gzip trailer is written, then the destination is flushed.
pub struct Sink<W: Write> {
    inner: BufWriter<Layer<W>>,
}

impl<W: Write> Sink<W> {
    pub fn new(dest: W, gzip: bool) -> Self {
        let layer = if gzip {
            Layer::Gzip(GzEncoder::new(dest, Compression::default()))
        } else {
            Layer::Plain(dest)
        };
        Self {
            inner: BufWriter::with_capacity(BUFFER_SIZE, layer),
        }
    }

    pub fn finish(self) -> io::Result<W> {
        let layer = self.inner.into_inner().map_err(|err| err.into_error())?;
        let mut dest = match layer {
            Layer::Plain(dest) => dest,
            Layer::Gzip(encoder) => encoder.finish()?,
        };
        dest.flush()?;
        Ok(dest)
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
