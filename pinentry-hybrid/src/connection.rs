//! Connection handler.

use cookie_factory::SerializeFn;
use secrecy::{ExposeSecret, SecretString};
use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use zeroize::Zeroize;

use crate::{
    error::Error,
    format::{write, Command},
};

/// The line-oriented channel to the calling program.
pub struct Connection<R, W> {
    input: R,
    output: W,
    buffer: Vec<u8>,
}

impl Connection<io::BufReader<io::Stdin>, io::Stdout> {
    /// A connection over the process's standard input and output.
    pub fn stdio() -> Self {
        Connection::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Connection<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Connection {
            input,
            output,
            buffer: Vec::new(),
        }
    }

    /// Consumes the connection, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Reads the next command, skipping comment lines.
    pub(crate) fn read_command(&mut self) -> Result<Command, Error> {
        loop {
            // Arguments may carry sensitive text.
            self.buffer.zeroize();

            let read = self.input.read_until(b'\n', &mut self.buffer)?;
            if read == 0 || self.buffer.last() != Some(&b'\n') {
                return Err(Error::UnexpectedEof);
            }

            let line = String::from_utf8_lossy(&self.buffer);
            let command = Command::parse(&line);
            if let Cow::Owned(mut line) = line {
                line.zeroize();
            }

            if let Some(command) = command {
                break Ok(command);
            }
        }
    }

    fn write_reply<'a, F: SerializeFn<&'a mut W>>(&'a mut self, f: F) -> io::Result<()> {
        cookie_factory::gen_simple(f, &mut self.output)
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("failed to write response: {:?}", e),
                )
            })?
            .flush()
    }

    pub(crate) fn greeting(&mut self) -> io::Result<()> {
        self.write_reply(write::greeting())
    }

    pub(crate) fn ok(&mut self) -> io::Result<()> {
        self.write_reply(write::ok())
    }

    pub(crate) fn error(&mut self, message: &str) -> io::Result<()> {
        self.write_reply(write::error(message))
    }

    pub(crate) fn comment(&mut self, text: &str) -> io::Result<()> {
        self.write_reply(write::comment(text))
    }

    pub(crate) fn data(&mut self, value: &SecretString) -> io::Result<()> {
        self.write_reply(write::data(value.expose_secret()))
    }
}
