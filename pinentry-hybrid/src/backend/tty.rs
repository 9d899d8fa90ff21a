//! Terminal devices opened by path.

use log::debug;
use secrecy::SecretString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use zeroize::Zeroize;

use super::textual::{Device, DeviceOpener};

/// Opens [`Tty`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtyOpener;

impl DeviceOpener for TtyOpener {
    type Device = Tty;

    fn open(&self, path: &str) -> io::Result<Tty> {
        Tty::open(path)
    }
}

/// A terminal device, such as the one gpg-agent passes in `OPTION ttyname`.
///
/// Reads are unbuffered: nothing past the current line is taken from the
/// device.
pub struct Tty {
    file: File,
}

impl Tty {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Tty { file })
    }

    fn read_raw_line(&mut self) -> io::Result<String> {
        let mut buf = Vec::with_capacity(128);
        let mut byte = [0u8; 1];
        let mut at_eof = false;

        loop {
            match self.file.read(&mut byte) {
                Ok(0) => {
                    at_eof = true;
                    break;
                }
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => buf.push(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
                Err(e) => {
                    buf.zeroize();
                    byte.zeroize();
                    return Err(e);
                }
            }
        }
        byte.zeroize();

        if at_eof && buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "terminal closed",
            ));
        }
        while let Some(b'\r') = buf.last() {
            buf.pop();
        }

        String::from_utf8(buf).map_err(|e| {
            e.into_bytes().zeroize();
            io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
        })
    }
}

impl Device for Tty {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()
    }

    fn read_masked_line(&mut self) -> io::Result<SecretString> {
        let guard = echo::disable(&self.file)?;
        if guard.is_none() {
            debug!("Device is not a terminal; reading without masking");
        }
        let line = self.read_raw_line();
        drop(guard);
        line.map(SecretString::new)
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.read_raw_line()
    }
}

#[cfg(unix)]
mod echo {
    use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};
    use std::fs::File;
    use std::io;

    /// Restores the saved terminal attributes when dropped.
    pub(super) struct Guard {
        tty: File,
        saved: Termios,
    }

    /// Turns off echo on `file`. Returns `None` if `file` is not a terminal.
    pub(super) fn disable(file: &File) -> io::Result<Option<Guard>> {
        let saved = match tcgetattr(file) {
            Ok(saved) => saved,
            Err(_) => return Ok(None),
        };
        let tty = file.try_clone()?;

        let mut hidden = saved.clone();
        hidden.local_flags.remove(LocalFlags::ECHO);
        tcsetattr(&tty, SetArg::TCSANOW, &hidden)?;

        Ok(Some(Guard { tty, saved }))
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            let _ = tcsetattr(&self.tty, SetArg::TCSANOW, &self.saved);
        }
    }
}

#[cfg(not(unix))]
mod echo {
    use std::fs::File;
    use std::io;

    pub(super) struct Guard;

    pub(super) fn disable(_: &File) -> io::Result<Option<Guard>> {
        Ok(None)
    }
}
