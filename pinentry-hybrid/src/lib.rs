//! A pinentry that prefers a dialog and falls back to plain tty prompts.
//!
//! Credential tools such as gpg-agent run a pinentry as a subprocess whenever
//! they need a passphrase, a confirmation or a message shown to the user. They
//! talk to it over a small line protocol on its stdin and stdout.
//!
//! # Protocol
//!
//! Each request is a single line `COMMAND[ ARGUMENT]`. The server answers every
//! request with exactly one status line, `OK` or `ERR <message>`, optionally
//! preceded by payload lines:
//!
//! - `D <value>` carries a secret entered by the user. `%`, CR and LF in the
//!   value are written as `%25`, `%0D` and `%0A`.
//! - `# <text>` lines are comments; `HELP` emits one per command.
//!
//! On start-up the server sends a single `OK` greeting line.
//!
//! ## Commands
//!
//! - `NOP` does nothing.
//! - `BYE` ends the session after its `OK`.
//! - `RESET` restores every setting to its default.
//! - `HELP` lists the commands.
//! - `OPTION ttyname=PATH` sets the terminal used by the tty prompts. Any other
//!   option is rejected.
//! - `SETDESC`, `SETPROMPT`, `SETREPEAT`, `SETERROR`, `SETOK` and `SETCANCEL`
//!   set the description, the first and second prompt, the error text and the
//!   button labels. Their argument is percent-encoded. `SETREPEAT` also makes
//!   the next `GETPIN` ask for the secret twice.
//! - `GETPIN` asks for a secret.
//! - `CONFIRM` asks a yes/no question; declining yields `ERR not confirmed`.
//! - `MESSAGE` shows the description until the user acknowledges it.
//!
//! Settings persist until they are overwritten or `RESET`; the interaction
//! mode falls back to a plain `GETPIN` after every `GETPIN`, `CONFIRM` or
//! `MESSAGE`.
//!
//! ## Example
//!
//! ```text
//! C <-- S | OK pinentry-hybrid accepting commands, use HELP to see all
//! C --> S | SETDESC Unlock%20key%20for%20alice@example.org
//! C <-- S | OK
//! C --> S | SETREPEAT Again:
//! C <-- S | OK
//! C --> S | GETPIN
//! C <-- S | D correct horse
//! C <-- S | OK
//! C --> S | CONFIRM
//! C <-- S | ERR not confirmed
//! C --> S | BYE
//! C <-- S | OK
//! ```
//!
//! # Backends
//!
//! The interaction itself is delegated to a [`Backend`](backend::Backend); see
//! the [`backend`] module.

pub mod backend;
mod connection;
mod decode;
mod error;
mod format;
mod server;
mod session;

pub use connection::Connection;
pub use decode::percent_decode;
pub use error::Error;
pub use format::{Command, ProtocolOption, COMMANDS};
pub use server::{Reply, Server};
pub use session::{Mode, Session};
