use crate::decode::percent_decode;

pub(crate) const CMD_NOP: &str = "NOP";
pub(crate) const CMD_BYE: &str = "BYE";
pub(crate) const CMD_RESET: &str = "RESET";
pub(crate) const CMD_HELP: &str = "HELP";
pub(crate) const CMD_OPTION: &str = "OPTION";
pub(crate) const CMD_SETDESC: &str = "SETDESC";
pub(crate) const CMD_SETPROMPT: &str = "SETPROMPT";
pub(crate) const CMD_SETREPEAT: &str = "SETREPEAT";
pub(crate) const CMD_SETERROR: &str = "SETERROR";
pub(crate) const CMD_SETOK: &str = "SETOK";
pub(crate) const CMD_SETCANCEL: &str = "SETCANCEL";
pub(crate) const CMD_GETPIN: &str = "GETPIN";
pub(crate) const CMD_CONFIRM: &str = "CONFIRM";
pub(crate) const CMD_MESSAGE: &str = "MESSAGE";

/// Every command the server understands, in the order `HELP` lists them.
pub const COMMANDS: [&str; 14] = [
    CMD_NOP,
    CMD_BYE,
    CMD_RESET,
    CMD_HELP,
    CMD_OPTION,
    CMD_SETDESC,
    CMD_SETPROMPT,
    CMD_SETREPEAT,
    CMD_SETERROR,
    CMD_SETOK,
    CMD_SETCANCEL,
    CMD_GETPIN,
    CMD_CONFIRM,
    CMD_MESSAGE,
];

const OPT_TTYNAME: &str = "ttyname=";

/// Argument of an `OPTION` command.
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolOption {
    TtyName(String),
    /// Anything else; carries the raw argument for the error message.
    Unknown(String),
}

/// A single parsed protocol line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Nop,
    Bye,
    Reset,
    Help,
    Option(ProtocolOption),
    SetDescription(String),
    SetPrompt(String),
    SetRepeat(String),
    SetError(String),
    SetOk(String),
    SetCancel(String),
    GetPin,
    Confirm,
    Message,
    Unknown(String),
}

impl Command {
    /// Parses one line, without its terminating newline.
    ///
    /// Returns `None` for Assuan comment lines, which get no response.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.starts_with('#') {
            return None;
        }

        let (name, arg) = read::command_line(line);
        Some(match name {
            CMD_NOP => Command::Nop,
            CMD_BYE => Command::Bye,
            CMD_RESET => Command::Reset,
            CMD_HELP => Command::Help,
            CMD_OPTION => Command::Option(match arg.strip_prefix(OPT_TTYNAME) {
                Some(path) => ProtocolOption::TtyName(path.to_owned()),
                None => ProtocolOption::Unknown(arg.to_owned()),
            }),
            CMD_SETDESC => Command::SetDescription(percent_decode(arg)),
            CMD_SETPROMPT => Command::SetPrompt(percent_decode(arg)),
            CMD_SETREPEAT => Command::SetRepeat(percent_decode(arg)),
            CMD_SETERROR => Command::SetError(percent_decode(arg)),
            CMD_SETOK => Command::SetOk(percent_decode(arg)),
            CMD_SETCANCEL => Command::SetCancel(percent_decode(arg)),
            CMD_GETPIN => Command::GetPin,
            CMD_CONFIRM => Command::Confirm,
            CMD_MESSAGE => Command::Message,
            other => Command::Unknown(other.to_owned()),
        })
    }

    /// Protocol name of the command, for logging.
    pub fn name(&self) -> &str {
        match self {
            Command::Nop => CMD_NOP,
            Command::Bye => CMD_BYE,
            Command::Reset => CMD_RESET,
            Command::Help => CMD_HELP,
            Command::Option(_) => CMD_OPTION,
            Command::SetDescription(_) => CMD_SETDESC,
            Command::SetPrompt(_) => CMD_SETPROMPT,
            Command::SetRepeat(_) => CMD_SETREPEAT,
            Command::SetError(_) => CMD_SETERROR,
            Command::SetOk(_) => CMD_SETOK,
            Command::SetCancel(_) => CMD_SETCANCEL,
            Command::GetPin => CMD_GETPIN,
            Command::Confirm => CMD_CONFIRM,
            Command::Message => CMD_MESSAGE,
            Command::Unknown(name) => name,
        }
    }
}

mod read {
    use nom::{
        bytes::complete::take_till,
        character::complete::char,
        combinator::{opt, rest},
        sequence::{pair, preceded},
        IResult,
    };

    fn split(input: &str) -> IResult<&str, (&str, Option<&str>)> {
        pair(
            take_till(|c: char| c == ' '),
            opt(preceded(char(' '), rest)),
        )(input)
    }

    /// Splits a line into the command name and its (possibly empty) argument.
    pub(super) fn command_line(line: &str) -> (&str, &str) {
        match split(line) {
            Ok((_, (name, arg))) => (name, arg.unwrap_or("")),
            Err(_) => (line, ""),
        }
    }
}

pub(crate) mod write {
    use cookie_factory::{combinator::string, sequence::tuple, SerializeFn, WriteContext};
    use std::io::Write;

    pub(crate) const GREETING: &str = "pinentry-hybrid accepting commands, use HELP to see all";

    /// Escapes the characters Assuan forbids in data lines.
    pub(crate) fn escape_data(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '%' => escaped.push_str("%25"),
                '\r' => escaped.push_str("%0D"),
                '\n' => escaped.push_str("%0A"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    pub(crate) fn greeting<'a, W: 'a + Write>() -> impl SerializeFn<W> + 'a {
        tuple((string("OK "), string(GREETING), string("\n")))
    }

    pub(crate) fn ok<'a, W: 'a + Write>() -> impl SerializeFn<W> + 'a {
        string("OK\n")
    }

    pub(crate) fn error<'a, W: 'a + Write>(message: &'a str) -> impl SerializeFn<W> + 'a {
        tuple((string("ERR "), string(message), string("\n")))
    }

    pub(crate) fn comment<'a, W: 'a + Write>(text: &'a str) -> impl SerializeFn<W> + 'a {
        tuple((string("# "), string(text), string("\n")))
    }

    pub(crate) fn data<'a, W: 'a + Write>(value: &'a str) -> impl SerializeFn<W> + 'a {
        move |w: WriteContext<W>| {
            let writer = tuple((string("D "), string(escape_data(value)), string("\n")));
            writer(w)
        }
    }
}
