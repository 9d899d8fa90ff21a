use gumdrop::Options;
use log::{error, LevelFilter};
use pinentry_hybrid::{backend::Frontend, Connection, Server, Session};
use std::process;

#[derive(Debug, Options)]
struct PinentryOptions {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "print version info and exit", short = "V")]
    version: bool,

    #[options(help = "log debugging output to stderr")]
    debug: bool,

    #[options(
        help = "prompt on TTY until the caller sets another one",
        meta = "TTY",
        no_short
    )]
    ttyname: Option<String>,

    #[options(help = "never open a dialog, only prompt on the tty", no_short)]
    no_dialog: bool,
}

fn main() {
    let opts = PinentryOptions::parse_args_default_or_exit();

    if opts.version {
        println!("pinentry-hybrid {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    // stdout belongs to the protocol, so logs go to stderr.
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    logger.format_timestamp(None);
    if opts.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let mut session = Session::default();
    if let Some(tty) = opts.ttyname {
        session.set_tty_name(tty);
    }

    let mut server = Server::with_session(Frontend::select(!opts.no_dialog), session);
    if let Err(e) = server.serve(&mut Connection::stdio()) {
        error!("{}", e);
        process::exit(1);
    }
}
