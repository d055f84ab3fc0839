use std::io::Write;

use tracing::{debug, info};

use remexec::agent::{HttpControlChannel, WebSocketEventChannel};
use remexec::args::InvocationSpec;
use remexec::cli::Cli;
use remexec::config::{Configuration, EnvLayers, WrapperFlags};
use remexec::error::SessionError;
use remexec::logging::init_tracing;
use remexec::output::OutputSink;
use remexec::session::{Outcome, Session};
use remexec::{APP_VERSION, NATIVE_NAME};

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let invocation = InvocationSpec::from_argv(&argv, NATIVE_NAME);

    // Under the native alias every token belongs to the remote command.
    let flags = if invocation.aliased {
        WrapperFlags::default()
    } else {
        match Cli::parse_wrapper(&invocation.parser_args()) {
            Ok(cli) => cli.flags(),
            Err(e) => e.exit(),
        }
    };

    let code = match run(&flags, invocation).await {
        Ok(outcome) => report(outcome),
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    };

    let _ = std::io::stdout().flush();
    std::process::exit(code);
}

async fn run(flags: &WrapperFlags, invocation: InvocationSpec) -> Result<Outcome, SessionError> {
    let config = Configuration::resolve(flags, EnvLayers::from_process_env())?;
    init_tracing(&config.log_level);

    info!(version = APP_VERSION, agent = %config.agent_url.value, "Starting");
    debug!(?config, ?invocation, "Resolved invocation");

    let control = HttpControlChannel::new(&config.agent_url.value)
        .map_err(SessionError::AgentUnreachable)?;
    let events = WebSocketEventChannel::new(&config.agent_url.value)
        .map_err(SessionError::EventChannel)?;
    debug!(url = %events.url(), "Event channel endpoint");
    let sink = OutputSink::stdio(config.timestamp.value);

    let mut session = Session::new(control, events, config, invocation, sink);
    session.run().await
}

/// Print what the outcome has to say and return the process exit code.
fn report(outcome: Outcome) -> i32 {
    let code = outcome.exit_code();
    match outcome {
        Outcome::Help { text, exit_code: 0 } => print!("{}", text),
        Outcome::Help { text, .. } => eprint!("{}", text),
        Outcome::Exited {
            error: Some(error), ..
        } => eprintln!("{}", error),
        Outcome::Exited { error: None, .. } => {}
        Outcome::ChannelClosed { error } => eprintln!("{}", error),
    }
    code
}
