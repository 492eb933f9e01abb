use std::io::Write;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ctxwatch::app::{fallback_output, App};
use ctxwatch_core::config::{Command, Config, Settings};
use ctxwatch_core::hook::read_event;
use ctxwatch_core::HookEvent;

/// Every path exits 0: a hook must never make the host see a failure.
fn main() {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings, falling back to defaults on a broken config file
    let mut settings = Settings::load(cli.config.as_ref()).unwrap_or_else(|e| {
        tracing::warn!("{:#}, using defaults", e);
        Settings::default()
    });
    settings.merge_cli(&cli);
    settings.validate();

    let event = if reads_event(cli.command) {
        read_stdin_event(Duration::from_millis(settings.stdin_timeout_ms))
    } else {
        HookEvent::default()
    };

    let output = match App::new(settings) {
        Ok(app) => app.dispatch(cli.command, &event),
        Err(e) => {
            tracing::warn!("Failed to initialize: {:#}", e);
            fallback_output(cli.command, &event)
        }
    };

    if let Some(output) = output {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
        let _ = stdout.flush();
    }
}

fn reads_event(command: Command) -> bool {
    matches!(
        command,
        Command::Statusline | Command::Context | Command::Tick | Command::Cleanup
    )
}

/// Read the host event from stdin within `timeout`
///
/// Stdin reads cannot be cancelled, so the runtime is shut down in the
/// background instead of waiting for a read that may never finish.
fn read_stdin_event(timeout: Duration) -> HookEvent {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!("Failed to start runtime: {}", e);
            return HookEvent::default();
        }
    };

    let event = runtime.block_on(read_event(tokio::io::stdin(), timeout));
    runtime.shutdown_background();
    event
}

fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_env("CTXWATCH_LOG").unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("ctxwatch=debug,ctxwatch_core=debug")
        } else {
            EnvFilter::new("ctxwatch=warn,ctxwatch_core=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
