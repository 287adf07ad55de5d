use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use surfacing_application::{ControllerConfig, SessionController, SettingsUseCase};
use surfacing_core::{SessionStore, SettingsService, ShellEvent};
use surfacing_infrastructure::{
    CommandCaptureProvider, SurfacingPaths, TomlSettingsService, XdgAutostart,
};
use surfacing_interaction::GeminiClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::terminal::{HELP, Input, TerminalShell, parse_line};

pub async fn run(
    paths: &SurfacingPaths,
    capture_command: Option<&str>,
    settle_ms: u64,
) -> Result<()> {
    let settings: Arc<dyn SettingsService> = Arc::new(TomlSettingsService::new(paths)?);
    let registrar = Arc::new(XdgAutostart::new(paths)?);
    if let Err(err) = SettingsUseCase::new(settings.clone(), registrar)
        .sync_launch_at_login()
        .await
    {
        tracing::warn!(error = %err, "Could not sync launch-at-login state");
    }

    let capture = match capture_command {
        Some(command_line) => CommandCaptureProvider::from_command_line(command_line)
            .context("--capture-command must not be empty")?,
        None => CommandCaptureProvider::default(),
    };
    tracing::info!(program = capture.program(), settle_ms, "Starting panel");

    let controller = SessionController::new(
        SessionStore::new(),
        Arc::new(TerminalShell::new()),
        Arc::new(capture),
        Arc::new(GeminiClient::new(settings)),
        ControllerConfig {
            settle_delay: Duration::from_millis(settle_ms),
            ..Default::default()
        },
    );

    let (events, receiver) = mpsc::unbounded_channel();
    let controller_task = tokio::spawn(controller.run(receiver));

    println!("Cinoa Surfacing. Type :toggle to open the panel, :help for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_line(&line) {
            Input::Events(batch) => {
                let quit = batch.contains(&ShellEvent::QuitRequested);
                if batch.into_iter().any(|event| events.send(event).is_err()) || quit {
                    break;
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Unknown(command) => println!("Unknown command {command}. Type :help."),
        }
    }

    // End of input counts as quitting.
    let _ = events.send(ShellEvent::QuitRequested);
    controller_task
        .await
        .context("Session controller stopped unexpectedly")?;
    Ok(())
}
