mod error_text;
mod format;
mod import_text;
mod json;
mod mode;
mod report_text;

use std::io;

use nestegg_client::{ClientError, SuccessEnvelope};
use serde_json::Value;

use crate::stdout_io::{write_stdout_line, write_stdout_text};

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => write_stdout_line(&render_text_success(success)?),
        OutputMode::Json => write_stdout_line(&json::render_success_json(success)?),
        OutputMode::Raw => write_stdout_text(&raw_content(success)?),
    }
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text | OutputMode::Raw => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "import" => import_text::render_import_run(&success.data),
        "summary" => report_text::render_summary(&success.data),
        "cashflow" => report_text::render_cashflow(&success.data),
        "snapshot" => report_text::render_snapshot(&success.data),
        "restore" => report_text::render_restore(&success.data),
        "settings" => report_text::render_settings(&success.data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}

fn raw_content(success: &SuccessEnvelope) -> io::Result<String> {
    let content = success
        .data
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other(format!("`{}` output requires content", success.command)))?;
    let mut text = content.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}
