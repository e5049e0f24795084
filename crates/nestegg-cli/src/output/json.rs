use std::io;

use nestegg_client::{ClientError, SuccessEnvelope};
use serde::Serialize;
use serde_json::json;

const JSON_VERSION: &str = "v1";

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    let value = match success.command.as_str() {
        "import" | "summary" | "cashflow" | "snapshot" | "restore" | "settings" => json!({
            "ok": true,
            "command": success.command,
            "version": JSON_VERSION,
            "data": success.data.clone(),
        }),
        _ => {
            return Err(io::Error::other(format!(
                "JSON output is not supported for command `{}`",
                success.command
            )));
        }
    };

    serialize_json_pretty(&value)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    let payload = json!({
        "ok": false,
        "error": {
            "code": error.code,
            "message": error.message,
            "recovery_steps": error.recovery_steps,
        }
    });
    serialize_json_pretty(&payload)
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
