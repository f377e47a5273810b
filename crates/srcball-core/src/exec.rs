//! Running external tools.
//!
//! Every external invocation goes through [`run`]: the command line is
//! echoed (unless quiet), stdout and stderr are streamed line by line as the
//! command produces them and also captured, and a non-zero exit is turned
//! into a [`CommandError`].

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::CommandError;

/// Render a command as a single shell-like line for logs and errors.
pub fn command_line(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command to completion and return its combined output.
///
/// # Errors
///
/// Returns [`CommandError::Spawn`] if the process cannot be started and
/// [`CommandError::Failed`] if it exits unsuccessfully.
pub fn run(cmd: &mut Command, quiet: bool) -> Result<String, CommandError> {
    let (status, combined) = run_unchecked(cmd, quiet)?;
    if status.success() {
        Ok(combined)
    } else {
        Err(CommandError::Failed {
            command: command_line(cmd),
            code: status.code(),
            output: combined,
        })
    }
}

/// Run a command, returning its exit status and output regardless of
/// success.
///
/// # Errors
///
/// Returns [`CommandError::Spawn`] if the process cannot be started or
/// waited on.
pub fn run_unchecked(cmd: &mut Command, quiet: bool) -> Result<(ExitStatus, String), CommandError> {
    let line = command_line(cmd);
    if !quiet {
        println!("\n  running {line}");
    }
    tracing::debug!(command = %line, "spawning");

    let spawn_error = |source| CommandError::Spawn {
        command: line.clone(),
        source,
    };

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    // Both pipes are drained concurrently so neither can fill up and stall
    // the child.
    let (mut combined, errors) = std::thread::scope(|scope| {
        let errors = scope.spawn(|| stream_lines(stderr, quiet));
        let output = stream_lines(stdout, quiet);
        (output, errors.join().unwrap_or_default())
    });
    combined.push_str(&errors);

    let status = child.wait().map_err(spawn_error)?;
    tracing::debug!(command = %line, status = ?status.code(), "finished");

    Ok((status, combined))
}

/// Read `stream` to the end, echoing each line (unless quiet) as it arrives.
fn stream_lines(stream: Option<impl Read>, quiet: bool) -> String {
    let mut collected = String::new();
    let Some(stream) = stream else {
        return collected;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if !quiet {
                    println!("    {}", line.trim());
                }
                collected.push_str(&line);
            }
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_args() {
        let mut cmd = Command::new("hg");
        cmd.args(["update", "-r", "FIREFOX_10_0_RELEASE"]);
        assert_eq!(command_line(&cmd), "hg update -r FIREFOX_10_0_RELEASE");
    }

    #[test]
    fn test_run_captures_stdout_and_stderr() {
        let out = run(Command::new("sh").args(["-c", "echo out; echo err >&2"]), true).unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[test]
    fn test_run_nonzero_exit_is_failure() {
        let err = run(Command::new("sh").args(["-c", "echo boom; exit 3"]), true).unwrap_err();
        match err {
            CommandError::Failed { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("boom"));
            }
            CommandError::Spawn { .. } => panic!("expected exit failure"),
        }
    }

    #[test]
    fn test_run_missing_program_is_spawn_error() {
        let err = run(&mut Command::new("srcball-no-such-program"), true).unwrap_err();
        assert!(!err.is_exit_failure());
    }

    #[test]
    fn test_run_unchecked_ignores_status() {
        let (status, _) = run_unchecked(&mut Command::new("false"), true).unwrap();
        assert!(!status.success());
    }

    #[test]
    fn test_run_drains_large_output_on_both_streams() {
        let out = run(
            Command::new("sh").args([
                "-c",
                "i=0; while [ $i -lt 20000 ]; do echo out$i; echo err$i >&2; i=$((i+1)); done",
            ]),
            true,
        )
        .unwrap();
        assert!(out.contains("out19999\n"));
        assert!(out.contains("err19999\n"));
    }

    #[test]
    fn test_run_keeps_invalid_utf8_lines() {
        let out = run(Command::new("sh").args(["-c", "printf 'a\\377b\\nnext\\n'"]), true).unwrap();
        assert!(out.contains("next"));
    }
}
