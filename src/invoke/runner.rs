//! Blocking tool invocation with captured output.
//!
//! Executes exactly one child process per invocation, no retries. The
//! request is validated before anything is spawned, both output streams
//! are captured in full, and the outcome is classified into the error
//! taxonomy: pre-spawn failures are `ConfigError`, a non-zero exit or a
//! timeout is `InvocationError`, and a zero exit without the declared
//! output file is `MissingArtifact`.

use crate::error::{CryorunError, Result};
use crate::invoke::plan::CommandPlan;
use crate::invoke::request::InvocationRequest;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Result of a successful tool invocation.
///
/// Only produced when the child exited with code zero and the declared
/// output file exists.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// Exit code of the process (always zero for a success).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// The output path the tool was asked to produce, verified to exist.
    pub declared_output: PathBuf,
    /// Wall-clock duration of the child process.
    pub duration: Duration,
}

/// Execute one external tool invocation as a blocking child process.
///
/// # Arguments
///
/// * `plan` - The command plan derived from the tool profile and request
/// * `request` - The validated invocation request
/// * `timeout` - Optional wall-clock limit; on expiry the child's whole
///   process group is killed
///
/// # Returns
///
/// * `Ok(InvocationResult)` - Exit code zero and the declared output exists
/// * `Err(CryorunError::ConfigError)` - A required path could not be
///   resolved; nothing was spawned
/// * `Err(CryorunError::InvocationError)` - The tool exited non-zero or
///   timed out; the message carries the tool's standard error
/// * `Err(CryorunError::MissingArtifact)` - Exit code zero but the
///   declared output file does not exist
pub fn invoke(
    plan: &CommandPlan,
    request: &InvocationRequest,
    timeout: Option<Duration>,
) -> Result<InvocationResult> {
    preflight(plan, request)?;

    let rendered = plan.render();
    let execution = run_child(plan, timeout)?;

    if execution.timed_out {
        return Err(CryorunError::InvocationError(format!(
            "command `{}` timed out after {}s",
            rendered,
            timeout.unwrap_or_default().as_secs()
        )));
    }

    let exit_code = execution.exit_code.unwrap_or(-1);
    if exit_code != 0 {
        let diagnostic = if execution.stderr.trim().is_empty() {
            execution.stdout.trim().to_string()
        } else {
            execution.stderr.trim().to_string()
        };
        return Err(CryorunError::InvocationError(format!(
            "command `{}` exited with code {}: {}",
            rendered, exit_code, diagnostic
        )));
    }

    let declared_output = request.output_path().to_path_buf();
    if !declared_output.exists() {
        return Err(CryorunError::MissingArtifact(declared_output));
    }

    Ok(InvocationResult {
        exit_code,
        stdout: execution.stdout,
        stderr: execution.stderr,
        declared_output,
        duration: execution.duration,
    })
}

/// Validate everything the plan needs before spawning the child.
///
/// No child process is started and no state is written when a check
/// fails. The output parent directory is created last, after every
/// existence check has passed.
fn preflight(plan: &CommandPlan, request: &InvocationRequest) -> Result<()> {
    let input = request.input_path();
    if !input.is_file() {
        return Err(CryorunError::ConfigError(format!(
            "input file '{}' does not exist",
            input.display()
        )));
    }

    if let Some(activation) = &plan.activation
        && !activation.script.is_file()
    {
        return Err(CryorunError::ConfigError(format!(
            "activation script '{}' does not exist",
            activation.script.display()
        )));
    }

    if let Some(workdir) = &plan.workdir
        && !workdir.is_dir()
    {
        return Err(CryorunError::ConfigError(format!(
            "tool directory '{}' does not exist",
            workdir.display()
        )));
    }

    if let Some(parent) = request.output_path().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CryorunError::ConfigError(format!(
                "failed to create output directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// Raw outcome of running the child process.
struct Execution {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    timed_out: bool,
    duration: Duration,
}

/// Spawn the child and wait for it, capturing both output streams.
fn run_child(plan: &CommandPlan, timeout: Option<Duration>) -> Result<Execution> {
    let mut command = build_command(plan)?;
    let spawned_program = if plan.requires_shell() {
        "bash".to_string()
    } else {
        plan.program.clone()
    };

    let start = Instant::now();
    let mut child = command.spawn().map_err(|e| {
        CryorunError::ConfigError(format!(
            "failed to execute '{}': {} (is it installed and on PATH?)",
            spawned_program, e
        ))
    })?;

    let stdout_reader = spawn_capture_thread(child.stdout.take());
    let stderr_reader = spawn_capture_thread(child.stderr.take());

    let (status, timed_out) = match timeout {
        Some(limit) => wait_with_timeout(&mut child, limit)?,
        None => {
            let status = child.wait().map_err(|e| {
                CryorunError::InvocationError(format!("failed to wait for process: {}", e))
            })?;
            (Some(status), false)
        }
    };

    let stdout = join_capture(stdout_reader);
    let stderr = join_capture(stderr_reader);

    Ok(Execution {
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        timed_out,
        duration: start.elapsed(),
    })
}

/// Build the process command for a plan.
///
/// With an activation stage the rendered line runs through `bash -c` and
/// the directory change is part of the line itself. Without one the
/// program is spawned directly and nothing is shell-interpreted.
fn build_command(plan: &CommandPlan) -> Result<Command> {
    let mut command = if plan.requires_shell() {
        let mut command = Command::new("bash");
        command.arg("-c").arg(plan.render());
        command
    } else {
        let mut command = Command::new(&plan.program);
        command.args(plan.direct_args()?);
        if let Some(workdir) = &plan.workdir {
            command.current_dir(workdir);
        }
        command
    };

    for (key, value) in &plan.env {
        command.env(key, value);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Put the child in its own process group so a timeout can kill the
    // whole tree, shell included.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    Ok(command)
}

/// Read a child output pipe to completion on a helper thread.
///
/// Draining the pipe concurrently with the wait loop keeps a chatty tool
/// from deadlocking against a full pipe buffer.
fn spawn_capture_thread<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = reader.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join_capture(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait for a child process, killing it on timeout.
///
/// Returns (exit_status, timed_out). A timed-out child has been killed
/// and reaped by the time this returns.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(Option<ExitStatus>, bool)> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((Some(status), false)),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    kill_process_tree(child);
                    return Ok((None, true));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(CryorunError::InvocationError(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

/// Kill the child's whole process group and reap it.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // The child was spawned with process_group(0), so its pid is also
    // its process group id.
    let pgid = Pid::from_raw(child.id() as i32);
    if killpg(pgid, Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
