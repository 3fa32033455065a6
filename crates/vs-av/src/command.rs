//! Builder for executing external tool commands with timeout support.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of diagnostic stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 8;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use vs_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> vs_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            current_dir: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Run the process with the given working directory.
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Returns [`vs_core::Error::Tool`] if the process times out (message
    ///   includes the timeout duration).
    /// - Returns [`vs_core::Error::Tool`] if the process exits with a non-zero
    ///   status (message includes stderr).
    /// - Returns [`vs_core::Error::Tool`] if spawning the process fails.
    pub async fn execute(&self) -> vs_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| vs_core::Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        // kill_on_drop reaps the child if the timeout drops this future.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(vs_core::Error::tool(
                        program_name,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(vs_core::Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(vs_core::Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Execute the command, handing every stderr line to `on_line` as it
    /// arrives. Stdout is discarded.
    ///
    /// Used for tools that report progress on stderr (ffmpeg `-progress
    /// pipe:2`). The returned [`ToolOutput::stderr`] and any error message
    /// carry only the last few diagnostic lines; bare `key=value` progress
    /// lines are left out.
    pub async fn execute_with_stderr_callback(
        &self,
        mut on_line: impl FnMut(&str),
    ) -> vs_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| vs_core::Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| vs_core::Error::tool(&program_name, "stderr was not captured"))?;

        let run = async {
            // Metadata tags echoed by the tool are not always UTF-8.
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                on_line(&line);
                if is_key_value_line(&line) || line.trim().is_empty() {
                    continue;
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok((status, tail))) => {
                let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
                if !status.success() {
                    return Err(vs_core::Error::tool(
                        program_name,
                        format!("exited with status {status}: {}", stderr.trim()),
                    ));
                }
                Ok(ToolOutput {
                    status,
                    stdout: String::new(),
                    stderr,
                })
            }
            Ok(Err(e)) => Err(vs_core::Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(vs_core::Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

/// `true` for machine-readable `key=value` lines such as ffmpeg's
/// `-progress` output.
fn is_key_value_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, value)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !value.contains(' ')
        }
        None => false,
    }
}
