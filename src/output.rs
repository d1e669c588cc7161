use crate::transport::OutputStream;
use std::io::Write;

/// Abstraction over user-facing output.
///
/// The orchestrator reports per-host progress and remote output through this
/// trait instead of `println!`, so tests can record it and `--quiet` can
/// drop it. Everything written here is advisory; outcomes never depend on it.
pub trait UserOutput: Send + Sync {
    /// Informational status message (e.g., "starting transfer to 10.0.0.1: /sixsense/app.jar")
    fn status(&self, message: &str);

    /// Success message (e.g., "finished transfer to 10.0.0.1: /sixsense/app.jar")
    fn success(&self, message: &str);

    /// Warning message (e.g., "skipping start stage")
    fn warning(&self, message: &str);

    /// Error message (e.g., "failed transfer to 10.0.0.1: ...")
    fn error(&self, message: &str);

    /// One line of remote stdout/stderr, attributed to its host.
    fn remote_line(&self, host: &str, stream: OutputStream, line: &str);

    /// A blank line separator.
    fn blank(&self);
}

/// Standard CLI output — writes to stdout/stderr with ANSI colors.
pub struct CliOutput;

impl UserOutput for CliOutput {
    fn status(&self, message: &str) {
        println!("{}", message);
    }

    fn success(&self, message: &str) {
        println!("\x1b[32m{}\x1b[0m", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("\x1b[33m{}\x1b[0m", message);
    }

    fn error(&self, message: &str) {
        eprintln!("\x1b[31m{}\x1b[0m", message);
    }

    fn remote_line(&self, host: &str, stream: OutputStream, line: &str) {
        // Lines from concurrent hosts interleave; lock so each stays whole.
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "[{} | {}]# {}", host, stream, line).ok();
    }

    fn blank(&self) {
        println!();
    }
}

/// Suppresses all output.
pub struct QuietOutput;

impl UserOutput for QuietOutput {
    fn status(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn remote_line(&self, _host: &str, _stream: OutputStream, _line: &str) {}
    fn blank(&self) {}
}
