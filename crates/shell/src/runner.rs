use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;

/// Boxed future returned by [`CommandRunner::run`].
pub type ShellFuture<'a> = Pin<Box<dyn Future<Output = io::Result<ShellOutput>> + Send + 'a>>;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, or `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` to completion.
    ///
    /// Dropping the returned future must stop the child process.
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> ShellFuture<'a>;
}

/// Runs commands with `tokio::process`.
///
/// Children are killed when the future is dropped, so cancelling an install
/// does not leave a shell running in the background.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRunner;

impl CommandRunner for TokioRunner {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> ShellFuture<'a> {
        Box::pin(async move {
            let output = tokio::process::Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await?;

            Ok(ShellOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_output() {
        let out = TokioRunner
            .run("sh", &["-c", "echo out; echo err >&2; exit 3"])
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let err = TokioRunner
            .run("/nonexistent/definitely-not-here", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
