use {
    super::{AnalyzeError, Analyzer, AnalyzerConfig, EngineInitError, Token, parse_output},
    std::{
        io::Write,
        path::PathBuf,
        process::{Command, Stdio},
        thread,
    },
    tracing::{debug, info},
};

/// Analyzer which runs the `mecab` executable once per call.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandAnalyzer {
    /// Default name of the program to run.
    pub const DEFAULT_PROGRAM: &'static str = "mecab";

    /// Checks that `program` runs, and creates an analyzer with `config`.
    ///
    /// # Errors
    ///
    /// Errors if the configuration is invalid, or if the program cannot be
    /// started.
    pub fn new(
        program: impl Into<PathBuf>,
        config: AnalyzerConfig,
    ) -> Result<Self, EngineInitError> {
        let program = program.into();
        let config = config.resolve()?;

        let output = Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineInitError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(EngineInitError::Exited {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!(
            "Using analyzer {program:?}: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );

        Ok(Self {
            program,
            args: config.mecab_args(),
        })
    }
}

impl Analyzer for CommandAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalyzeError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(AnalyzeError::Io)?;

        // the child stops reading once its stdout pipe is full, so it is drained while writing
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin
                    .write_all(text.as_bytes())
                    .and_then(|()| stdin.write_all(b"\n")),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = output.map_err(AnalyzeError::Io)?;
        if !output.status.success() {
            return Err(AnalyzeError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        written
            .map_err(|_| AnalyzeError::Backend("stdin writer panicked".into()))?
            .map_err(AnalyzeError::Io)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tokens = parse_output(&stdout);
        debug!("Analyzed {} chars into {} tokens", text.chars().count(), tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program() {
        let result = CommandAnalyzer::new(
            "/nonexistent/kanabun-test-mecab",
            AnalyzerConfig {
                rule_config_path: None,
                dictionary_path: None,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EngineInitError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn output_larger_than_pipe() {
        use std::{fs, os::unix::fs::PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("echo-mecab");
        fs::write(&program, "#!/bin/sh\nexec cat\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let analyzer = CommandAnalyzer {
            program,
            args: Vec::new(),
        };
        let tokens = analyzer.analyze(&"春\tハル\n".repeat(40_000)).unwrap();
        assert_eq!(tokens.len(), 40_000);
        assert_eq!(tokens[0], Token::morpheme("春", "ハル"));
    }
}
