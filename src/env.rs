use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the environment a child command runs in.
///
/// The environment contains:
/// - `vars`: a map of environment variables passed to executed commands.
/// - `current_dir`: the working directory for command execution.
///
/// Note: fields are public for simplicity; the struct is a plain snapshot
/// with no invariants of its own.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes
    /// `current_dir` from `std::env::current_dir()`.
    pub fn new() -> Self {
        let mut vars = HashMap::new();
        for (k, v) in stdenv::vars() {
            vars.insert(k, v);
        }
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Prepend directories to PATH, keeping the existing entries behind them.
    ///
    /// Used to give spawned commands access to project-local binary
    /// directories without touching the parent process environment.
    pub fn prepend_paths(&mut self, extra: &[PathBuf]) {
        if extra.is_empty() {
            return;
        }
        let old = self.get_var("PATH").unwrap_or_default();
        let mut entries: Vec<PathBuf> = extra.to_vec();
        entries.extend(stdenv::split_paths(&old));
        if let Ok(joined) = stdenv::join_paths(entries) {
            self.set_var("PATH", joined.to_string_lossy());
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = empty_env();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    #[cfg(unix)]
    fn test_prepend_paths_puts_new_entries_first() {
        let mut env = empty_env();
        env.set_var("PATH", "/usr/bin:/bin");
        env.prepend_paths(&[PathBuf::from("/opt/tools")]);
        assert_eq!(
            env.get_var("PATH"),
            Some("/opt/tools:/usr/bin:/bin".to_string())
        );
    }

    #[test]
    fn test_prepend_paths_with_no_extras_is_a_noop() {
        let mut env = empty_env();
        env.set_var("PATH", "keepme");
        env.prepend_paths(&[]);
        assert_eq!(env.get_var("PATH"), Some("keepme".to_string()));
    }
}
