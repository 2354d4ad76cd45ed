//! Execution Context
//!
//! The mutable state evaluation runs against: working directory, shell
//! variables and their exported subset, and the job table. The root
//! context writes cwd and exported variables through to the real
//! process; a subshell context is a copy that never writes back, which
//! is exactly what makes `(cd /tmp && pwd)` side-effect free.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::exec::JobTable;
use crate::interpreter::errors::RuntimeError;

#[derive(Debug)]
pub struct ExecContext {
    cwd: PathBuf,
    vars: HashMap<String, String>,
    exported: HashSet<String>,
    jobs: JobTable,
    /// Whether cwd/exports mirror into the real process (root context
    /// only).
    write_through: bool,
}

impl ExecContext {
    /// The root context: tracks the real process cwd and writes changes
    /// back to it.
    pub fn root() -> io::Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
            vars: HashMap::new(),
            exported: HashSet::new(),
            jobs: JobTable::new(),
            write_through: true,
        })
    }

    /// Derive an isolated child context for a subshell: same cwd and
    /// variables, fresh job table, no write-back.
    pub fn subshell(&self) -> Self {
        Self {
            cwd: self.cwd.clone(),
            vars: self.vars.clone(),
            exported: self.exported.clone(),
            jobs: JobTable::new(),
            write_through: false,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Look a variable up: context variables shadow the process
    /// environment.
    pub fn var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Set a variable and mark it for the environment of spawned
    /// processes.
    pub fn export(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if self.write_through {
            std::env::set_var(&name, &value);
        }
        self.vars.insert(name.clone(), value);
        self.exported.insert(name);
    }

    /// The exported context variables, overlaid on the inherited
    /// environment at spawn time.
    pub fn exported_env(&self) -> HashMap<String, String> {
        self.exported
            .iter()
            .filter_map(|name| {
                self.vars
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Change the working directory. `None` means home.
    pub fn cd(&mut self, path: Option<&str>) -> Result<(), RuntimeError> {
        let target = match path {
            Some(p) => {
                let p = Path::new(p);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    self.cwd.join(p)
                }
            }
            None => self.home().ok_or_else(|| RuntimeError::Chdir {
                path: "~".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "home directory not set"),
            })?,
        };

        let target = target.canonicalize().map_err(|e| RuntimeError::Chdir {
            path: target.display().to_string(),
            source: e,
        })?;
        if !target.is_dir() {
            return Err(RuntimeError::Chdir {
                path: target.display().to_string(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }

        if self.write_through {
            std::env::set_current_dir(&target).map_err(|e| RuntimeError::Chdir {
                path: target.display().to_string(),
                source: e,
            })?;
        }
        debug!("cd {}", target.display());
        self.set_var("PWD", target.display().to_string());
        self.exported.insert("PWD".into());
        self.cwd = target;
        Ok(())
    }

    /// The home directory used by `cd` and tilde expansion.
    pub fn home(&self) -> Option<PathBuf> {
        dirs::home_dir().or_else(|| self.var("HOME").map(PathBuf::from))
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobTable {
        &mut self.jobs
    }
}
