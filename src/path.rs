use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static DRIVE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([A-Za-z]):\\(.*)$").expect("valid regex"));

/// Shell environment the sync tool runs under on the local machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Cygwin,
    Wsl,
    #[default]
    Posix,
}

impl Environment {
    fn drive_mount(self) -> Option<&'static str> {
        match self {
            Self::Cygwin => Some("/cygdrive"),
            Self::Wsl => Some("/mnt"),
            Self::Posix => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cygwin => "cygwin",
            Self::Wsl => "wsl",
            Self::Posix => "posix",
        };
        f.write_str(name)
    }
}

/// Rewrites a native path into the form the remote-sync shell expects.
///
/// Under Cygwin `C:\Users` becomes `/cygdrive/c/Users`, under WSL it becomes
/// `/mnt/c/Users`. Anything that is not rooted at a drive letter only gets its
/// separators flipped.
pub fn translate(path: &str, env: Environment) -> String {
    let Some(mount) = env.drive_mount() else {
        return fix_windows_slashes(path);
    };

    match DRIVE_PATH_RE.captures(path) {
        Some(caps) => {
            let drive = caps[1].to_ascii_lowercase();
            let rest = fix_windows_slashes(&caps[2]);
            format!("{mount}/{drive}/{rest}")
        }
        None => fix_windows_slashes(path),
    }
}

pub fn fix_windows_slashes(path: &str) -> String {
    path.replace('\\', "/")
}
