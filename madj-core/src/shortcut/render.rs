// madj-core/src/shortcut/render.rs
use std::path::{Path, PathBuf};

use madj_common::model::ShortcutEntry;

use super::ShortcutDirs;

/// On-disk shape of a launch entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutFormat {
    /// freedesktop `.desktop` file in the applications directory.
    DesktopEntry,
    /// Executable `.command` script on the Desktop (Finder runs these in Terminal).
    CommandScript,
    /// `.cmd` script on the Desktop.
    BatchScript,
}

impl ShortcutFormat {
    pub fn native() -> Self {
        if cfg!(target_os = "windows") {
            Self::BatchScript
        } else if cfg!(target_os = "macos") {
            Self::CommandScript
        } else {
            Self::DesktopEntry
        }
    }

    /// The single canonical location for `entry` in this format.
    pub fn location(&self, dirs: &ShortcutDirs, entry: &ShortcutEntry) -> PathBuf {
        match self {
            Self::DesktopEntry => dirs.applications.join(format!("{}.desktop", slug(&entry.name))),
            Self::CommandScript => dirs.desktop.join(format!("{}.command", entry.name)),
            Self::BatchScript => dirs.desktop.join(format!("{}.cmd", entry.name)),
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, Self::DesktopEntry | Self::CommandScript)
    }

    pub fn render(&self, entry: &ShortcutEntry) -> String {
        match self {
            Self::DesktopEntry => render_desktop_entry(entry),
            Self::CommandScript => render_command_script(entry),
            Self::BatchScript => render_batch_script(entry),
        }
    }
}

/// "Market Adjuster" -> "market-adjuster"
fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn render_desktop_entry(entry: &ShortcutEntry) -> String {
    let exec = std::iter::once(lossy(&entry.target))
        .chain(entry.args.iter().cloned())
        .map(|arg| exec_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::from("[Desktop Entry]\n");
    out.push_str("Type=Application\n");
    out.push_str("Version=1.0\n");
    out.push_str(&format!("Name={}\n", entry.name));
    out.push_str("Comment=Start the market condition adjustment tool\n");
    out.push_str(&format!("Exec={exec}\n"));
    out.push_str(&format!("Path={}\n", desktop_value(&lossy(&entry.working_dir))));
    if let Some(icon) = &entry.icon {
        out.push_str(&format!("Icon={}\n", desktop_value(&lossy(icon))));
    }
    out.push_str("Terminal=false\n");
    out.push_str("Categories=Office;\n");
    out
}

/// String-value escaping for `.desktop` keys: `\\`, `\n`, `\t`, `\r`.
fn desktop_value(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Quotes one `Exec=` argument. Exec-level escaping first, then the string-value escaping;
/// `%` is the field-code marker.
fn exec_quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        match c {
            '"' | '`' | '$' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '%' => quoted.push_str("%%"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    desktop_value(&quoted)
}

fn sh_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

fn render_command_script(entry: &ShortcutEntry) -> String {
    let command = std::iter::once(lossy(&entry.target))
        .chain(entry.args.iter().cloned())
        .map(|arg| sh_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "#!/bin/sh\n# {}\ncd {} || exit 1\nexec {}\n",
        entry.name,
        sh_quote(&lossy(&entry.working_dir)),
        command
    )
}

fn batch_quote(arg: &str) -> String {
    format!("\"{}\"", arg.replace('%', "%%"))
}

fn render_batch_script(entry: &ShortcutEntry) -> String {
    let command = std::iter::once(lossy(&entry.target))
        .chain(entry.args.iter().cloned())
        .map(|arg| batch_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "@echo off\r\nrem {}\r\ncd /d {}\r\n{}\r\n",
        entry.name,
        batch_quote(&lossy(&entry.working_dir)),
        command
    )
}
