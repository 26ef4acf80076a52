use std::process::Command;
use std::thread;

use log::warn;

use super::error::FetchError;

pub(super) fn run_shell(command_line: &str) -> Result<String, FetchError> {
    let output = shell(command_line)
        .output()
        .map_err(|source| FetchError::CommandSpawn {
            command: command_line.to_owned(),
            source,
        })?;

    if output.status.success() {
        String::from_utf8(output.stdout).map_err(|_| FetchError::Utf8 {
            command: command_line.to_owned(),
        })
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FetchError::CommandFailed {
            command: command_line.to_owned(),
            status: output.status.to_string(),
            stderr: stderr.trim().to_owned(),
        })
    }
}

/// Starts `command_line` without blocking the caller; used for navigation
/// hooks. A short-lived thread reaps the child once it exits.
pub fn spawn_detached(command_line: &str) -> Result<(), FetchError> {
    let mut child = shell(command_line)
        .spawn()
        .map_err(|source| FetchError::CommandSpawn {
            command: command_line.to_owned(),
            source,
        })?;

    let command = command_line.to_owned();
    thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!("`{command}` exited with {status}"),
        Ok(_) => {}
        Err(error) => warn!("failed to wait for `{command}`: {error}"),
    });
    Ok(())
}

pub fn fill_template(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(&format!("{{{placeholder}}}"), value)
}

fn shell(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_placeholder_occurrence() {
        assert_eq!(
            fill_template("fetch --limit {limit} --page-size {limit}", "limit", "50"),
            "fetch --limit 50 --page-size 50"
        );
        assert_eq!(fill_template("open {id}", "limit", "50"), "open {id}");
    }

    /// Children of this process that have exited but were never waited on.
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let parent = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .expect("procfs mounted")
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(parent.as_str())
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn detached_commands_are_reaped() {
        for _ in 0..5 {
            spawn_detached("true").expect("shell spawns");
        }

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while zombie_children() > 0 && std::time::Instant::now() < deadline {
            thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(zombie_children(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_reports_failures() {
        assert_eq!(run_shell("printf hello").expect("command runs"), "hello");
        assert!(matches!(
            run_shell("echo boom >&2; exit 3"),
            Err(FetchError::CommandFailed { stderr, .. }) if stderr == "boom"
        ));
    }
}
