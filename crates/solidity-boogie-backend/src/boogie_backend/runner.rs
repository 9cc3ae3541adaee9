// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Launching the boogie process.
//!
//! Boogie starts the SMT solver as a child process. When the hard timeout expires the whole
//! process tree is killed, otherwise the solver outlives the run.

use anyhow::{anyhow, Context};
use itertools::Itertools;
use log::{debug, warn};
use std::{
    process::{Command, Output, Stdio},
    sync::mpsc,
    thread,
    time::Duration,
};

/// How a boogie run ended
#[derive(Debug)]
pub enum RunOutcome {
    Finished(Output),
    /// Killed once the hard timeout had passed
    TimedOut(Duration),
}

/// Runs the command line `command`, whose first element is the boogie executable.
pub fn run_boogie(command: &[String], hard_timeout: Option<Duration>) -> anyhow::Result<RunOutcome> {
    let (exe, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("empty boogie command line"))?;
    let mut cmd = Command::new(exe);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    own_process_group(&mut cmd);
    let child = cmd
        .spawn()
        .with_context(|| format!("cannot execute boogie `{}`", command.iter().join(" ")))?;

    let Some(timeout) = hard_timeout else {
        let output = child.wait_with_output().context("waiting for boogie")?;
        return Ok(RunOutcome::Finished(output));
    };

    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });
    match rx.recv_timeout(timeout) {
        Ok(output) => Ok(RunOutcome::Finished(output.context("waiting for boogie")?)),
        Err(_) => {
            warn!("boogie still running after {:?}, killing process {}", timeout, pid);
            kill_tree(pid);
            Ok(RunOutcome::TimedOut(timeout))
        }
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn own_process_group(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(unix)]
fn kill_tree(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!("killing process group {}: {}", pid, err);
    }
}

#[cfg(windows)]
fn kill_tree(pid: u32) {
    if let Err(err) = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .output()
    {
        debug!("killing process tree {}: {}", pid, err);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn command(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn output_of_finished_run_is_collected() {
        let outcome = run_boogie(&command(&["echo", "Boogie program verifier finished"]), None).unwrap();
        let RunOutcome::Finished(output) = outcome else {
            panic!("expected the run to finish");
        };
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("verifier finished"));
    }

    #[test]
    fn run_past_hard_timeout_is_killed() {
        let timeout = Duration::from_millis(100);
        let outcome = run_boogie(&command(&["sleep", "5"]), Some(timeout)).unwrap();
        assert!(matches!(outcome, RunOutcome::TimedOut(t) if t == timeout));
    }

    #[test]
    fn missing_executable_is_an_error() {
        let err = run_boogie(&command(&["/nonexistent/boogie", "a.bpl"]), None).unwrap_err();
        assert!(err.to_string().contains("cannot execute boogie"));
        assert!(run_boogie(&[], None).is_err());
    }
}
