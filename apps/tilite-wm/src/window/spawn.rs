use std::process::{Child, Command, Stdio};
use std::thread;

use tracing::{debug, info, warn};

/// Splits a command line on whitespace. Single or double quotes group words;
/// the quote characters themselves are dropped.
pub fn split_cmd(cmd: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut token = String::new();
    let mut quoted = false;

    for ch in cmd.chars() {
        match ch {
            '"' | '\'' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !token.is_empty() {
                    args.push(std::mem::take(&mut token));
                }
            }
            c => token.push(c),
        }
    }
    if !token.is_empty() {
        args.push(token);
    }
    args
}

/// Splits argv on `|` into the commands of a pipeline. Empty stages are dropped.
pub fn pipeline(argv: &[String]) -> Vec<&[String]> {
    argv.split(|arg| arg == "|")
        .filter(|stage| !stage.is_empty())
        .collect()
}

/// Starts every stage of the pipeline, wiring each stdout into the next
/// stdin. Each child gets a waiter thread so it is reaped on exit.
pub fn spawn(argv: &[String]) {
    let stages = pipeline(argv);
    if stages.is_empty() {
        return;
    }

    let last = stages.len() - 1;
    let mut upstream: Option<Stdio> = None;

    for (i, stage) in stages.iter().enumerate() {
        let mut cmd = Command::new(&stage[0]);
        cmd.args(&stage[1..]);
        if let Some(stdin) = upstream.take() {
            cmd.stdin(stdin);
        }
        if i < last {
            cmd.stdout(Stdio::piped());
        }

        match cmd.spawn() {
            Ok(mut child) => {
                info!("Spawned {:?} (pid {})", stage, child.id());
                upstream = child.stdout.take().map(Stdio::from);
                reap(child);
            }
            Err(e) => {
                warn!("Failed to spawn {:?}: {}", stage, e);
                return;
            }
        }
    }
}

fn reap(mut child: Child) {
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => debug!("Child {} exited with {}", pid, status),
            Err(e) => warn!("Waiting for child {} failed: {}", pid, e),
        });
    if let Err(e) = spawned {
        warn!("Cannot start waiter for child {}: {}", pid, e);
    }
}
