//! CLI Command Implementations

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use log::{info, warn};
use serde_json::Value;

use crate::config::RenderConfig;
use crate::describe::describe_project;
use crate::engine::Session;
use crate::model::TimeSignature;
use crate::render::{AudioFormat, RenderCoordinator};
use crate::state;
use crate::tools::{ToolHost, ToolResponse};

/// Render config from the environment with command-line overrides applied.
pub fn render_config(renderer: Option<&Path>, timeout_ms: Option<u64>) -> RenderConfig {
    let mut config = RenderConfig::from_env();
    if let Some(renderer) = renderer {
        config = config.with_renderer(renderer);
    }
    if let Some(ms) = timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    config
}

/// Create and save an empty project.
pub fn new_project(
    path: &Path,
    tempo: f64,
    time_signature: &str,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let sig: TimeSignature = time_signature.parse()?;
    let mut session = Session::create(tempo, sig)?;
    if let Some(name) = name {
        session.rename_project(name)?;
    }
    session.save(Some(path))?;
    println!("Project created: {}", path.display());
    Ok(())
}

/// Split a script into calls: a JSON array, or one object per line.
fn parse_script(text: &str) -> anyhow::Result<Vec<Value>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let calls: Vec<Value> = serde_json::from_str(trimmed).context("script is not a JSON array")?;
        return Ok(calls);
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with("//"))
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("line {} is not valid JSON", n + 1))
        })
        .collect()
}

fn print_response(response: &ToolResponse) -> anyhow::Result<()> {
    let line = serde_json::to_string(response)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

/// Run every call in a script file, printing one response per line.
pub fn run_script(path: &Path, keep_going: bool, config: RenderConfig) -> anyhow::Result<()> {
    info!("Running script: {}", path.display());
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read script {}", path.display()))?;
    let calls = parse_script(&text)?;

    let mut host = ToolHost::new(config);
    let mut failures = 0;
    for (index, call) in calls.into_iter().enumerate() {
        let response = host.dispatch_value(call);
        print_response(&response)?;
        if !response.ok {
            failures += 1;
            if !keep_going {
                bail!("call {} failed; stopping", index + 1);
            }
        }
    }
    if failures > 0 {
        warn!("{} call(s) failed", failures);
    }
    Ok(())
}

/// Serve tool calls from stdin until EOF.
pub fn serve_stdio(config: RenderConfig) -> anyhow::Result<()> {
    info!("Reading tool calls from stdin");
    let mut host = ToolHost::new(config);
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Value>(&line) {
            Ok(value) => host.dispatch_value(value),
            Err(e) => ToolResponse::failure(&crate::StudioError::invalid("call", e.to_string())),
        };
        print_response(&response)?;
    }
    Ok(())
}

/// Print a project's description.
pub fn describe(path: &Path, json: bool) -> anyhow::Result<()> {
    let project = state::load(path)?;
    let description = describe_project(&project)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&description)?);
    } else {
        println!("{}", description);
    }
    Ok(())
}

/// Render a project file and print the outcome as JSON.
pub fn render(
    path: &Path,
    output: &Path,
    format: Option<&str>,
    config: RenderConfig,
) -> anyhow::Result<()> {
    let format = format.map(str::parse::<AudioFormat>).transpose()?;
    let project = state::load(path)?;
    let outcome = RenderCoordinator::new(config)
        .render(&project, output, format)
        .with_context(|| format!("rendering {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
