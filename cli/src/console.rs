use std::io::IsTerminal;
use std::path::Path;

use ceres_gate_kit::guard::Confirmer;
use dialoguer::Confirm;

/// Confirmation on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfirmer;

impl Confirmer for ConsoleConfirmer {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn ask(&self, warnings: &[String]) -> bool {
        eprintln!("Warnings:");
        for warning in warnings {
            eprintln!("- {warning}");
        }
        Confirm::new()
            .with_prompt("Proceed with these changes?")
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Open `path` in `editor`, or `$EDITOR`.
///
/// Skipped with a warning when no editor is configured or stdin is not a
/// terminal. The editor's exit status is reported but not fatal.
pub fn open_in_editor(path: &Path, editor: Option<&str>) -> anyhow::Result<()> {
    let editor = match editor {
        Some(editor) => Some(editor.to_string()),
        None => std::env::var("EDITOR").ok(),
    };
    let Some(editor) = editor.filter(|e| !e.trim().is_empty()) else {
        eprintln!("No editor configured (set $EDITOR or pass --editor); skipping --open.");
        return Ok(());
    };
    if !std::io::stdin().is_terminal() {
        eprintln!("stdin is not a terminal; skipping --open.");
        return Ok(());
    }

    let words = shell_words(&editor)?;
    let Some((program, args)) = words.split_first() else {
        return Ok(());
    };
    let status = std::process::Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|err| anyhow::anyhow!("Failed to launch editor '{program}': {err}"))?;
    if !status.success() {
        tracing::warn!(editor = %program, status = %status, "editor exited unsuccessfully");
    }
    Ok(())
}

fn shell_words(line: &str) -> anyhow::Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| anyhow::anyhow!("Invalid editor command: {line}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn editor_command_is_split_like_a_shell() {
        assert_eq!(
            shell_words("code --wait").expect("split"),
            vec!["code".to_string(), "--wait".to_string()]
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        assert!(shell_words("vim \"unterminated").is_err());
    }
}
