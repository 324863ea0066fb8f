/// Source of operator confirmation.
pub trait Confirmer {
    /// Whether a human can answer a prompt right now.
    fn is_interactive(&self) -> bool;

    /// Show `warnings` and ask once. Any failure to ask counts as "no".
    fn ask(&self, warnings: &[String]) -> bool;
}

/// Confirmer for contexts without a terminal. Never approves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Confirmer for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn ask(&self, _warnings: &[String]) -> bool {
        false
    }
}

/// Decide whether a change with `warnings` may be applied.
///
/// No warnings, or `confirm` set, approves. Otherwise an interactive
/// confirmer is asked once; a non-interactive one declines.
pub fn confirm_if_needed(warnings: &[String], confirm: bool, confirmer: &dyn Confirmer) -> bool {
    if warnings.is_empty() || confirm {
        return true;
    }
    if !confirmer.is_interactive() {
        tracing::warn!("confirmation required but no terminal is attached; declining");
        return false;
    }
    confirmer.ask(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Scripted {
        interactive: bool,
        answer: bool,
        asked: Cell<usize>,
    }

    impl Confirmer for Scripted {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn ask(&self, _warnings: &[String]) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.answer
        }
    }

    fn scripted(interactive: bool, answer: bool) -> Scripted {
        Scripted {
            interactive,
            answer,
            asked: Cell::new(0),
        }
    }

    #[test]
    fn no_warnings_needs_no_prompt() {
        let c = scripted(true, false);
        assert!(confirm_if_needed(&[], false, &c));
        assert_eq!(c.asked.get(), 0);
    }

    #[test]
    fn confirm_flag_auto_approves() {
        let c = scripted(false, false);
        assert!(confirm_if_needed(&["w".to_string()], true, &c));
    }

    #[test]
    fn non_interactive_fails_closed() {
        assert!(!confirm_if_needed(&["w".to_string()], false, &NonInteractive));
    }

    #[test]
    fn interactive_asks_exactly_once() {
        let c = scripted(true, true);
        assert!(confirm_if_needed(&["w".to_string()], false, &c));
        assert_eq!(c.asked.get(), 1);
    }
}
