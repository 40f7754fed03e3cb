use crate::config::RunConfig;
use crate::error::{ConfigError, RunError};
use crate::suite::{Case, CaseMode};
use regex::Regex;
use tracing::debug;

fn compile(pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::Grep {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

/// Apply grep filters and focus to `cases`, keeping declaration order.
///
/// With `forbid_only` any focused case in the set rejects the run, whether or
/// not the grep filters would have selected it.
pub fn select(cases: Vec<Case>, config: &RunConfig) -> Result<Vec<Case>, RunError> {
    if config.forbid_only {
        let focused: Vec<String> = cases
            .iter()
            .filter(|case| case.mode == CaseMode::Only)
            .map(Case::full_title)
            .collect();
        if !focused.is_empty() {
            return Err(RunError::FocusedCases(focused));
        }
    }

    let grep = compile(config.grep.as_deref())?;
    let grep_invert = compile(config.grep_invert.as_deref())?;
    let matched: Vec<Case> = cases
        .into_iter()
        .filter(|case| {
            let title = case.full_title();
            grep.as_ref().is_none_or(|re| re.is_match(&title))
                && grep_invert.as_ref().is_none_or(|re| !re.is_match(&title))
        })
        .collect();

    let selected = if matched.iter().any(|case| case.mode == CaseMode::Only) {
        matched
            .into_iter()
            .filter(|case| case.mode == CaseMode::Only)
            .collect()
    } else {
        matched
    };
    debug!(selected = selected.len(), "cases selected");

    if selected.is_empty() {
        return Err(RunError::NothingSelected);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::CaseKind;

    fn case(id: u16) -> Case {
        Case::new(id, "noop", CaseKind::Positive, |_ctx| async { Ok(()) })
    }

    fn config() -> RunConfig {
        RunConfig::defaults(false)
    }

    fn ids(cases: &[Case]) -> Vec<u16> {
        cases.iter().map(|c| c.id).collect()
    }

    #[test]
    fn grep_and_invert_filter_by_full_title() {
        let mut config = config();
        config.grep = Some("TestId: 10".into());
        config.grep_invert = Some("1002".into());
        let selected = select(vec![case(1001), case(1002), case(2001)], &config).unwrap();
        assert_eq!(ids(&selected), vec![1001]);
    }

    #[test]
    fn focus_narrows_the_run() {
        let selected = select(vec![case(1001), case(1002).only(), case(1003)], &config()).unwrap();
        assert_eq!(ids(&selected), vec![1002]);
    }

    #[test]
    fn forbid_only_rejects_focused_cases() {
        let mut config = config();
        config.forbid_only = true;
        let err = select(vec![case(1001), case(1002).only()], &config).unwrap_err();
        match err {
            RunError::FocusedCases(titles) => assert_eq!(titles, vec!["TestId: 1002. noop"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_selection_is_an_error() {
        let mut config = config();
        config.grep = Some("nothing matches this".into());
        assert!(matches!(
            select(vec![case(1001)], &config),
            Err(RunError::NothingSelected)
        ));
    }

    #[test]
    fn skipped_cases_stay_selected() {
        let selected = select(vec![case(1001).skip(), case(1002)], &config()).unwrap();
        assert_eq!(ids(&selected), vec![1001, 1002]);
    }
}
