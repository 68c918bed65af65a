//! Non-fatal checks over resolved actions.
//!
//! Validators never abort a run; they report conditions that will make an
//! action fail or that make the result depend on execution order.
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::resources::create::{Desired, Source};
use crate::tasks::{Action, ActionKind};

/// A validation warning detected after the declarations were resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// One-based position of the offending action.
    pub action: usize,
    /// The path or URL that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(action: usize, item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action,
            item: item.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action #{} ({}): {}", self.action, self.item, self.message)
    }
}

/// Trait for action validators.
pub trait ConfigValidator {
    /// Inspect `actions` and return any warnings found.
    fn validate(&self, actions: &[Action]) -> Vec<ValidationWarning>;

    /// Short name of the check, used in debug output.
    fn name(&self) -> &'static str;
}

/// Flags destinations targeted by more than one action.
///
/// Such actions run in declaration order and the last one wins.
#[derive(Debug)]
pub struct DuplicateDestinationValidator;

impl ConfigValidator for DuplicateDestinationValidator {
    fn validate(&self, actions: &[Action]) -> Vec<ValidationWarning> {
        let mut first_seen: HashMap<&Path, usize> = HashMap::new();
        let mut warnings = Vec::new();

        for (i, action) in actions.iter().enumerate() {
            let index = i + 1;
            let dest = action.destination();
            if let Some(first) = first_seen.get(dest) {
                warnings.push(ValidationWarning::new(
                    index,
                    dest.display().to_string(),
                    format!("destination also targeted by action #{first}; the later action wins"),
                ));
            } else {
                first_seen.insert(dest, index);
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "duplicate-destinations"
    }
}

/// Flags local sources that are not regular files (yet).
#[derive(Debug)]
pub struct LocalSourceValidator;

impl ConfigValidator for LocalSourceValidator {
    fn validate(&self, actions: &[Action]) -> Vec<ValidationWarning> {
        actions
            .iter()
            .enumerate()
            .filter_map(|(i, action)| {
                let source = action.local_source()?;
                if source.is_file() {
                    return None;
                }
                let message = if source.exists() {
                    "source is not a regular file"
                } else {
                    "source file does not exist"
                };
                Some(ValidationWarning::new(
                    i + 1,
                    source.display().to_string(),
                    message,
                ))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "local-sources"
    }
}

/// Flags URL sources that are not plain HTTP(S).
#[derive(Debug)]
pub struct RemoteSourceValidator;

impl ConfigValidator for RemoteSourceValidator {
    fn validate(&self, actions: &[Action]) -> Vec<ValidationWarning> {
        actions
            .iter()
            .enumerate()
            .filter_map(|(i, action)| match &action.kind {
                ActionKind::Create(r) => match &r.desired {
                    Desired::Copy(Source::Url(url))
                        if !url.starts_with("http://") && !url.starts_with("https://") =>
                    {
                        Some(ValidationWarning::new(
                            i + 1,
                            url.clone(),
                            "URL should start with http:// or https://",
                        ))
                    }
                    _ => None,
                },
                ActionKind::FileContent(_) => None,
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "remote-sources"
    }
}

/// Run every validator over `actions` and collect the warnings.
#[must_use]
pub fn validate_actions(actions: &[Action]) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 3] = [
        &DuplicateDestinationValidator,
        &LocalSourceValidator,
        &RemoteSourceValidator,
    ];

    let mut all_warnings = Vec::new();
    for validator in validators {
        let warnings = validator.validate(actions);
        tracing::trace!("{}: {} warning(s)", validator.name(), warnings.len());
        all_warnings.extend(warnings);
    }
    all_warnings
}
