use std::fmt;
use std::path::PathBuf;

use crate::error::DeployError;
use crate::plan::PlanWarning;

/// One call the reconciler issued against a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChange {
    Clients {
        group: String,
        before: Vec<String>,
        after: Vec<String>,
    },
    Stream {
        group: String,
        before: String,
        after: String,
    },
    Name {
        group: String,
        before: String,
        after: String,
    },
}

impl fmt::Display for GroupChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupChange::Clients { group, before, after } => write!(
                f,
                "group {}: clients [{}] -> [{}]",
                group,
                before.join(", "),
                after.join(", ")
            ),
            GroupChange::Stream { group, before, after } => {
                write!(f, "group {}: stream {} -> {}", group, before, after)
            }
            GroupChange::Name { group, before, after } => {
                write!(f, "group {}: name {:?} -> {:?}", group, before, after)
            }
        }
    }
}

/// Outcome of one deployment run
#[derive(Debug, Default)]
pub struct DeployReport {
    /// Artifacts written, in write order
    pub written: Vec<PathBuf>,
    /// Services restarted successfully
    pub restarted: Vec<String>,
    /// Room devices whose client was ensured running
    pub launched: Vec<String>,
    /// Client ids given their room's display name
    pub renamed_clients: Vec<String>,
    pub group_changes: Vec<GroupChange>,
    pub errors: Vec<DeployError>,
    pub warnings: Vec<PlanWarning>,
}

impl DeployReport {
    pub fn fatal(&self) -> impl Iterator<Item = &DeployError> {
        self.errors.iter().filter(|e| e.is_fatal())
    }

    pub fn soft(&self) -> impl Iterator<Item = &DeployError> {
        self.errors.iter().filter(|e| !e.is_fatal())
    }

    /// True when no fatal error occurred
    pub fn is_success(&self) -> bool {
        self.fatal().next().is_none()
    }

    pub(crate) fn record(&mut self, error: DeployError) {
        if error.is_fatal() {
            tracing::error!(%error, "deployment step failed");
        } else {
            tracing::warn!(%error, "deployment step incomplete");
        }
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, warning: PlanWarning) {
        tracing::warn!(%warning, "plan adjusted");
        self.warnings.push(warning);
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.written {
            writeln!(f, "wrote {}", path.display())?;
        }
        for service in &self.restarted {
            writeln!(f, "restarted {}", service)?;
        }
        if !self.launched.is_empty() {
            writeln!(f, "clients running: {}", self.launched.join(", "))?;
        }
        for client in &self.renamed_clients {
            writeln!(f, "renamed client {}", client)?;
        }
        if self.group_changes.is_empty() {
            writeln!(f, "groups already up to date")?;
        }
        for change in &self.group_changes {
            writeln!(f, "{}", change)?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        for error in &self.errors {
            let level = if error.is_fatal() { "error" } else { "warning" };
            writeln!(f, "{}: {}", level, error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_ignores_soft_errors() {
        let mut report = DeployReport::default();
        report.record(DeployError::ReconciliationTimeout {
            missing: vec!["room_bath".to_string()],
        });
        assert!(report.is_success());
        assert_eq!(report.soft().count(), 1);

        report.record(DeployError::process("snapserver", "exit status 1"));
        assert!(!report.is_success());
        assert_eq!(report.fatal().count(), 1);
    }

    #[test]
    fn test_display_lists_changes() {
        let report = DeployReport {
            written: vec![PathBuf::from("/etc/asound.conf")],
            group_changes: vec![GroupChange::Stream {
                group: "g1".to_string(),
                before: "default".to_string(),
                after: "Spotify Haus".to_string(),
            }],
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("wrote /etc/asound.conf\n"));
        assert!(text.contains("group g1: stream default -> Spotify Haus\n"));
        assert!(!text.contains("already up to date"));
    }
}
