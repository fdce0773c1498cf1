//! User-supplied references and requested actions, validated before any remote call

use std::fmt;

use crate::domain::DomainError;

/// How the user identified a system on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SystemRef {
    Name(String),
    Uuid(String),
}

impl SystemRef {
    /// Build a reference from the mutually exclusive `--name` / `--uuid` options.
    pub fn from_options(name: Option<&str>, uuid: Option<&str>) -> Result<Self, DomainError> {
        match (name, uuid) {
            (Some(name), Some(uuid)) => Err(DomainError::ConflictingSystemRef {
                name: name.to_string(),
                uuid: uuid.to_string(),
            }),
            (Some(name), None) => Ok(Self::Name(name.to_string())),
            (None, Some(uuid)) => Ok(Self::Uuid(uuid.to_string())),
            (None, None) => Err(DomainError::MissingSystemRef),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Uuid(_) => None,
        }
    }

    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::Uuid(uuid) => Some(uuid),
            Self::Name(_) => None,
        }
    }

    /// The identifying string, whichever form was given.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(s) | Self::Uuid(s) => s,
        }
    }
}

impl fmt::Display for SystemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote package operation. Each variant produces exactly one task on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageAction {
    Install(Vec<String>),
    Remove(Vec<String>),
    /// Empty list means "update everything".
    Update(Vec<String>),
    InstallGroups(Vec<String>),
    RemoveGroups(Vec<String>),
}

/// Raw package options as they come off the command line.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub install: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
    pub update: Option<Vec<String>>,
    pub update_all: bool,
    pub install_groups: Option<Vec<String>>,
    pub remove_groups: Option<Vec<String>>,
}

impl PackageAction {
    /// Select the single requested action, if any.
    ///
    /// Returns `Ok(None)` when no action was requested (plain package listing).
    /// `--all` must come with a bare `--update`; names alongside it are rejected.
    pub fn from_options(opts: PackageOptions) -> Result<Option<Self>, DomainError> {
        let requested = [
            opts.install.is_some(),
            opts.remove.is_some(),
            opts.update.is_some() || opts.update_all,
            opts.install_groups.is_some(),
            opts.remove_groups.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if requested > 1 {
            return Err(DomainError::ConflictingPackageActions);
        }

        let action = if let Some(names) = opts.install {
            Self::Install(non_empty(names, "install")?)
        } else if let Some(names) = opts.remove {
            Self::Remove(non_empty(names, "remove")?)
        } else if opts.update_all {
            let named = opts.update.map(clean_list).unwrap_or_default();
            if !named.is_empty() {
                return Err(DomainError::UpdateAllWithNames);
            }
            Self::Update(Vec::new())
        } else if let Some(names) = opts.update {
            Self::Update(non_empty(names, "update")?)
        } else if let Some(names) = opts.install_groups {
            Self::InstallGroups(non_empty(names, "install_groups")?)
        } else if let Some(names) = opts.remove_groups {
            Self::RemoveGroups(non_empty(names, "remove_groups")?)
        } else {
            return Ok(None);
        };
        Ok(Some(action))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Remove(_) => "remove",
            Self::Update(_) => "update",
            Self::InstallGroups(_) => "install_groups",
            Self::RemoveGroups(_) => "remove_groups",
        }
    }

    /// Package or group names carried by the action.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Install(n)
            | Self::Remove(n)
            | Self::Update(n)
            | Self::InstallGroups(n)
            | Self::RemoveGroups(n) => n,
        }
    }

    /// True when the names refer to package groups rather than packages.
    pub fn targets_groups(&self) -> bool {
        matches!(self, Self::InstallGroups(_) | Self::RemoveGroups(_))
    }
}

fn non_empty(names: Vec<String>, action: &'static str) -> Result<Vec<String>, DomainError> {
    let names = clean_list(names);
    if names.is_empty() {
        Err(DomainError::EmptyPackageList { action })
    } else {
        Ok(names)
    }
}

/// Trim entries of a comma-separated option and drop the empty ones.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Which entitlements to drop from a system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeTarget {
    All,
    Serial(String),
    Entitlement(String),
}
