//! Pre-flight check for the external tools the builder shells out to.

use crate::error::BuildError;

/// An external program and the distribution package that provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub program: &'static str,
    pub package: &'static str,
}

/// Tools every tarball build needs.
pub const DEPENDENCIES: &[Dependency] = &[
    Dependency {
        program: "hg",
        package: "mercurial",
    },
    Dependency {
        program: "tar",
        package: "tar",
    },
];

/// Needed in addition when the layout runs a post-checkout step.
pub const POST_CHECKOUT_DEPENDENCY: Dependency = Dependency {
    program: "python",
    package: "python",
};

/// Ensure every dependency resolves to an executable.
///
/// Absolute programs are checked in place; anything else is looked up on
/// `PATH`.
///
/// # Errors
///
/// Returns [`BuildError::DependencyNotFound`] for the first missing tool.
pub fn check_dependencies(deps: &[Dependency]) -> Result<(), BuildError> {
    for dep in deps {
        if which::which(dep.program).is_err() {
            return Err(BuildError::DependencyNotFound {
                program: dep.program.to_string(),
                package: dep.package.to_string(),
            });
        }
        tracing::debug!(program = dep.program, "dependency found");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_dependency_passes() {
        let deps = [Dependency {
            program: "sh",
            package: "dash",
        }];
        assert!(check_dependencies(&deps).is_ok());
    }

    #[test]
    fn test_missing_dependency_names_package() {
        let deps = [
            Dependency {
                program: "sh",
                package: "dash",
            },
            Dependency {
                program: "srcball-missing-tool",
                package: "srcball-tools",
            },
        ];
        let err = check_dependencies(&deps).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Dependency not found: srcball-missing-tool. Please install package srcball-tools"
        );
    }

    #[test]
    fn test_missing_absolute_dependency() {
        let deps = [Dependency {
            program: "/nonexistent/bin/hg",
            package: "mercurial",
        }];
        assert!(matches!(
            check_dependencies(&deps),
            Err(BuildError::DependencyNotFound { .. })
        ));
    }
}
