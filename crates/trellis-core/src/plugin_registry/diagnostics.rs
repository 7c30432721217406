use std::fmt;

/// Severity of a resolution diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The fault was recovered from; the offending descriptor was disabled
    /// or the offending element skipped.
    Warning,
    /// The whole registry could not be resolved.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Kinds of diagnostics produced while resolving a registry.
///
/// [`code`] returns the stable message identifier for each kind.
///
/// [`code`]: DiagnosticKind::code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A fragment is missing a required attribute.
    FragmentMissingAttribute,
    /// A fragment is missing its id or name.
    FragmentMissingIdName,
    /// A fragment targets a plugin version not present in the registry.
    FragmentTargetMissing,
    /// A plugin descriptor is missing a required attribute.
    PluginMissingAttribute,
    /// A plugin descriptor is missing its id or name.
    PluginMissingIdName,
    /// A prerequisite names a plugin that is missing or disabled.
    PrerequisiteDisabled,
    /// The prerequisite graph loops back on itself.
    PrerequisiteLoop,
    /// No descriptor satisfies a prerequisite together with the constraints
    /// already accepted for its target.
    UnsatisfiedPrerequisite,
    /// An extension targets an unknown plugin or extension point.
    ExtensionPointUnknown,
    /// An extension targets an extension point in a disabled plugin.
    ExtensionPointDisabled,
    /// No root plugins could be found; nothing was resolved.
    UnableToResolve,
}

impl DiagnosticKind {
    /// The stable message identifier for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::FragmentMissingAttribute => "parse.fragmentMissingAttr",
            DiagnosticKind::FragmentMissingIdName => "parse.fragmentMissingIdName",
            DiagnosticKind::FragmentTargetMissing => "parse.missingFragmentPd",
            DiagnosticKind::PluginMissingAttribute => "parse.pluginMissingAttr",
            DiagnosticKind::PluginMissingIdName => "parse.pluginMissingIdName",
            DiagnosticKind::PrerequisiteDisabled => "parse.prereqDisabled",
            DiagnosticKind::PrerequisiteLoop => "parse.prereqLoop",
            DiagnosticKind::UnsatisfiedPrerequisite => "parse.unsatisfiedPrereq",
            DiagnosticKind::ExtensionPointUnknown => "parse.extPointUnknown",
            DiagnosticKind::ExtensionPointDisabled => "parse.extPointDisabled",
            DiagnosticKind::UnableToResolve => "plugin.unableToResolve",
        }
    }
}

/// One recorded resolution fault.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Create a warning-severity diagnostic.
    pub fn warning(kind: DiagnosticKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message,
        }
    }

    /// Create an error-severity diagnostic.
    pub fn error(kind: DiagnosticKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.code(), self.message)
    }
}

/// Append-only accumulator of diagnostics, returned by value from `resolve`.
///
/// Diagnostics appear in the order they were produced, which is
/// deterministic for a given registry.
#[derive(Debug, Default)]
pub struct ResolutionStatus {
    diagnostics: Vec<Diagnostic>,
}

impl ResolutionStatus {
    /// Create an empty (OK) status.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no diagnostic was recorded.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Record a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// All recorded diagnostics, in production order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True iff at least one diagnostic of the given kind was recorded.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return write!(f, "ok");
        }
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
