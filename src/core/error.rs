use thiserror::Error;

/// Core error types for nspolicy
#[derive(Debug, Error)]
pub enum Error {
    /// Required environment variable is unset or empty
    #[error("required environment variable {var} is not set")]
    MissingEnv { var: String },

    /// Environment variable holds a malformed CIDR range
    #[error("environment variable {var} has invalid CIDR \"{value}\": {source}")]
    InvalidCidr {
        var: String,
        value: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    /// iptables command execution failed
    #[error("iptables error: {message}")]
    Iptables { message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an error reported by the iptables backend.
    pub fn iptables(err: Box<dyn std::error::Error>) -> Self {
        Error::Iptables {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// Database of iptables error patterns and their translations
pub struct IptablesErrorPattern;

impl IptablesErrorPattern {
    /// Matches an error message against known patterns and returns a user-friendly translation.
    pub fn match_error(msg: &str) -> ErrorTranslation {
        let lower = msg.to_lowercase();

        // Permission errors
        if lower.contains("permission denied") || lower.contains("operation not permitted") {
            return ErrorTranslation::new("Insufficient permissions to modify the filter table")
                .with_suggestion("Run the sidecar as root or grant it CAP_NET_ADMIN")
                .with_suggestion(
                    "In Kubernetes, set securityContext.capabilities.add: [\"NET_ADMIN\"]",
                )
                .with_suggestion("Verify access with: iptables -L INPUT");
        }

        // Missing iptables binary
        if lower.contains("command not found")
            || lower.contains("no such file")
            || lower.contains("unable to find iptables")
        {
            return ErrorTranslation::new("iptables is not installed or not found in PATH")
                .with_suggestion("Install iptables: apk add iptables  (Alpine)")
                .with_suggestion("Or: apt-get install iptables  (Debian/Ubuntu)")
                .with_suggestion("Ensure the sidecar image ships the iptables userspace tools");
        }

        // Missing kernel support
        if lower.contains("can't initialize iptables table")
            || lower.contains("table does not exist")
        {
            return ErrorTranslation::new("The kernel filter table is unavailable")
                .with_suggestion("Check kernel modules: lsmod | grep ip_tables")
                .with_suggestion("Load the module on the host: modprobe ip_tables");
        }

        // Chain errors
        if lower.contains("no chain/target/match by that name") {
            return ErrorTranslation::new("Filter chain or target not found")
                .with_suggestion("INPUT and OUTPUT are built into the filter table; check the chain name")
                .with_suggestion("List chains with: iptables -S");
        }

        // Concurrent rule-set mutation
        if lower.contains("resource temporarily unavailable") || lower.contains("xtables lock") {
            return ErrorTranslation::new("Another process holds the iptables lock")
                .with_suggestion("A concurrent iptables invocation is mutating the rule set")
                .with_suggestion("The supervisor will restart this sidecar; the full sequence is re-run");
        }

        // Malformed rule specification
        if lower.contains("bad argument")
            || (lower.contains("invalid")
                && (lower.contains("ip") || lower.contains("address") || lower.contains("mask")))
        {
            return ErrorTranslation::new("Invalid rule specification")
                .with_suggestion("Use proper CIDR notation: 10.0.0.0/8 or 10.1.2.0/24")
                .with_suggestion("Check the ip_range_cluster and ip_range_ns values");
        }

        // Generic fallback
        ErrorTranslation::new(format!("Filter table error: {msg}"))
            .with_suggestion("Check the detailed error message for more information")
            .with_suggestion("Inspect the current rules with: iptables -S")
    }
}
