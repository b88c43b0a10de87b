//! Command injection strategies.
//!
//! Every strategy is a pure function from the client's command to a
//! [`Plan`]: what will actually be executed, and how. Nothing here spawns a
//! process, so the whole table is unit-testable.
//!
//! The regex filter and the keyword blacklist are deliberately incomplete
//! and are labeled as such.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cmdi::models::CommandType;
use crate::config::CommandInjectionConfig;
use crate::mitigation::Rejection;

static DANGEROUS_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;&|><`$\{\}\(\)\n]").expect("static pattern"));

/// Named defenses for the free-text command routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// No defense: the text goes to `sh -c`.
    Vulnerable,
    Whitelist,
    /// Weak: strips metacharacters, misses everything else.
    RegexFilter,
    EscapeShell,
    SubprocessSafe,
    LengthRestriction,
    /// Weak: substring blacklist.
    BlacklistKeywords,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::Vulnerable,
        Strategy::Whitelist,
        Strategy::RegexFilter,
        Strategy::EscapeShell,
        Strategy::SubprocessSafe,
        Strategy::LengthRestriction,
        Strategy::BlacklistKeywords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Vulnerable => "vulnerable",
            Strategy::Whitelist => "whitelist",
            Strategy::RegexFilter => "regex_filter",
            Strategy::EscapeShell => "escape_shell",
            Strategy::SubprocessSafe => "subprocess_safe",
            Strategy::LengthRestriction => "length_restriction",
            Strategy::BlacklistKeywords => "blacklist_keywords",
        }
    }

    /// Route path below `/cmdi`.
    pub fn path(&self) -> String {
        match self {
            Strategy::Vulnerable => "/vulnerable/exec".to_string(),
            other => format!("/secure/{}", other.as_str()),
        }
    }
}

/// How a command is handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Interpreted by `sh -c`.
    Shell(String),
    /// Split into words (POSIX rules) at execution time, no shell.
    Words(String),
    /// Exact argument vector.
    Argv(Vec<String>),
}

impl Invocation {
    /// Text shown back to the client as the executed command.
    pub fn display(&self) -> String {
        match self {
            Invocation::Shell(command) | Invocation::Words(command) => command.clone(),
            Invocation::Argv(argv) => argv.join(" "),
        }
    }
}

/// What a strategy decided to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub invocation: Invocation,
    /// Set when the strategy rewrote the input.
    pub sanitized: Option<String>,
    /// Set when the strategy quoted the input.
    pub escaped: Option<String>,
}

impl Plan {
    fn unchanged(invocation: Invocation) -> Self {
        Self {
            invocation,
            sanitized: None,
            escaped: None,
        }
    }
}

/// Strategy parameters taken from configuration.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    max_command_length: usize,
    blacklist: Vec<String>,
    ping_count: u32,
}

impl CommandPolicy {
    pub fn new(config: &CommandInjectionConfig) -> Self {
        Self {
            max_command_length: config.max_command_length,
            blacklist: config.blacklisted_keywords.clone(),
            ping_count: config.ping_count,
        }
    }

    /// Apply `strategy` to an already trimmed command.
    pub fn plan(&self, strategy: Strategy, command: &str) -> Result<Plan, Rejection> {
        match strategy {
            Strategy::Vulnerable => Ok(Plan::unchanged(Invocation::Shell(command.to_string()))),
            Strategy::Whitelist => {
                if CommandType::parse(command).is_none() {
                    let allowed: Vec<&str> = CommandType::ALL.iter().map(|c| c.as_str()).collect();
                    return Err(Rejection::new(
                        strategy.as_str(),
                        format!("Command not allowed. Allowed commands: {}", allowed.join(", ")),
                    ));
                }
                Ok(Plan::unchanged(Invocation::Words(command.to_string())))
            }
            Strategy::RegexFilter => {
                let sanitized = sanitize_regex(command);
                Ok(Plan {
                    invocation: Invocation::Words(sanitized.clone()),
                    sanitized: Some(sanitized),
                    escaped: None,
                })
            }
            Strategy::EscapeShell => {
                let escaped = escape_shell(command);
                Ok(Plan {
                    invocation: Invocation::Shell(format!("echo {}", escaped)),
                    sanitized: None,
                    escaped: Some(escaped),
                })
            }
            Strategy::SubprocessSafe => Ok(Plan::unchanged(Invocation::Words(command.to_string()))),
            Strategy::LengthRestriction => {
                let length = command.chars().count();
                if length > self.max_command_length {
                    return Err(Rejection::new(
                        strategy.as_str(),
                        format!(
                            "Command too long: {} characters (maximum {})",
                            length, self.max_command_length
                        ),
                    ));
                }
                Ok(Plan::unchanged(Invocation::Words(command.to_string())))
            }
            Strategy::BlacklistKeywords => {
                if let Some(keyword) = self.blacklist.iter().find(|k| command.contains(k.as_str())) {
                    return Err(Rejection::new(
                        strategy.as_str(),
                        format!("Input contains blacklisted keyword: {}", keyword),
                    ));
                }
                Ok(Plan::unchanged(Invocation::Words(command.to_string())))
            }
        }
    }

    /// Fixed argument vector for a mapped command. `args` only applies to `ping`.
    pub fn map_command(&self, command_type: CommandType, args: Option<&str>) -> Vec<String> {
        let mut argv = match command_type {
            CommandType::Ls => vec!["ls".to_string()],
            CommandType::Ping => vec!["ping".to_string(), "-c".to_string(), self.ping_count.to_string()],
            CommandType::Whoami => vec!["whoami".to_string()],
        };
        if command_type == CommandType::Ping {
            if let Some(args) = args.filter(|a| !a.is_empty()) {
                argv.push(args.to_string());
            }
        }
        argv
    }
}

/// Remove shell metacharacters.
pub fn sanitize_regex(input: &str) -> String {
    DANGEROUS_CHARS.replace_all(input, "").into_owned()
}

/// POSIX single-quote the input so the shell sees one literal word.
pub fn escape_shell(input: &str) -> String {
    // shlex only refuses NUL bytes, which cannot reach a shell argument anyway.
    shlex::try_quote(input)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| format!("'{}'", input.replace('\0', "").replace('\'', r"'\''")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "; cat /etc/passwd";

    fn policy() -> CommandPolicy {
        CommandPolicy::new(&CommandInjectionConfig::default())
    }

    #[test]
    fn test_vulnerable_passes_payload_to_shell() {
        let plan = policy().plan(Strategy::Vulnerable, PAYLOAD).unwrap();
        assert_eq!(plan.invocation, Invocation::Shell(PAYLOAD.to_string()));
    }

    #[test]
    fn test_whitelist() {
        let policy = policy();
        assert!(policy.plan(Strategy::Whitelist, "whoami").is_ok());
        let rejection = policy.plan(Strategy::Whitelist, PAYLOAD).unwrap_err();
        assert_eq!(rejection.strategy, "whitelist");
        assert!(rejection.reason.contains("ls, ping, whoami"));
    }

    #[test]
    fn test_regex_filter_strips_metacharacters() {
        let plan = policy().plan(Strategy::RegexFilter, "ls; rm -rf $(pwd) | cat").unwrap();
        assert_eq!(plan.sanitized.as_deref(), Some("ls rm -rf pwd  cat"));
        assert_eq!(plan.invocation, Invocation::Words("ls rm -rf pwd  cat".to_string()));
    }

    #[test]
    fn test_escape_shell_quotes_input() {
        let plan = policy().plan(Strategy::EscapeShell, "hi; id").unwrap();
        assert_eq!(plan.escaped.as_deref(), Some("'hi; id'"));
        assert_eq!(plan.invocation, Invocation::Shell("echo 'hi; id'".to_string()));
    }

    #[test]
    fn test_length_restriction() {
        let policy = policy();
        assert!(policy.plan(Strategy::LengthRestriction, "ls -la").is_ok());
        assert!(policy
            .plan(Strategy::LengthRestriction, "ls -la /var/log/nginx/access.log")
            .is_err());
    }

    #[test]
    fn test_blacklist_keywords() {
        let policy = policy();
        let rejection = policy.plan(Strategy::BlacklistKeywords, PAYLOAD).unwrap_err();
        assert_eq!(rejection.reason, "Input contains blacklisted keyword: ;");
        assert!(policy.plan(Strategy::BlacklistKeywords, "ls -la").is_ok());
        // Substring match: "rm" inside a harmless word is refused too.
        assert!(policy.plan(Strategy::BlacklistKeywords, "echo format").is_err());
    }

    #[test]
    fn test_every_secure_strategy_refuses_or_neutralizes_payload() {
        let policy = policy();
        for strategy in Strategy::ALL {
            match policy.plan(strategy, PAYLOAD) {
                Ok(plan) => match plan.invocation {
                    Invocation::Shell(ref command) => match strategy {
                        Strategy::Vulnerable => assert_eq!(command, PAYLOAD),
                        Strategy::EscapeShell => {
                            assert_eq!(*command, format!("echo {}", escape_shell(PAYLOAD)))
                        }
                        other => panic!("{:?} reached the shell", other),
                    },
                    Invocation::Words(_) | Invocation::Argv(_) => {}
                },
                Err(rejection) => assert_eq!(rejection.strategy, strategy.as_str()),
            }
        }
    }

    #[test]
    fn test_map_command() {
        let policy = policy();
        assert_eq!(
            policy.map_command(CommandType::Ping, Some("example.com")),
            vec!["ping", "-c", "4", "example.com"]
        );
        assert_eq!(policy.map_command(CommandType::Ls, Some("/etc")), vec!["ls"]);
        assert_eq!(policy.map_command(CommandType::Whoami, None), vec!["whoami"]);
    }

    #[test]
    fn test_paths() {
        assert_eq!(Strategy::Vulnerable.path(), "/vulnerable/exec");
        assert_eq!(Strategy::RegexFilter.path(), "/secure/regex_filter");
    }
}
