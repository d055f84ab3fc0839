//! Argument splitter: raw argv → wrapper args + native command line.

use std::path::Path;

/// Token separating wrapper options from the native command line.
pub const SEPARATOR: &str = "--";

/// The invocation split into the part the wrapper owns and the part it
/// forwards to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    /// Program name as invoked (argv[0]).
    pub program: String,
    /// Wrapper-owned tokens, program name excluded.
    pub wrapper_args: Vec<String>,
    /// Native command followed by its arguments. May be empty.
    pub native_args: Vec<String>,
    /// True when invoked under the native alias name.
    pub aliased: bool,
}

/// Split tokens at the first exact `--`.
///
/// Everything before the separator is wrapper-owned, everything after it is
/// the native command line. Without a separator all tokens belong to the
/// wrapper and the native command line is empty.
pub fn split_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    match args.iter().position(|a| a == SEPARATOR) {
        Some(idx) => (args[..idx].to_vec(), args[idx + 1..].to_vec()),
        None => (args.to_vec(), Vec::new()),
    }
}

impl InvocationSpec {
    /// Build the invocation from the full process argv.
    ///
    /// When the basename of `argv[0]` equals `native_name` the wrapper is
    /// shadowing the real command: nothing is split and the whole argv
    /// (basename first) is the native command line.
    pub fn from_argv(argv: &[String], native_name: &str) -> Self {
        let program = argv.first().cloned().unwrap_or_default();
        let exe_name = Path::new(&program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rest = argv.get(1..).unwrap_or_default();

        if !exe_name.is_empty() && exe_name == native_name {
            let mut native_args = Vec::with_capacity(argv.len());
            native_args.push(exe_name);
            native_args.extend(rest.iter().cloned());
            return Self {
                program,
                wrapper_args: Vec::new(),
                native_args,
                aliased: true,
            };
        }

        let (wrapper_args, native_args) = split_args(rest);
        Self {
            program,
            wrapper_args,
            native_args,
            aliased: false,
        }
    }

    /// Native command and its arguments, if any command was given.
    pub fn command(&self) -> Option<(&str, &[String])> {
        self.native_args
            .split_first()
            .map(|(cmd, args)| (cmd.as_str(), args))
    }

    /// Arguments to hand to the flag parser: program name plus wrapper tokens.
    pub fn parser_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.wrapper_args.len() + 1);
        args.push(self.program.clone());
        args.extend(self.wrapper_args.iter().cloned());
        args
    }
}
