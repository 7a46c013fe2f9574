//! Typed shell-command construction (C4), replacing the teacher's ad-hoc
//! `format!("claude {}", args.join(" "))` string building with a builder
//! that owns quoting in one place.

struct Arg {
    value: String,
    raw: bool,
}

pub struct CommandBuilder {
    program: String,
    args: Vec<Arg>,
}

impl CommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: arg.into(),
            raw: false,
        });
        self
    }

    /// An argument emitted verbatim, unquoted — for shell constructs like
    /// `"$NEW_ID"` that `quote()` would otherwise wrap in single quotes and
    /// break expansion of.
    pub fn raw_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: arg.into(),
            raw: true,
        });
        self
    }

    pub fn flag_if(mut self, cond: bool, flag: &str) -> Self {
        if cond {
            self.args.push(Arg {
                value: flag.to_string(),
                raw: false,
            });
        }
        self
    }

    pub fn option_if(mut self, value: Option<&str>, flag: &str) -> Self {
        if let Some(v) = value {
            self.args.push(Arg {
                value: flag.to_string(),
                raw: false,
            });
            self.args.push(Arg {
                value: v.to_string(),
                raw: false,
            });
        }
        self
    }

    pub fn build(self) -> String {
        let mut parts = vec![quote(&self.program)];
        parts.extend(self.args.iter().map(|a| {
            if a.raw {
                a.value.clone()
            } else {
                quote(&a.value)
            }
        }));
        parts.join(" ")
    }
}

/// POSIX single-quote escaping. A token made up only of characters that
/// never need escaping in a shell word is left bare for readability
/// (matches the look of the teacher's hand-built command strings); anything
/// else is wrapped in single quotes with embedded quotes turned into
/// `'\''`.
pub fn quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_/.=:".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
