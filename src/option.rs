/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use crate::UciError;

/// The type of a configurable engine option, as declared with `type <kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// A boolean toggle.
    Check,

    /// An integer within `[min, max]`.
    Spin,

    /// One of a fixed list of strings.
    Combo,

    /// An action with no value.
    Button,

    /// Free-form text.
    String,

    /// A kind this client does not recognize, or an empty string if the declaration had no `type`.
    Unknown(String),
}

impl OptionKind {
    /// Parses the word following `type` in an option declaration.
    ///
    /// Never fails; unrecognized words become [`OptionKind::Unknown`].
    pub fn from_word(word: &str) -> Self {
        match word {
            "check" => Self::Check,
            "spin" => Self::Spin,
            "combo" => Self::Combo,
            "button" => Self::Button,
            "string" => Self::String,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Check => "check",
            Self::Spin => "spin",
            Self::Combo => "combo",
            Self::Button => "button",
            Self::String => "string",
            Self::Unknown(word) => word.as_str(),
        })
    }
}

/// A value for an engine option.
///
/// Renders to protocol text via [`fmt::Display`]: booleans as `true`/`false`,
/// integers in decimal, and strings unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Int(n) => n.fmt(f),
            Self::Str(s) => s.fmt(f),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

macro_rules! impl_from_int {
    ($($int:ty),*) => {
        $(
            impl From<$int> for OptionValue {
                fn from(value: $int) -> Self {
                    Self::Int(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// A configurable engine parameter, as declared by the engine during the `uci` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UciOption {
    /// Name of the option. May contain spaces.
    pub name: String,

    /// The option's type.
    pub kind: OptionKind,

    /// Default value, typed according to `kind`. Always `None` for buttons.
    pub default: Option<OptionValue>,

    /// Lower bound of a `spin` option. Zero if not declared.
    pub min: i64,

    /// Upper bound of a `spin` option. Zero if not declared.
    pub max: i64,

    /// Allowed values of a `combo` option, in declaration order.
    pub vars: Vec<String>,
}

impl Default for OptionKind {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl UciOption {
    /// Parses an option declaration (the text following `option `), such as
    /// `name Threads type spin default 1 min 1 max 512`.
    ///
    /// Parsing is lenient: anything that cannot be understood is left at its zero value,
    /// so a single odd declaration never prevents the rest of the handshake from being read.
    /// Use [`str::parse`] for a strict parse.
    pub fn parse(declaration: &str) -> Self {
        Self::parse_checked(declaration).0
    }

    /// Lenient parse, also reporting whether the declaration was well-formed.
    pub(crate) fn parse_checked(declaration: &str) -> (Self, bool) {
        let mut option = Self::default();
        let mut clean = true;

        // The name runs up to the first ` type `, so it may contain spaces
        let Some((_, named)) = declaration.split_once("name ") else {
            return (option, false);
        };
        let split = named
            .split_once(" type ")
            .or_else(|| Some((named.trim_end().strip_suffix(" type")?, "")));
        let Some((name, rest)) = split else {
            return (option, false);
        };
        option.name = name.trim().to_string();

        let mut tokens = rest.split_whitespace();
        option.kind = OptionKind::from_word(tokens.next().unwrap_or_default());
        if matches!(option.kind, OptionKind::Unknown(_)) {
            clean = false;
        }

        let mut default = None;
        let mut min = None;
        let mut max = None;
        while let Some(token) = tokens.next() {
            match token {
                // `default` may legitimately be the last token of an empty string option
                "default" if default.is_none() => default = Some(tokens.next().unwrap_or_default()),
                "min" if min.is_none() => min = tokens.next(),
                "max" if max.is_none() => max = tokens.next(),
                "var" => option.vars.extend(tokens.next().map(String::from)),
                _ => {}
            }
        }

        let mut int = |raw: Option<&str>| match raw.map(str::parse::<i64>) {
            Some(Ok(n)) => Some(n),
            Some(Err(_)) => {
                clean = false;
                None
            }
            None => None,
        };

        option.min = int(min).unwrap_or_default();
        option.max = int(max).unwrap_or_default();

        option.default = match option.kind {
            OptionKind::Button => None,
            OptionKind::Spin => int(default).map(OptionValue::Int),
            OptionKind::Check => match default {
                Some("true") => Some(OptionValue::Bool(true)),
                Some("false") => Some(OptionValue::Bool(false)),
                Some(_) => {
                    clean = false;
                    None
                }
                None => None,
            },
            _ => default.map(OptionValue::from),
        };

        (option, clean)
    }

    /// Interprets `raw` as a value for this option, based on its [`OptionKind`].
    ///
    /// `check` options yield booleans and `spin` options yield integers, if `raw` can be read as one.
    /// Everything else is passed through as a string.
    pub fn typed_value(&self, raw: &str) -> OptionValue {
        let typed = match self.kind {
            OptionKind::Check => raw.parse().map(OptionValue::Bool).ok(),
            OptionKind::Spin => raw.parse().map(OptionValue::Int).ok(),
            _ => None,
        };

        typed.unwrap_or_else(|| OptionValue::from(raw))
    }
}

impl FromStr for UciOption {
    type Err = UciError;

    /// Strictly parses an option declaration, failing on anything [`UciOption::parse`] would have to guess at.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_checked(s) {
            (option, true) => Ok(option),
            (_, false) => Err(UciError::MalformedOption {
                declaration: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UciOption {
    /// Formats this option the way an engine declares it, without the leading `option`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name {} type {}", self.name, self.kind)?;

        if let Some(default) = &self.default {
            write!(f, " default {default}")?;
        }

        if self.kind == OptionKind::Spin {
            write!(f, " min {} max {}", self.min, self.max)?;
        }

        for var in &self.vars {
            write!(f, " var {var}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin() {
        let opt = UciOption::parse("name Threads type spin default 1 min 1 max 512");
        assert_eq!(
            opt,
            UciOption {
                name: String::from("Threads"),
                kind: OptionKind::Spin,
                default: Some(OptionValue::Int(1)),
                min: 1,
                max: 512,
                vars: vec![],
            }
        );
    }

    #[test]
    fn test_check() {
        let opt: UciOption = "name Ponder type check default false".parse().unwrap();
        assert_eq!(opt.name, "Ponder");
        assert_eq!(opt.kind, OptionKind::Check);
        assert_eq!(opt.default, Some(OptionValue::Bool(false)));
        assert_eq!((opt.min, opt.max), (0, 0));
        assert!(opt.vars.is_empty());
    }

    #[test]
    fn test_combo() {
        let decl = "name Analysis Contempt type combo default Both var Off var White var Black var Both";
        let opt: UciOption = decl.parse().unwrap();
        assert_eq!(opt.name, "Analysis Contempt");
        assert_eq!(opt.kind, OptionKind::Combo);
        assert_eq!(opt.default, Some(OptionValue::from("Both")));
        assert_eq!(opt.vars, ["Off", "White", "Black", "Both"]);
    }

    #[test]
    fn test_button() {
        let opt: UciOption = "name Clear Hash type button".parse().unwrap();
        assert_eq!(opt.name, "Clear Hash");
        assert_eq!(opt.kind, OptionKind::Button);
        assert_eq!(opt.default, None);
    }

    #[test]
    fn test_string() {
        let opt: UciOption = "name SyzygyPath type string default <empty>".parse().unwrap();
        assert_eq!(opt.name, "SyzygyPath");
        assert_eq!(opt.kind, OptionKind::String);
        assert_eq!(opt.default, Some(OptionValue::from("<empty>")));

        // Some engines declare an empty default by ending the line after `default`
        let opt: UciOption = "name Debug Log File type string default".parse().unwrap();
        assert_eq!(opt.name, "Debug Log File");
        assert_eq!(opt.default, Some(OptionValue::from("")));
    }

    #[test]
    fn test_malformed_degrades() {
        // No `type` at all
        let (opt, clean) = UciOption::parse_checked("name Hash spin default 16");
        assert!(!clean);
        assert_eq!(opt, UciOption::default());

        // Unparseable numbers are zeroed, but the rest survives
        let decl = "name Hash type spin default lots min 1 max many";
        let (opt, clean) = UciOption::parse_checked(decl);
        assert!(!clean);
        assert_eq!(opt.name, "Hash");
        assert_eq!(opt.kind, OptionKind::Spin);
        assert_eq!(opt.default, None);
        assert_eq!((opt.min, opt.max), (1, 0));

        // Unknown kinds are kept for forward-compatibility
        let (opt, clean) = UciOption::parse_checked("name Future type slider default 3");
        assert!(!clean);
        assert_eq!(opt.kind, OptionKind::Unknown(String::from("slider")));
        assert_eq!(opt.default, Some(OptionValue::from("3")));

        // A missing kind still keeps the name
        let (opt, clean) = UciOption::parse_checked("name Contempt Mode type");
        assert!(!clean);
        assert_eq!(opt.name, "Contempt Mode");
        assert_eq!(opt.kind, OptionKind::Unknown(String::new()));
        assert_eq!(opt.default, None);

        assert!("name Hash type spin default lots".parse::<UciOption>().is_err());
        assert!("name Contempt Mode type".parse::<UciOption>().is_err());
    }

    #[test]
    fn test_display() {
        let decl = "name Threads type spin default 1 min 1 max 512";
        assert_eq!(UciOption::parse(decl).to_string(), decl);

        let decl = "name Style type combo default Normal var Solid var Normal var Risky";
        assert_eq!(UciOption::parse(decl).to_string(), decl);
    }

    #[test]
    fn test_typed_value() {
        let check = UciOption::parse("name Ponder type check default false");
        assert_eq!(check.typed_value("true"), OptionValue::Bool(true));

        let spin = UciOption::parse("name Hash type spin default 16 min 1 max 1024");
        assert_eq!(spin.typed_value("256"), OptionValue::Int(256));
        assert_eq!(spin.typed_value("big"), OptionValue::from("big"));

        let string = UciOption::parse("name EvalFile type string default nn.nnue");
        assert_eq!(string.typed_value("123"), OptionValue::from("123"));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(OptionValue::from(true).to_string(), "true");
        assert_eq!(OptionValue::from(false).to_string(), "false");
        assert_eq!(OptionValue::from(-42).to_string(), "-42");
        assert_eq!(OptionValue::from("a b c").to_string(), "a b c");
    }
}
