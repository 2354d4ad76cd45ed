//! Word Expansion
//!
//! Turns raw [`Word`] tokens into the concrete strings that make up an
//! argv. The policy is deliberately small:
//!
//! - quote delimiters are already stripped by the lexer
//! - an unquoted leading `~` becomes the home directory
//! - `$NAME` and `${NAME}` are substituted from the execution context
//!   (falling back to the process environment, then to the empty string),
//!   except inside single quotes
//!
//! No arithmetic, command, or glob expansion happens here.

use crate::ast::Word;
use crate::interpreter::ExecContext;

/// Expand one word into its final argv string.
pub fn expand_word(word: &Word, ctx: &ExecContext) -> String {
    let mut text = word.text.clone();
    if !word.single_quoted {
        text = expand_vars(&text, ctx);
    }
    if !word.quoted {
        text = expand_tilde(&text, ctx);
    }
    text
}

/// Expand a full argv, dropping words that expand to nothing.
///
/// An unquoted `$UNSET` contributes no argument, matching common shell
/// field-splitting behavior for empty expansions.
pub fn expand_argv(words: &[Word], ctx: &ExecContext) -> Vec<String> {
    words
        .iter()
        .map(|w| (expand_word(w, ctx), w.quoted))
        .filter(|(text, quoted)| *quoted || !text.is_empty())
        .map(|(text, _)| text)
        .collect()
}

/// Substitute a leading `~` with the home directory.
fn expand_tilde(text: &str, ctx: &ExecContext) -> String {
    match text.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match ctx.home() {
            Some(home) => format!("{}{}", home.display(), rest),
            None => text.to_string(),
        },
        _ => text.to_string(),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Substitute `$NAME` and `${NAME}` occurrences.
fn expand_vars(text: &str, ctx: &ExecContext) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed && !name.is_empty() && name.chars().all(is_name_char) {
                    result.push_str(&ctx.var(&name).unwrap_or_default());
                } else {
                    // Not a variable reference after all; keep it literal.
                    result.push_str("${");
                    result.push_str(&name);
                    if closed {
                        result.push('}');
                    }
                }
            }
            Some(&c) if is_name_start(c) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                result.push_str(&ctx.var(&name).unwrap_or_default());
            }
            _ => result.push('$'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Word;

    fn ctx_with(vars: &[(&str, &str)]) -> ExecContext {
        let mut ctx = ExecContext::root().unwrap().subshell();
        for &(name, value) in vars {
            ctx.set_var(name, value);
        }
        ctx
    }

    fn word(s: &str) -> Word {
        Word::new(s)
    }

    #[test]
    fn test_literal_word() {
        let ctx = ctx_with(&[]);
        assert_eq!(expand_word(&word("hello"), &ctx), "hello");
    }

    #[test]
    fn test_variable_expansion() {
        let ctx = ctx_with(&[("GREETING", "hi")]);
        assert_eq!(expand_word(&word("$GREETING"), &ctx), "hi");
        assert_eq!(expand_word(&word("${GREETING}!"), &ctx), "hi!");
        assert_eq!(expand_word(&word("say-$GREETING-now"), &ctx), "say-hi-now");
    }

    #[test]
    fn test_unset_variable_is_empty() {
        let ctx = ctx_with(&[]);
        assert_eq!(expand_word(&word("$SHOAL_TEST_UNSET_XYZ"), &ctx), "");
    }

    #[test]
    fn test_environment_fallback() {
        std::env::set_var("SHOAL_TEST_FALLBACK", "from-env");
        let ctx = ctx_with(&[]);
        assert_eq!(expand_word(&word("$SHOAL_TEST_FALLBACK"), &ctx), "from-env");
    }

    #[test]
    fn test_context_shadows_environment() {
        std::env::set_var("SHOAL_TEST_SHADOW", "from-env");
        let ctx = ctx_with(&[("SHOAL_TEST_SHADOW", "from-ctx")]);
        assert_eq!(expand_word(&word("$SHOAL_TEST_SHADOW"), &ctx), "from-ctx");
    }

    #[test]
    fn test_dollar_literal_cases() {
        let ctx = ctx_with(&[]);
        assert_eq!(expand_word(&word("$"), &ctx), "$");
        assert_eq!(expand_word(&word("a$ b"), &ctx), "a$ b");
        assert_eq!(expand_word(&word("${}"), &ctx), "${}");
    }

    #[test]
    fn test_single_quote_suppresses_vars() {
        let ctx = ctx_with(&[("X", "1")]);
        let mut w = word("$X");
        w.quoted = true;
        w.single_quoted = true;
        assert_eq!(expand_word(&w, &ctx), "$X");
    }

    #[test]
    fn test_double_quote_expands_vars() {
        let ctx = ctx_with(&[("X", "1")]);
        let mut w = word("$X");
        w.quoted = true;
        assert_eq!(expand_word(&w, &ctx), "1");
    }

    #[test]
    fn test_tilde_expansion() {
        let ctx = ctx_with(&[]);
        if let Some(home) = ctx.home() {
            assert_eq!(expand_word(&word("~"), &ctx), home.display().to_string());
            assert_eq!(
                expand_word(&word("~/notes"), &ctx),
                format!("{}/notes", home.display())
            );
        }
        // ~user and mid-word tildes stay literal.
        assert_eq!(expand_word(&word("~nobody"), &ctx), "~nobody");
        assert_eq!(expand_word(&word("a~b"), &ctx), "a~b");
    }

    #[test]
    fn test_quoted_tilde_is_literal() {
        let ctx = ctx_with(&[]);
        let mut w = word("~");
        w.quoted = true;
        assert_eq!(expand_word(&w, &ctx), "~");
    }

    #[test]
    fn test_expand_argv_drops_empty_unquoted() {
        let ctx = ctx_with(&[]);
        let words = vec![word("echo"), word("$SHOAL_TEST_UNSET_XYZ"), word("x")];
        assert_eq!(expand_argv(&words, &ctx), vec!["echo", "x"]);
    }

    #[test]
    fn test_expand_argv_keeps_empty_quoted() {
        let ctx = ctx_with(&[]);
        let mut empty = word("");
        empty.quoted = true;
        let words = vec![word("echo"), empty];
        assert_eq!(expand_argv(&words, &ctx), vec!["echo", ""]);
    }
}
