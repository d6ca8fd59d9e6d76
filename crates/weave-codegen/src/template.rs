// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `{name}` substitution and indentation stripping for emitted lines.

use crate::error::EmitError;
use crate::Subs;

/// Replace every `{name}` in `template` with its binding in `vars`.
/// `{{` and `}}` stand for literal braces.
pub(crate) fn substitute(template: &str, vars: &Subs) -> Result<String, EmitError> {
    let malformed = |position, message| EmitError::MalformedTemplate {
        template: template.to_string(),
        position,
        message,
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            end = Some(i);
                            break;
                        }
                        '{' => return Err(malformed(i, "unexpected '{' in field name")),
                        _ => {}
                    }
                }
                let Some(end) = end else {
                    return Err(malformed(pos, "single '{' encountered"));
                };
                let name = &template[pos + 1..end];
                if name.is_empty() {
                    return Err(malformed(pos, "empty field name"));
                }
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(EmitError::MissingSubstitution {
                            name: name.to_string(),
                            template: template.to_string(),
                        })
                    }
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(malformed(pos, "single '}' encountered"));
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Strip the leading whitespace shared by every non-blank line.
/// Whitespace-only lines come back empty, and one after the final newline
/// is dropped.
pub(crate) fn dedent(text: &str) -> Vec<&str> {
    let text = match text.rfind('\n') {
        Some(i) if text[i + 1..].trim().is_empty() => &text[..=i],
        _ => text,
    };
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        let content = line.trim_start();
        if content.is_empty() {
            continue;
        }
        let indent = &line[..line.len() - content.len()];
        margin = Some(match margin {
            None => indent,
            Some(m) => common_prefix(m, indent),
        });
    }
    let cut = margin.map_or(0, str::len);
    text.lines()
        .map(|line| if line.trim().is_empty() { "" } else { &line[cut..] })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or(a.len().min(b.len()), |((i, _), _)| i);
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subs;

    #[test]
    fn names_and_escapes() {
        let vars = subs! { name = "f", n = 3 };
        assert_eq!(substitute("def {name}(x): return x * {n}", &vars).unwrap(), "def f(x): return x * 3");
        assert_eq!(substitute("d = {{}} # {name}", &vars).unwrap(), "d = {} # f");
    }

    #[test]
    fn template_errors() {
        let vars = subs! { a = 1 };
        assert_eq!(
            substitute("{b}", &vars),
            Err(EmitError::MissingSubstitution { name: "b".into(), template: "{b}".into() })
        );
        assert!(matches!(substitute("x = {a", &vars), Err(EmitError::MalformedTemplate { position: 4, .. })));
        assert!(matches!(substitute("x = a}", &vars), Err(EmitError::MalformedTemplate { position: 5, .. })));
        assert!(matches!(substitute("{}", &vars), Err(EmitError::MalformedTemplate { .. })));
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        let text = "    if x:\n        y = 1\n\n    z = 2\n";
        assert_eq!(dedent(text), ["if x:", "    y = 1", "", "z = 2"]);
        assert_eq!(dedent("a\n  b"), ["a", "  b"]);
        assert_eq!(dedent("  a\n    b\n  "), ["a", "  b"]);
    }
}
