//! Template engine for entrypoint placeholder substitution.
//!
//! Tool entrypoints are templates like `python eval.py {input} {output}`.
//! Rendering substitutes `{placeholder}` occurrences and fails on
//! undefined names rather than silently inserting empty strings, so a
//! typo in a profile surfaces before anything is executed.
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of placeholder `name`
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`

use std::collections::HashMap;
use std::fmt;

/// Error type for template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder was referenced but not provided.
    UndefinedPlaceholder {
        /// The name of the undefined placeholder.
        name: String,
        /// The position in the template where it was found.
        position: usize,
    },
    /// A `{` was found without a matching `}`.
    UnmatchedBrace {
        /// The position of the unmatched `{`.
        position: usize,
    },
    /// An empty placeholder name was found (`{}`).
    EmptyPlaceholderName {
        /// The position of the empty placeholder.
        position: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedPlaceholder { name, position } => {
                write!(
                    f,
                    "undefined placeholder '{}' at position {} in template",
                    name, position
                )
            }
            TemplateError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {} in template", position)
            }
            TemplateError::EmptyPlaceholderName { position } => {
                write!(
                    f,
                    "empty placeholder name '{{}}' at position {} in template",
                    position
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Render a template string by substituting placeholders.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use cryorun::tools::template::render;
///
/// let mut values = HashMap::new();
/// values.insert("input".to_string(), "in.mrc".to_string());
/// values.insert("output".to_string(), "out.mrc".to_string());
///
/// let line = render("python eval.py {input} {output}", &values).unwrap();
/// assert_eq!(line, "python eval.py in.mrc out.mrc");
/// ```
pub fn render(
    template: &str,
    values: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                // Check for escape sequence {{
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    result.push('{');
                } else {
                    let start_pos = pos;
                    let mut name = String::new();

                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => name.push(c),
                            None => {
                                return Err(TemplateError::UnmatchedBrace {
                                    position: start_pos,
                                });
                            }
                        }
                    }

                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholderName {
                            position: start_pos,
                        });
                    }

                    let name = name.trim();
                    match values.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            return Err(TemplateError::UndefinedPlaceholder {
                                name: name.to_string(),
                                position: start_pos,
                            });
                        }
                    }
                }
            }
            '}' => {
                // Check for escape sequence }}
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                    result.push('}');
                } else {
                    // Lone } is just a regular character
                    result.push('}');
                }
            }
            _ => result.push(ch),
        }
    }

    Ok(result)
}

/// Helper to create a values map from a list of key-value pairs.
pub fn values<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_substitution() {
        let values = values([("input", "a.mrc"), ("output", "b.mrc")]);
        let result = render("python eval.py {input} {output}", &values).unwrap();
        assert_eq!(result, "python eval.py a.mrc b.mrc");
    }

    #[test]
    fn test_no_placeholders() {
        let values = HashMap::new();
        let result = render("plain command line", &values).unwrap();
        assert_eq!(result, "plain command line");
    }

    #[test]
    fn test_escape_braces() {
        let values = HashMap::new();
        let result = render("awk '{{print $1}}'", &values).unwrap();
        assert_eq!(result, "awk '{print $1}'");
    }

    #[test]
    fn test_undefined_placeholder_error() {
        let values = HashMap::new();
        let err = render("tool {input}", &values).unwrap_err();
        match err {
            TemplateError::UndefinedPlaceholder { name, position } => {
                assert_eq!(name, "input");
                assert_eq!(position, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_brace_error() {
        let values = HashMap::new();
        let err = render("tool {input", &values).unwrap_err();
        assert!(matches!(err, TemplateError::UnmatchedBrace { position: 5 }));
    }

    #[test]
    fn test_empty_placeholder_name_error() {
        let values = HashMap::new();
        let err = render("tool {}", &values).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::EmptyPlaceholderName { position: 5 }
        ));
    }

    #[test]
    fn test_whitespace_in_placeholder_name() {
        let values = values([("input", "a.mrc")]);
        let result = render("tool { input }", &values).unwrap();
        assert_eq!(result, "tool a.mrc");
    }

    #[test]
    fn test_multiple_occurrences() {
        let values = values([("input", "a.mrc")]);
        let result = render("{input} {input}", &values).unwrap();
        assert_eq!(result, "a.mrc a.mrc");
    }

    #[test]
    fn test_lone_closing_brace() {
        let values = HashMap::new();
        let result = render("a } b", &values).unwrap();
        assert_eq!(result, "a } b");
    }

    #[test]
    fn test_value_with_spaces_substitutes_whole() {
        let values = values([("input", "'/data/my maps/a.mrc'")]);
        let result = render("cp {input} out", &values).unwrap();
        assert_eq!(result, "cp '/data/my maps/a.mrc' out");
    }

    #[test]
    fn test_error_display() {
        let err = TemplateError::UndefinedPlaceholder {
            name: "inptu".to_string(),
            position: 10,
        };
        assert_eq!(
            err.to_string(),
            "undefined placeholder 'inptu' at position 10 in template"
        );

        let err = TemplateError::UnmatchedBrace { position: 5 };
        assert_eq!(err.to_string(), "unmatched '{' at position 5 in template");
    }
}
