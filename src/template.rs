//! ERB-style placeholder substitution for command templates.
//!
//! Rendering happens before tokenization: by the time a command line reaches
//! the tokenizer it is fully substituted text. Only `<%= name %>` is
//! understood; there is no other template syntax.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Errors produced while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder referenced a variable that was never bound.
    UnknownVariable(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownVariable(name) => {
                write!(f, "unknown template variable `{name}`")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<%=\s*([A-Za-z_][A-Za-z0-9_]*)\s*%>").expect("placeholder pattern is valid")
    })
}

/// Substitute every `<%= name %>` placeholder in `template` with the bound
/// value from `vars`. Text outside placeholders is copied verbatim.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_re().captures_iter(template) {
        let placeholder = caps.get(0).expect("whole-match group always exists");
        let name = &caps[1];
        let value = vars
            .get(name)
            .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
        out.push_str(&template[last..placeholder.start()]);
        out.push_str(value);
        last = placeholder.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_text_passes_through() {
        let rendered = render("echo hello", &HashMap::new()).unwrap();
        assert_eq!(rendered, "echo hello");
    }

    #[test]
    fn substitutes_a_bound_variable() {
        let rendered = render("cat <%= file %>", &vars(&[("file", "notes.txt")])).unwrap();
        assert_eq!(rendered, "cat notes.txt");
    }

    #[test]
    fn whitespace_inside_the_delimiters_is_flexible() {
        let bound = vars(&[("a", "1"), ("b", "2")]);
        let rendered = render("x <%=a%> <%=  b  %>", &bound).unwrap();
        assert_eq!(rendered, "x 1 2");
    }

    #[test]
    fn same_variable_can_appear_twice() {
        let rendered = render("<%= v %> and <%= v %>", &vars(&[("v", "again")])).unwrap();
        assert_eq!(rendered, "again and again");
    }

    #[test]
    fn unbound_variable_is_an_error() {
        let err = render("echo <%= missing %>", &HashMap::new()).unwrap_err();
        assert_eq!(err, TemplateError::UnknownVariable("missing".to_string()));
    }

    #[test]
    fn malformed_placeholder_is_left_alone() {
        // Not a recognized placeholder, so it is treated as literal text.
        let rendered = render("echo <%= %>", &HashMap::new()).unwrap();
        assert_eq!(rendered, "echo <%= %>");
    }
}
