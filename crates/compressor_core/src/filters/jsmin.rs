use super::Filter;
use crate::error::CompressError;

/// Minifies the combined script. See [`jsmin`].
pub struct JsMinFilter;

impl Filter for JsMinFilter {
    fn name(&self) -> &'static str {
        "jsmin"
    }

    fn output(&self, content: &str) -> Result<Option<String>, CompressError> {
        jsmin(content).map(Some).map_err(|message| CompressError::FilterFailed {
            filter: "jsmin",
            message,
        })
    }
}

/// Minifies JavaScript with Douglas Crockford's JSMin algorithm.
///
/// Comments are removed, runs of whitespace are collapsed or dropped where
/// they are not needed, and string and regular-expression literals are copied
/// untouched. Fails on an unterminated comment, string or regex literal.
pub fn jsmin(js: &str) -> Result<String, String> {
    let mut minifier = JsMin::new(js);
    minifier.run()?;
    let out = minifier.out;
    Ok(out.strip_prefix('\n').map(str::to_string).unwrap_or(out))
}

/// The three JSMin actions.
#[derive(Clone, Copy)]
enum Action {
    /// Output A, copy B to A, get the next B.
    Output,
    /// Copy B to A, get the next B.
    DeleteA,
    /// Get the next B.
    DeleteB,
}

struct JsMin {
    input: Vec<char>,
    pos: usize,
    lookahead: Option<char>,
    a: Option<char>,
    b: Option<char>,
    /// Whitespace between A and B was dropped.
    gap: bool,
    out: String,
}

fn is_alphanum(c: Option<char>) -> bool {
    match c {
        Some(c) => c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '\\') || (c as u32) > 126,
        None => false,
    }
}

impl JsMin {
    fn new(js: &str) -> Self {
        Self {
            input: js.chars().collect(),
            pos: 0,
            lookahead: None,
            a: None,
            b: None,
            gap: false,
            out: String::with_capacity(js.len()),
        }
    }

    /// Returns the next character, mapping control characters to spaces and
    /// carriage returns to newlines.
    fn get(&mut self) -> Option<char> {
        let c = match self.lookahead.take() {
            Some(c) => Some(c),
            None => {
                let c = self.input.get(self.pos).copied();
                if c.is_some() {
                    self.pos += 1;
                }
                c
            }
        };
        match c {
            Some(c) if c >= ' ' || c == '\n' => Some(c),
            Some('\r') => Some('\n'),
            Some(_) => Some(' '),
            None => None,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.lookahead = self.get();
        self.lookahead
    }

    /// Returns the next character, skipping comments.
    fn next(&mut self) -> Result<Option<char>, String> {
        let c = self.get();
        if c != Some('/') {
            return Ok(c);
        }
        match self.peek() {
            Some('/') => loop {
                let c = self.get();
                if c.is_none() || c == Some('\n') {
                    return Ok(c);
                }
            },
            Some('*') => {
                self.get();
                loop {
                    match self.get() {
                        Some('*') if self.peek() == Some('/') => {
                            self.get();
                            return Ok(Some(' '));
                        }
                        Some(_) => {}
                        None => return Err("unterminated comment".to_string()),
                    }
                }
            }
            _ => Ok(c),
        }
    }

    fn put(&mut self, c: Option<char>) {
        if let Some(c) = c {
            self.out.push(c);
        }
    }

    fn action(&mut self, action: Action) -> Result<(), String> {
        if matches!(action, Action::Output) {
            self.put(self.a);
            // `a + +b` must not become `a++b`.
            if self.gap && matches!(self.a, Some('+' | '-')) && self.a == self.b {
                self.out.push(' ');
            }
        }
        if matches!(action, Action::DeleteB) {
            self.gap |= matches!(self.b, Some(' ' | '\n'));
        } else {
            self.gap = false;
            self.a = self.b;
            if matches!(self.a, Some('\'' | '"' | '`')) {
                let quote = self.a;
                loop {
                    self.put(self.a);
                    self.a = self.get();
                    if self.a == quote {
                        break;
                    }
                    if self.a == Some('\\') {
                        self.put(self.a);
                        self.a = self.get();
                    }
                    if self.a.is_none() {
                        return Err("unterminated string literal".to_string());
                    }
                }
            }
        }

        self.b = self.next()?;
        if self.b == Some('/')
            && matches!(
                self.a,
                Some('(' | ',' | '=' | ':' | '[' | '!' | '&' | '|' | '?' | '{' | '}' | ';' | '\n')
            )
        {
            self.put(self.a);
            self.put(self.b);
            loop {
                self.a = self.get();
                match self.a {
                    Some('[') => loop {
                        self.put(self.a);
                        self.a = self.get();
                        match self.a {
                            Some(']') => break,
                            Some('\\') => {
                                self.put(self.a);
                                self.a = self.get();
                            }
                            None => return Err("unterminated set in regex literal".to_string()),
                            _ => {}
                        }
                    },
                    Some('/') => break,
                    Some('\\') => {
                        self.put(self.a);
                        self.a = self.get();
                    }
                    None => return Err("unterminated regex literal".to_string()),
                    _ => {}
                }
                self.put(self.a);
            }
            self.b = self.next()?;
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), String> {
        self.a = Some('\n');
        self.action(Action::DeleteB)?;
        while self.a.is_some() {
            let action = match (self.a, self.b) {
                (Some(' '), b) => {
                    if is_alphanum(b) {
                        Action::Output
                    } else {
                        Action::DeleteA
                    }
                }
                (Some('\n'), Some('{' | '[' | '(' | '+' | '-' | '!' | '~')) => Action::Output,
                (Some('\n'), Some(' ')) => Action::DeleteB,
                (Some('\n'), b) => {
                    if is_alphanum(b) {
                        Action::Output
                    } else {
                        Action::DeleteA
                    }
                }
                (a, Some(' ')) => {
                    if is_alphanum(a) {
                        Action::Output
                    } else {
                        Action::DeleteB
                    }
                }
                (a, Some('\n')) => match a {
                    Some('}' | ']' | ')' | '+' | '-' | '"' | '\'' | '`') => Action::Output,
                    _ if is_alphanum(a) => Action::Output,
                    _ => Action::DeleteB,
                },
                _ => Action::Output,
            };
            self.action(action)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_simple_statements() {
        assert_eq!(
            jsmin("obj = {};\nobj.value = \"value\";").unwrap(),
            "obj={};obj.value=\"value\";"
        );
    }

    #[test]
    fn drops_comments() {
        let js = "// leading\nvar a = 1; /* block */\nvar b = 2;\n";
        assert_eq!(jsmin(js).unwrap(), "var a=1;var b=2;");
    }

    #[test]
    fn keeps_strings_intact() {
        let js = "var s = 'a  // not a comment';\nvar t = \"x \\\" y\";";
        assert_eq!(
            jsmin(js).unwrap(),
            "var s='a  // not a comment';var t=\"x \\\" y\";"
        );
    }

    #[test]
    fn keeps_regex_literals() {
        let js = "var re = /ab+c  [/]/g;";
        assert_eq!(jsmin(js).unwrap(), "var re=/ab+c  [/]/g;");
    }

    #[test]
    fn keeps_needed_spaces() {
        assert_eq!(jsmin("return  x;\nvar y = a + +b;").unwrap(), "return x;var y=a+ +b;");
    }

    #[test]
    fn newline_after_closing_brace_is_kept() {
        assert_eq!(jsmin("if (a) {\n  b();\n}\nc();").unwrap(), "if(a){b();}\nc();");
    }

    #[test]
    fn unterminated_comment_fails() {
        assert!(jsmin("var a; /* open").is_err());
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(jsmin("var a = 'open;").is_err());
    }

    #[test]
    fn filter_reports_failures() {
        let err = JsMinFilter.output("/* open").unwrap_err();
        assert!(matches!(err, CompressError::FilterFailed { filter: "jsmin", .. }));
    }
}
