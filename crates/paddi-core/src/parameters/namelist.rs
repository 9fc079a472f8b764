//! Minimal Fortran namelist reader.
//!
//! Handles `&group ... /` (and `$group ... $end`) blocks, `!` comments,
//! quoted strings, logicals, integers and reals with `d` exponents. Keys are
//! case-insensitive and returned lowercased. An entry with several values is
//! kept as text.

use crate::domain::{PaddiError, PaddiResult};
use crate::schema::{Value, parse_float};
use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

pub(super) const INPUT_GROUP: &str = "input_values";

type NamelistResult<T> = Result<T, (usize, String)>;

pub(super) fn read_group(path: &Path, group: &str) -> PaddiResult<Vec<(String, Value)>> {
    let text = fs::read_to_string(path).map_err(|source| PaddiError::io(path, source))?;
    let groups = tokenize(&text)
        .and_then(|tokens| parse_groups(&tokens))
        .map_err(|(line, reason)| PaddiError::format(path, line, reason))?;

    groups
        .into_iter()
        .find(|candidate| candidate.name.eq_ignore_ascii_case(group))
        .map(|found| found.entries)
        .ok_or_else(|| PaddiError::missing_parameter(format!("namelist group '{group}'")))
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    GroupStart(String),
    GroupEnd,
    Word(String),
    Quoted(String),
    Equals,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

#[derive(Debug)]
struct Group {
    name: String,
    entries: Vec<(String, Value)>,
}

fn tokenize(text: &str) -> NamelistResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            let kind = match ch {
                '!' => break,
                ',' => TokenKind::Comma,
                '=' => TokenKind::Equals,
                '/' => TokenKind::GroupEnd,
                '&' | '$' => {
                    let name = take_word(&mut chars);
                    if name.is_empty() {
                        return Err((line_number, "group marker without a name".to_string()));
                    }
                    if name.eq_ignore_ascii_case("end") {
                        TokenKind::GroupEnd
                    } else {
                        TokenKind::GroupStart(name.to_ascii_lowercase())
                    }
                }
                '\'' | '"' => TokenKind::Quoted(take_quoted(&mut chars, ch, line_number)?),
                other if other.is_whitespace() => continue,
                other => {
                    let mut word = String::from(other);
                    word.push_str(&take_word(&mut chars));
                    TokenKind::Word(word)
                }
            };
            tokens.push(Token {
                kind,
                line: line_number,
            });
        }
    }
    Ok(tokens)
}

fn take_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&next) = chars.peek() {
        if next.is_whitespace() || matches!(next, ',' | '=' | '/' | '!') {
            break;
        }
        word.push(next);
        chars.next();
    }
    word
}

fn take_quoted(
    chars: &mut Peekable<Chars<'_>>,
    quote: char,
    line_number: usize,
) -> NamelistResult<String> {
    let mut text = String::new();
    loop {
        match chars.next() {
            // A doubled quote stands for one literal quote.
            Some(ch) if ch == quote => {
                if chars.peek() == Some(&quote) {
                    chars.next();
                    text.push(quote);
                } else {
                    return Ok(text);
                }
            }
            Some(ch) => text.push(ch),
            None => return Err((line_number, "unterminated string".to_string())),
        }
    }
}

fn is_assignment(tokens: &[Token], index: usize) -> bool {
    matches!(
        tokens.get(index + 1).map(|token| &token.kind),
        Some(TokenKind::Equals)
    )
}

fn parse_groups(tokens: &[Token]) -> NamelistResult<Vec<Group>> {
    let mut groups = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let TokenKind::GroupStart(name) = &tokens[index].kind else {
            index += 1;
            continue;
        };
        let opened_at = tokens[index].line;
        index += 1;

        let mut entries: Vec<(String, Value)> = Vec::new();
        loop {
            let Some(token) = tokens.get(index) else {
                return Err((opened_at, format!("group '{name}' is not terminated")));
            };
            match &token.kind {
                TokenKind::GroupEnd => {
                    index += 1;
                    break;
                }
                TokenKind::Comma => index += 1,
                TokenKind::Word(key) if is_assignment(tokens, index) => {
                    index += 2;
                    let mut raw = Vec::new();
                    while let Some(next) = tokens.get(index) {
                        match &next.kind {
                            TokenKind::Comma => index += 1,
                            TokenKind::Word(_) if is_assignment(tokens, index) => break,
                            TokenKind::Word(_) | TokenKind::Quoted(_) => {
                                raw.push(&next.kind);
                                index += 1;
                            }
                            _ => break,
                        }
                    }

                    let value = match raw.as_slice() {
                        [] => return Err((token.line, format!("no value assigned to '{key}'"))),
                        [single] => parse_value(single),
                        many => Value::Text(
                            many.iter()
                                .map(|kind| raw_text(kind))
                                .collect::<Vec<_>>()
                                .join(", "),
                        ),
                    };
                    let key = key.to_ascii_lowercase();
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                TokenKind::Word(word) => {
                    return Err((token.line, format!("expected 'name = value', found '{word}'")));
                }
                TokenKind::Quoted(text) => {
                    return Err((token.line, format!("unexpected string '{text}'")));
                }
                TokenKind::Equals => {
                    return Err((token.line, "'=' without a name".to_string()));
                }
                TokenKind::GroupStart(inner) => {
                    return Err((
                        token.line,
                        format!("group '{inner}' opened inside group '{name}'"),
                    ));
                }
            }
        }

        groups.push(Group {
            name: name.clone(),
            entries,
        });
    }

    Ok(groups)
}

fn raw_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Word(word) => word.clone(),
        TokenKind::Quoted(text) => format!("'{text}'"),
        _ => String::new(),
    }
}

fn parse_value(kind: &TokenKind) -> Value {
    let word = match kind {
        TokenKind::Word(word) => word,
        TokenKind::Quoted(text) => return Value::Text(text.clone()),
        _ => return Value::Text(String::new()),
    };

    if let Some(logical) = parse_logical(word) {
        return Value::Logical(logical);
    }
    if let Ok(integer) = word.parse::<i64>() {
        return Value::Integer(integer);
    }
    if let Some(real) = parse_float(word) {
        return Value::Float(real);
    }
    Value::Text(word.clone())
}

fn parse_logical(word: &str) -> Option<bool> {
    let lowered = word.to_ascii_lowercase();
    let dotted = lowered.strip_prefix('.');
    let core = dotted.unwrap_or(&lowered);
    if dotted.is_some() {
        return match core.chars().next() {
            Some('t') => Some(true),
            Some('f') => Some(false),
            _ => None,
        };
    }
    match core {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{INPUT_GROUP, parse_logical, read_group};
    use crate::domain::PaddiError;
    use crate::parameters::{Parameter, ParameterSet, default_format};
    use crate::schema::Value;
    use std::fs;
    use tempfile::TempDir;

    const PARAMETER_FILE: &str = "\
! layered run
&Input_Values
  B_therm = 1.0d0, B_comp = 1.0d0
  viscous_diffusion_coeff = 7.0
  thermal_diffusion_coeff = 1.0, compositional_diffusion_coeff = 1.0D-2
  thermal_stratif_param = 1.0
  compositional_stratif_param = 0.5  ! density ratio
  x_extent_of_the_box = 100.0
  y_extent_of_the_box = 50.0
  z_extent_of_the_box = 200.0
  cfl_safety_factor = 0.4
  maximum_time_step_length = 0.1
  initial_time_step_length = 1.0e-4
  max_degree_of_x_fourier_modes = 32
  max_degree_of_y_fourier_modes = 16
  max_degree_of_z_fourier_modes = 64
  number_of_tasks_1st_transpose = 4
  number_of_tasks_2nd_transpose = 2
  DEALIAS = .FALSE.
  name_of_input_restart_file = 'layers'
  wave_numbers = 1, 2, 3
/
&other
  ignored = 1
/
";

    #[test]
    fn input_group_becomes_parameter_set() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("parameter_file");
        fs::write(&path, PARAMETER_FILE).expect("parameter file should be written");

        let set = ParameterSet::from_namelist_file(&path, &default_format())
            .expect("namelist should parse");
        assert_eq!(set.float(Parameter::ThermalBuoyancy).expect("B_therm"), 1.0);
        assert_eq!(
            set.float(Parameter::CompositionalDiffusion).expect("D_comp"),
            0.01
        );
        assert_eq!(set.float(Parameter::TimeStep).expect("dt"), 1.0e-4);
        assert_eq!(set.integer(Parameter::Nx).expect("nx"), 128);
        assert_eq!(
            set.extra("name_of_input_restart_file"),
            Some(&Value::Text("layers".to_string()))
        );
        assert_eq!(
            set.extra("wave_numbers"),
            Some(&Value::Text("1, 2, 3".to_string()))
        );
        assert_eq!(set.extra("ignored"), None);
    }

    #[test]
    fn dollar_groups_and_doubled_quotes_are_understood() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("legacy");
        fs::write(&path, "$input_values\n title = 'it''s', flag = T\n$end\n")
            .expect("file should be written");

        let entries = read_group(&path, INPUT_GROUP).expect("legacy group should parse");
        assert_eq!(
            entries,
            vec![
                ("title".to_string(), Value::Text("it's".to_string())),
                ("flag".to_string(), Value::Logical(true)),
            ]
        );
    }

    #[test]
    fn missing_group_is_a_missing_parameter() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("parameter_file");
        fs::write(&path, "&other\n a = 1\n/\n").expect("file should be written");

        let error = read_group(&path, INPUT_GROUP).expect_err("group is absent");
        assert!(matches!(error, PaddiError::MissingParameter { .. }));
    }

    #[test]
    fn unterminated_group_points_at_its_start() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("parameter_file");
        fs::write(&path, "! header\n&input_values\n a = 1\n").expect("file should be written");

        let error = read_group(&path, INPUT_GROUP).expect_err("group never closes");
        assert!(matches!(error, PaddiError::Format { line: 2, .. }));
    }

    #[test]
    fn logical_spellings() {
        assert_eq!(parse_logical(".true."), Some(true));
        assert_eq!(parse_logical(".F."), Some(false));
        assert_eq!(parse_logical("T"), Some(true));
        assert_eq!(parse_logical("false"), Some(false));
        assert_eq!(parse_logical("1.0"), None);
        assert_eq!(parse_logical(".5"), None);
    }
}
