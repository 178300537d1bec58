//! Fortran namelist text codec.
//!
//! Parses the subset of the namelist grammar that JULES configuration files
//! use: `&group … /` blocks, `param = value-list` assignments spanning one or
//! more lines, quoted strings with `''` escapes, logicals, integers, reals
//! (including `d` exponents), `!` comments, and `N*value` repeats.

use std::fs;
use std::path::Path;

use crate::model::namelist::{Namelist, NamelistGroup};
use crate::model::value::Value;

use super::Format;
use super::error::Error;

pub fn read(path: &Path) -> Result<Namelist, Error> {
    let text = fs::read_to_string(path)?;
    read_str(&text)
}

pub fn read_str(text: &str) -> Result<Namelist, Error> {
    let tokens = tokenize(text)?;
    parse(&tokens)
}

pub fn write(path: &Path, namelist: &Namelist, overwrite: bool) -> Result<(), Error> {
    if path.exists() && !overwrite {
        return Err(Error::Exists(path.to_path_buf()));
    }
    fs::write(path, write_str(namelist))?;
    Ok(())
}

pub fn write_str(namelist: &Namelist) -> String {
    let mut out = String::new();
    for (name, group) in namelist.iter() {
        out.push('&');
        out.push_str(name);
        out.push('\n');
        for (param, value) in group.iter() {
            out.push_str(&format!("  {param} = {value}\n"));
        }
        out.push_str("/\n\n");
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    GroupStart(String),
    GroupEnd,
    Eq,
    Comma,
    Quoted(String),
    Bare(String),
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, Error> {
    let mut tokens = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                c if c.is_whitespace() => i += 1,
                '!' => break,
                '&' => {
                    i += 1;
                    let start = i;
                    while i < chars.len() && is_ident_char(chars[i]) {
                        i += 1;
                    }
                    if i == start {
                        return Err(Error::parse(Format::Namelist, lineno, "'&' without a group name"));
                    }
                    let name: String = chars[start..i].iter().collect();
                    tokens.push((Token::GroupStart(name.to_lowercase()), lineno));
                }
                '/' => {
                    tokens.push((Token::GroupEnd, lineno));
                    i += 1;
                }
                '=' => {
                    tokens.push((Token::Eq, lineno));
                    i += 1;
                }
                ',' => {
                    tokens.push((Token::Comma, lineno));
                    i += 1;
                }
                quote @ ('\'' | '"') => {
                    i += 1;
                    let mut s = String::new();
                    let mut closed = false;
                    while i < chars.len() {
                        if chars[i] == quote {
                            // Doubled quote is an escaped literal quote.
                            if i + 1 < chars.len() && chars[i + 1] == quote {
                                s.push(quote);
                                i += 2;
                            } else {
                                i += 1;
                                closed = true;
                                break;
                            }
                        } else {
                            s.push(chars[i]);
                            i += 1;
                        }
                    }
                    if !closed {
                        return Err(Error::parse(Format::Namelist, lineno, "unterminated string"));
                    }
                    tokens.push((Token::Quoted(s), lineno));
                }
                _ => {
                    let start = i;
                    while i < chars.len()
                        && !chars[i].is_whitespace()
                        && !matches!(chars[i], ',' | '=' | '/' | '!' | '\'' | '"' | '&')
                    {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    tokens.push((Token::Bare(word), lineno));
                }
            }
        }
    }
    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse(tokens: &[(Token, usize)]) -> Result<Namelist, Error> {
    let mut namelist = Namelist::new();
    let mut i = 0;

    while i < tokens.len() {
        let (token, line) = &tokens[i];
        let name = match token {
            Token::GroupStart(name) => name.clone(),
            other => {
                return Err(Error::parse(
                    Format::Namelist,
                    *line,
                    format!("expected '&group', found {other:?}"),
                ));
            }
        };
        i += 1;

        let mut group = NamelistGroup::new();
        let mut terminated = false;
        while i < tokens.len() {
            match &tokens[i] {
                (Token::GroupEnd, _) => {
                    i += 1;
                    terminated = true;
                    break;
                }
                (Token::Bare(param), line) if matches!(tokens.get(i + 1), Some((Token::Eq, _))) => {
                    let param = param.to_lowercase();
                    let assign_line = *line;
                    i += 2;
                    let (value, next) = parse_values(tokens, i, assign_line)?;
                    group.set(param, value);
                    i = next;
                }
                (other, line) => {
                    return Err(Error::parse(
                        Format::Namelist,
                        *line,
                        format!("expected 'param =' or '/', found {other:?}"),
                    ));
                }
            }
        }
        if !terminated {
            let line = tokens.last().map(|(_, l)| *l).unwrap_or(0);
            return Err(Error::parse(
                Format::Namelist,
                line,
                format!("group '&{name}' is not terminated by '/'"),
            ));
        }

        if !namelist.insert_group(name.clone(), group) {
            let line = tokens.get(i.saturating_sub(1)).map(|(_, l)| *l).unwrap_or(0);
            return Err(Error::parse(
                Format::Namelist,
                line,
                format!("duplicate group '&{name}'"),
            ));
        }
    }

    Ok(namelist)
}

/// Literal values accumulated for one assignment before homogenization.
#[derive(Debug, Clone)]
enum Raw {
    Str(String),
    Bool(bool),
    Int(i64),
    Real(f64),
}

fn parse_values(
    tokens: &[(Token, usize)],
    mut i: usize,
    assign_line: usize,
) -> Result<(Value, usize), Error> {
    let mut raws: Vec<Raw> = Vec::new();

    while i < tokens.len() {
        match &tokens[i] {
            (Token::Comma, _) => i += 1,
            (Token::GroupEnd, _) | (Token::GroupStart(_), _) => break,
            (Token::Bare(_), _) if matches!(tokens.get(i + 1), Some((Token::Eq, _))) => break,
            (Token::Quoted(s), _) => {
                raws.push(Raw::Str(s.clone()));
                i += 1;
            }
            (Token::Bare(word), line) => {
                parse_bare(word, *line, &mut raws)?;
                i += 1;
            }
            (other, line) => {
                return Err(Error::parse(
                    Format::Namelist,
                    *line,
                    format!("unexpected {other:?} in value list"),
                ));
            }
        }
    }

    if raws.is_empty() {
        return Err(Error::parse(Format::Namelist, assign_line, "assignment with no values"));
    }

    Ok((homogenize(raws, assign_line)?, i))
}

fn parse_bare(word: &str, line: usize, out: &mut Vec<Raw>) -> Result<(), Error> {
    // Fortran repeat syntax: N*value expands to N copies.
    if let Some((count, literal)) = word.split_once('*') {
        let count: usize = count
            .parse()
            .map_err(|_| Error::parse(Format::Namelist, line, format!("bad repeat count in '{word}'")))?;
        let raw = parse_literal(literal, line)?;
        for _ in 0..count {
            out.push(raw.clone());
        }
        return Ok(());
    }
    out.push(parse_literal(word, line)?);
    Ok(())
}

fn parse_literal(word: &str, line: usize) -> Result<Raw, Error> {
    let lower = word.to_ascii_lowercase();
    match lower.as_str() {
        ".true." | ".t." | "t" => return Ok(Raw::Bool(true)),
        ".false." | ".f." | "f" => return Ok(Raw::Bool(false)),
        _ => {}
    }
    if let Ok(int) = word.parse::<i64>() {
        return Ok(Raw::Int(int));
    }
    let normalized = lower.replace('d', "e");
    if let Ok(real) = normalized.parse::<f64>() {
        return Ok(Raw::Real(real));
    }
    Err(Error::parse(
        Format::Namelist,
        line,
        format!("cannot interpret '{word}' as a namelist value"),
    ))
}

fn homogenize(mut raws: Vec<Raw>, line: usize) -> Result<Value, Error> {
    if raws.len() == 1 {
        if let Some(raw) = raws.pop() {
            return Ok(match raw {
                Raw::Str(s) => Value::Str(s),
                Raw::Bool(b) => Value::Bool(b),
                Raw::Int(i) => Value::Int(i),
                Raw::Real(r) => Value::Real(r),
            });
        }
    }

    let all_str = raws.iter().all(|r| matches!(r, Raw::Str(_)));
    let all_bool = raws.iter().all(|r| matches!(r, Raw::Bool(_)));
    let all_int = raws.iter().all(|r| matches!(r, Raw::Int(_)));
    let all_num = raws.iter().all(|r| matches!(r, Raw::Int(_) | Raw::Real(_)));

    if all_str {
        Ok(Value::Strs(
            raws.into_iter()
                .map(|r| match r {
                    Raw::Str(s) => s,
                    _ => unreachable!(),
                })
                .collect(),
        ))
    } else if all_bool {
        Ok(Value::Bools(
            raws.into_iter()
                .map(|r| match r {
                    Raw::Bool(b) => b,
                    _ => unreachable!(),
                })
                .collect(),
        ))
    } else if all_int {
        Ok(Value::Ints(
            raws.into_iter()
                .map(|r| match r {
                    Raw::Int(i) => i,
                    _ => unreachable!(),
                })
                .collect(),
        ))
    } else if all_num {
        // Integers promote to reals in a mixed numeric list.
        Ok(Value::Reals(
            raws.into_iter()
                .map(|r| match r {
                    Raw::Int(i) => i as f64,
                    Raw::Real(v) => v,
                    _ => unreachable!(),
                })
                .collect(),
        ))
    } else {
        Err(Error::parse(Format::Namelist, line, "mixed-type value list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_values_and_comments() {
        let text = "\
! a drive namelist
&jules_drive
  file = 'drive/data.txt'   ! relative path
  nvars = 3,
  tstep = 1800.0
  interp = 'nb', 'nb', 'nb'
  use_diff = .false.
/
&jules_drive_extra
/
";
        let nml = read_str(text).expect("parse");
        assert_eq!(nml.len(), 2);
        let group = nml.group("jules_drive").unwrap();
        assert_eq!(group.get("file"), Some(&Value::from("drive/data.txt")));
        assert_eq!(group.get("nvars"), Some(&Value::Int(3)));
        assert_eq!(group.get("tstep"), Some(&Value::Real(1800.0)));
        assert_eq!(
            group.get("interp"),
            Some(&Value::Strs(vec!["nb".into(), "nb".into(), "nb".into()]))
        );
        assert_eq!(group.get("use_diff"), Some(&Value::Bool(false)));
        assert!(nml.group("jules_drive_extra").unwrap().is_empty());
    }

    #[test]
    fn multi_line_lists_and_repeats() {
        let text = "\
&jules_frac
  frac = 0.7, 0.1,
         0.1, 0.1
  zero = 4*0.0
  counts = 1, 2.5
/
";
        let group_set = read_str(text).expect("parse");
        let group = group_set.group("jules_frac").unwrap();
        assert_eq!(
            group.get("frac"),
            Some(&Value::Reals(vec![0.7, 0.1, 0.1, 0.1]))
        );
        assert_eq!(group.get("zero"), Some(&Value::Reals(vec![0.0; 4])));
        // Mixed integer/real numeric lists promote to reals.
        assert_eq!(group.get("counts"), Some(&Value::Reals(vec![1.0, 2.5])));
    }

    #[test]
    fn d_exponents_and_escaped_quotes() {
        let text = "&g\n  a = 1.5d-3\n  b = 'it''s'\n/\n";
        let nml = read_str(text).expect("parse");
        let group = nml.group("g").unwrap();
        assert_eq!(group.get("a"), Some(&Value::Real(1.5e-3)));
        assert_eq!(group.get("b"), Some(&Value::from("it's")));
    }

    #[test]
    fn duplicate_group_is_a_parse_error() {
        let text = "&g\n/\n&g\n/\n";
        let err = read_str(text).unwrap_err();
        assert!(err.to_string().contains("duplicate group"));
    }

    #[test]
    fn unterminated_group_is_a_parse_error() {
        let err = read_str("&g\n a = 1\n").unwrap_err();
        assert!(err.to_string().contains("not terminated"));
    }

    #[test]
    fn mixed_type_list_is_rejected() {
        let err = read_str("&g\n a = 1, 'x'\n/\n").unwrap_err();
        assert!(err.to_string().contains("mixed-type"));
    }

    #[test]
    fn write_then_read_is_identity() {
        let text = "\
&jules_soil_props
  const_z = .true.
  file = 'soil.dat'
  sathh = 6.63, 6.13, 6.13
  nlayers = 4
/
";
        let nml = read_str(text).expect("parse");
        let rendered = write_str(&nml);
        let reparsed = read_str(&rendered).expect("reparse");
        assert_eq!(nml, reparsed);
    }

    #[test]
    fn wide_integral_reals_survive_a_roundtrip() {
        let mut nml = Namelist::new();
        nml.group_or_insert("jules_time").set("end", Value::Real(1e16));
        let rendered = write_str(&nml);
        let reparsed = read_str(&rendered).expect("reparse");
        assert_eq!(
            reparsed.group("jules_time").unwrap().get("end"),
            Some(&Value::Real(1e16))
        );
    }
}
