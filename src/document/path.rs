//! Dotted, bracket-indexed paths such as `base_value_2.sample_list[0]`.

/// One step of a path: a mapping key or a zero-based sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Split a path into segments.
///
/// Keys are separated by `.`; any key may be followed by one or more `[n]`
/// indices. A leading index (`[0].name`) addresses a top-level sequence.
pub fn parse(path: &str) -> Result<Vec<Segment>, String> {
    if path.is_empty() {
        return Err("path is empty".to_string());
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut indices) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };

        if name.contains(']') {
            return Err(format!("unexpected ']' in '{}'", part));
        }
        if name.is_empty() && indices.is_empty() {
            return Err("empty key segment".to_string());
        }
        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }

        while !indices.is_empty() {
            let Some(rest) = indices.strip_prefix('[') else {
                return Err(format!("unexpected text after index in '{}'", part));
            };
            let Some(close) = rest.find(']') else {
                return Err(format!("unterminated index in '{}'", part));
            };
            let index = rest[..close]
                .parse::<usize>()
                .map_err(|_| format!("invalid index '{}' in '{}'", &rest[..close], part))?;
            segments.push(Segment::Index(index));
            indices = &rest[close + 1..];
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn test_dotted_keys() {
        assert_eq!(
            parse("base_value.subvalue.subvalue2.boolean").unwrap(),
            vec![
                key("base_value"),
                key("subvalue"),
                key("subvalue2"),
                key("boolean")
            ]
        );
    }

    #[test]
    fn test_indices() {
        assert_eq!(
            parse("base_value_2.sample_list[2]").unwrap(),
            vec![key("base_value_2"), key("sample_list"), Segment::Index(2)]
        );
        assert_eq!(
            parse("matrix[1][0].name").unwrap(),
            vec![
                key("matrix"),
                Segment::Index(1),
                Segment::Index(0),
                key("name")
            ]
        );
        assert_eq!(
            parse("[3]").unwrap(),
            vec![Segment::Index(3)]
        );
    }

    #[test]
    fn test_malformed_paths() {
        assert!(parse("").is_err());
        assert!(parse("a..b").is_err());
        assert!(parse("a.").is_err());
        assert!(parse("list[").is_err());
        assert!(parse("list[x]").is_err());
        assert!(parse("list[-1]").is_err());
        assert!(parse("list[0]tail").is_err());
        assert!(parse("a]b").is_err());
    }
}
