pub const GENERAL: &str = r#"Oizys - minimal interpreted language

Statements:
  x = expr          assign variable
  const x = expr    define constant
  null x            reset variable
  del x             delete variable

Control flow:
  if condition:
    ...
    done

  else:
    ...
    done

  while condition:
    ...
    done

Output & environment:
  out expr           print expression
  RESET              clear variables/constants
  CLEAR              clear screen
  exit               quit interpreter

Expressions:
  +  -  *  /  ^      arithmetic
  !  !!  !!!         factorials
  == != < > <= >=    comparisons
  and or not         logic"#;

const TOPICS: [(&str, &str); 7] = [
    (
        "if",
        r#"Usage:
  if condition:
    ...
    done

Example:
  if 3 > 2:
    out "3 is greater than 2"
    done"#,
    ),
    (
        "else",
        r#"Usage:
  if condition:
    ...
    done
  else:
    ...
    done

Example:
  if 2 > 3:
    out "2 is bigger than 3"
    done
  else:
    out "3 is bigger than 2"
    done"#,
    ),
    (
        "while",
        r#"Usage:
  while condition:
    ...
    done

Example:
  a = 0
  while a < 5:
    a = a + 1
    done"#,
    ),
    (
        "del",
        r#"Usage:
  del variable

Example:
  a = 2
  del a"#,
    ),
    (
        "null",
        r#"Usage:
  null variable

Example:
  null a"#,
    ),
    (
        "out",
        r#"Usage:
  out variable
  out constant

Example:
  a = 5
  out a
  out "Example""#,
    ),
    (
        "const",
        r#"Usage:
  const variable = value

Example:
  const a = 5"#,
    ),
];

pub fn topic(name: &str) -> Option<&'static str> {
    TOPICS
        .iter()
        .find(|(topic, _)| *topic == name)
        .map(|(_, text)| *text)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_topics() {
        for name in ["if", "else", "while", "del", "null", "out", "const"] {
            assert!(topic(name).is_some(), "missing help for {name}");
        }
    }

    #[test]
    fn test_unknown_topic() {
        assert_eq!(topic("for"), None);
    }
}
