use std::fmt;
use std::str::FromStr;

/// Store-assigned client identity. Sequences never hand out a value twice, so
/// an id is never reused after its client is deleted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse::<i64>().map(ClientId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_numeric_text_when_parsed_should_return_id() {
        let id: ClientId = " 42 ".parse().unwrap();
        assert_eq!(id, ClientId(42));
    }

    #[test]
    fn given_non_numeric_text_when_parsed_should_fail() {
        assert!("not-an-id".parse::<ClientId>().is_err());
    }

    #[test]
    fn given_id_when_displayed_should_print_inner_value() {
        assert_eq!(ClientId(7).to_string(), "7");
    }
}
