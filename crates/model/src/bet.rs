use std::fmt;

/// A single bet placed at an agency.
///
/// Bets are immutable once built. The wire line is rendered at construction
/// so the weight used by batch admission is always the exact byte length
/// that ends up on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    agency: String,
    first_name: String,
    last_name: String,
    document: String,
    birth_date: String,
    number: String,
    /// `agency|first|last|document|birth|number\n`
    line: String,
}

impl Bet {
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document: impl Into<String>,
        birth_date: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        let agency = agency.into();
        let first_name = first_name.into();
        let last_name = last_name.into();
        let document = document.into();
        let birth_date = birth_date.into();
        let number = number.into();

        let line = format!(
            "{agency}|{first_name}|{last_name}|{document}|{birth_date}|{number}\n"
        );

        Self {
            agency,
            first_name,
            last_name,
            document,
            birth_date,
            number,
            line,
        }
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    /// Serialized form, newline terminated.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Byte length of [`Bet::line`].
    pub fn weight(&self) -> usize {
        self.line.len()
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.line.trim_end_matches('\n'))
    }
}

#[cfg(test)]
#[path = "bet_tests.rs"]
mod tests;
