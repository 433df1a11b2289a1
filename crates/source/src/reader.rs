use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use agency_model::Bet;
use log::{debug, trace};

/// Number of comma-separated fields in a dataset row.
const FIELDS_PER_ROW: usize = 5;

/// Streams bets out of an agency dataset.
///
/// Each row holds `first_name,last_name,document,birth_date,number`.
/// Rows with missing fields, or with a `|` that would corrupt the wire
/// format, are skipped and counted. Read errors are handed to the caller.
pub struct BetSource<R> {
    lines: io::Lines<R>,
    agency: String,
    line_no: usize,
    skipped: usize,
}

impl BetSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, agency: impl Into<String>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), agency))
    }
}

impl<R: BufRead> BetSource<R> {
    pub fn new(reader: R, agency: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            agency: agency.into(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Rows dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn parse_row(&self, line: &str) -> Option<Bet> {
        if line.contains('|') {
            return None;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < FIELDS_PER_ROW {
            return None;
        }

        Some(Bet::new(
            self.agency.as_str(),
            fields[0],
            fields[1],
            fields[2],
            fields[3],
            fields[4],
        ))
    }
}

impl<R: BufRead> Iterator for BetSource<R> {
    type Item = io::Result<Bet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_no += 1;

            let row = line.trim();
            if row.is_empty() {
                continue;
            }

            match self.parse_row(row) {
                Some(bet) => {
                    trace!("[source] line {} -> {}", self.line_no, bet);
                    return Some(Ok(bet));
                }
                None => {
                    self.skipped += 1;
                    debug!("[source] skipping malformed line {}: {row:?}", self.line_no);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
