use super::*;
use std::io::{Cursor, Read, Write};

use crate::default_dataset_path;

fn collect(input: &str) -> (Vec<Bet>, usize) {
    let mut source = BetSource::new(Cursor::new(input.to_string()), "4");
    let bets = source.by_ref().map(|r| r.expect("read row")).collect();
    (bets, source.skipped())
}

/// Reader that fails after yielding its first chunk.
struct FailingReader {
    first: Option<&'static [u8]>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.first.take() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
            None => Err(io::Error::other("disk on fire")),
        }
    }
}

#[test]
fn rows_become_bets_for_the_agency() {
    let (bets, skipped) = collect(
        "Santiago Lionel,Lorca,30904465,1999-03-17,2201\n\
         Joaquin Emanuel,Hidalgo,24813860,1993-11-17,7574\n",
    );

    assert_eq!(skipped, 0);
    assert_eq!(bets.len(), 2);
    assert_eq!(
        bets[0].line(),
        "4|Santiago Lionel|Lorca|30904465|1999-03-17|2201\n"
    );
    assert_eq!(bets[1].document(), "24813860");
    assert!(bets.iter().all(|b| b.agency() == "4"));
}

#[test]
fn malformed_rows_are_skipped_and_counted() {
    let cases: &[(&str, usize, usize)] = &[
        // (input, bets, skipped)
        ("", 0, 0),
        ("\n\n   \n", 0, 0),
        ("a,b,c,d\n", 0, 1),
        ("a,b,c,d,e\nonly,two\n", 1, 1),
        ("a|x,b,c,d,e\na,b,c,d,e\n", 1, 1),
        ("a,b,c,d,e,extra\n", 1, 0),
        ("a,b,c,d,e", 1, 0), // no trailing newline
        ("a,b,c,d,e\r\nf,g,h,i,j\r\n", 2, 0),
    ];

    for (input, want_bets, want_skipped) in cases {
        let (bets, skipped) = collect(input);
        assert_eq!(bets.len(), *want_bets, "bets for {:?}", input);
        assert_eq!(skipped, *want_skipped, "skipped for {:?}", input);
    }
}

#[test]
fn only_the_row_is_trimmed() {
    let (bets, _) = collect("  Ana , Gil ,1, 2001-02-03 ,10 \n");
    assert_eq!(bets[0].line(), "4|Ana | Gil |1| 2001-02-03 |10\n");
}

#[test]
fn read_errors_are_propagated() {
    let reader = BufReader::new(FailingReader {
        first: Some(b"a,b,c,d,e\n"),
    });
    let mut source = BetSource::new(reader, "1");

    assert!(source.next().expect("first row").is_ok());
    let err = source.next().expect("error item").unwrap_err();
    assert_eq!(err.to_string(), "disk on fire");
}

#[test]
fn open_reads_dataset_file() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = default_dataset_path(tmp.path(), "2");
    assert!(path.ends_with("agency-2.csv"));

    let mut file = File::create(&path).expect("create dataset");
    writeln!(file, "Ana,Gil,1,2001-02-03,10").unwrap();
    writeln!(file, "broken").unwrap();
    writeln!(file, "Leo,Paz,2,1990-12-31,20").unwrap();
    drop(file);

    let mut source = BetSource::open(&path, "2").expect("open dataset");
    let docs: Vec<String> = source
        .by_ref()
        .map(|r| r.unwrap().document().to_string())
        .collect();

    assert_eq!(docs, ["1", "2"]);
    assert_eq!(source.skipped(), 1);
}

#[test]
fn open_missing_file_fails() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let err = BetSource::open(tmp.path().join("nope.csv"), "1")
        .err()
        .expect("missing file");
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}
