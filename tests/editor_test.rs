mod common;
use common::Session;

fn listing(s: &mut Session) -> String {
    s.enter("LIST");
    s.output()
}

#[test]
fn test_list_is_sorted_regardless_of_entry_order() {
    let mut s = Session::new();
    s.enter("30 PRINT 3");
    s.enter("10 PRINT 1");
    s.enter("20 PRINT 2");
    assert_eq!(listing(&mut s), "10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n");
}

#[test]
fn test_replace_line() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    s.enter("20 PRINT 2");
    s.enter("10 PRINT 9");
    assert_eq!(listing(&mut s), "10 PRINT 9\n20 PRINT 2\n");
}

#[test]
fn test_replace_line_with_longer_and_shorter() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    s.enter("20 PRINT 2");
    s.enter("10 PRINT 1+1+1");
    assert_eq!(listing(&mut s), "10 PRINT 1+1+1\n20 PRINT 2\n");
    s.enter("10 REM");
    assert_eq!(listing(&mut s), "10 REM \n20 PRINT 2\n");
}

#[test]
fn test_bare_number_deletes_line() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    s.enter("20 PRINT 2");
    s.enter("30 PRINT 3");
    s.enter("20");
    assert_eq!(listing(&mut s), "10 PRINT 1\n30 PRINT 3\n");
}

#[test]
fn test_delete_unknown_line_reports() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    s.enter("20");
    assert_eq!(s.output(), "Unknown Line Error\n");
    assert_eq!(listing(&mut s), "10 PRINT 1\n");
}

#[test]
fn test_line_zero_reports() {
    let mut s = Session::new();
    s.enter("0 PRINT 1");
    assert_eq!(s.output(), "Unknown Line Error\n");
}

#[test]
fn test_list_range() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    s.enter("20 PRINT 2");
    s.enter("30 PRINT 3");
    s.enter("LIST 20");
    assert_eq!(s.output(), "20 PRINT 2\n");
    s.enter("LIST 20, 30");
    assert_eq!(s.output(), "20 PRINT 2\n30 PRINT 3\n");
}

#[test]
fn test_listing_retokenizes_to_the_same_listing() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 3 STEP 2");
    s.enter("20 IF I>=2 THEN PRINT \"HI \";I");
    s.enter("30 NEXT I: REM DONE");
    s.enter("40 A$=\"X\": A(1)=LEN(A$)%2");
    let first = listing(&mut s);
    s.enter("NEW");
    for line in first.lines() {
        s.enter(line);
    }
    assert_eq!(listing(&mut s), first);
}

#[test]
fn test_edits_between_runs() {
    let mut s = Session::new();
    s.enter("10 A=1");
    s.enter("20 PRINT A");
    s.enter("RUN");
    assert_eq!(s.output(), "1\n");
    s.enter("10 A=2");
    s.enter("15 A=A*10");
    s.enter("RUN");
    assert_eq!(s.output(), "20\n");
    s.enter("15");
    s.enter("RUN");
    assert_eq!(s.output(), "2\n");
}
