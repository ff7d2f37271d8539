mod common;
use common::Session;

#[test]
fn test_for_loop_prints_each_value() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 3");
    s.enter("20 PRINT I");
    s.enter("30 NEXT I");
    s.enter("RUN");
    assert_eq!(s.output(), "1\n2\n3\n");
}

#[test]
fn test_if_then() {
    let mut s = Session::new();
    s.enter("10 LET A=5");
    s.enter("20 IF A>3 THEN PRINT \"Y\"");
    s.enter("30 IF A<3 THEN PRINT \"N\"");
    s.enter("RUN");
    assert_eq!(s.output(), "Y\n");
}

#[test]
fn test_if_then_implicit_goto() {
    let mut s = Session::new();
    s.enter("10 IF 1 THEN 40");
    s.enter("20 PRINT \"SKIPPED\"");
    s.enter("40 PRINT \"THERE\"");
    s.enter("RUN");
    assert_eq!(s.output(), "THERE\n");
}

#[test]
fn test_gosub_return() {
    let mut s = Session::new();
    s.enter("10 GOSUB 100");
    s.enter("20 PRINT \"BACK\"");
    s.enter("30 END");
    s.enter("100 PRINT \"SUB\"");
    s.enter("110 RETURN");
    s.enter("RUN");
    assert_eq!(s.output(), "SUB\nBACK\n");
}

#[test]
fn test_array_fill_and_print() {
    let mut s = Session::new();
    s.enter("10 DIM A(5)");
    s.enter("20 FOR I=1 TO 5: A(I)=I*I: NEXT I");
    s.enter("30 FOR I=1 TO 5: PRINT A(I);: NEXT I");
    s.enter("RUN");
    assert_eq!(s.output(), "1 4 9 16 25");
}

#[test]
fn test_string_print() {
    let mut s = Session::new();
    s.enter("10 A$=\"WORLD\"");
    s.enter("20 PRINT \"HELLO \";A$");
    s.enter("RUN");
    assert_eq!(s.output(), "HELLO WORLD\n");
}

#[test]
fn test_input_number() {
    let mut s = Session::new();
    s.enter("10 INPUT A : PRINT A*2");
    s.provide("21");
    s.enter("RUN");
    assert_eq!(s.output(), "? 42\n");
}

#[test]
fn test_input_negative_and_prompt() {
    let mut s = Session::new();
    s.enter("10 INPUT \"N\"; A");
    s.enter("20 PRINT A");
    s.provide("  -7");
    s.enter("RUN");
    assert_eq!(s.output(), "N? -7\n");
}

#[test]
fn test_input_break_character_stops() {
    let mut s = Session::new();
    s.enter("10 INPUT A, B");
    s.enter("20 PRINT \"NOT REACHED\"");
    s.provide("5");
    s.provide("#");
    s.enter("RUN");
    assert_eq!(s.output(), "? ? ");
}

#[test]
fn test_typed_break_character_stops_the_program() {
    // without the break poll this program never ends
    let mut s = Session::new();
    s.enter("10 A=1");
    s.enter("20 GOTO 10");
    s.provide("#");
    s.enter("RUN");
    assert_eq!(s.output(), "");
}

#[test]
fn test_goto_computed_target() {
    let mut s = Session::new();
    s.enter("10 A=10");
    s.enter("20 GOTO 10*A");
    s.enter("30 PRINT \"NO\"");
    s.enter("100 PRINT \"YES\"");
    s.enter("RUN");
    assert_eq!(s.output(), "YES\n");
}

#[test]
fn test_goto_unknown_line_reports() {
    let mut s = Session::new();
    s.enter("10 GOTO 99");
    s.enter("RUN");
    assert_eq!(s.output(), "10: Unknown Line Error\n");
}

#[test]
fn test_return_without_gosub_reports() {
    let mut s = Session::new();
    s.enter("10 RETURN");
    s.enter("RUN");
    assert_eq!(s.output(), "10: Return Error\n");
}

#[test]
fn test_next_wrong_variable_reports() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 3");
    s.enter("20 NEXT J");
    s.enter("RUN");
    assert_eq!(s.output(), "20: Next Error\n");
}

#[test]
fn test_for_skips_body_when_done_at_entry() {
    let mut s = Session::new();
    s.enter("10 FOR I=5 TO 1");
    s.enter("20 PRINT I");
    s.enter("30 NEXT I");
    s.enter("40 PRINT \"DONE\"");
    s.enter("RUN");
    assert_eq!(s.output(), "DONE\n");
}

#[test]
fn test_for_negative_step() {
    let mut s = Session::new();
    s.enter("10 FOR I=3 TO 1 STEP -1");
    s.enter("20 PRINT I;");
    s.enter("30 NEXT I");
    s.enter("RUN");
    assert_eq!(s.output(), "3 2 1");
}

#[test]
fn test_nested_for() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 2");
    s.enter("20 FOR J=1 TO 2");
    s.enter("30 PRINT I*10+J;");
    s.enter("40 NEXT J");
    s.enter("50 NEXT I");
    s.enter("RUN");
    assert_eq!(s.output(), "11 12 21 22");
}

#[test]
fn test_break_leaves_innermost_loop() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 5");
    s.enter("20 PRINT I;");
    s.enter("30 IF I=2 THEN BREAK");
    s.enter("40 NEXT I");
    s.enter("50 PRINT \" OUT\"");
    s.enter("RUN");
    assert_eq!(s.output(), "1 2 OUT\n");
}

#[test]
fn test_end_and_cont() {
    let mut s = Session::new();
    s.enter("10 A=1");
    s.enter("20 END");
    s.enter("30 PRINT A");
    s.enter("RUN");
    assert_eq!(s.output(), "");
    s.enter("CONT");
    assert_eq!(s.output(), "1\n");
}

#[test]
fn test_run_from_line() {
    let mut s = Session::new();
    s.enter("10 PRINT \"ONE\"");
    s.enter("20 PRINT \"TWO\"");
    s.enter("RUN 20");
    assert_eq!(s.output(), "TWO\n");
}

#[test]
fn test_new_erases_program_and_variables() {
    let mut s = Session::new();
    s.enter("10 A=1");
    s.enter("RUN");
    s.enter("NEW");
    s.enter("PRINT A");
    s.enter("LIST");
    assert_eq!(s.output(), "0\n");
}

#[test]
fn test_clr_zeroes_scalars() {
    let mut s = Session::new();
    s.enter("A=5");
    s.enter("CLR");
    s.enter("PRINT A");
    assert_eq!(s.output(), "0\n");
}

#[test]
fn test_rem_skips_rest_of_line() {
    let mut s = Session::new();
    s.enter("10 REM NOTHING TO SEE: PRINT \"X\"");
    s.enter("20 PRINT \"Y\"");
    s.enter("RUN");
    assert_eq!(s.output(), "Y\n");
}

#[test]
fn test_immediate_statement_runs_directly() {
    let mut s = Session::new();
    s.enter("PRINT 2+3");
    assert_eq!(s.output(), "5\n");
}

#[test]
fn test_colon_separated_statements() {
    let mut s = Session::new();
    s.enter("A=1: B=2: PRINT A+B");
    assert_eq!(s.output(), "3\n");
}

#[test]
fn test_print_field_width() {
    let mut s = Session::new();
    s.enter("PRINT #4, 7; 13");
    assert_eq!(s.output(), "7   13  \n");
}

#[test]
fn test_print_comma_separator() {
    let mut s = Session::new();
    s.enter("PRINT 1,2");
    assert_eq!(s.output(), "1 2\n");
}

#[test]
fn test_error_clears_for_stack() {
    let mut s = Session::new();
    s.enter("10 FOR I=1 TO 3");
    s.enter("20 GOTO 99");
    s.enter("RUN");
    assert_eq!(s.output(), "20: Unknown Line Error\n");
    // the FOR stack was cleared at the boundary, so NEXT underflows
    s.enter("NEXT");
    assert_eq!(s.output(), "FOR Error\n");
}

#[test]
fn test_stop_mid_program() {
    let mut s = Session::new();
    s.enter("10 PRINT \"A\"");
    s.enter("20 STOP");
    s.enter("30 PRINT \"B\"");
    s.enter("RUN");
    assert_eq!(s.output(), "A\n");
    s.enter("CONT");
    assert_eq!(s.output(), "B\n");
}

#[test]
fn test_gosub_depth_limit() {
    let mut s = Session::new();
    s.enter("10 GOSUB 10");
    s.enter("RUN");
    assert_eq!(s.output(), "10: GOSUB Error\n");
}

#[test]
fn test_put_writes_raw_characters() {
    let mut s = Session::new();
    s.enter("PUT 72, 73");
    assert_eq!(s.output(), "HI");
}

#[test]
fn test_get_with_pending_character() {
    let mut s = Session::new();
    s.provide("A");
    s.enter("GET C: PRINT C");
    assert_eq!(s.output(), "65\n");
}

#[test]
fn test_get_without_input_yields_zero() {
    let mut s = Session::new();
    s.enter("GET C: PRINT C");
    assert_eq!(s.output(), "0\n");
}

#[test]
fn test_tab_prints_spaces() {
    let mut s = Session::new();
    s.enter("TAB 3: PRINT \"X\"");
    assert_eq!(s.output(), "   X\n");
}
